//! Engine facade
//!
//! Wires storage, catalog, table directory, bus and the three operational
//! components (store, kitchen, billing) into one handle the server and
//! the tests hold on to.

use std::sync::Arc;

use crate::billing::BillingAggregator;
use crate::catalog::MenuCatalog;
use crate::common::FulfillmentResult;
use crate::core::Config;
use crate::kitchen::KitchenQueueEngine;
use crate::message::{BusConfig, NotificationBus};
use crate::routing::StationRouter;
use crate::storage::FulfillmentStorage;
use crate::store::OrderStore;
use crate::tables::TableDirectory;
use shared::auth::ActorContext;
use shared::order::Order;

#[cfg(test)]
mod tests;

/// The assembled fulfillment engine
#[derive(Clone)]
pub struct FulfillmentEngine {
    storage: FulfillmentStorage,
    bus: NotificationBus,
    store: OrderStore,
    kitchen: KitchenQueueEngine,
    billing: BillingAggregator,
    tables: Arc<dyn TableDirectory>,
}

impl FulfillmentEngine {
    /// Open the engine against the configured working directory
    pub fn new(
        config: &Config,
        catalog: Arc<dyn MenuCatalog>,
        tables: Arc<dyn TableDirectory>,
    ) -> anyhow::Result<Self> {
        let db_path = config.database_path();
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let storage = FulfillmentStorage::open(&db_path)?;
        tracing::info!(path = %db_path.display(), "Fulfillment database opened");
        let bus = NotificationBus::from_config(BusConfig {
            channel_capacity: config.bus_capacity,
        });
        Ok(Self::assemble(storage, catalog, tables, bus))
    }

    /// Fully in-memory engine for tests and demos
    pub fn in_memory(
        catalog: Arc<dyn MenuCatalog>,
        tables: Arc<dyn TableDirectory>,
    ) -> FulfillmentResult<Self> {
        let storage = FulfillmentStorage::open_in_memory()?;
        Ok(Self::assemble(storage, catalog, tables, NotificationBus::new()))
    }

    fn assemble(
        storage: FulfillmentStorage,
        catalog: Arc<dyn MenuCatalog>,
        tables: Arc<dyn TableDirectory>,
        bus: NotificationBus,
    ) -> Self {
        let router = StationRouter::new(storage.clone(), catalog.clone());
        let store = OrderStore::new(storage.clone(), catalog, router, bus.clone());
        let kitchen = KitchenQueueEngine::new(storage.clone(), bus.clone());
        let billing = BillingAggregator::new(storage.clone(), tables.clone(), bus.clone());
        Self {
            storage,
            bus,
            store,
            kitchen,
            billing,
            tables,
        }
    }

    /// Open an order for a table and flag the table occupied
    ///
    /// The occupancy flag is a hint for the floor map, so a directory
    /// failure does not fail the order.
    pub fn open_table(&self, table_id: &str, actor: &ActorContext) -> FulfillmentResult<Order> {
        let order = self.store.create_order(table_id, actor)?;
        if let Err(e) = self.tables.mark_occupied(table_id) {
            tracing::warn!(table_id, error = %e, "Failed to mark table occupied");
        }
        Ok(order)
    }

    pub fn store(&self) -> &OrderStore {
        &self.store
    }

    pub fn kitchen(&self) -> &KitchenQueueEngine {
        &self.kitchen
    }

    pub fn billing(&self) -> &BillingAggregator {
        &self.billing
    }

    pub fn bus(&self) -> &NotificationBus {
        &self.bus
    }

    pub fn storage(&self) -> &FulfillmentStorage {
        &self.storage
    }

    /// Stop bus consumers; storage flushes on drop
    pub fn shutdown(&self) {
        self.bus.shutdown();
    }
}

impl std::fmt::Debug for FulfillmentEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FulfillmentEngine").finish_non_exhaustive()
    }
}
