//! Station router
//!
//! Derives the target preparation station for each order item from the
//! menu catalog and materializes exactly one `KitchenQueueEntry` per item.
//! Routing is idempotent on `order_item_id`; an unknown menu item cancels
//! the item with a reason rather than leaving it in limbo without a queue
//! entry.

use redb::WriteTransaction;
use shared::catalog::MenuItemMeta;
use shared::queue::{KitchenQueueEntry, PrepStatus, Station};
use shared::order::OrderItem;
use std::sync::Arc;

use crate::catalog::MenuCatalog;
use crate::common::{FulfillmentError, FulfillmentResult};
use crate::storage::FulfillmentStorage;

/// Result of routing one item
#[derive(Debug, Clone)]
pub enum RouteOutcome {
    /// A fresh entry was created
    Created(KitchenQueueEntry),
    /// The item already had an entry; routing is a no-op
    AlreadyRouted(String),
}

/// Routes order items to station queues
#[derive(Clone)]
pub struct StationRouter {
    storage: FulfillmentStorage,
    catalog: Arc<dyn MenuCatalog>,
}

impl StationRouter {
    pub fn new(storage: FulfillmentStorage, catalog: Arc<dyn MenuCatalog>) -> Self {
        Self { storage, catalog }
    }

    /// Station for a catalog entry; unannotated items fall back to `main`
    ///
    /// The fallback is a documented policy choice: an item without a
    /// station annotation is still cooked somewhere, never dropped.
    fn station_for(meta: &MenuItemMeta) -> Station {
        meta.station.unwrap_or(Station::Main)
    }

    /// Route one item within the caller's transaction
    ///
    /// On a catalog miss the item is marked cancelled with a reason inside
    /// the same transaction and `UnknownMenuItem` is returned.
    pub fn route_in_txn(
        &self,
        txn: &WriteTransaction,
        item: &OrderItem,
        table_id: &str,
    ) -> FulfillmentResult<RouteOutcome> {
        // Idempotency: one entry per item, ever
        if let Some(entry_id) = self.storage.entry_id_for_item(txn, &item.id)? {
            tracing::debug!(item_id = %item.id, entry_id = %entry_id, "Item already routed");
            return Ok(RouteOutcome::AlreadyRouted(entry_id));
        }

        let Some(meta) = self.catalog.lookup(&item.menu_item_id) else {
            // Menu item vanished between add and submit; cancel rather
            // than strand the item without a queue entry
            let mut cancelled = item.clone();
            cancelled.status = PrepStatus::Cancelled;
            cancelled.cancel_reason =
                Some(format!("menu item {} not found during routing", item.menu_item_id));
            self.storage.put_item(txn, &cancelled)?;
            tracing::warn!(
                item_id = %item.id,
                menu_item_id = %item.menu_item_id,
                "Routing failed, item cancelled"
            );
            return Err(FulfillmentError::UnknownMenuItem(item.menu_item_id.clone()));
        };

        let station = Self::station_for(&meta);
        let entry = KitchenQueueEntry::new(
            item.id.clone(),
            item.order_id.clone(),
            table_id,
            station,
            item.name_snapshot.clone(),
            item.qty,
            item.notes.clone(),
        );
        self.storage.put_entry(txn, &entry)?;
        tracing::info!(
            item_id = %item.id,
            entry_id = %entry.id,
            station = %station,
            "Item routed to station queue"
        );
        Ok(RouteOutcome::Created(entry))
    }

    /// Propagate an item edit (qty/notes) onto its entry, if one exists
    /// and is still queued
    ///
    /// Once a cook has started, the entry never silently changes; the
    /// store enforces that edits are only legal while queued.
    pub fn refresh_entry(
        &self,
        txn: &WriteTransaction,
        item: &OrderItem,
    ) -> FulfillmentResult<Option<KitchenQueueEntry>> {
        let Some(entry_id) = self.storage.entry_id_for_item(txn, &item.id)? else {
            return Ok(None);
        };
        let mut entry = self.storage.entry_in_txn(txn, &entry_id)?;
        if entry.status != PrepStatus::Queued {
            return Ok(None);
        }
        entry.qty = item.qty;
        entry.notes = item.notes.clone();
        self.storage.put_entry(txn, &entry)?;
        Ok(Some(entry))
    }

    /// Suppress the entry of a cancelled item, regardless of entry status
    ///
    /// This is the manager-edit path, distinct from the kitchen-side
    /// `cancel` transition which is only legal from `queued`.
    pub fn suppress_entry(
        &self,
        txn: &WriteTransaction,
        order_item_id: &str,
    ) -> FulfillmentResult<Option<KitchenQueueEntry>> {
        let Some(entry_id) = self.storage.entry_id_for_item(txn, order_item_id)? else {
            return Ok(None);
        };
        let mut entry = self.storage.entry_in_txn(txn, &entry_id)?;
        if entry.status == PrepStatus::Cancelled {
            return Ok(Some(entry));
        }
        entry.status = PrepStatus::Cancelled;
        self.storage.put_entry(txn, &entry)?;
        tracing::info!(
            entry_id = %entry.id,
            order_item_id = %order_item_id,
            station = %entry.station,
            "Queue entry suppressed for cancelled item"
        );
        Ok(Some(entry))
    }
}

impl std::fmt::Debug for StationRouter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StationRouter").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::StaticCatalog;
    use rust_decimal::Decimal;
    use shared::order::Order;

    fn setup() -> (FulfillmentStorage, StationRouter, Arc<StaticCatalog>) {
        let storage = FulfillmentStorage::open_in_memory().unwrap();
        let catalog = StaticCatalog::new();
        catalog.upsert("burger", "Burger", Decimal::new(900, 2), Some(Station::Main));
        catalog.upsert("mojito", "Mojito", Decimal::new(650, 2), Some(Station::Bar));
        catalog.upsert("flan", "Flan", Decimal::new(450, 2), None);
        let router = StationRouter::new(storage.clone(), catalog.clone());
        (storage, router, catalog)
    }

    fn stored_item(storage: &FulfillmentStorage, menu_item_id: &str) -> OrderItem {
        let order = Order::new("T1");
        let item = OrderItem::new(
            &order.id,
            menu_item_id,
            menu_item_id,
            Decimal::new(900, 2),
            1,
            None,
        );
        let txn = storage.begin_write().unwrap();
        storage.put_order(&txn, &order).unwrap();
        storage.put_item(&txn, &item).unwrap();
        txn.commit().unwrap();
        item
    }

    #[test]
    fn routes_to_catalog_station() {
        let (storage, router, _) = setup();
        let item = stored_item(&storage, "mojito");

        let txn = storage.begin_write().unwrap();
        let outcome = router.route_in_txn(&txn, &item, "T1").unwrap();
        txn.commit().unwrap();

        match outcome {
            RouteOutcome::Created(entry) => {
                assert_eq!(entry.station, Station::Bar);
                assert_eq!(entry.status, PrepStatus::Queued);
                assert_eq!(entry.order_item_id, item.id);
            }
            other => panic!("expected Created, got {:?}", other),
        }
    }

    #[test]
    fn unannotated_item_falls_back_to_main() {
        let (storage, router, _) = setup();
        let item = stored_item(&storage, "flan");

        let txn = storage.begin_write().unwrap();
        let outcome = router.route_in_txn(&txn, &item, "T1").unwrap();
        txn.commit().unwrap();

        match outcome {
            RouteOutcome::Created(entry) => assert_eq!(entry.station, Station::Main),
            other => panic!("expected Created, got {:?}", other),
        }
    }

    #[test]
    fn routing_twice_is_a_noop() {
        let (storage, router, _) = setup();
        let item = stored_item(&storage, "burger");

        let txn = storage.begin_write().unwrap();
        let first = router.route_in_txn(&txn, &item, "T1").unwrap();
        let second = router.route_in_txn(&txn, &item, "T1").unwrap();
        txn.commit().unwrap();

        let RouteOutcome::Created(entry) = first else {
            panic!("expected Created");
        };
        match second {
            RouteOutcome::AlreadyRouted(entry_id) => assert_eq!(entry_id, entry.id),
            other => panic!("expected AlreadyRouted, got {:?}", other),
        }
        // Still exactly one entry for the item
        assert_eq!(
            storage.entry_for_item(&item.id).unwrap().unwrap().id,
            entry.id
        );
    }

    #[test]
    fn unknown_menu_item_cancels_item_with_reason() {
        let (storage, router, catalog) = setup();
        let item = stored_item(&storage, "burger");
        catalog.remove("burger");

        let txn = storage.begin_write().unwrap();
        let err = router.route_in_txn(&txn, &item, "T1").unwrap_err();
        txn.commit().unwrap();

        assert!(matches!(err, FulfillmentError::UnknownMenuItem(_)));
        let reloaded = storage.get_item(&item.id).unwrap().unwrap();
        assert_eq!(reloaded.status, PrepStatus::Cancelled);
        assert!(reloaded.cancel_reason.is_some());
        // Never left in limbo with a queue entry
        assert!(storage.entry_for_item(&item.id).unwrap().is_none());
    }

    #[test]
    fn suppress_marks_entry_cancelled_even_mid_prep() {
        let (storage, router, _) = setup();
        let item = stored_item(&storage, "burger");

        let txn = storage.begin_write().unwrap();
        let RouteOutcome::Created(mut entry) = router.route_in_txn(&txn, &item, "T1").unwrap()
        else {
            panic!("expected Created");
        };
        // Simulate a cook having started
        entry.status = PrepStatus::Prepping;
        storage.put_entry(&txn, &entry).unwrap();

        let suppressed = router.suppress_entry(&txn, &item.id).unwrap().unwrap();
        txn.commit().unwrap();

        assert_eq!(suppressed.status, PrepStatus::Cancelled);
    }
}
