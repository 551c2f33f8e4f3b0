//! Fulfillment Server - order fulfillment and kitchen routing engine
//!
//! # Architecture
//!
//! The engine takes a table's order from cart to settled bill:
//!
//! - **Order store** (`store`): order/item lifecycle and cart edits
//! - **Station router** (`routing`): one kitchen ticket per item, per station
//! - **Kitchen queue** (`kitchen`): CAS-guarded `queued -> prepping -> ready -> served`
//! - **Billing** (`billing`): derived unpaid bills, atomic settlement
//! - **Notification bus** (`message`): fire-and-forget board updates
//!
//! # Module layout
//!
//! ```text
//! fulfillment-server/src/
//! ├── core/          # configuration
//! ├── common/        # errors, logging
//! ├── storage.rs     # redb persistence
//! ├── catalog.rs     # menu lookup seam
//! ├── tables.rs      # table occupancy seam
//! ├── store/         # order store
//! ├── routing.rs     # station router
//! ├── kitchen.rs     # kitchen queue engine
//! ├── billing.rs     # billing aggregator
//! ├── message/       # notification bus
//! └── engine/        # facade wiring it all together
//! ```

pub mod billing;
pub mod catalog;
pub mod common;
pub mod core;
pub mod engine;
pub mod kitchen;
pub mod message;
pub mod money;
pub mod routing;
pub mod storage;
pub mod store;
pub mod tables;

pub use billing::{BillLine, BillOrder, BillingAggregator, SettlementResult, UnpaidBill};
pub use catalog::{MenuCatalog, StaticCatalog};
pub use common::logger::init_logger;
pub use common::{FulfillmentError, FulfillmentResult};
pub use core::Config;
pub use engine::FulfillmentEngine;
pub use kitchen::KitchenQueueEngine;
pub use message::{NotificationBus, TopicSubscription};
pub use routing::StationRouter;
pub use storage::FulfillmentStorage;
pub use store::OrderStore;
pub use tables::{InMemoryTableDirectory, TableDirectory};

/// Create the working directory and initialize logging
pub fn setup_environment(config: &Config) -> anyhow::Result<()> {
    std::fs::create_dir_all(&config.work_dir)?;
    let log_dir = config.log_json.then(|| config.log_dir());
    let log_dir = log_dir.as_ref().and_then(|p| p.to_str());
    init_logger(&config.log_level, config.is_production(), log_dir)?;
    Ok(())
}
