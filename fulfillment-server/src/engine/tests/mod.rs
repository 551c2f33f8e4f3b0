//! End-to-end engine tests against an in-memory database

mod test_billing;
mod test_concurrency;
mod test_flows;

use std::sync::Arc;

use rust_decimal::Decimal;
use shared::auth::{ActorContext, Role};
use shared::queue::Station;

use crate::catalog::StaticCatalog;
use crate::engine::FulfillmentEngine;
use crate::tables::InMemoryTableDirectory;

pub(crate) fn dec(s: &str) -> Decimal {
    use std::str::FromStr;
    Decimal::from_str(s).unwrap()
}

pub(crate) fn engine_with_menu() -> (
    FulfillmentEngine,
    Arc<StaticCatalog>,
    Arc<InMemoryTableDirectory>,
) {
    let catalog = StaticCatalog::new();
    catalog.upsert("burger", "Burger", dec("9.00"), Some(Station::Main));
    catalog.upsert("fries", "Fries", dec("3.50"), Some(Station::Main));
    catalog.upsert("mojito", "Mojito", dec("6.50"), Some(Station::Bar));
    catalog.upsert("flan", "Flan", dec("4.50"), Some(Station::Dessert));
    catalog.upsert("soup", "Soup of the Day", dec("5.00"), None);
    let tables = InMemoryTableDirectory::new();
    let engine = FulfillmentEngine::in_memory(catalog.clone(), tables.clone()).unwrap();
    (engine, catalog, tables)
}

pub(crate) fn waiter() -> ActorContext {
    ActorContext::new("w1", "Ana", Role::Waiter)
}

pub(crate) fn cook() -> ActorContext {
    ActorContext::new("k1", "Luis", Role::Kitchen)
}

pub(crate) fn cashier() -> ActorContext {
    ActorContext::new("c1", "Maya", Role::Cashier)
}
