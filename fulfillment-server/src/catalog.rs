//! Menu catalog collaborator
//!
//! The engine consumes the catalog, it does not own it. `MenuCatalog` is
//! the seam: the production deployment backs it with the restaurant
//! configuration service, tests back it with `StaticCatalog`.

use dashmap::DashMap;
use rust_decimal::Decimal;
use shared::catalog::MenuItemMeta;
use shared::queue::Station;
use std::sync::Arc;

/// Read-only menu lookup consumed by the store and the router
pub trait MenuCatalog: Send + Sync {
    /// Returns `None` when the menu item is unknown
    fn lookup(&self, menu_item_id: &str) -> Option<MenuItemMeta>;
}

/// In-memory catalog backed by a concurrent map
///
/// Mutable so tests and demos can simulate menu edits (price changes after
/// an item was added must not affect existing snapshots).
#[derive(Debug, Default)]
pub struct StaticCatalog {
    items: DashMap<String, MenuItemMeta>,
}

impl StaticCatalog {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Insert or replace a menu item
    pub fn upsert(
        &self,
        menu_item_id: impl Into<String>,
        name: impl Into<String>,
        price: Decimal,
        station: Option<Station>,
    ) {
        self.items
            .insert(menu_item_id.into(), MenuItemMeta::new(name, price, station));
    }

    /// Change only the price of an existing item
    pub fn set_price(&self, menu_item_id: &str, price: Decimal) {
        if let Some(mut meta) = self.items.get_mut(menu_item_id) {
            meta.price = price;
        }
    }

    pub fn remove(&self, menu_item_id: &str) {
        self.items.remove(menu_item_id);
    }
}

impl MenuCatalog for StaticCatalog {
    fn lookup(&self, menu_item_id: &str) -> Option<MenuItemMeta> {
        self.items.get(menu_item_id).map(|m| m.value().clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_returns_station_annotation() {
        let catalog = StaticCatalog::new();
        catalog.upsert("mojito", "Mojito", Decimal::new(650, 2), Some(Station::Bar));
        catalog.upsert("burger", "Burger", Decimal::new(900, 2), None);

        let mojito = catalog.lookup("mojito").unwrap();
        assert_eq!(mojito.station, Some(Station::Bar));

        let burger = catalog.lookup("burger").unwrap();
        assert_eq!(burger.station, None);

        assert!(catalog.lookup("nope").is_none());
    }

    #[test]
    fn set_price_replaces_only_price() {
        let catalog = StaticCatalog::new();
        catalog.upsert("burger", "Burger", Decimal::new(900, 2), Some(Station::Main));
        catalog.set_price("burger", Decimal::new(1100, 2));

        let meta = catalog.lookup("burger").unwrap();
        assert_eq!(meta.price, Decimal::new(1100, 2));
        assert_eq!(meta.name, "Burger");
        assert_eq!(meta.station, Some(Station::Main));
    }
}
