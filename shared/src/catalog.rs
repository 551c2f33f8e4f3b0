//! Menu catalog lookup types
//!
//! The catalog itself is an external collaborator; the engine only
//! consumes `{menu_item_id -> MenuItemMeta}` lookups.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::queue::Station;

/// Catalog metadata for one menu item
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MenuItemMeta {
    pub name: String,
    pub price: Decimal,
    /// Target preparation station; `None` means unannotated and the
    /// router falls back to `main` (documented policy, not an error)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub station: Option<Station>,
}

impl MenuItemMeta {
    pub fn new(name: impl Into<String>, price: Decimal, station: Option<Station>) -> Self {
        Self {
            name: name.into(),
            price,
            station,
        }
    }
}
