//! Order and OrderItem entities
//!
//! One `Order` per table-visit session, one `OrderItem` per distinct menu
//! selection. Item name/price are snapshotted at add-time and never
//! recomputed from the catalog, so historical bills survive price changes.

use chrono::Utc;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::queue::PrepStatus;

/// Order lifecycle status
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    /// Accepting item mutations
    #[default]
    Open,
    /// Submitted to the kitchen; items routed to stations
    Sent,
    /// Voided; excluded from billing
    Cancelled,
}

/// Order entity - one per table-visit session
///
/// `is_paid` flips false -> true exactly once (settlement) and never
/// reverts. Orders are soft history records, never hard-deleted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    pub id: String,
    pub table_id: String,
    pub status: OrderStatus,
    pub is_paid: bool,
    /// Settlement timestamp (Unix milliseconds), set with `is_paid`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub paid_at: Option<i64>,
    /// Creation timestamp (Unix milliseconds)
    pub created_at: i64,
}

impl Order {
    /// Create a fresh open order for a table
    pub fn new(table_id: impl Into<String>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            table_id: table_id.into(),
            status: OrderStatus::Open,
            is_paid: false,
            paid_at: None,
            created_at: Utc::now().timestamp_millis(),
        }
    }

    /// Whether this order still counts toward the table's unpaid bill
    pub fn is_billable(&self) -> bool {
        !self.is_paid && self.status != OrderStatus::Cancelled
    }

    /// Whether this order can still accept item mutations
    pub fn accepts_items(&self) -> bool {
        self.status == OrderStatus::Open && !self.is_paid
    }
}

/// Order item entity - one per distinct menu selection
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderItem {
    pub id: String,
    pub order_id: String,
    pub menu_item_id: String,
    /// Name captured from the catalog at add-time
    pub name_snapshot: String,
    /// Price captured from the catalog at add-time; immutable afterwards
    pub price_snapshot: Decimal,
    pub qty: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    /// Mirror of the kitchen queue entry status (entry is authoritative
    /// for kitchen-side transitions)
    pub status: PrepStatus,
    /// Reason recorded when the item was soft-cancelled
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cancel_reason: Option<String>,
    /// Creation timestamp (Unix milliseconds)
    pub created_at: i64,
}

impl OrderItem {
    /// Create a queued item with snapshotted catalog data
    pub fn new(
        order_id: impl Into<String>,
        menu_item_id: impl Into<String>,
        name_snapshot: impl Into<String>,
        price_snapshot: Decimal,
        qty: i32,
        notes: Option<String>,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            order_id: order_id.into(),
            menu_item_id: menu_item_id.into(),
            name_snapshot: name_snapshot.into(),
            price_snapshot,
            qty,
            notes,
            status: PrepStatus::Queued,
            cancel_reason: None,
            created_at: Utc::now().timestamp_millis(),
        }
    }

    /// Line total: price_snapshot * qty
    pub fn line_total(&self) -> Decimal {
        self.price_snapshot * Decimal::from(self.qty)
    }

    /// Whether the item counts toward billing
    pub fn is_billable(&self) -> bool {
        self.status != PrepStatus::Cancelled
    }
}
