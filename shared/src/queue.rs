//! Kitchen queue entry and the per-entry status machine
//!
//! ```text
//! queued --(start)--> prepping --(finish)--> ready --(serve)--> served
//!   |
//!   +--(cancel, only while queued)--> cancelled
//! ```
//!
//! Transitions are strictly monotonic: no skipping, no regression. The
//! engine enforces this with compare-and-swap on the caller's expected
//! status; this module only defines the legal edges.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Preparation station that owns a queue entry
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Station {
    /// Fallback station for unannotated menu items
    #[default]
    Main,
    Bar,
    Dessert,
}

impl Station {
    pub fn as_str(&self) -> &'static str {
        match self {
            Station::Main => "main",
            Station::Bar => "bar",
            Station::Dessert => "dessert",
        }
    }

    /// All stations, for board iteration
    pub const ALL: [Station; 3] = [Station::Main, Station::Bar, Station::Dessert];
}

impl fmt::Display for Station {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Preparation status, shared by queue entries and their item mirrors
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PrepStatus {
    #[default]
    Queued,
    Prepping,
    Ready,
    Served,
    Cancelled,
}

impl PrepStatus {
    /// Terminal states accept no further transitions
    pub fn is_terminal(&self) -> bool {
        matches!(self, PrepStatus::Served | PrepStatus::Cancelled)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PrepStatus::Queued => "queued",
            PrepStatus::Prepping => "prepping",
            PrepStatus::Ready => "ready",
            PrepStatus::Served => "served",
            PrepStatus::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for PrepStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The four kitchen-side transition commands
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum QueueTransition {
    Start,
    Finish,
    Serve,
    Cancel,
}

impl QueueTransition {
    /// The only status this transition is legal from
    pub fn from_status(&self) -> PrepStatus {
        match self {
            QueueTransition::Start => PrepStatus::Queued,
            QueueTransition::Finish => PrepStatus::Prepping,
            QueueTransition::Serve => PrepStatus::Ready,
            QueueTransition::Cancel => PrepStatus::Queued,
        }
    }

    /// The status this transition produces
    pub fn to_status(&self) -> PrepStatus {
        match self {
            QueueTransition::Start => PrepStatus::Prepping,
            QueueTransition::Finish => PrepStatus::Ready,
            QueueTransition::Serve => PrepStatus::Served,
            QueueTransition::Cancel => PrepStatus::Cancelled,
        }
    }

    /// Whether this transition is legal from `current`
    pub fn is_legal_from(&self, current: PrepStatus) -> bool {
        current == self.from_status()
    }
}

impl fmt::Display for QueueTransition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QueueTransition::Start => write!(f, "start"),
            QueueTransition::Finish => write!(f, "finish"),
            QueueTransition::Serve => write!(f, "serve"),
            QueueTransition::Cancel => write!(f, "cancel"),
        }
    }
}

/// Kitchen queue entry - one per OrderItem, owned by exactly one station
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KitchenQueueEntry {
    pub id: String,
    /// 1:1 link to the owning OrderItem; entries never exist without one
    pub order_item_id: String,
    pub order_id: String,
    pub table_id: String,
    pub station: Station,
    pub status: PrepStatus,
    /// Display data denormalized for boards
    pub item_name: String,
    pub qty: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    /// Creation timestamp (Unix milliseconds)
    pub created_at: i64,
    /// Set by `start`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub started_at: Option<i64>,
    /// Set by `finish`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub done_at: Option<i64>,
}

impl KitchenQueueEntry {
    /// Create a queued entry for an order item
    pub fn new(
        order_item_id: impl Into<String>,
        order_id: impl Into<String>,
        table_id: impl Into<String>,
        station: Station,
        item_name: impl Into<String>,
        qty: i32,
        notes: Option<String>,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            order_item_id: order_item_id.into(),
            order_id: order_id.into(),
            table_id: table_id.into(),
            station,
            status: PrepStatus::Queued,
            item_name: item_name.into(),
            qty,
            notes,
            created_at: Utc::now().timestamp_millis(),
            started_at: None,
            done_at: None,
        }
    }

    /// Whether the entry should appear on its station board
    pub fn is_active(&self) -> bool {
        matches!(self.status, PrepStatus::Queued | PrepStatus::Prepping)
    }
}
