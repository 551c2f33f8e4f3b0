//! Notification bus event types
//!
//! Events are a convenience, not the source of truth: delivery is
//! fire-and-forget and consumers must tolerate missed events by falling
//! back to a full re-read of current state.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::order::OrderStatus;
use crate::queue::{PrepStatus, Station};

/// Bus topic; consumers subscribe per station or per table
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE", tag = "kind", content = "station")]
pub enum Topic {
    OrderChanged,
    QueueChanged(Station),
    TableSettled,
}

impl Topic {
    /// Dotted topic name ("order.changed", "queue.bar.changed", ...)
    pub fn name(&self) -> String {
        match self {
            Topic::OrderChanged => "order.changed".to_string(),
            Topic::QueueChanged(station) => format!("queue.{}.changed", station),
            Topic::TableSettled => "table.settled".to_string(),
        }
    }
}

impl fmt::Display for Topic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name())
    }
}

/// Topic filter for subscriptions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TopicFilter {
    /// Every event
    All,
    /// Order mutations only (billing views, staff dashboards)
    Orders,
    /// One station's queue (kitchen board)
    Station(Station),
    /// Settlement events only (table map, billing screens)
    Settlements,
}

impl TopicFilter {
    pub fn matches(&self, topic: &Topic) -> bool {
        match (self, topic) {
            (TopicFilter::All, _) => true,
            (TopicFilter::Orders, Topic::OrderChanged) => true,
            (TopicFilter::Station(s), Topic::QueueChanged(t)) => s == t,
            (TopicFilter::Settlements, Topic::TableSettled) => true,
            _ => false,
        }
    }
}

/// Event payload variants
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE", tag = "type")]
pub enum EventPayload {
    OrderChanged {
        order_id: String,
        table_id: String,
        status: OrderStatus,
    },
    QueueChanged {
        entry_id: String,
        order_item_id: String,
        station: Station,
        status: PrepStatus,
    },
    TableSettled {
        table_id: String,
        order_ids: Vec<String>,
        settled_amount: Decimal,
    },
}

/// One bus event
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BusEvent {
    pub event_id: String,
    pub topic: Topic,
    pub payload: EventPayload,
    /// Publish timestamp (Unix milliseconds)
    pub timestamp: i64,
}

impl BusEvent {
    pub fn new(topic: Topic, payload: EventPayload) -> Self {
        Self {
            event_id: uuid::Uuid::new_v4().to_string(),
            topic,
            payload,
            timestamp: chrono::Utc::now().timestamp_millis(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn topic_names_are_dotted() {
        assert_eq!(Topic::OrderChanged.name(), "order.changed");
        assert_eq!(Topic::QueueChanged(Station::Bar).name(), "queue.bar.changed");
        assert_eq!(Topic::TableSettled.name(), "table.settled");
    }

    #[test]
    fn station_filter_only_matches_its_station() {
        let filter = TopicFilter::Station(Station::Bar);
        assert!(filter.matches(&Topic::QueueChanged(Station::Bar)));
        assert!(!filter.matches(&Topic::QueueChanged(Station::Main)));
        assert!(!filter.matches(&Topic::OrderChanged));
    }

    #[test]
    fn wire_format_uses_screaming_snake_tags() {
        let topic = serde_json::to_value(Topic::QueueChanged(Station::Bar)).unwrap();
        assert_eq!(topic["kind"], "QUEUE_CHANGED");
        assert_eq!(topic["station"], "BAR");

        let payload = serde_json::to_value(EventPayload::TableSettled {
            table_id: "T1".into(),
            order_ids: vec!["o1".into()],
            settled_amount: Decimal::new(1800, 2),
        })
        .unwrap();
        assert_eq!(payload["type"], "TABLE_SETTLED");
        assert_eq!(payload["table_id"], "T1");
    }

    #[test]
    fn all_filter_matches_everything() {
        for topic in [
            Topic::OrderChanged,
            Topic::QueueChanged(Station::Dessert),
            Topic::TableSettled,
        ] {
            assert!(TopicFilter::All.matches(&topic));
        }
    }
}
