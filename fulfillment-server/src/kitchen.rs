//! Kitchen queue engine
//!
//! Owns every status transition of `KitchenQueueEntry` records. Each
//! transition is a compare-and-swap: the caller states which status it
//! believes the entry is in, and a mismatch fails with `StaleState` so
//! two cooks tapping the same ticket cannot both win. The mirrored
//! status on the owning `OrderItem` is updated in the same transaction.

use chrono::Utc;
use shared::auth::ActorContext;
use shared::message::{BusEvent, EventPayload, Topic};
use shared::queue::{KitchenQueueEntry, PrepStatus, QueueTransition, Station};

use crate::common::{FulfillmentError, FulfillmentResult};
use crate::message::NotificationBus;
use crate::storage::FulfillmentStorage;

/// Drives entries through `queued -> prepping -> ready -> served`
#[derive(Clone)]
pub struct KitchenQueueEngine {
    storage: FulfillmentStorage,
    bus: NotificationBus,
}

impl KitchenQueueEngine {
    pub fn new(storage: FulfillmentStorage, bus: NotificationBus) -> Self {
        Self { storage, bus }
    }

    // ========== Transitions ==========

    /// Cook picks up the ticket: `queued -> prepping`
    pub fn start(
        &self,
        entry_id: &str,
        expected: PrepStatus,
        actor: &ActorContext,
    ) -> FulfillmentResult<KitchenQueueEntry> {
        self.transition(entry_id, QueueTransition::Start, expected, None, actor)
    }

    /// Dish is done: `prepping -> ready`
    pub fn finish(
        &self,
        entry_id: &str,
        expected: PrepStatus,
        actor: &ActorContext,
    ) -> FulfillmentResult<KitchenQueueEntry> {
        self.transition(entry_id, QueueTransition::Finish, expected, None, actor)
    }

    /// Runner delivers to the table: `ready -> served`
    pub fn serve(
        &self,
        entry_id: &str,
        expected: PrepStatus,
        actor: &ActorContext,
    ) -> FulfillmentResult<KitchenQueueEntry> {
        self.transition(entry_id, QueueTransition::Serve, expected, None, actor)
    }

    /// Kitchen-side cancel, only legal before a cook has started
    pub fn cancel(
        &self,
        entry_id: &str,
        expected: PrepStatus,
        reason: Option<String>,
        actor: &ActorContext,
    ) -> FulfillmentResult<KitchenQueueEntry> {
        self.transition(entry_id, QueueTransition::Cancel, expected, reason, actor)
    }

    fn transition(
        &self,
        entry_id: &str,
        action: QueueTransition,
        expected: PrepStatus,
        reason: Option<String>,
        actor: &ActorContext,
    ) -> FulfillmentResult<KitchenQueueEntry> {
        let txn = self.storage.begin_write()?;
        let mut entry = self.storage.entry_in_txn(&txn, entry_id)?;

        // CAS first: a concurrent writer surfaces as StaleState, which
        // tells the caller to refresh the board and retry
        if entry.status != expected {
            return Err(FulfillmentError::StaleState {
                entry_id: entry_id.to_string(),
                expected,
                actual: entry.status,
            });
        }
        if !action.is_legal_from(entry.status) {
            return Err(FulfillmentError::InvalidTransition {
                entry_id: entry_id.to_string(),
                from: entry.status,
                action,
            });
        }

        let now = Utc::now().timestamp_millis();
        entry.status = action.to_status();
        match action {
            QueueTransition::Start => entry.started_at = Some(now),
            QueueTransition::Finish => entry.done_at = Some(now),
            _ => {}
        }
        self.storage.put_entry(&txn, &entry)?;

        // Mirror onto the owning item so billing and order views agree
        let mut item = self.storage.item_in_txn(&txn, &entry.order_item_id)?;
        item.status = entry.status;
        if action == QueueTransition::Cancel {
            item.cancel_reason = reason.or_else(|| Some("cancelled by kitchen".to_string()));
        }
        self.storage.put_item(&txn, &item)?;
        txn.commit()?;

        tracing::info!(
            entry_id = %entry.id,
            station = %entry.station,
            action = %action,
            status = %entry.status,
            actor = %actor.actor_id,
            "Queue entry transitioned"
        );

        self.bus.publish(BusEvent::new(
            Topic::QueueChanged(entry.station),
            EventPayload::QueueChanged {
                entry_id: entry.id.clone(),
                order_item_id: entry.order_item_id.clone(),
                station: entry.station,
                status: entry.status,
            },
        ));
        // A kitchen cancel changes what the table owes
        if action == QueueTransition::Cancel {
            let order = self.storage.get_order(&entry.order_id)?;
            if let Some(order) = order {
                self.bus.publish(BusEvent::new(
                    Topic::OrderChanged,
                    EventPayload::OrderChanged {
                        order_id: order.id.clone(),
                        table_id: order.table_id.clone(),
                        status: order.status,
                    },
                ));
            }
        }
        Ok(entry)
    }

    // ========== Board Projections ==========

    /// Active tickets for one station, oldest first
    pub fn station_board(&self, station: Station) -> FulfillmentResult<Vec<KitchenQueueEntry>> {
        let mut entries: Vec<_> = self
            .storage
            .entries_for_station(station)?
            .into_iter()
            .filter(|e| e.is_active())
            .collect();
        entries.sort_by_key(|e| e.created_at);
        Ok(entries)
    }

    /// Every station board at once, for the expo screen
    pub fn overview(&self) -> FulfillmentResult<Vec<(Station, Vec<KitchenQueueEntry>)>> {
        Station::ALL
            .iter()
            .map(|s| Ok((*s, self.station_board(*s)?)))
            .collect()
    }

    /// Dishes waiting to be run out, across all stations
    pub fn serving_board(&self) -> FulfillmentResult<Vec<KitchenQueueEntry>> {
        let mut entries: Vec<_> = self
            .storage
            .all_entries()?
            .into_iter()
            .filter(|e| e.status == PrepStatus::Ready)
            .collect();
        entries.sort_by_key(|e| e.done_at.unwrap_or(e.created_at));
        Ok(entries)
    }
}

impl std::fmt::Debug for KitchenQueueEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KitchenQueueEngine").finish_non_exhaustive()
    }
}
