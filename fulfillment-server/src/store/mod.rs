//! Order store
//!
//! Manages the order/item lifecycle up to the kitchen handoff: opening a
//! table session, editing the cart while the order is open, and submitting
//! it to the station queues. Catalog name and price are snapshotted at
//! add-time; later menu edits never reprice an existing item.

use rust_decimal::Decimal;
use shared::auth::ActorContext;
use shared::message::{BusEvent, EventPayload, Topic};
use shared::order::{Order, OrderItem, OrderStatus};
use shared::queue::{KitchenQueueEntry, PrepStatus};
use std::sync::Arc;

use crate::catalog::MenuCatalog;
use crate::common::{FulfillmentError, FulfillmentResult};
use crate::message::NotificationBus;
use crate::routing::{RouteOutcome, StationRouter};
use crate::storage::FulfillmentStorage;

/// Manages orders and their items
#[derive(Clone)]
pub struct OrderStore {
    storage: FulfillmentStorage,
    catalog: Arc<dyn MenuCatalog>,
    router: StationRouter,
    bus: NotificationBus,
}

impl OrderStore {
    pub fn new(
        storage: FulfillmentStorage,
        catalog: Arc<dyn MenuCatalog>,
        router: StationRouter,
        bus: NotificationBus,
    ) -> Self {
        Self {
            storage,
            catalog,
            router,
            bus,
        }
    }

    // ========== Order Lifecycle ==========

    /// Open an order for a table, or return the table's active one
    ///
    /// Idempotent per table session: while an open, unpaid order exists
    /// for the table, repeated calls return it instead of forking a
    /// second cart.
    pub fn create_order(&self, table_id: &str, actor: &ActorContext) -> FulfillmentResult<Order> {
        let txn = self.storage.begin_write()?;
        if let Some(existing) = self.storage.find_open_unpaid_order(&txn, table_id)? {
            tracing::debug!(
                table_id,
                order_id = %existing.id,
                "Active order already open for table"
            );
            return Ok(existing);
        }

        let order = Order::new(table_id);
        self.storage.put_order(&txn, &order)?;
        txn.commit()?;

        tracing::info!(
            table_id,
            order_id = %order.id,
            actor = %actor.actor_id,
            "Order created"
        );
        self.publish_order_changed(&order);
        Ok(order)
    }

    /// Submit the order to the kitchen: `open -> sent`, routing every
    /// item that does not have a queue entry yet
    ///
    /// Re-submitting a sent order is a repair path: it only materializes
    /// entries for items that missed routing, it never duplicates one.
    pub fn submit_order(
        &self,
        order_id: &str,
        actor: &ActorContext,
    ) -> FulfillmentResult<Vec<KitchenQueueEntry>> {
        let txn = self.storage.begin_write()?;
        let mut order = self.storage.order_in_txn(&txn, order_id)?;
        if order.status == OrderStatus::Cancelled || order.is_paid {
            return Err(FulfillmentError::OrderClosed(order_id.to_string()));
        }

        let items = self.storage.items_for_order_in_txn(&txn, order_id)?;
        let active: Vec<_> = items.into_iter().filter(|i| i.is_billable()).collect();
        if active.is_empty() {
            return Err(FulfillmentError::EmptyOrder(order_id.to_string()));
        }

        let mut created = Vec::new();
        for item in &active {
            match self.router.route_in_txn(&txn, item, &order.table_id) {
                Ok(RouteOutcome::Created(entry)) => created.push(entry),
                Ok(RouteOutcome::AlreadyRouted(_)) => {}
                // The router already cancelled the item; the rest of the
                // order still goes to the kitchen
                Err(FulfillmentError::UnknownMenuItem(menu_item_id)) => {
                    tracing::warn!(
                        order_id,
                        item_id = %item.id,
                        menu_item_id = %menu_item_id,
                        "Item dropped from submission, menu item gone"
                    );
                }
                Err(e) => return Err(e),
            }
        }

        order.status = OrderStatus::Sent;
        self.storage.put_order(&txn, &order)?;
        txn.commit()?;

        tracing::info!(
            order_id,
            entries = created.len(),
            actor = %actor.actor_id,
            "Order submitted to kitchen"
        );
        self.publish_order_changed(&order);
        for entry in &created {
            self.bus.publish(BusEvent::new(
                Topic::QueueChanged(entry.station),
                EventPayload::QueueChanged {
                    entry_id: entry.id.clone(),
                    order_item_id: entry.order_item_id.clone(),
                    station: entry.station,
                    status: entry.status,
                },
            ));
        }
        Ok(created)
    }

    // ========== Item Mutations ==========

    /// Add an item to an open order, snapshotting catalog name and price
    pub fn add_item(
        &self,
        order_id: &str,
        menu_item_id: &str,
        qty: i32,
        notes: Option<String>,
        actor: &ActorContext,
    ) -> FulfillmentResult<OrderItem> {
        if qty < 1 {
            return Err(FulfillmentError::InvalidQuantity(qty));
        }

        let txn = self.storage.begin_write()?;
        let order = self.storage.order_in_txn(&txn, order_id)?;
        if !order.accepts_items() {
            return Err(FulfillmentError::OrderClosed(order_id.to_string()));
        }
        let meta = self
            .catalog
            .lookup(menu_item_id)
            .ok_or_else(|| FulfillmentError::UnknownMenuItem(menu_item_id.to_string()))?;

        let item = OrderItem::new(order_id, menu_item_id, meta.name, meta.price, qty, notes);
        self.storage.put_item(&txn, &item)?;
        txn.commit()?;

        tracing::info!(
            order_id,
            item_id = %item.id,
            menu_item_id,
            qty,
            actor = %actor.actor_id,
            "Item added"
        );
        self.publish_order_changed(&order);
        Ok(item)
    }

    /// Change an item's quantity; legal only while still queued
    pub fn update_item_qty(
        &self,
        item_id: &str,
        qty: i32,
        actor: &ActorContext,
    ) -> FulfillmentResult<OrderItem> {
        if qty < 1 {
            return Err(FulfillmentError::InvalidQuantity(qty));
        }

        let txn = self.storage.begin_write()?;
        let mut item = self.storage.item_in_txn(&txn, item_id)?;
        if item.status != PrepStatus::Queued {
            return Err(FulfillmentError::ItemNotEditable {
                item_id: item_id.to_string(),
                status: item.status,
            });
        }
        let order = self.storage.order_in_txn(&txn, &item.order_id)?;
        if order.is_paid || order.status == OrderStatus::Cancelled {
            return Err(FulfillmentError::OrderClosed(order.id.clone()));
        }

        item.qty = qty;
        self.storage.put_item(&txn, &item)?;
        // If already submitted, the still-queued ticket follows the edit
        let refreshed = self.router.refresh_entry(&txn, &item)?;
        txn.commit()?;

        tracing::info!(
            item_id,
            qty,
            actor = %actor.actor_id,
            "Item quantity updated"
        );
        self.publish_order_changed(&order);
        if let Some(entry) = refreshed {
            self.publish_queue_changed(&entry);
        }
        Ok(item)
    }

    /// Hard-delete an item that never reached the kitchen
    ///
    /// Once a queue entry exists the ticket is referenced by boards, so
    /// the item can only be cancelled, not removed.
    pub fn remove_item(&self, item_id: &str, actor: &ActorContext) -> FulfillmentResult<()> {
        let txn = self.storage.begin_write()?;
        let item = self.storage.item_in_txn(&txn, item_id)?;
        if item.status != PrepStatus::Queued {
            return Err(FulfillmentError::ItemNotRemovable {
                item_id: item_id.to_string(),
                status: item.status,
            });
        }
        if self.storage.entry_id_for_item(&txn, item_id)?.is_some() {
            return Err(FulfillmentError::ItemNotRemovable {
                item_id: item_id.to_string(),
                status: item.status,
            });
        }
        let order = self.storage.order_in_txn(&txn, &item.order_id)?;

        self.storage.delete_item(&txn, &item)?;
        txn.commit()?;

        tracing::info!(item_id, actor = %actor.actor_id, "Item removed");
        self.publish_order_changed(&order);
        Ok(())
    }

    /// Soft-cancel an item with a reason, suppressing its queue entry
    ///
    /// The manager-edit path: unlike the kitchen-side cancel this is
    /// legal at any point before the dish is served.
    pub fn cancel_item(
        &self,
        item_id: &str,
        reason: Option<String>,
        actor: &ActorContext,
    ) -> FulfillmentResult<OrderItem> {
        let txn = self.storage.begin_write()?;
        let mut item = self.storage.item_in_txn(&txn, item_id)?;
        if item.status == PrepStatus::Cancelled {
            return Ok(item);
        }
        if item.status == PrepStatus::Served {
            return Err(FulfillmentError::ItemNotEditable {
                item_id: item_id.to_string(),
                status: item.status,
            });
        }
        let order = self.storage.order_in_txn(&txn, &item.order_id)?;

        item.status = PrepStatus::Cancelled;
        item.cancel_reason = reason.or_else(|| Some("cancelled by staff".to_string()));
        self.storage.put_item(&txn, &item)?;
        let suppressed = self.router.suppress_entry(&txn, item_id)?;
        txn.commit()?;

        tracing::info!(
            item_id,
            reason = item.cancel_reason.as_deref().unwrap_or(""),
            actor = %actor.actor_id,
            "Item cancelled"
        );
        self.publish_order_changed(&order);
        if let Some(entry) = suppressed {
            self.publish_queue_changed(&entry);
        }
        Ok(item)
    }

    // ========== Reads ==========

    pub fn get_order(&self, order_id: &str) -> FulfillmentResult<Order> {
        self.storage
            .get_order(order_id)?
            .ok_or_else(|| FulfillmentError::OrderNotFound(order_id.to_string()))
    }

    pub fn get_items(&self, order_id: &str) -> FulfillmentResult<Vec<OrderItem>> {
        Ok(self.storage.items_for_order(order_id)?)
    }

    /// The order total as currently billed (cancelled items excluded)
    pub fn order_total(&self, order_id: &str) -> FulfillmentResult<Decimal> {
        let items = self.get_items(order_id)?;
        Ok(crate::money::round_money(
            items
                .iter()
                .filter(|i| i.is_billable())
                .map(|i| i.line_total())
                .sum(),
        ))
    }

    // ========== Events ==========

    fn publish_order_changed(&self, order: &Order) {
        self.bus.publish(BusEvent::new(
            Topic::OrderChanged,
            EventPayload::OrderChanged {
                order_id: order.id.clone(),
                table_id: order.table_id.clone(),
                status: order.status,
            },
        ));
    }

    fn publish_queue_changed(&self, entry: &KitchenQueueEntry) {
        self.bus.publish(BusEvent::new(
            Topic::QueueChanged(entry.station),
            EventPayload::QueueChanged {
                entry_id: entry.id.clone(),
                order_item_id: entry.order_item_id.clone(),
                station: entry.station,
                status: entry.status,
            },
        ));
    }
}

impl std::fmt::Debug for OrderStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OrderStore").finish_non_exhaustive()
    }
}
