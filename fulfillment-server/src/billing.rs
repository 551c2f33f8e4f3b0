//! Billing aggregator
//!
//! A table's bill is derived on demand from its unpaid orders; nothing is
//! accumulated incrementally, so the bill can never drift out of sync with
//! the items. Settlement flips every unpaid order in one write
//! transaction, which is what makes it atomic with respect to concurrent
//! cart edits.

use chrono::Utc;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use shared::auth::ActorContext;
use shared::message::{BusEvent, EventPayload, Topic};
use shared::order::{Order, OrderItem};
use std::sync::Arc;

use crate::common::FulfillmentResult;
use crate::message::NotificationBus;
use crate::money::round_money;
use crate::storage::FulfillmentStorage;
use crate::tables::TableDirectory;

/// One item line on a bill
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BillLine {
    pub item_id: String,
    pub name: String,
    pub qty: i32,
    pub unit_price: Decimal,
    pub line_total: Decimal,
}

/// One unpaid order on a bill
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BillOrder {
    pub order_id: String,
    pub created_at: i64,
    pub lines: Vec<BillLine>,
    pub order_total: Decimal,
}

/// The table's aggregated unpaid bill
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UnpaidBill {
    pub table_id: String,
    pub orders: Vec<BillOrder>,
    pub total_amount: Decimal,
}

/// Outcome of a settlement
///
/// A second settlement of the same table succeeds with an empty order
/// list and a zero amount; paying an already-paid table is not an error.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SettlementResult {
    pub table_id: String,
    pub settled_order_ids: Vec<String>,
    pub settled_amount: Decimal,
    pub settled_at: i64,
}

/// Aggregates and settles table bills
#[derive(Clone)]
pub struct BillingAggregator {
    storage: FulfillmentStorage,
    tables: Arc<dyn TableDirectory>,
    bus: NotificationBus,
}

impl BillingAggregator {
    pub fn new(
        storage: FulfillmentStorage,
        tables: Arc<dyn TableDirectory>,
        bus: NotificationBus,
    ) -> Self {
        Self {
            storage,
            tables,
            bus,
        }
    }

    fn bill_order(order: &Order, items: &[OrderItem]) -> BillOrder {
        let lines: Vec<BillLine> = items
            .iter()
            .filter(|i| i.is_billable())
            .map(|i| BillLine {
                item_id: i.id.clone(),
                name: i.name_snapshot.clone(),
                qty: i.qty,
                unit_price: i.price_snapshot,
                line_total: round_money(i.line_total()),
            })
            .collect();
        let order_total = round_money(lines.iter().map(|l| l.line_total).sum());
        BillOrder {
            order_id: order.id.clone(),
            created_at: order.created_at,
            lines,
            order_total,
        }
    }

    /// Current unpaid bill for a table, from one read snapshot
    ///
    /// Pure read: safe to call at any time, including mid-meal.
    pub fn unpaid_total(&self, table_id: &str) -> FulfillmentResult<UnpaidBill> {
        let mut orders: Vec<BillOrder> = self
            .storage
            .orders_with_items_for_table(table_id)?
            .iter()
            .filter(|(order, _)| order.is_billable())
            .map(|(order, items)| Self::bill_order(order, items))
            .collect();
        orders.sort_by_key(|o| o.created_at);
        let total_amount = round_money(orders.iter().map(|o| o.order_total).sum());
        Ok(UnpaidBill {
            table_id: table_id.to_string(),
            orders,
            total_amount,
        })
    }

    /// Settle every unpaid order of the table in one transaction
    ///
    /// Orders created after this write commits belong to the next bill;
    /// there is no window in which an order is half-settled.
    pub fn settle_table(
        &self,
        table_id: &str,
        actor: &ActorContext,
    ) -> FulfillmentResult<SettlementResult> {
        let now = Utc::now().timestamp_millis();
        let txn = self.storage.begin_write()?;

        let mut settled_order_ids = Vec::new();
        let mut settled_amount = Decimal::ZERO;
        for mut order in self.storage.orders_for_table_in_txn(&txn, table_id)? {
            if !order.is_billable() {
                continue;
            }
            let items = self.storage.items_for_order_in_txn(&txn, &order.id)?;
            settled_amount += items
                .iter()
                .filter(|i| i.is_billable())
                .map(|i| i.line_total())
                .sum::<Decimal>();
            order.is_paid = true;
            order.paid_at = Some(now);
            self.storage.put_order(&txn, &order)?;
            settled_order_ids.push(order.id);
        }
        txn.commit()?;
        let settled_amount = round_money(settled_amount);

        if settled_order_ids.is_empty() {
            tracing::debug!(table_id, "Nothing to settle");
            return Ok(SettlementResult {
                table_id: table_id.to_string(),
                settled_order_ids,
                settled_amount: Decimal::ZERO,
                settled_at: now,
            });
        }

        tracing::info!(
            table_id,
            orders = settled_order_ids.len(),
            amount = %settled_amount,
            actor = %actor.actor_id,
            "Table settled"
        );

        self.bus.publish(BusEvent::new(
            Topic::TableSettled,
            EventPayload::TableSettled {
                table_id: table_id.to_string(),
                order_ids: settled_order_ids.clone(),
                settled_amount,
            },
        ));

        // Occupancy hint only; the settlement stands even if this fails
        if let Err(e) = self.tables.mark_available(table_id) {
            tracing::warn!(table_id, error = %e, "Failed to mark table available");
        }

        Ok(SettlementResult {
            table_id: table_id.to_string(),
            settled_order_ids,
            settled_amount,
            settled_at: now,
        })
    }
}

impl std::fmt::Debug for BillingAggregator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BillingAggregator").finish_non_exhaustive()
    }
}
