//! redb-based storage layer for orders, items and kitchen queue entries
//!
//! # Tables
//!
//! | Table | Key | Value | Purpose |
//! |-------|-----|-------|---------|
//! | `orders` | `order_id` | `Order` | Order records (soft history, never deleted) |
//! | `table_orders` | `(table_id, order_id)` | `()` | Per-table order index |
//! | `order_items` | `item_id` | `OrderItem` | Item records |
//! | `items_by_order` | `(order_id, item_id)` | `()` | Per-order item index |
//! | `queue_entries` | `entry_id` | `KitchenQueueEntry` | Kitchen queue entries |
//! | `entry_by_item` | `order_item_id` | `entry_id` | 1:1 routing idempotency index |
//! | `station_entries` | `(station, entry_id)` | `()` | Per-station board index |
//!
//! # Concurrency
//!
//! redb write transactions are single-writer: every mutation path (item
//! edit, queue transition, table settlement) reads current state and
//! writes the new state inside one transaction, which is what makes the
//! compare-and-swap discipline and settlement serialization sound without
//! any external lock. Reads run on independent snapshots and never block
//! writers.

use redb::{
    Database, ReadableDatabase, ReadableTable, TableDefinition, WriteTransaction,
};
use shared::order::{Order, OrderItem};
use shared::queue::{KitchenQueueEntry, Station};
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;

/// Table for orders: key = order_id, value = JSON-serialized Order
const ORDERS_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("orders");

/// Per-table order index: key = (table_id, order_id), value = empty
const TABLE_ORDERS_TABLE: TableDefinition<(&str, &str), ()> = TableDefinition::new("table_orders");

/// Table for order items: key = item_id, value = JSON-serialized OrderItem
const ORDER_ITEMS_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("order_items");

/// Per-order item index: key = (order_id, item_id), value = empty
const ITEMS_BY_ORDER_TABLE: TableDefinition<(&str, &str), ()> =
    TableDefinition::new("items_by_order");

/// Table for queue entries: key = entry_id, value = JSON-serialized KitchenQueueEntry
const QUEUE_ENTRIES_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("queue_entries");

/// Routing idempotency index: key = order_item_id, value = entry_id
const ENTRY_BY_ITEM_TABLE: TableDefinition<&str, &str> = TableDefinition::new("entry_by_item");

/// Per-station board index: key = (station, entry_id), value = empty
const STATION_ENTRIES_TABLE: TableDefinition<(&str, &str), ()> =
    TableDefinition::new("station_entries");

/// Upper bound sentinel for (prefix, id) range scans; ids are ASCII uuids
const KEY_MAX: &str = "\u{10FFFF}";

/// Storage errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(#[from] redb::DatabaseError),

    #[error("Transaction error: {0}")]
    Transaction(#[from] redb::TransactionError),

    #[error("Table error: {0}")]
    Table(#[from] redb::TableError),

    #[error("Storage error: {0}")]
    Storage(#[from] redb::StorageError),

    #[error("Commit error: {0}")]
    Commit(#[from] redb::CommitError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Order not found: {0}")]
    OrderNotFound(String),

    #[error("Item not found: {0}")]
    ItemNotFound(String),

    #[error("Queue entry not found: {0}")]
    EntryNotFound(String),
}

pub type StorageResult<T> = Result<T, StorageError>;

/// Fulfillment storage backed by redb
///
/// Commits are durable as soon as `commit()` returns; the database file is
/// always in a consistent state after power loss.
#[derive(Clone)]
pub struct FulfillmentStorage {
    db: Arc<Database>,
}

impl FulfillmentStorage {
    /// Open or create the database at the given path
    pub fn open(path: impl AsRef<Path>) -> StorageResult<Self> {
        let db = Database::create(path)?;
        let storage = Self { db: Arc::new(db) };
        storage.init_tables()?;
        Ok(storage)
    }

    /// Open an in-memory database (for testing)
    pub fn open_in_memory() -> StorageResult<Self> {
        let db = Database::builder().create_with_backend(redb::backends::InMemoryBackend::new())?;
        let storage = Self { db: Arc::new(db) };
        storage.init_tables()?;
        Ok(storage)
    }

    fn init_tables(&self) -> StorageResult<()> {
        let write_txn = self.db.begin_write()?;
        {
            let _ = write_txn.open_table(ORDERS_TABLE)?;
            let _ = write_txn.open_table(TABLE_ORDERS_TABLE)?;
            let _ = write_txn.open_table(ORDER_ITEMS_TABLE)?;
            let _ = write_txn.open_table(ITEMS_BY_ORDER_TABLE)?;
            let _ = write_txn.open_table(QUEUE_ENTRIES_TABLE)?;
            let _ = write_txn.open_table(ENTRY_BY_ITEM_TABLE)?;
            let _ = write_txn.open_table(STATION_ENTRIES_TABLE)?;
        }
        write_txn.commit()?;
        Ok(())
    }

    /// Begin a write transaction
    pub fn begin_write(&self) -> StorageResult<WriteTransaction> {
        Ok(self.db.begin_write()?)
    }

    // ========== Order Operations ==========

    /// Store an order and maintain the per-table index (within transaction)
    pub fn put_order(&self, txn: &WriteTransaction, order: &Order) -> StorageResult<()> {
        let bytes = serde_json::to_vec(order)?;
        let mut table = txn.open_table(ORDERS_TABLE)?;
        table.insert(order.id.as_str(), bytes.as_slice())?;
        drop(table);

        let mut index = txn.open_table(TABLE_ORDERS_TABLE)?;
        index.insert((order.table_id.as_str(), order.id.as_str()), ())?;
        Ok(())
    }

    /// Load an order within a write transaction (read-your-writes)
    pub fn order_in_txn(&self, txn: &WriteTransaction, order_id: &str) -> StorageResult<Order> {
        let table = txn.open_table(ORDERS_TABLE)?;
        let guard = table
            .get(order_id)?
            .ok_or_else(|| StorageError::OrderNotFound(order_id.to_string()))?;
        Ok(serde_json::from_slice(guard.value())?)
    }

    /// Load an order (read-only)
    pub fn get_order(&self, order_id: &str) -> StorageResult<Option<Order>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(ORDERS_TABLE)?;
        match table.get(order_id)? {
            Some(guard) => Ok(Some(serde_json::from_slice(guard.value())?)),
            None => Ok(None),
        }
    }

    /// All orders for a table, within a write transaction
    pub fn orders_for_table_in_txn(
        &self,
        txn: &WriteTransaction,
        table_id: &str,
    ) -> StorageResult<Vec<Order>> {
        let index = txn.open_table(TABLE_ORDERS_TABLE)?;
        let orders_table = txn.open_table(ORDERS_TABLE)?;
        let mut orders = Vec::new();
        for result in index.range((table_id, "")..=(table_id, KEY_MAX))? {
            let (key, _) = result?;
            let (_, order_id) = key.value();
            let guard = orders_table
                .get(order_id)?
                .ok_or_else(|| StorageError::OrderNotFound(order_id.to_string()))?;
            orders.push(serde_json::from_slice(guard.value())?);
        }
        Ok(orders)
    }

    /// All orders for a table (read-only)
    pub fn orders_for_table(&self, table_id: &str) -> StorageResult<Vec<Order>> {
        let read_txn = self.db.begin_read()?;
        let index = read_txn.open_table(TABLE_ORDERS_TABLE)?;
        let orders_table = read_txn.open_table(ORDERS_TABLE)?;
        let mut orders = Vec::new();
        for result in index.range((table_id, "")..=(table_id, KEY_MAX))? {
            let (key, _) = result?;
            let (_, order_id) = key.value();
            let guard = orders_table
                .get(order_id)?
                .ok_or_else(|| StorageError::OrderNotFound(order_id.to_string()))?;
            orders.push(serde_json::from_slice(guard.value())?);
        }
        Ok(orders)
    }

    /// The open, unpaid order for a table, if any (within transaction)
    ///
    /// This is the "active session" lookup that keeps one visit's bill on
    /// one order row instead of fragmenting it.
    pub fn find_open_unpaid_order(
        &self,
        txn: &WriteTransaction,
        table_id: &str,
    ) -> StorageResult<Option<Order>> {
        let orders = self.orders_for_table_in_txn(txn, table_id)?;
        Ok(orders.into_iter().find(|o| o.accepts_items()))
    }

    // ========== Order Item Operations ==========

    /// Store an item and maintain the per-order index (within transaction)
    pub fn put_item(&self, txn: &WriteTransaction, item: &OrderItem) -> StorageResult<()> {
        let bytes = serde_json::to_vec(item)?;
        let mut table = txn.open_table(ORDER_ITEMS_TABLE)?;
        table.insert(item.id.as_str(), bytes.as_slice())?;
        drop(table);

        let mut index = txn.open_table(ITEMS_BY_ORDER_TABLE)?;
        index.insert((item.order_id.as_str(), item.id.as_str()), ())?;
        Ok(())
    }

    /// Hard-delete an item and its index entry (within transaction)
    ///
    /// Only legal while the item is still queued; the store enforces that.
    pub fn delete_item(&self, txn: &WriteTransaction, item: &OrderItem) -> StorageResult<()> {
        let mut table = txn.open_table(ORDER_ITEMS_TABLE)?;
        table.remove(item.id.as_str())?;
        drop(table);

        let mut index = txn.open_table(ITEMS_BY_ORDER_TABLE)?;
        index.remove((item.order_id.as_str(), item.id.as_str()))?;
        Ok(())
    }

    /// Load an item within a write transaction
    pub fn item_in_txn(&self, txn: &WriteTransaction, item_id: &str) -> StorageResult<OrderItem> {
        let table = txn.open_table(ORDER_ITEMS_TABLE)?;
        let guard = table
            .get(item_id)?
            .ok_or_else(|| StorageError::ItemNotFound(item_id.to_string()))?;
        Ok(serde_json::from_slice(guard.value())?)
    }

    /// Load an item (read-only)
    pub fn get_item(&self, item_id: &str) -> StorageResult<Option<OrderItem>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(ORDER_ITEMS_TABLE)?;
        match table.get(item_id)? {
            Some(guard) => Ok(Some(serde_json::from_slice(guard.value())?)),
            None => Ok(None),
        }
    }

    /// All items of an order, within a write transaction
    pub fn items_for_order_in_txn(
        &self,
        txn: &WriteTransaction,
        order_id: &str,
    ) -> StorageResult<Vec<OrderItem>> {
        let index = txn.open_table(ITEMS_BY_ORDER_TABLE)?;
        let items_table = txn.open_table(ORDER_ITEMS_TABLE)?;
        let mut items = Vec::new();
        for result in index.range((order_id, "")..=(order_id, KEY_MAX))? {
            let (key, _) = result?;
            let (_, item_id) = key.value();
            let guard = items_table
                .get(item_id)?
                .ok_or_else(|| StorageError::ItemNotFound(item_id.to_string()))?;
            items.push(serde_json::from_slice(guard.value())?);
        }
        Ok(items)
    }

    /// All items of an order (read-only)
    pub fn items_for_order(&self, order_id: &str) -> StorageResult<Vec<OrderItem>> {
        let read_txn = self.db.begin_read()?;
        let index = read_txn.open_table(ITEMS_BY_ORDER_TABLE)?;
        let items_table = read_txn.open_table(ORDER_ITEMS_TABLE)?;
        let mut items = Vec::new();
        for result in index.range((order_id, "")..=(order_id, KEY_MAX))? {
            let (key, _) = result?;
            let (_, item_id) = key.value();
            let guard = items_table
                .get(item_id)?
                .ok_or_else(|| StorageError::ItemNotFound(item_id.to_string()))?;
            items.push(serde_json::from_slice(guard.value())?);
        }
        Ok(items)
    }

    /// All orders of a table with their items, in one read snapshot
    ///
    /// Billing reads go through this so the bill is computed from a single
    /// consistent view rather than stitched across transactions.
    pub fn orders_with_items_for_table(
        &self,
        table_id: &str,
    ) -> StorageResult<Vec<(Order, Vec<OrderItem>)>> {
        let read_txn = self.db.begin_read()?;
        let table_index = read_txn.open_table(TABLE_ORDERS_TABLE)?;
        let orders_table = read_txn.open_table(ORDERS_TABLE)?;
        let item_index = read_txn.open_table(ITEMS_BY_ORDER_TABLE)?;
        let items_table = read_txn.open_table(ORDER_ITEMS_TABLE)?;

        let mut result = Vec::new();
        for entry in table_index.range((table_id, "")..=(table_id, KEY_MAX))? {
            let (key, _) = entry?;
            let (_, order_id) = key.value();
            let guard = orders_table
                .get(order_id)?
                .ok_or_else(|| StorageError::OrderNotFound(order_id.to_string()))?;
            let order: Order = serde_json::from_slice(guard.value())?;

            let mut items = Vec::new();
            for item_entry in item_index.range((order_id, "")..=(order_id, KEY_MAX))? {
                let (item_key, _) = item_entry?;
                let (_, item_id) = item_key.value();
                let item_guard = items_table
                    .get(item_id)?
                    .ok_or_else(|| StorageError::ItemNotFound(item_id.to_string()))?;
                items.push(serde_json::from_slice(item_guard.value())?);
            }
            result.push((order, items));
        }
        Ok(result)
    }

    // ========== Queue Entry Operations ==========

    /// Store a queue entry and maintain both indexes (within transaction)
    pub fn put_entry(
        &self,
        txn: &WriteTransaction,
        entry: &KitchenQueueEntry,
    ) -> StorageResult<()> {
        let bytes = serde_json::to_vec(entry)?;
        let mut table = txn.open_table(QUEUE_ENTRIES_TABLE)?;
        table.insert(entry.id.as_str(), bytes.as_slice())?;
        drop(table);

        let mut by_item = txn.open_table(ENTRY_BY_ITEM_TABLE)?;
        by_item.insert(entry.order_item_id.as_str(), entry.id.as_str())?;
        drop(by_item);

        let mut by_station = txn.open_table(STATION_ENTRIES_TABLE)?;
        by_station.insert((entry.station.as_str(), entry.id.as_str()), ())?;
        Ok(())
    }

    /// Load a queue entry within a write transaction
    pub fn entry_in_txn(
        &self,
        txn: &WriteTransaction,
        entry_id: &str,
    ) -> StorageResult<KitchenQueueEntry> {
        let table = txn.open_table(QUEUE_ENTRIES_TABLE)?;
        let guard = table
            .get(entry_id)?
            .ok_or_else(|| StorageError::EntryNotFound(entry_id.to_string()))?;
        Ok(serde_json::from_slice(guard.value())?)
    }

    /// Load a queue entry (read-only)
    pub fn get_entry(&self, entry_id: &str) -> StorageResult<Option<KitchenQueueEntry>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(QUEUE_ENTRIES_TABLE)?;
        match table.get(entry_id)? {
            Some(guard) => Ok(Some(serde_json::from_slice(guard.value())?)),
            None => Ok(None),
        }
    }

    /// The queue entry id routed for an item, if any (within transaction)
    pub fn entry_id_for_item(
        &self,
        txn: &WriteTransaction,
        order_item_id: &str,
    ) -> StorageResult<Option<String>> {
        let table = txn.open_table(ENTRY_BY_ITEM_TABLE)?;
        Ok(table.get(order_item_id)?.map(|g| g.value().to_string()))
    }

    /// The queue entry routed for an item, if any (read-only)
    pub fn entry_for_item(&self, order_item_id: &str) -> StorageResult<Option<KitchenQueueEntry>> {
        let read_txn = self.db.begin_read()?;
        let by_item = read_txn.open_table(ENTRY_BY_ITEM_TABLE)?;
        let Some(entry_id) = by_item.get(order_item_id)?.map(|g| g.value().to_string()) else {
            return Ok(None);
        };
        let table = read_txn.open_table(QUEUE_ENTRIES_TABLE)?;
        match table.get(entry_id.as_str())? {
            Some(guard) => Ok(Some(serde_json::from_slice(guard.value())?)),
            None => Ok(None),
        }
    }

    /// All entries owned by a station (read-only)
    pub fn entries_for_station(&self, station: Station) -> StorageResult<Vec<KitchenQueueEntry>> {
        let read_txn = self.db.begin_read()?;
        let index = read_txn.open_table(STATION_ENTRIES_TABLE)?;
        let entries_table = read_txn.open_table(QUEUE_ENTRIES_TABLE)?;
        let mut entries = Vec::new();
        let key = station.as_str();
        for result in index.range((key, "")..=(key, KEY_MAX))? {
            let (k, _) = result?;
            let (_, entry_id) = k.value();
            let guard = entries_table
                .get(entry_id)?
                .ok_or_else(|| StorageError::EntryNotFound(entry_id.to_string()))?;
            entries.push(serde_json::from_slice(guard.value())?);
        }
        Ok(entries)
    }

    /// All entries across stations (serving board source)
    pub fn all_entries(&self) -> StorageResult<Vec<KitchenQueueEntry>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(QUEUE_ENTRIES_TABLE)?;
        let mut entries = Vec::new();
        for result in table.iter()? {
            let (_, guard) = result?;
            entries.push(serde_json::from_slice(guard.value())?);
        }
        Ok(entries)
    }
}

impl std::fmt::Debug for FulfillmentStorage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FulfillmentStorage").finish_non_exhaustive()
    }
}
