//! Engine-wide error type
//!
//! One enum carries the whole taxonomy. Validation errors mean the request
//! itself is malformed; state-conflict errors mean the caller's view of
//! state is stale and the correct recovery is a re-read (never a blind
//! retry, which could replay a stale intent); storage errors wrap the
//! persistence layer.

use shared::error::{ErrorCategory, ErrorCode};
use shared::queue::{PrepStatus, QueueTransition};
use thiserror::Error;

use crate::storage::StorageError;

/// Engine errors
#[derive(Debug, Error)]
pub enum FulfillmentError {
    // ========== Validation ==========
    #[error("Invalid quantity: {0} (must be >= 1)")]
    InvalidQuantity(i32),

    #[error("Order has no items: {0}")]
    EmptyOrder(String),

    #[error("Unknown menu item: {0}")]
    UnknownMenuItem(String),

    // ========== State Conflicts ==========
    #[error("Invalid transition: {action} not allowed from {from} (entry {entry_id})")]
    InvalidTransition {
        entry_id: String,
        from: PrepStatus,
        action: QueueTransition,
    },

    #[error("Stale state: expected {expected}, found {actual} (entry {entry_id})")]
    StaleState {
        entry_id: String,
        expected: PrepStatus,
        actual: PrepStatus,
    },

    #[error("Order is not open: {0}")]
    OrderClosed(String),

    #[error("Item {item_id} is not editable while {status}")]
    ItemNotEditable { item_id: String, status: PrepStatus },

    #[error("Item {item_id} is not removable while {status}")]
    ItemNotRemovable { item_id: String, status: PrepStatus },

    // ========== Not Found ==========
    #[error("Order not found: {0}")]
    OrderNotFound(String),

    #[error("Item not found: {0}")]
    ItemNotFound(String),

    #[error("Queue entry not found: {0}")]
    EntryNotFound(String),

    // ========== System ==========
    #[error("Storage error: {0}")]
    Storage(StorageError),
}

pub type FulfillmentResult<T> = Result<T, FulfillmentError>;

impl FulfillmentError {
    /// Wire error code for clients
    pub fn code(&self) -> ErrorCode {
        match self {
            FulfillmentError::InvalidQuantity(_) => ErrorCode::InvalidQuantity,
            FulfillmentError::EmptyOrder(_) => ErrorCode::EmptyOrder,
            FulfillmentError::UnknownMenuItem(_) => ErrorCode::UnknownMenuItem,
            FulfillmentError::InvalidTransition { .. } => ErrorCode::InvalidTransition,
            FulfillmentError::StaleState { .. } => ErrorCode::StaleState,
            FulfillmentError::OrderClosed(_) => ErrorCode::OrderClosed,
            FulfillmentError::ItemNotEditable { .. } => ErrorCode::ItemNotEditable,
            FulfillmentError::ItemNotRemovable { .. } => ErrorCode::ItemNotRemovable,
            FulfillmentError::OrderNotFound(_) => ErrorCode::OrderNotFound,
            FulfillmentError::ItemNotFound(_) => ErrorCode::ItemNotFound,
            FulfillmentError::EntryNotFound(_) => ErrorCode::EntryNotFound,
            FulfillmentError::Storage(_) => ErrorCode::StorageError,
        }
    }

    /// Error family, see `shared::error`
    pub fn category(&self) -> ErrorCategory {
        self.code().category()
    }
}

impl From<StorageError> for FulfillmentError {
    fn from(err: StorageError) -> Self {
        // Not-found lookups surface as domain errors, everything else is a
        // storage failure
        match err {
            StorageError::OrderNotFound(id) => FulfillmentError::OrderNotFound(id),
            StorageError::ItemNotFound(id) => FulfillmentError::ItemNotFound(id),
            StorageError::EntryNotFound(id) => FulfillmentError::EntryNotFound(id),
            other => {
                tracing::error!(error = %other, "Storage error occurred");
                FulfillmentError::Storage(other)
            }
        }
    }
}

impl From<redb::CommitError> for FulfillmentError {
    fn from(err: redb::CommitError) -> Self {
        StorageError::from(err).into()
    }
}
