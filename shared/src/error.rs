//! Wire-level error codes and the error taxonomy
//!
//! Three families:
//! - validation errors: the request itself is malformed, no retry helps
//! - state-conflict errors: the caller's view of state is stale; the
//!   correct recovery is a re-read, surfaced to the UI as "refresh and
//!   retry" rather than a generic failure
//! - collaborator/system errors

use serde::{Deserialize, Serialize};
use std::fmt;

/// Error code carried to clients
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    // Validation
    InvalidQuantity,
    EmptyOrder,
    UnknownMenuItem,

    // State conflicts
    InvalidTransition,
    StaleState,
    OrderClosed,
    ItemNotEditable,
    ItemNotRemovable,

    // Not found
    OrderNotFound,
    ItemNotFound,
    EntryNotFound,

    // System
    StorageError,
    Internal,
}

/// Error family, driving client recovery behavior
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Caller-correctable; the request is malformed
    Validation,
    /// The caller's view is stale; re-read current state, never blind-retry
    StateConflict,
    /// The referenced entity does not exist
    NotFound,
    /// Storage or collaborator failure
    System,
}

impl ErrorCode {
    pub fn category(&self) -> ErrorCategory {
        match self {
            ErrorCode::InvalidQuantity | ErrorCode::EmptyOrder | ErrorCode::UnknownMenuItem => {
                ErrorCategory::Validation
            }
            ErrorCode::InvalidTransition
            | ErrorCode::StaleState
            | ErrorCode::OrderClosed
            | ErrorCode::ItemNotEditable
            | ErrorCode::ItemNotRemovable => ErrorCategory::StateConflict,
            ErrorCode::OrderNotFound | ErrorCode::ItemNotFound | ErrorCode::EntryNotFound => {
                ErrorCategory::NotFound
            }
            ErrorCode::StorageError | ErrorCode::Internal => ErrorCategory::System,
        }
    }

    /// Whether the client should re-fetch state and let the human decide
    pub fn is_refresh_and_retry(&self) -> bool {
        self.category() == ErrorCategory::StateConflict
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ErrorCode::InvalidQuantity => "INVALID_QUANTITY",
            ErrorCode::EmptyOrder => "EMPTY_ORDER",
            ErrorCode::UnknownMenuItem => "UNKNOWN_MENU_ITEM",
            ErrorCode::InvalidTransition => "INVALID_TRANSITION",
            ErrorCode::StaleState => "STALE_STATE",
            ErrorCode::OrderClosed => "ORDER_CLOSED",
            ErrorCode::ItemNotEditable => "ITEM_NOT_EDITABLE",
            ErrorCode::ItemNotRemovable => "ITEM_NOT_REMOVABLE",
            ErrorCode::OrderNotFound => "ORDER_NOT_FOUND",
            ErrorCode::ItemNotFound => "ITEM_NOT_FOUND",
            ErrorCode::EntryNotFound => "ENTRY_NOT_FOUND",
            ErrorCode::StorageError => "STORAGE_ERROR",
            ErrorCode::Internal => "INTERNAL",
        };
        f.write_str(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn state_conflicts_are_refresh_and_retry() {
        assert!(ErrorCode::StaleState.is_refresh_and_retry());
        assert!(ErrorCode::InvalidTransition.is_refresh_and_retry());
        assert!(ErrorCode::ItemNotEditable.is_refresh_and_retry());
        assert!(!ErrorCode::InvalidQuantity.is_refresh_and_retry());
        assert!(!ErrorCode::OrderNotFound.is_refresh_and_retry());
    }
}
