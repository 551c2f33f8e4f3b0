//! Table directory collaborator
//!
//! The billing aggregator marks a table available after settlement as a
//! best-effort hint; occupancy is a UX convenience, not a correctness
//! flag, so failures are logged and never propagated.

use dashmap::DashMap;
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TableDirectoryError {
    #[error("Table directory unavailable: {0}")]
    Unavailable(String),
}

/// Occupancy hints for the table map
pub trait TableDirectory: Send + Sync {
    fn mark_available(&self, table_id: &str) -> Result<(), TableDirectoryError>;
    fn mark_occupied(&self, table_id: &str) -> Result<(), TableDirectoryError>;
}

/// In-memory directory backed by a concurrent map
#[derive(Debug, Default)]
pub struct InMemoryTableDirectory {
    // table_id -> is_available
    availability: DashMap<String, bool>,
}

impl InMemoryTableDirectory {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Unknown tables default to available
    pub fn is_available(&self, table_id: &str) -> bool {
        self.availability.get(table_id).map(|v| *v).unwrap_or(true)
    }
}

impl TableDirectory for InMemoryTableDirectory {
    fn mark_available(&self, table_id: &str) -> Result<(), TableDirectoryError> {
        self.availability.insert(table_id.to_string(), true);
        Ok(())
    }

    fn mark_occupied(&self, table_id: &str) -> Result<(), TableDirectoryError> {
        self.availability.insert(table_id.to_string(), false);
        Ok(())
    }
}
