//! Actor identity threaded through mutating calls
//!
//! Role checks happen at the caller (the HTTP/session layer); the engine
//! is role-agnostic and trusts the context it is given. The context is
//! recorded in logs for audit.

use serde::{Deserialize, Serialize};

/// Staff role, as asserted by the caller's auth layer
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    Guest,
    Waiter,
    Kitchen,
    Cashier,
    Manager,
    System,
}

/// Authenticated actor context for audit logging
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActorContext {
    pub actor_id: String,
    /// Name snapshot for audit trails
    pub actor_name: String,
    pub role: Role,
}

impl ActorContext {
    pub fn new(actor_id: impl Into<String>, actor_name: impl Into<String>, role: Role) -> Self {
        Self {
            actor_id: actor_id.into(),
            actor_name: actor_name.into(),
            role,
        }
    }
}
