//! Shared types for the fulfillment engine
//!
//! Domain entities, status machines, bus event types and error codes used
//! by both the engine and its clients (kitchen boards, billing screens).

pub mod auth;
pub mod catalog;
pub mod error;
pub mod message;
pub mod order;
pub mod queue;

// Re-exports
pub use serde::{Deserialize, Serialize};

// Convenient access to the most-used types
pub use auth::{ActorContext, Role};
pub use error::{ErrorCategory, ErrorCode};
pub use message::{BusEvent, EventPayload, Topic};
pub use order::{Order, OrderItem, OrderStatus};
pub use queue::{KitchenQueueEntry, PrepStatus, QueueTransition, Station};
