//! Notification bus
//!
//! Fire-and-forget pub/sub for connected displays. Events are a
//! convenience, never the source of truth: a failed or lagged delivery
//! does not roll anything back, and consumers resynchronize by re-reading
//! current state.

mod bus;

pub use bus::{BusConfig, NotificationBus, TopicSubscription};
