//! # Shared Bus - Event Bus for Inter-Subsystem Communication
//!
//! Fire-and-forget choreography between the node's components: a component
//! publishes what happened, interested components subscribe by topic. This
//! is deliberately separate from the request/response IPC in
//! `shared-types::ipc`, which always goes through `AuthenticatedMessage<T>`.
//!
//! ```text
//! ┌──────────────┐                    ┌──────────────┐
//! │ Component A  │                    │ Component B  │
//! │              │    publish()       │              │
//! │              │ ──────┐            │              │
//! └──────────────┘       │            └──────────────┘
//!                        ▼                    ↑
//!                  ┌──────────────┐          │
//!                  │  Event Bus   │          │
//!                  │              │ ─────────┘
//!                  └──────────────┘  subscribe()
//! ```
//!
//! ## Security
//!
//! - **Time-Bounded Nonce Cache:** available for transports that need their
//!   own replay prevention independent of the IPC envelope's nonce cache.
//! - **Dead Letter Queue:** critical errors get their own topic so they can
//!   be routed to an operator-facing sink.

// Nursery lints that are too strict
#![allow(clippy::missing_const_for_fn)]
// Allow in tests
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]
#![cfg_attr(test, allow(clippy::panic))]

pub mod events;
pub mod nonce_cache;
pub mod publisher;
pub mod subscriber;

// Re-export main types
pub use events::{CoreEvent, EventFilter, EventTopic};
pub use nonce_cache::TimeBoundedNonceCache;
pub use publisher::{EventPublisher, InMemoryEventBus};
pub use subscriber::{EventStream, EventSubscriber, Subscription, SubscriptionError};

/// Current protocol version for event bus messages.
pub const PROTOCOL_VERSION: u16 = 1;

/// Maximum events to buffer per subscriber before backpressure.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 1000;

/// Dead Letter Queue topic for failed messages.
pub const DLQ_TOPIC: &str = "dlq.critical";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_protocol_version() {
        assert_eq!(PROTOCOL_VERSION, 1);
    }

    #[test]
    fn test_default_capacity() {
        assert_eq!(DEFAULT_CHANNEL_CAPACITY, 1000);
    }
}
