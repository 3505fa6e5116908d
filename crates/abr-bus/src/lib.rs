//! # ABR Bus - Local Event Fan-out
//!
//! Carries change notifications from the state client to anything in the
//! process that renders or reacts to the ABR state.
//!
//! ```text
//! ┌──────────────┐                    ┌──────────────┐
//! │ StateManager │                    │  UI / CLI    │
//! │  Notifier    │    publish()       │  consumers   │
//! │              │ ──────┐            │              │
//! └──────────────┘       │            └──────────────┘
//!                        ▼                    ↑
//!                  ┌──────────────┐          │
//!                  │  Event Bus   │          │
//!                  │              │ ─────────┘
//!                  └──────────────┘  subscribe(filter)
//! ```
//!
//! Subscribers pick what they care about with an [`EventFilter`]: every
//! event, only state replacements, or only refreshes of particular caches.

// Nursery lints that are too strict
#![allow(clippy::missing_const_for_fn)]
// Allow in tests
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]
#![cfg_attr(test, allow(clippy::panic))]

pub mod events;
pub mod publisher;
pub mod subscriber;

// Re-export main types
pub use events::{ClientEvent, ConnectionStatus, EventFilter, EventTopic};
pub use publisher::{EventPublisher, InMemoryEventBus};
pub use subscriber::{EventStream, Subscription, SubscriptionError};

/// Maximum events to buffer per subscriber before older ones are dropped.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 256;
