//! # ABR Client - State Client for the ABR Compose Server
//!
//! Keeps a validated local copy of the server-authoritative visualization
//! state, answers path queries against it, and refetches whatever the server
//! says has changed.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                          Session                                │
//! │                                                                 │
//! │   ┌──────────┐  {"target":..}  ┌──────────────┐  GET /api/...   │
//! │   │ Notifier │ ──────────────► │ StateManager │ ──────────────► │ ── HTTP ──► ABR server
//! │   │ (/ws/)   │                 │  + caches    │                 │
//! │   └──────────┘                 └──────┬───────┘                 │
//! │        ▲                              │ validate                │
//! │        │                       ┌──────▼───────┐                 │
//! │    WebSocket                   │  Validator   │                 │
//! │                                └──────────────┘                 │
//! │                                       │ StateReplaced           │
//! │                                ┌──────▼───────┐                 │
//! │                                │  Event Bus   │ ──► subscribers │
//! │                                └──────────────┘                 │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Invariants
//!
//! - No document enters the local cache unless it validates against the schema.
//! - A failed refresh leaves both the current and the previous snapshot untouched.
//! - Replacement is wholesale: the new state is never merged into the old one.
//!
//! ## Usage
//!
//! ```ignore
//! use abr_client::{ClientConfig, Session, StatePath};
//!
//! let session = Session::new(ClientConfig::default().with_env_overrides())?;
//! session.connect().await?;
//!
//! let path: StatePath = "/impressions".parse()?;
//! let impressions = session.state().get_path(&path);
//! session.state().update(&path.child("new-uuid"), serde_json::json!({})).await?;
//! ```

#![warn(clippy::all)]
#![deny(unsafe_code)]
// Allow in tests
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]
#![cfg_attr(test, allow(clippy::panic))]

pub mod adapters;
pub mod domain;
pub mod notifier;
pub mod ports;
pub mod session;
pub mod state;
pub mod validator;

#[cfg(test)]
mod testing;

pub use adapters::HttpTransport;
pub use domain::{
    ClientConfig, ClientError, ClientResult, Histogram, HistogramBin, HistogramRequest,
    PushTarget, ReconnectPolicy, RefreshOrdering, StatePath, Thumbnail,
};
pub use notifier::{Notifier, NotifierState};
pub use ports::{InvalidationHandler, StateTransport, TransportRequest, TransportResponse};
pub use session::Session;
pub use state::{RefreshOutcome, ServerLibrary, StateManager};
pub use validator::SchemaValidator;

// The bus types callers need to consume events.
pub use abr_bus::{ClientEvent, ConnectionStatus, EventFilter, EventTopic};
