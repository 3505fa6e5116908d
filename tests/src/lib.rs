//! # ABR Client Test Suite
//!
//! End-to-end flows of `abr-client` against an in-process compose server.
//!
//! ## Structure
//!
//! ```text
//! tests/src/
//! ├── fixtures.rs         # Fake compose server (axum): REST routes + /ws/ push
//! └── integration/
//!     ├── session_flows.rs   # connect, edits, validation, undo/redo
//!     ├── push_channel.rs    # invalidation routing, reconnects, thumbnails
//!     └── library_routes.rs  # saved states, histogram, schema
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test -p abr-tests
//! ```

pub mod integration;
