//! Cached state, named caches and the server library.

pub mod library;
pub mod manager;
pub mod thumbnail;

pub use library::ServerLibrary;
pub use manager::{RefreshOutcome, StateManager};
pub use thumbnail::{png_data_url, ThumbnailPoller};
