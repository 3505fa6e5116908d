//! Domain layer: configuration, errors, paths and the state tree helpers.

pub mod config;
pub mod error;
pub mod message;
pub mod path;
pub mod tree;
pub mod types;

pub use config::{ClientConfig, ReconnectPolicy, RefreshOrdering};
pub use error::{ClientError, ClientResult};
pub use message::{parse_push_message, PushTarget, CACHE_UPDATE_PREFIX, STATE_TARGET};
pub use path::StatePath;
pub use types::{Histogram, HistogramBin, HistogramRequest, SavedStates, StateEnvelope, Thumbnail};
