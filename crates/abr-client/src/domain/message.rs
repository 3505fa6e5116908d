//! Push channel message envelope.
//!
//! The server broadcasts `{"target": "state"}` after every accepted state
//! change and `{"target": "CacheUpdate-<name>"}` when a named cache moved.

use serde::{Deserialize, Serialize};

/// Target that requests a full state refresh.
pub const STATE_TARGET: &str = "state";

/// Prefix that marks a cache invalidation; the rest is the cache name.
pub const CACHE_UPDATE_PREFIX: &str = "CacheUpdate-";

/// What an inbound push message asks the client to refetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PushTarget {
    State,
    Cache(String),
}

impl PushTarget {
    /// Interpret a raw `target` value. Unknown targets yield `None`.
    pub fn from_target(target: &str) -> Option<Self> {
        if target == STATE_TARGET {
            return Some(Self::State);
        }
        match target.strip_prefix(CACHE_UPDATE_PREFIX) {
            Some(name) if !name.is_empty() => Some(Self::Cache(name.to_string())),
            _ => None,
        }
    }

    /// Wire form of the target.
    pub fn as_target(&self) -> String {
        match self {
            Self::State => STATE_TARGET.to_string(),
            Self::Cache(name) => format!("{CACHE_UPDATE_PREFIX}{name}"),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PushEnvelope {
    #[serde(default)]
    pub target: Option<String>,
}

impl From<&PushTarget> for PushEnvelope {
    fn from(target: &PushTarget) -> Self {
        Self {
            target: Some(target.as_target()),
        }
    }
}

/// Parse a text frame. Malformed JSON, a missing target and unknown
/// targets all yield `None`.
pub fn parse_push_message(text: &str) -> Option<PushTarget> {
    let envelope: PushEnvelope = serde_json::from_str(text).ok()?;
    PushTarget::from_target(envelope.target.as_deref()?)
}
