//! # Client Events
//!
//! Every notification the state client emits to local subscribers.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle of the push channel to the ABR server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConnectionStatus {
    /// Opening the socket (first attempt).
    Connecting,
    /// Handshake sent; invalidations are flowing.
    Ready,
    /// Channel dropped, waiting before the given retry attempt.
    Reconnecting { attempt: u32 },
    /// Terminal: shut down or out of retries.
    Closed,
}

impl fmt::Display for ConnectionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Connecting => write!(f, "connecting"),
            Self::Ready => write!(f, "ready"),
            Self::Reconnecting { attempt } => write!(f, "reconnecting (attempt {attempt})"),
            Self::Closed => write!(f, "closed"),
        }
    }
}

/// All events that can be published to the bus.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ClientEvent {
    /// A validated state document replaced the cached one.
    StateReplaced {
        /// Sequence number of the refresh that produced this state.
        sequence: u64,
    },

    /// A refresh was attempted but the cached state was kept.
    StateRefreshFailed {
        /// Sequence number of the failed refresh.
        sequence: u64,
        /// Human-readable reason (network, validation, ...).
        reason: String,
    },

    /// A named cache was refetched and stored.
    CacheRefreshed {
        /// Cache name, e.g. `visassets`.
        name: String,
    },

    /// A new preview thumbnail was detected.
    ThumbnailUpdated {
        /// Size of the PNG payload in bytes.
        bytes: usize,
    },

    /// The push channel changed state.
    Connection(ConnectionStatus),
}

impl ClientEvent {
    /// Get the topic for this event.
    #[must_use]
    pub fn topic(&self) -> EventTopic {
        match self {
            Self::StateReplaced { .. } | Self::StateRefreshFailed { .. } => EventTopic::State,
            Self::CacheRefreshed { .. } => EventTopic::Cache,
            Self::ThumbnailUpdated { .. } => EventTopic::Thumbnail,
            Self::Connection(_) => EventTopic::Connection,
        }
    }

    /// Cache name carried by the event, if any.
    #[must_use]
    pub fn cache_name(&self) -> Option<&str> {
        match self {
            Self::CacheRefreshed { name } => Some(name),
            _ => None,
        }
    }
}

/// Event topics for filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventTopic {
    /// Wildcard.
    All,
    /// State replacement and refresh failures.
    State,
    /// Named cache refreshes.
    Cache,
    /// Thumbnail updates.
    Thumbnail,
    /// Push channel status.
    Connection,
}

/// Filter for subscribing to specific events.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EventFilter {
    /// Topics to include. Empty means all topics.
    pub topics: Vec<EventTopic>,
    /// Cache names to include. Empty means every cache (and non-cache events).
    pub cache_names: Vec<String>,
}

impl EventFilter {
    /// Create a filter that accepts all events.
    #[must_use]
    pub fn all() -> Self {
        Self::default()
    }

    /// Create a filter for specific topics.
    #[must_use]
    pub fn topics(topics: Vec<EventTopic>) -> Self {
        Self {
            topics,
            cache_names: Vec::new(),
        }
    }

    /// Create a filter for refreshes of a single named cache.
    #[must_use]
    pub fn cache(name: impl Into<String>) -> Self {
        Self {
            topics: vec![EventTopic::Cache],
            cache_names: vec![name.into()],
        }
    }

    /// Check if an event matches this filter.
    #[must_use]
    pub fn matches(&self, event: &ClientEvent) -> bool {
        let topic_match = self.topics.is_empty()
            || self.topics.contains(&EventTopic::All)
            || self.topics.contains(&event.topic());

        let name_match = self.cache_names.is_empty()
            || event
                .cache_name()
                .is_some_and(|name| self.cache_names.iter().any(|n| n == name));

        topic_match && name_match
    }
}
