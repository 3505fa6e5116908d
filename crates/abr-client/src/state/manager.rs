//! Client-side copy of the server's state.
//!
//! The server is authoritative. Every mutation is a request; the local copy
//! only changes when a refresh brings back a document that passes schema
//! validation.

use abr_bus::{ClientEvent, EventPublisher};
use async_trait::async_trait;
use dashmap::DashMap;
use parking_lot::RwLock;
use serde_json::Value;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

use crate::domain::config::RefreshOrdering;
use crate::domain::error::ClientResult;
use crate::domain::path::StatePath;
use crate::domain::tree::{self, Walk};
use crate::domain::types::{StateEnvelope, Thumbnail};
use crate::ports::inbound::InvalidationHandler;
use crate::ports::outbound::{HttpMethod, StateTransport, TransportRequest, TransportResponse};
use crate::state::thumbnail::ThumbnailPoller;
use crate::validator::SchemaValidator;

/// Result of a successful `refresh_state`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// The fetched document replaced the cached state.
    Applied { sequence: u64 },
    /// A newer refresh had already been applied; this one was dropped.
    Stale { sequence: u64, applied: u64 },
}

impl RefreshOutcome {
    pub fn is_applied(&self) -> bool {
        matches!(self, Self::Applied { .. })
    }
}

struct StateSnapshot {
    current: Arc<Value>,
    previous: Arc<Value>,
    applied_sequence: u64,
}

impl Default for StateSnapshot {
    fn default() -> Self {
        let empty = Arc::new(Value::Object(Default::default()));
        Self {
            current: empty.clone(),
            previous: empty,
            applied_sequence: 0,
        }
    }
}

/// Cached state, named caches and the mutation helpers.
pub struct StateManager {
    transport: Arc<dyn StateTransport>,
    validator: Arc<SchemaValidator>,
    bus: Arc<dyn EventPublisher>,
    thumbnails: Arc<ThumbnailPoller>,
    ordering: RefreshOrdering,
    snapshot: RwLock<StateSnapshot>,
    caches: DashMap<String, Value>,
    next_sequence: AtomicU64,
}

impl StateManager {
    pub fn new(
        transport: Arc<dyn StateTransport>,
        validator: Arc<SchemaValidator>,
        bus: Arc<dyn EventPublisher>,
        thumbnails: Arc<ThumbnailPoller>,
        ordering: RefreshOrdering,
    ) -> Self {
        Self {
            transport,
            validator,
            bus,
            thumbnails,
            ordering,
            snapshot: RwLock::new(StateSnapshot::default()),
            caches: DashMap::new(),
            next_sequence: AtomicU64::new(0),
        }
    }

    // =========================================================================
    // Refresh
    // =========================================================================

    /// Fetch, validate and install the server's state.
    ///
    /// On any failure the cached state is left as it was and the error is
    /// returned (and published as `StateRefreshFailed`).
    #[instrument(skip(self))]
    pub async fn refresh_state(&self) -> ClientResult<RefreshOutcome> {
        let sequence = self.next_sequence.fetch_add(1, Ordering::SeqCst) + 1;

        match self.fetch_validated_state().await {
            Ok(state) => Ok(self.install(sequence, state)),
            Err(e) => {
                warn!(sequence, error = %e, "State refresh failed, keeping cached state");
                self.bus.publish(ClientEvent::StateRefreshFailed {
                    sequence,
                    reason: e.to_string(),
                });
                Err(e)
            }
        }
    }

    async fn fetch_validated_state(&self) -> ClientResult<Value> {
        let request = TransportRequest::get(["api", "state"]);
        let route = request.route();
        let envelope: StateEnvelope = self
            .transport
            .send(request)
            .await?
            .error_for_status(&route)?
            .json()?;
        self.validator.validate(envelope.state).await
    }

    fn install(&self, sequence: u64, state: Value) -> RefreshOutcome {
        let mut snapshot = self.snapshot.write();
        if self.ordering == RefreshOrdering::Sequenced && sequence < snapshot.applied_sequence {
            let applied = snapshot.applied_sequence;
            debug!(sequence, applied, "Discarding stale state response");
            return RefreshOutcome::Stale { sequence, applied };
        }

        let current = std::mem::replace(&mut snapshot.current, Arc::new(state));
        snapshot.previous = current;
        snapshot.applied_sequence = sequence;
        let changed = tree::changed_keys(&snapshot.previous, &snapshot.current);
        drop(snapshot);

        info!(sequence, changed = ?changed, "State replaced");
        self.bus.publish(ClientEvent::StateReplaced { sequence });
        self.thumbnails.start();

        RefreshOutcome::Applied { sequence }
    }

    // =========================================================================
    // Mutations (server-side; the cache updates on the following push)
    // =========================================================================

    /// Replace the whole server state.
    pub async fn update_state(&self, state: Value) -> ClientResult<()> {
        let request = TransportRequest::new(HttpMethod::Put, ["api", "state"]).with_body(state);
        self.send_checked(request).await.map(drop)
    }

    /// Set the value at `path` on the server.
    #[instrument(skip(self, value), fields(path = %path))]
    pub async fn update(&self, path: &StatePath, value: Value) -> ClientResult<()> {
        let request =
            TransportRequest::for_path(HttpMethod::Put, &["api", "state"], path).with_body(value);
        self.send_checked(request).await.map(drop)
    }

    /// Remove every occurrence of `value` from the server state.
    pub async fn remove_all(&self, value: &str) -> ClientResult<()> {
        self.send_unchecked(TransportRequest::new(
            HttpMethod::Delete,
            ["api", "remove", value],
        ))
        .await
    }

    /// Remove the subtree at `path`.
    pub async fn remove_path(&self, path: &StatePath) -> ClientResult<()> {
        self.send_unchecked(TransportRequest::for_path(
            HttpMethod::Delete,
            &["api", "remove-path"],
            path,
        ))
        .await
    }

    /// Remove a VisAsset from the server's local library.
    pub async fn remove_visasset(&self, uuid: &str) -> ClientResult<()> {
        self.send_unchecked(TransportRequest::new(
            HttpMethod::Delete,
            ["api", "remove-visasset", uuid],
        ))
        .await
    }

    /// Step the server's history back one change.
    pub async fn undo(&self) -> ClientResult<()> {
        self.send_checked(TransportRequest::new(HttpMethod::Post, ["api", "undo"]))
            .await
            .map(drop)
    }

    /// Step the server's history forward one change.
    pub async fn redo(&self) -> ClientResult<()> {
        self.send_checked(TransportRequest::new(HttpMethod::Post, ["api", "redo"]))
            .await
            .map(drop)
    }

    async fn send_checked(&self, request: TransportRequest) -> ClientResult<TransportResponse> {
        let route = request.route();
        self.transport.send(request).await?.error_for_status(&route)
    }

    // Removes are fire-and-forget on the server side; a refusal is only logged.
    async fn send_unchecked(&self, request: TransportRequest) -> ClientResult<()> {
        let route = request.route();
        let response = self.transport.send(request).await?;
        if !response.is_success() {
            warn!(%route, status = response.status, body = %response.text(), "Remove request refused");
        }
        Ok(())
    }

    // =========================================================================
    // Queries against the cached state
    // =========================================================================

    /// Current state. Cheap: the snapshot is shared, not copied.
    pub fn state(&self) -> Arc<Value> {
        Arc::clone(&self.snapshot.read().current)
    }

    /// State before the last applied refresh.
    pub fn previous_state(&self) -> Arc<Value> {
        Arc::clone(&self.snapshot.read().previous)
    }

    /// Sequence number of the refresh that produced the current state (0 = none).
    pub fn applied_sequence(&self) -> u64 {
        self.snapshot.read().applied_sequence
    }

    /// Top-level keys that changed with the last applied refresh.
    pub fn diff_keys(&self) -> Vec<String> {
        let snapshot = self.snapshot.read();
        tree::changed_keys(&snapshot.previous, &snapshot.current)
    }

    /// Value at `path`, or `None` if any segment is missing.
    pub fn get_path(&self, path: &StatePath) -> Option<Value> {
        tree::get(&self.state(), path).cloned()
    }

    pub fn key_exists<S: AsRef<str>>(&self, segments: &[S]) -> bool {
        tree::key_exists(&self.state(), segments)
    }

    pub fn length<S: AsRef<str>>(&self, segments: &[S]) -> Option<usize> {
        tree::length(&self.state(), segments)
    }

    /// Nodes under `start` matching `predicate`, in walk order.
    pub fn find_all<P>(&self, predicate: P, start: &StatePath) -> Vec<Value>
    where
        P: Fn(&Value) -> bool,
    {
        let state = self.state();
        tree::find_all(&state, start, predicate)
            .into_iter()
            .cloned()
            .collect()
    }

    /// Absolute paths of the nodes under `start` matching `predicate`.
    pub fn find_path<P>(&self, predicate: P, start: &StatePath) -> Vec<StatePath>
    where
        P: Fn(&Value) -> bool,
    {
        tree::find_paths(&self.state(), start, predicate)
    }

    /// Run `f` over a lazy walk of the current snapshot.
    pub fn walk<R>(&self, start: &StatePath, f: impl FnOnce(Walk<'_>) -> R) -> R {
        let state = self.state();
        f(tree::walk(&state, start))
    }

    // =========================================================================
    // Named caches
    // =========================================================================

    /// Fetch `GET /api/<name>` and store it.
    #[instrument(skip(self))]
    pub async fn refresh_cache(&self, name: &str) -> ClientResult<Value> {
        let value: Value = self
            .send_checked(TransportRequest::get(["api", name]))
            .await?
            .json()?;
        self.caches.insert(name.to_string(), value.clone());
        debug!(cache = %name, "Cache refreshed");
        self.bus.publish(ClientEvent::CacheRefreshed {
            name: name.to_string(),
        });
        Ok(value)
    }

    /// Last stored value of a cache, or an empty object.
    pub fn get_cache(&self, name: &str) -> Value {
        self.caches
            .get(name)
            .map(|entry| entry.value().clone())
            .unwrap_or_else(|| Value::Object(Default::default()))
    }

    /// Stored value, fetching it first if the cache was never loaded.
    pub async fn ensure_cache(&self, name: &str) -> ClientResult<Value> {
        if let Some(entry) = self.caches.get(name) {
            return Ok(entry.value().clone());
        }
        self.refresh_cache(name).await
    }

    pub fn cache_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.caches.iter().map(|e| e.key().clone()).collect();
        names.sort();
        names
    }

    /// Latest preview thumbnail picked up after a refresh.
    pub fn thumbnail(&self) -> Option<Thumbnail> {
        self.thumbnails.latest()
    }

    pub(crate) fn stop_background(&self) {
        self.thumbnails.stop();
    }
}

#[async_trait]
impl InvalidationHandler for StateManager {
    async fn on_state(&self) {
        // Failures are logged and published inside refresh_state.
        let _ = self.refresh_state().await;
    }

    async fn on_cache(&self, name: &str) {
        if let Err(e) = self.refresh_cache(name).await {
            warn!(cache = %name, error = %e, "Cache refresh failed");
        }
    }
}
