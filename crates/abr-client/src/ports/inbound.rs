//! # Driving Ports (Inbound API)
//!
//! What the push channel drives when the server announces a change.

use async_trait::async_trait;

/// Receiver of invalidation messages.
///
/// Implementations refetch the named resource. Errors are theirs to log;
/// the push channel keeps processing later messages either way.
///
/// # Example
///
/// ```rust,ignore
/// let manager: Arc<StateManager> = session.state();
/// notifier.start(manager.clone() as Arc<dyn InvalidationHandler>);
/// ```
#[async_trait]
pub trait InvalidationHandler: Send + Sync {
    /// The server's state changed.
    async fn on_state(&self);

    /// The named cache (e.g. `visassets`) changed.
    async fn on_cache(&self, name: &str);
}
