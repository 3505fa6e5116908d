//! Saved states, VisAsset library and data endpoints of the compose server.

use serde_json::{json, Value};
use std::sync::Arc;
use tracing::info;

use crate::domain::error::ClientResult;
use crate::domain::types::{Histogram, HistogramRequest, SavedStates};
use crate::ports::outbound::{HttpMethod, StateTransport, TransportRequest, TransportResponse};
use crate::state::thumbnail::png_data_url;

/// Thin wrappers over the server's library routes. Every non-success status
/// comes back as `ClientError::Rejected` with the server's text.
pub struct ServerLibrary {
    transport: Arc<dyn StateTransport>,
}

impl ServerLibrary {
    pub fn new(transport: Arc<dyn StateTransport>) -> Self {
        Self { transport }
    }

    async fn send(&self, request: TransportRequest) -> ClientResult<TransportResponse> {
        let route = request.route();
        self.transport.send(request).await?.error_for_status(&route)
    }

    // -------------------------------------------------------------------------
    // Saved states
    // -------------------------------------------------------------------------

    pub async fn list_states(&self) -> ClientResult<Vec<String>> {
        let saved: SavedStates = self
            .send(TransportRequest::get(["api", "list-states"]))
            .await?
            .json()?;
        Ok(saved.states)
    }

    /// Save the current server state under `name`. Returns the server's message.
    pub async fn save_state(&self, name: &str) -> ClientResult<String> {
        let message = self
            .send(TransportRequest::get(["api", "save-state", name]))
            .await?
            .text();
        info!(state = %name, "Saved state");
        Ok(message)
    }

    /// Make the saved state `name` current. The server broadcasts the change.
    pub async fn load_state(&self, name: &str) -> ClientResult<String> {
        let message = self
            .send(TransportRequest::get(["api", "load-state", name]))
            .await?
            .text();
        info!(state = %name, "Loaded state");
        Ok(message)
    }

    pub async fn delete_state(&self, name: &str) -> ClientResult<String> {
        Ok(self
            .send(TransportRequest::get(["api", "delete-state", name]))
            .await?
            .text())
    }

    /// Preview image of a saved state as a `data:` URL.
    pub async fn thumbnail(&self, name: &str) -> ClientResult<String> {
        let response = self
            .send(TransportRequest::get(["api", "thumbnail", name]))
            .await?;
        Ok(png_data_url(&response.body))
    }

    // -------------------------------------------------------------------------
    // VisAssets
    // -------------------------------------------------------------------------

    /// Ask the server to download a VisAsset, optionally from a specific
    /// library host.
    pub async fn download_visasset(
        &self,
        uuid: &str,
        host_path: Option<&str>,
    ) -> ClientResult<()> {
        let mut request =
            TransportRequest::new(HttpMethod::Post, ["api", "download-visasset", uuid]);
        if let Some(host) = host_path {
            request = request.with_body(json!({ "hostPath": host }));
        }
        self.send(request).await.map(drop)
    }

    /// Persist a local (unpublished) VisAsset on the server.
    pub async fn save_local_visasset(&self, uuid: &str) -> ClientResult<()> {
        self.send(TransportRequest::new(
            HttpMethod::Post,
            ["api", "save-local-visasset", uuid],
        ))
        .await
        .map(drop)
    }

    // -------------------------------------------------------------------------
    // Data
    // -------------------------------------------------------------------------

    pub async fn histogram(&self, request: &HistogramRequest) -> ClientResult<Histogram> {
        let mut http = TransportRequest::get([
            "api",
            "histogram",
            request.organization.as_str(),
            request.dataset.as_str(),
            "KeyData",
            request.key_data.as_str(),
            request.variable.as_str(),
        ]);
        if let Some(min) = request.min {
            http = http.with_query("min", min.to_string());
        }
        if let Some(max) = request.max {
            http = http.with_query("max", max.to_string());
        }
        self.send(http).await?.json()
    }

    /// A schema document served by the compose server.
    pub async fn schema(&self, name: &str) -> ClientResult<Value> {
        // Route requires the trailing slash.
        self.send(TransportRequest::get(["api", "schemas", name, ""]))
            .await?
            .json()
    }
}
