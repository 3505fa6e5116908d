//! Outbound ports for the state client.

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::fmt;

use crate::domain::error::{ClientError, ClientResult};
use crate::domain::path::StatePath;

/// HTTP verbs used by the compose API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HttpMethod {
    Get,
    Put,
    Post,
    Delete,
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Get => "GET",
            Self::Put => "PUT",
            Self::Post => "POST",
            Self::Delete => "DELETE",
        };
        f.write_str(name)
    }
}

/// Where a request goes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestTarget {
    /// Path segments below the server base URL. Segments are percent-encoded
    /// individually, so a segment may contain `/`.
    Route(Vec<String>),
    /// A fully qualified URL (the schema may live on another host).
    Absolute(String),
}

impl fmt::Display for RequestTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Route(segments) => {
                for segment in segments {
                    write!(f, "/{segment}")?;
                }
                Ok(())
            }
            Self::Absolute(url) => f.write_str(url),
        }
    }
}

/// A request against the compose server.
#[derive(Debug, Clone, PartialEq)]
pub struct TransportRequest {
    pub method: HttpMethod,
    pub target: RequestTarget,
    pub query: Vec<(String, String)>,
    pub body: Option<Value>,
}

impl TransportRequest {
    pub fn new<I, S>(method: HttpMethod, segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            method,
            target: RequestTarget::Route(segments.into_iter().map(Into::into).collect()),
            query: Vec::new(),
            body: None,
        }
    }

    pub fn get<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(HttpMethod::Get, segments)
    }

    pub fn absolute(method: HttpMethod, url: impl Into<String>) -> Self {
        Self {
            method,
            target: RequestTarget::Absolute(url.into()),
            query: Vec::new(),
            body: None,
        }
    }

    /// `<prefix>/<state path>` with the path's quoting applied.
    pub fn for_path(method: HttpMethod, prefix: &[&str], path: &StatePath) -> Self {
        let segments = prefix
            .iter()
            .map(|s| s.to_string())
            .chain(path.url_segments().map(|s| s.into_owned()));
        Self::new(method, segments)
    }

    pub fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    pub fn with_query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    /// Route as it would appear in a log line, e.g. `/api/state/impressions`.
    pub fn route(&self) -> String {
        self.target.to_string()
    }
}

/// Raw response: status plus body bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

impl TransportResponse {
    pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn json_body(status: u16, body: &Value) -> Self {
        Self::new(status, body.to_string())
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    pub fn json<T: DeserializeOwned>(&self) -> ClientResult<T> {
        serde_json::from_slice(&self.body).map_err(|e| ClientError::Parse(e.to_string()))
    }

    /// Turn a non-success status into `Rejected`, carrying the body text.
    pub fn error_for_status(self, route: &str) -> ClientResult<Self> {
        if self.is_success() {
            Ok(self)
        } else {
            Err(ClientError::Rejected {
                route: route.to_string(),
                status: self.status,
                body: self.text(),
            })
        }
    }
}

/// Everything the client sends to the server goes through this port.
#[async_trait]
pub trait StateTransport: Send + Sync {
    /// Perform one request. Non-success statuses are returned, not raised.
    async fn send(&self, request: TransportRequest) -> ClientResult<TransportResponse>;
}

/// Time source trait for testability
pub trait TimeSource: Send + Sync {
    /// Milliseconds since the Unix epoch.
    fn now_millis(&self) -> u64;
}

/// System time implementation
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemTimeSource;

impl TimeSource for SystemTimeSource {
    fn now_millis(&self) -> u64 {
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            // Clock before Unix epoch - return 0 rather than panic
            .unwrap_or(0)
    }
}
