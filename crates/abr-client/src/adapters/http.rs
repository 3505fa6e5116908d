//! `reqwest` implementation of [`StateTransport`].

use async_trait::async_trait;
use reqwest::{Client, Method, Url};
use tracing::{debug, trace};

use crate::domain::config::ServerConfig;
use crate::domain::error::{ClientError, ClientResult};
use crate::ports::outbound::{
    HttpMethod, RequestTarget, StateTransport, TransportRequest, TransportResponse,
};

/// HTTP transport against a compose server.
pub struct HttpTransport {
    client: Client,
    base_url: Url,
}

impl HttpTransport {
    /// Build a transport with the configured timeouts.
    pub fn new(config: &ServerConfig) -> ClientResult<Self> {
        let base_url = Url::parse(&config.base_url)
            .map_err(|e| ClientError::Config(format!("server.base_url: {e}")))?;
        if base_url.cannot_be_a_base() {
            return Err(ClientError::Config(format!(
                "server.base_url cannot be a base: {base_url}"
            )));
        }

        let client = Client::builder()
            .timeout(config.request_timeout)
            .connect_timeout(config.connect_timeout)
            .build()
            .map_err(ClientError::Http)?;

        Ok(Self { client, base_url })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Resolve a request target to a full URL, percent-encoding each segment.
    pub fn url_for(&self, request: &TransportRequest) -> ClientResult<Url> {
        let mut url = match &request.target {
            RequestTarget::Absolute(url) => Url::parse(url)
                .map_err(|e| ClientError::Config(format!("invalid url {url}: {e}")))?,
            RequestTarget::Route(segments) => {
                let mut url = self.base_url.clone();
                url.path_segments_mut()
                    .map_err(|_| ClientError::Config("base url cannot be a base".into()))?
                    .pop_if_empty()
                    .extend(segments);
                url
            }
        };
        if !request.query.is_empty() {
            url.query_pairs_mut().extend_pairs(&request.query);
        }
        Ok(url)
    }
}

fn method(method: HttpMethod) -> Method {
    match method {
        HttpMethod::Get => Method::GET,
        HttpMethod::Put => Method::PUT,
        HttpMethod::Post => Method::POST,
        HttpMethod::Delete => Method::DELETE,
    }
}

#[async_trait]
impl StateTransport for HttpTransport {
    async fn send(&self, request: TransportRequest) -> ClientResult<TransportResponse> {
        let url = self.url_for(&request)?;
        debug!(method = %request.method, %url, "Sending request");

        let mut builder = self.client.request(method(request.method), url.clone());
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = builder.send().await.map_err(|e| {
            if e.is_connect() {
                ClientError::Connection(format!("Cannot connect to {}", self.base_url))
            } else {
                ClientError::Http(e)
            }
        })?;

        let status = response.status().as_u16();
        let body = response.bytes().await.map_err(ClientError::Http)?;
        trace!(%url, status, bytes = body.len(), "Received response");

        Ok(TransportResponse::new(status, body.to_vec()))
    }
}
