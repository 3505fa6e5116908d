//! In-memory transport for unit tests.

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::Value;
use std::collections::{HashMap, VecDeque};
use tokio::sync::oneshot;

use crate::domain::error::{ClientError, ClientResult};
use crate::ports::outbound::{StateTransport, TransportRequest, TransportResponse};

pub(crate) enum Reply {
    Now(TransportResponse),
    /// Held until the sender fires (or is dropped).
    Gated(oneshot::Receiver<()>, TransportResponse),
    Fail(String),
}

/// Replies are queued per `"<METHOD> <route>"`; the last reply of a queue
/// is repeated once the others are used up.
#[derive(Default)]
pub(crate) struct ScriptedTransport {
    replies: Mutex<HashMap<String, VecDeque<Reply>>>,
    requests: Mutex<Vec<TransportRequest>>,
}

impl ScriptedTransport {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn push(&self, key: &str, reply: Reply) {
        self.replies
            .lock()
            .entry(key.to_string())
            .or_default()
            .push_back(reply);
    }

    pub(crate) fn json(&self, key: &str, status: u16, body: Value) {
        self.push(key, Reply::Now(TransportResponse::json_body(status, &body)));
    }

    pub(crate) fn text(&self, key: &str, status: u16, body: &str) {
        self.push(key, Reply::Now(TransportResponse::new(status, body)));
    }

    pub(crate) fn requests(&self) -> Vec<TransportRequest> {
        self.requests.lock().clone()
    }

    pub(crate) fn count(&self, key: &str) -> usize {
        self.requests
            .lock()
            .iter()
            .filter(|r| key_of(r) == key)
            .count()
    }
}

fn key_of(request: &TransportRequest) -> String {
    format!("{} {}", request.method, request.route())
}

#[async_trait]
impl StateTransport for ScriptedTransport {
    async fn send(&self, request: TransportRequest) -> ClientResult<TransportResponse> {
        let key = key_of(&request);
        self.requests.lock().push(request);

        let reply = {
            let mut replies = self.replies.lock();
            match replies.get_mut(&key) {
                Some(queue) if queue.len() > 1 => queue.pop_front(),
                Some(queue) => match queue.front() {
                    Some(Reply::Now(response)) => Some(Reply::Now(response.clone())),
                    Some(Reply::Fail(reason)) => Some(Reply::Fail(reason.clone())),
                    _ => queue.pop_front(),
                },
                None => None,
            }
        };

        match reply {
            Some(Reply::Now(response)) => Ok(response),
            Some(Reply::Gated(gate, response)) => {
                let _ = gate.await;
                Ok(response)
            }
            Some(Reply::Fail(reason)) => Err(ClientError::Connection(reason)),
            None => Ok(TransportResponse::new(404, format!("no reply for {key}"))),
        }
    }
}
