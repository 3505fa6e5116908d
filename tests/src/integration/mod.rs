//! Integration flows against [`crate::fixtures::FakeAbrServer`].

pub mod library_routes;
pub mod push_channel;
pub mod session_flows;

use std::time::Duration;

use abr_bus::Subscription;
use abr_client::{ClientEvent, Session};

use crate::fixtures::FakeAbrServer;

/// Upper bound for anything a test waits on.
pub const WAIT: Duration = Duration::from_secs(5);

/// A session against `server`, connected and with the initial state loaded.
pub async fn connected_session(server: &FakeAbrServer) -> Session {
    let session = Session::new(server.config()).expect("valid session config");
    session.connect().await.expect("session connects");
    server.wait_for_handshakes(1).await;
    session
}

/// Wait for the first event accepted by `pred`, skipping the others.
pub async fn next_matching<F>(subscription: &mut Subscription, mut pred: F) -> ClientEvent
where
    F: FnMut(&ClientEvent) -> bool,
{
    tokio::time::timeout(WAIT, async {
        loop {
            match subscription.recv().await {
                Some(event) if pred(&event) => return event,
                Some(_) => continue,
                None => panic!("event bus closed"),
            }
        }
    })
    .await
    .expect("timed out waiting for event")
}
