//! # Push Channel
//!
//! Routing of `{"target": ..}` frames into refetches, recovery after the
//! server drops the socket, and thumbnail polling after state changes.

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use serde_json::json;

    use abr_client::{ClientEvent, ConnectionStatus, EventFilter, EventTopic};

    use crate::fixtures::FakeAbrServer;
    use crate::integration::{connected_session, next_matching};

    // =========================================================================
    // ROUTING
    // =========================================================================

    #[tokio::test]
    async fn test_cache_update_refetches_only_that_cache() {
        let server = FakeAbrServer::start().await;
        server.set_cache("visassets", json!({"u-1": {"name": "Blues"}}));
        server.set_cache("datasets", json!({"ds": {}}));
        let session = connected_session(&server).await;
        let mut events = session.subscribe(EventFilter::cache("visassets"));

        server.push_target("CacheUpdate-visassets");
        let event = next_matching(&mut events, |_| true).await;
        assert_eq!(
            event,
            ClientEvent::CacheRefreshed {
                name: "visassets".into()
            }
        );

        assert_eq!(
            session.state().get_cache("visassets"),
            json!({"u-1": {"name": "Blues"}})
        );
        assert_eq!(session.state().get_cache("datasets"), json!({}));
        assert_eq!(server.request_count("GET /api/visassets"), 1);
        assert_eq!(server.request_count("GET /api/datasets"), 0);
        assert_eq!(server.request_count("GET /api/state"), 1);

        session.shutdown().await;
    }

    #[tokio::test]
    async fn test_unknown_frames_are_ignored() {
        let server = FakeAbrServer::start().await;
        let session = connected_session(&server).await;
        let mut events = session.subscribe(EventFilter::topics(vec![EventTopic::State]));

        server.push_raw("not json");
        server.push_raw(r#"{"target": "somethingElse"}"#);
        server.push_raw(r#"{"message": "hi"}"#);
        server.push_target("state");

        // Only the last frame leads to a refresh.
        let event =
            next_matching(&mut events, |e| matches!(e, ClientEvent::StateReplaced { .. })).await;
        assert_eq!(event, ClientEvent::StateReplaced { sequence: 2 });
        assert_eq!(server.request_count("GET /api/state"), 2);
        assert_eq!(session.notifier().status(), ConnectionStatus::Ready);

        session.shutdown().await;
    }

    #[tokio::test]
    async fn test_remove_visasset_invalidates_library_cache() {
        let server = FakeAbrServer::start().await;
        server.set_cache("visassets", json!({"u-1": {}, "u-2": {}}));
        let session = connected_session(&server).await;
        session.state().refresh_cache("visassets").await.unwrap();
        let mut events = session.subscribe(EventFilter::cache("visassets"));

        session.state().remove_visasset("u-1").await.unwrap();
        next_matching(&mut events, |_| true).await;

        assert_eq!(session.state().get_cache("visassets"), json!({"u-2": {}}));

        session.shutdown().await;
    }

    // =========================================================================
    // RECONNECT
    // =========================================================================

    #[tokio::test]
    async fn test_reconnects_after_server_drop() {
        let server = FakeAbrServer::start().await;
        let session = connected_session(&server).await;
        let mut events = session.subscribe(EventFilter::topics(vec![
            EventTopic::Connection,
            EventTopic::State,
        ]));

        server.disconnect_clients();

        next_matching(&mut events, |e| {
            matches!(
                e,
                ClientEvent::Connection(ConnectionStatus::Reconnecting { attempt: 1 })
            )
        })
        .await;
        next_matching(&mut events, |e| {
            *e == ClientEvent::Connection(ConnectionStatus::Ready)
        })
        .await;
        server.wait_for_handshakes(2).await;

        // The new socket still routes invalidations.
        server.push_target("state");
        next_matching(&mut events, |e| matches!(e, ClientEvent::StateReplaced { .. })).await;
        assert_eq!(server.request_count("GET /ws/"), 2);

        session.shutdown().await;
    }

    #[tokio::test]
    async fn test_gives_up_after_reconnect_budget() {
        let server = FakeAbrServer::start().await;
        let session = connected_session(&server).await;
        let mut status = session.notifier().watch_status();

        server.disconnect_clients();
        drop(server);

        tokio::time::timeout(
            Duration::from_secs(5),
            status.wait_for(|s| s.status == ConnectionStatus::Closed),
        )
        .await
        .expect("notifier settles in Closed")
        .unwrap();

        // Cached state survives the outage.
        assert_eq!(session.state().applied_sequence(), 1);
        session.shutdown().await;
    }

    // =========================================================================
    // THUMBNAILS
    // =========================================================================

    #[tokio::test]
    async fn test_thumbnail_follows_state_changes() {
        let server = FakeAbrServer::start().await;
        let session = connected_session(&server).await;
        let mut events = session.subscribe(EventFilter::topics(vec![EventTopic::Thumbnail]));

        let first = match session.state().thumbnail() {
            Some(thumbnail) => thumbnail,
            None => match next_matching(&mut events, |_| true).await {
                ClientEvent::ThumbnailUpdated { .. } => session.state().thumbnail().unwrap(),
                other => panic!("unexpected event {other:?}"),
            },
        };
        assert_eq!(first.bytes, 10);
        assert!(first.data_url.starts_with("data:image/png;base64,"));

        server.set_thumbnail(b"\x89PNG second render");
        server.push_target("state");

        let event = next_matching(&mut events, |e| {
            matches!(e, ClientEvent::ThumbnailUpdated { bytes: 18 })
        })
        .await;
        assert_eq!(event, ClientEvent::ThumbnailUpdated { bytes: 18 });
        assert_ne!(session.state().thumbnail(), Some(first));

        session.shutdown().await;
    }
}
