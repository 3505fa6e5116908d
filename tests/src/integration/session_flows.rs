//! # Session Flows
//!
//! A session connects, loads the server state and follows every accepted
//! edit through the push channel:
//!
//! 1. **Connect**: handshake on `/ws/`, then `GET /api/state` validated and cached
//! 2. **Edit**: `PUT /api/state/<path>` → server broadcast → refresh
//! 3. **Reject**: invalid documents never replace the cached state
//! 4. **History**: undo/redo round trips through the same refresh path

#[cfg(test)]
mod tests {
    use serde_json::json;

    use abr_client::{
        ClientError, ClientEvent, ConnectionStatus, EventFilter, EventTopic, Session, StatePath,
    };

    use crate::fixtures::{initial_state, FakeAbrServer, HANDSHAKE};
    use crate::integration::{connected_session, next_matching};

    fn path(text: &str) -> StatePath {
        text.parse().unwrap()
    }

    // =========================================================================
    // CONNECT
    // =========================================================================

    #[tokio::test]
    async fn test_connect_loads_state_and_sends_handshake() {
        let server = FakeAbrServer::start().await;
        let session = Session::new(server.config()).unwrap();
        let mut events = session.subscribe(EventFilter::topics(vec![
            EventTopic::State,
            EventTopic::Connection,
        ]));

        let outcome = session.connect().await.unwrap();
        assert!(outcome.is_applied());
        server.wait_for_handshakes(1).await;

        assert_eq!(server.handshakes(), vec![HANDSHAKE.to_string()]);
        assert_eq!(*session.state().state(), initial_state());
        assert_eq!(session.notifier().status(), ConnectionStatus::Ready);
        assert_eq!(server.request_count("GET /api/state"), 1);
        assert_eq!(server.request_count("GET /api/schemas/TestSchema.json/"), 1);

        next_matching(&mut events, |e| {
            *e == ClientEvent::Connection(ConnectionStatus::Ready)
        })
        .await;
        next_matching(&mut events, |e| {
            matches!(e, ClientEvent::StateReplaced { sequence: 1 })
        })
        .await;

        session.shutdown().await;
        assert_eq!(session.notifier().status(), ConnectionStatus::Closed);
    }

    // =========================================================================
    // EDITS
    // =========================================================================

    #[tokio::test]
    async fn test_update_is_applied_after_push() {
        let server = FakeAbrServer::start().await;
        let session = connected_session(&server).await;
        let mut events = session.subscribe(EventFilter::topics(vec![EventTopic::State]));

        session
            .state()
            .update(&path("/impressions/i-3"), json!({"name": "Pressure"}))
            .await
            .unwrap();

        next_matching(&mut events, |e| matches!(e, ClientEvent::StateReplaced { .. })).await;

        let state = session.state();
        assert_eq!(
            state.get_path(&path("/impressions/i-3/name")),
            Some(json!("Pressure"))
        );
        assert_eq!(state.length(&["impressions"]), Some(3));
        assert_eq!(state.diff_keys(), vec!["impressions".to_string()]);
        assert_eq!(
            state.previous_state().pointer("/impressions/i-3"),
            None,
            "previous snapshot keeps the pre-edit document"
        );

        session.shutdown().await;
    }

    #[tokio::test]
    async fn test_rejected_update_surfaces_server_text() {
        let server = FakeAbrServer::start().await;
        let session = connected_session(&server).await;

        let err = session
            .state()
            .update(&path("/impressions/i-1/name"), json!(42))
            .await
            .unwrap_err();

        match err {
            ClientError::Rejected { status, body, .. } => {
                assert_eq!(status, 400);
                assert_eq!(body, "Invalid state");
            }
            other => panic!("expected rejection, got {other:?}"),
        }
        assert_eq!(*session.state().state(), initial_state());

        session.shutdown().await;
    }

    #[tokio::test]
    async fn test_invalid_served_state_keeps_cache() {
        let server = FakeAbrServer::start().await;
        let session = connected_session(&server).await;
        let mut events = session.subscribe(EventFilter::topics(vec![EventTopic::State]));

        // Missing the required "version" field.
        server.serve_override(json!({"impressions": {}}));
        server.push_target("state");

        let event =
            next_matching(&mut events, |e| matches!(e, ClientEvent::StateRefreshFailed { .. }))
                .await;
        match event {
            ClientEvent::StateRefreshFailed { reason, .. } => {
                assert!(reason.contains("version"), "reason was: {reason}");
            }
            other => panic!("unexpected event {other:?}"),
        }
        assert_eq!(*session.state().state(), initial_state());
        assert_eq!(session.state().applied_sequence(), 1);

        session.shutdown().await;
    }

    #[tokio::test]
    async fn test_remove_path_with_slashed_key() {
        let mut state = initial_state();
        state["localVisAssets"] = json!({
            "colormaps/blue": {"artifactType": "colormap"},
            "glyphs/arrow": {"artifactType": "glyph"}
        });
        let server = FakeAbrServer::with_state(state).await;
        let session = connected_session(&server).await;
        let mut events = session.subscribe(EventFilter::topics(vec![EventTopic::State]));

        let target = StatePath::from_segments(["localVisAssets", "colormaps/blue"]);
        assert!(session.state().get_path(&target).is_some());

        session.state().remove_path(&target).await.unwrap();
        next_matching(&mut events, |e| matches!(e, ClientEvent::StateReplaced { .. })).await;

        assert_eq!(session.state().get_path(&target), None);
        assert!(session
            .state()
            .key_exists(&["localVisAssets", "glyphs/arrow"]));

        session.shutdown().await;
    }

    #[tokio::test]
    async fn test_remove_all_drops_key_everywhere() {
        let server = FakeAbrServer::start().await;
        let session = connected_session(&server).await;
        let mut events = session.subscribe(EventFilter::topics(vec![EventTopic::State]));

        session.state().remove_all("inputValues").await.unwrap();
        next_matching(&mut events, |e| matches!(e, ClientEvent::StateReplaced { .. })).await;

        let found = session
            .state()
            .find_path(|v| v.get("inputValues").is_some(), &StatePath::root());
        assert!(found.is_empty());
        assert_eq!(
            session.state().get_path(&path("/impressions/i-1/name")),
            Some(json!("Temperature"))
        );

        session.shutdown().await;
    }

    // =========================================================================
    // HISTORY
    // =========================================================================

    #[tokio::test]
    async fn test_undo_redo_round_trip() {
        let server = FakeAbrServer::start().await;
        let session = connected_session(&server).await;
        let mut events = session.subscribe(EventFilter::topics(vec![EventTopic::State]));
        let renamed = path("/impressions/i-2/name");

        session.state().update(&renamed, json!("Gusts")).await.unwrap();
        next_matching(&mut events, |e| matches!(e, ClientEvent::StateReplaced { .. })).await;
        assert_eq!(session.state().get_path(&renamed), Some(json!("Gusts")));

        session.state().undo().await.unwrap();
        next_matching(&mut events, |e| matches!(e, ClientEvent::StateReplaced { .. })).await;
        assert_eq!(session.state().get_path(&renamed), Some(json!("Wind")));

        session.state().redo().await.unwrap();
        next_matching(&mut events, |e| matches!(e, ClientEvent::StateReplaced { .. })).await;
        assert_eq!(session.state().get_path(&renamed), Some(json!("Gusts")));

        let err = session.state().redo().await.unwrap_err();
        assert!(err.to_string().contains("Nothing to redo"), "{err}");

        session.shutdown().await;
    }

    #[tokio::test]
    async fn test_undo_without_history_is_rejected() {
        let server = FakeAbrServer::start().await;
        let session = connected_session(&server).await;

        let err = session.state().undo().await.unwrap_err();
        assert!(matches!(err, ClientError::Rejected { status: 400, .. }));
        assert_eq!(server.state(), initial_state());

        session.shutdown().await;
    }
}
