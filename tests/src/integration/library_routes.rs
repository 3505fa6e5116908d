//! # Library Routes
//!
//! Saved states, histograms and schema documents through
//! [`abr_client::ServerLibrary`] over real HTTP.

#[cfg(test)]
mod tests {
    use serde_json::json;

    use abr_client::{ClientError, ClientEvent, EventFilter, EventTopic, HistogramRequest};

    use crate::fixtures::{initial_state, test_schema, FakeAbrServer, SCHEMA_NAME};
    use crate::integration::{connected_session, next_matching};

    #[tokio::test]
    async fn test_save_load_delete_state() {
        let server = FakeAbrServer::start().await;
        let session = connected_session(&server).await;
        let library = session.library();
        let mut events = session.subscribe(EventFilter::topics(vec![EventTopic::State]));

        assert!(library.list_states().await.unwrap().is_empty());
        assert_eq!(
            library.save_state("baseline").await.unwrap(),
            "Saved state baseline"
        );
        assert_eq!(library.list_states().await.unwrap(), vec!["baseline"]);

        session
            .state()
            .update_state(json!({"version": "0.2.0", "impressions": {}}))
            .await
            .unwrap();
        next_matching(&mut events, |e| matches!(e, ClientEvent::StateReplaced { .. })).await;
        assert_eq!(session.state().length(&["impressions"]), Some(0));

        library.load_state("baseline").await.unwrap();
        next_matching(&mut events, |e| matches!(e, ClientEvent::StateReplaced { .. })).await;
        assert_eq!(*session.state().state(), initial_state());

        library.delete_state("baseline").await.unwrap();
        assert!(library.list_states().await.unwrap().is_empty());

        let err = library.load_state("baseline").await.unwrap_err();
        match err {
            ClientError::Rejected { status, body, .. } => {
                assert_eq!(status, 404);
                assert_eq!(body, "State does not exist: baseline");
            }
            other => panic!("expected rejection, got {other:?}"),
        }

        session.shutdown().await;
    }

    #[tokio::test]
    async fn test_histogram_with_bounds() {
        let server = FakeAbrServer::start().await;
        let session = connected_session(&server).await;

        let request = HistogramRequest::new("TACC", "GulfOfMexico", "OceanCurrents", "Temperature")
            .with_bounds(10.0, 30.0);
        let histogram = session.library().histogram(&request).await.unwrap();

        assert_eq!(histogram.key_data_min, 10.0);
        assert_eq!(histogram.key_data_max, 30.0);
        assert_eq!(histogram.histogram[1].bin_max, 20.0);
        assert_eq!(histogram.total_items(), 10);

        let missing = HistogramRequest::new("TACC", "GulfOfMexico", "OceanCurrents", "Salinity");
        let err = session.library().histogram(&missing).await.unwrap_err();
        assert!(err.is_rejected());
        assert!(!err.is_transient());

        session.shutdown().await;
    }

    #[tokio::test]
    async fn test_schema_documents() {
        let server = FakeAbrServer::start().await;
        let session = connected_session(&server).await;

        assert_eq!(
            session.library().schema(SCHEMA_NAME).await.unwrap(),
            test_schema()
        );
        let err = session.library().schema("Missing.json").await.unwrap_err();
        assert!(matches!(err, ClientError::Rejected { status: 404, .. }));
        assert!(session.validator().is_loaded());

        session.shutdown().await;
    }
}
