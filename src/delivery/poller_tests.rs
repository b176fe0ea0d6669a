//! Tests for `PollResponseController`.

use super::test_fixtures::{Reply, ScriptedClient, endpoint, local_endpoint, response_for};
use super::{PollResponseController, ResponsePoller};
use crate::correlation::{NoopSink, PendingCallbacks, ResponseCorrelator, WebhookResponse};
use crate::endpoint::{EndpointConfig, EndpointRegistry, PollDialect};
use std::sync::{Arc, Mutex};

struct Harness {
    client: Arc<ScriptedClient>,
    registry: Arc<EndpointRegistry>,
    correlator: Arc<ResponseCorrelator<NoopSink>>,
    poller: PollResponseController<Arc<ScriptedClient>, NoopSink>,
}

fn harness(client: ScriptedClient, endpoints: Vec<EndpointConfig>) -> Harness {
    let client = Arc::new(client);
    let registry = Arc::new(EndpointRegistry::new(endpoints));
    let correlator = Arc::new(ResponseCorrelator::new(Arc::new(PendingCallbacks::default())));
    let poller = PollResponseController::new(
        Arc::clone(&client),
        Arc::clone(&registry),
        Arc::clone(&correlator),
    );
    Harness {
        client,
        registry,
        correlator,
        poller,
    }
}

mod request_shape {
    use super::*;

    #[tokio::test]
    async fn local_dialect_polls_path_parameter() {
        let h = harness(
            ScriptedClient::new().route("localhost", vec![Reply::pending()]),
            vec![local_endpoint(3001)],
        );

        h.poller.poll_for_response("xyz").await;

        let requests = h.client.requests();
        assert_eq!(requests[0].method, http::Method::GET);
        assert_eq!(requests[0].url.as_str(), "http://localhost:3001/webhook/poll/xyz");
    }

    #[tokio::test]
    async fn cloud_dialect_polls_query_parameters() {
        let h = harness(
            ScriptedClient::new().route("a.example.com", vec![Reply::pending()]),
            vec![endpoint("a.example.com", 1)],
        );

        h.poller.poll_for_response("xyz").await;

        assert_eq!(
            h.client.request_urls(),
            vec!["https://a.example.com/webhook?conversationId=xyz&action=poll"]
        );
    }

    #[tokio::test]
    async fn explicit_dialect_overrides_host() {
        let h = harness(
            ScriptedClient::new().route("a.example.com", vec![Reply::pending()]),
            vec![endpoint("a.example.com", 1).with_dialect(PollDialect::PathParam)],
        );

        h.poller.poll_for_response("xyz").await;

        assert_eq!(
            h.client.request_urls(),
            vec!["https://a.example.com/webhook/poll/xyz"]
        );
    }
}

mod results {
    use super::*;

    #[tokio::test]
    async fn available_result_is_returned_and_correlated() {
        let data = response_for("c1", "Here is your plan");
        let h = harness(
            ScriptedClient::new().route("a.example.com", vec![Reply::result(&data)]),
            vec![endpoint("a.example.com", 1)],
        );
        let received: Arc<Mutex<Vec<WebhookResponse>>> = Arc::default();
        let sink = Arc::clone(&received);
        h.correlator
            .register_callback("c1", move |r| sink.lock().unwrap().push(r))
            .unwrap();

        let result = h.poller.poll_for_response("c1").await;

        assert_eq!(result, Some(data.clone()));
        assert_eq!(*received.lock().unwrap(), vec![data]);
        assert!(h.correlator.callbacks().is_empty());
    }

    #[tokio::test]
    async fn healthy_endpoint_without_result_returns_none() {
        let h = harness(
            ScriptedClient::new().route("a.example.com", vec![Reply::pending()]),
            vec![endpoint("a.example.com", 1), endpoint("b.example.com", 1)],
        );

        assert!(h.poller.poll_for_response("c1").await.is_none());
        assert_eq!(h.client.requests().len(), 1);
        assert_eq!(h.registry.failing_endpoints(), 0);
    }

    #[tokio::test]
    async fn empty_or_malformed_bodies_mean_no_result() {
        let h = harness(
            ScriptedClient::new().route(
                "a.example.com",
                vec![
                    Reply::Status(204, String::new()),
                    Reply::Status(200, "<html>".to_string()),
                ],
            ),
            vec![endpoint("a.example.com", 1)],
        );

        assert!(h.poller.poll_for_response("c1").await.is_none());
        assert!(h.poller.poll_for_response("c1").await.is_none());
        assert_eq!(h.registry.failing_endpoints(), 0);
    }

    #[tokio::test]
    async fn success_flag_without_data_is_not_a_result() {
        let h = harness(
            ScriptedClient::new().route(
                "a.example.com",
                vec![Reply::Status(200, r#"{"success":true}"#.to_string())],
            ),
            vec![endpoint("a.example.com", 1)],
        );

        assert!(h.poller.poll_for_response("c1").await.is_none());
    }
}

mod failover {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn fails_over_to_next_candidate() {
        let data = response_for("c1", "ready");
        let h = harness(
            ScriptedClient::new()
                .route("a.example.com", vec![Reply::Hang])
                .route("b.example.com", vec![Reply::result(&data)]),
            vec![endpoint("a.example.com", 1), endpoint("b.example.com", 1)],
        );

        let result = h.poller.poll_for_response("c1").await;

        assert_eq!(result, Some(data));
        assert_eq!(h.registry.active_index(), 0);
        assert_eq!(h.registry.failing_endpoints(), 0);
    }

    #[tokio::test]
    async fn all_candidates_failing_returns_none_with_bookkeeping() {
        let h = harness(
            ScriptedClient::new(),
            vec![endpoint("a.example.com", 1), endpoint("b.example.com", 1)],
        );

        assert!(h.poller.poll_for_response("c1").await.is_none());

        let a = h.registry.endpoints()[0].clone();
        let b = h.registry.endpoints()[1].clone();
        assert_eq!(h.registry.failure_count(a.url()), 1);
        assert_eq!(h.registry.failure_count(b.url()), 1);

        // Both are now at their threshold: the next poll makes no requests.
        assert!(h.poller.poll_for_response("c1").await.is_none());
        assert_eq!(h.client.requests().len(), 2);
    }

    #[tokio::test]
    async fn trait_object_delegates_to_controller() {
        let data = response_for("c1", "ready");
        let h = harness(
            ScriptedClient::new().route("a.example.com", vec![Reply::result(&data)]),
            vec![endpoint("a.example.com", 1)],
        );
        let poller = Arc::new(h.poller);

        let result = ResponsePoller::poll_for_response(&poller, "c1").await;

        assert_eq!(result, Some(data));
    }
}
