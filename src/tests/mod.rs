//! Scenario tests
//!
//! Drive the client end to end over a scripted transport with paused time

#[cfg(test)]
mod scenario_tests {
    use crate::config::{ClientConfig, ClientConfigUpdate, RateLimitUpdate};
    use crate::models::api::CallParams;
    use crate::services::transport::{ApiTransport, RawResponse};
    use crate::services::BotClient;
    use crate::utils::error::{helpers, ApiResult, ErrorKind};
    use async_trait::async_trait;
    use serde_json::{json, Value};
    use std::collections::VecDeque;
    use std::sync::{Arc, Mutex};
    use std::time::Duration;
    use tokio::time::Instant;

    enum Step {
        Respond(RawResponse),
        NetworkDown,
        Hang,
    }

    /// Plays scripted steps in order, then answers `ok: true`
    struct ScriptedTransport {
        steps: Mutex<VecDeque<Step>>,
        calls: Mutex<Vec<Instant>>,
    }

    impl ScriptedTransport {
        fn new(steps: Vec<Step>) -> Arc<Self> {
            Arc::new(Self {
                steps: Mutex::new(steps.into()),
                calls: Mutex::new(Vec::new()),
            })
        }

        fn call_times(&self) -> Vec<Instant> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl ApiTransport for ScriptedTransport {
        async fn post(&self, _token: &str, _method: &str, _body: &Value) -> ApiResult<RawResponse> {
            self.calls.lock().unwrap().push(Instant::now());
            let step = self.steps.lock().unwrap().pop_front();
            match step {
                Some(Step::Respond(raw)) => Ok(raw),
                Some(Step::NetworkDown) => Err(helpers::network_error("connection reset")),
                Some(Step::Hang) => {
                    tokio::time::sleep(Duration::from_secs(3600)).await;
                    Ok(RawResponse::json(200, &json!({"ok": true, "result": true})))
                }
                None => Ok(RawResponse::json(200, &json!({"ok": true, "result": true}))),
            }
        }
    }

    fn client(transport: Arc<ScriptedTransport>) -> BotClient {
        BotClient::with_transport(Some("123:abc".to_string()), ClientConfig::default(), transport)
    }

    #[tokio::test(start_paused = true)]
    async fn cold_start_second_call_waits_for_the_limiter() {
        let transport = ScriptedTransport::new(vec![]);
        let client = client(transport.clone());
        client
            .configure(&ClientConfigUpdate {
                rate_limit: Some(RateLimitUpdate {
                    max_requests: Some(1),
                    window_ms: Some(1000),
                }),
                ..Default::default()
            })
            .unwrap();

        client.execute("getMe", &CallParams::new()).await.unwrap();
        client.execute("getMe", &CallParams::new()).await.unwrap();

        let times = transport.call_times();
        assert_eq!(times.len(), 2);
        assert!(times[1] - times[0] >= Duration::from_millis(1000));
    }

    #[tokio::test(start_paused = true)]
    async fn retry_after_hint_is_honoured_over_backoff() {
        let transport = ScriptedTransport::new(vec![Step::Respond(
            RawResponse::json(429, &json!({"ok": false, "error_code": 429})).with_retry_after(5),
        )]);
        let client = client(transport.clone());

        client.execute("sendMessage", &CallParams::new()).await.unwrap();

        let times = transport.call_times();
        assert_eq!(times.len(), 2);
        assert!(times[1] - times[0] >= Duration::from_millis(5000));
    }

    #[tokio::test(start_paused = true)]
    async fn backoff_doubles_between_attempts() {
        let server_error = || Step::Respond(RawResponse::new(502, "bad gateway"));
        let transport = ScriptedTransport::new(vec![server_error(), server_error(), server_error()]);
        let client = client(transport.clone());

        client.execute("getMe", &CallParams::new()).await.unwrap();

        let times = transport.call_times();
        assert_eq!(times.len(), 4);
        assert!(times[1] - times[0] >= Duration::from_millis(1000));
        assert!(times[2] - times[1] >= Duration::from_millis(2000));
        assert!(times[3] - times[2] >= Duration::from_millis(4000));
    }

    #[tokio::test(start_paused = true)]
    async fn network_failures_are_retried() {
        let transport = ScriptedTransport::new(vec![Step::NetworkDown, Step::NetworkDown]);
        let client = client(transport.clone());

        let result = client.execute("getMe", &CallParams::new()).await;
        assert_eq!(result.unwrap(), json!(true));
        assert_eq!(transport.call_times().len(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn timeout_is_classified_as_408() {
        let transport = ScriptedTransport::new(vec![Step::Hang]);
        let client = client(transport.clone());
        client
            .configure(&ClientConfigUpdate {
                max_retries: Some(0),
                timeout: Some(2000),
                ..Default::default()
            })
            .unwrap();

        let err = client.execute("getMe", &CallParams::new()).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Generic);
        assert_eq!(err.status(), Some(408));
    }

    #[tokio::test(start_paused = true)]
    async fn limiter_wait_does_not_count_against_timeout() {
        let transport = ScriptedTransport::new(vec![]);
        let client = client(transport.clone());
        client
            .configure(&ClientConfigUpdate {
                timeout: Some(100),
                rate_limit: Some(RateLimitUpdate {
                    max_requests: Some(1),
                    window_ms: Some(5000),
                }),
                ..Default::default()
            })
            .unwrap();

        client.execute("getMe", &CallParams::new()).await.unwrap();
        // Waits ~5s for a token, far beyond the 100ms timeout, and still succeeds
        client.execute("getMe", &CallParams::new()).await.unwrap();
        assert_eq!(transport.call_times().len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn every_retry_consumes_a_limiter_token() {
        let server_error = || Step::Respond(RawResponse::new(500, "internal error"));
        let transport = ScriptedTransport::new(vec![
            server_error(),
            server_error(),
            server_error(),
            server_error(),
        ]);
        let client = client(transport.clone());
        client
            .configure(&ClientConfigUpdate {
                rate_limit: Some(RateLimitUpdate {
                    max_requests: Some(10),
                    window_ms: Some(3_600_000),
                }),
                ..Default::default()
            })
            .unwrap();

        let err = client.execute("getMe", &CallParams::new()).await.unwrap_err();
        assert_eq!(err.status(), Some(500));
        assert_eq!(transport.call_times().len(), 4);
        assert_eq!(client.limiter().tokens_remaining(), 6);
    }

    #[tokio::test(start_paused = true)]
    async fn validation_errors_are_not_retried() {
        let transport = ScriptedTransport::new(vec![Step::Respond(RawResponse::json(
            400,
            &json!({"ok": false, "error_code": 400, "description": "Bad Request: message text is empty"}),
        ))]);
        let client = client(transport.clone());

        let err = client.execute("sendMessage", &CallParams::new()).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert_eq!(err.user_message(), "Bad Request: message text is empty");
        assert_eq!(transport.call_times().len(), 1);
    }
}
