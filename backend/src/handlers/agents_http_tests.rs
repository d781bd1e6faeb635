//! HTTP Integration Tests for the agent API
//!
//! Each test builds the full route table over a fresh in-memory SQLite
//! database. Upstream agents are faked with mockito servers or raw sockets.

#[cfg(test)]
mod http_integration_tests {
    use std::sync::Arc;

    use actix_web::http::StatusCode;
    use actix_web::{test, web, App};
    use serde_json::{json, Value};

    use crate::config::Config;
    use crate::handlers::configure_routes;
    use crate::services::agent_store::memory_store;
    use crate::services::{AgentRegistryService, CallProxy, RateLimitConfig, RateLimiterService};
    use crate::AppState;

    const TEST_KEY: &str = "dev-secret-key";

    /// Create test config, optionally overriding the rate limit
    fn create_test_config(max_requests: Option<u32>) -> Config {
        Config::from_vars(|name| match (name, max_requests) {
            ("RATE_LIMIT_MAX_REQUESTS", Some(max)) => Some(max.to_string()),
            _ => None,
        })
        .expect("test config should load")
    }

    /// Create test app state over a fresh in-memory database
    async fn create_test_app_state(config: Config) -> web::Data<AppState> {
        let store = Arc::new(memory_store().await);
        let proxy = CallProxy::new("agenthub-test").expect("client should build");
        web::Data::new(AppState::new(
            config,
            AgentRegistryService::new(store, proxy),
        ))
    }

    /// Build the full route table around `state`
    macro_rules! init_app {
        ($state:expr) => {
            test::init_service(App::new().app_data($state).configure(configure_routes)).await
        };
    }

    fn register_body(endpoint: &str) -> Value {
        json!({
            "name": "SummarizeAgent",
            "skills": ["summarize_text"],
            "input_schema": {"text": "string"},
            "output_schema": {"summary": "string"},
            "price_per_call": 0.001,
            "endpoint": endpoint,
            "max_latency_ms": 2000
        })
    }

    fn post(uri: &str, body: &Value) -> test::TestRequest {
        test::TestRequest::post()
            .uri(uri)
            .insert_header(("X-API-Key", TEST_KEY))
            .set_json(body)
    }

    fn get(uri: &str) -> test::TestRequest {
        test::TestRequest::get()
            .uri(uri)
            .insert_header(("X-API-Key", TEST_KEY))
    }

    fn delete(uri: &str) -> test::TestRequest {
        test::TestRequest::delete()
            .uri(uri)
            .insert_header(("X-API-Key", TEST_KEY))
    }

    /// Accepts connections and never answers.
    fn silent_endpoint() -> String {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        std::thread::spawn(move || {
            let mut held = Vec::new();
            for stream in listener.incoming().flatten() {
                held.push(stream);
            }
        });
        format!("http://{addr}/run")
    }

    /// An address nothing is listening on.
    fn closed_endpoint() -> String {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);
        format!("http://{addr}/run")
    }

    macro_rules! register {
        ($app:expr, $body:expr) => {{
            let resp = test::call_service($app, post("/api/v1/agents/register", &$body).to_request()).await;
            assert_eq!(resp.status(), StatusCode::CREATED);
            let body: Value = test::read_body_json(resp).await;
            body["data"].clone()
        }};
    }

    // =========================================================================
    // Registration
    // =========================================================================

    #[actix_rt::test]
    async fn http_register_returns_zeroed_agent() {
        let app = init_app!(create_test_app_state(create_test_config(None)).await);

        let agent = register!(&app, register_body("http://127.0.0.1:9001/run"));

        assert!(agent["id"].as_i64().unwrap() > 0);
        assert_eq!(agent["name"], "SummarizeAgent");
        assert_eq!(agent["skills"], json!(["summarize_text"]));
        assert_eq!(agent["total_calls"], 0);
        assert_eq!(agent["successful_calls"], 0);
        assert_eq!(agent["failed_calls"], 0);
        assert_eq!(agent["avg_latency"], 0.0);
        assert_eq!(agent["reputation_score"], 0.0);
        assert!(agent["created_at"].is_string());
    }

    #[actix_rt::test]
    async fn http_register_identical_payloads_yields_distinct_ids() {
        let app = init_app!(create_test_app_state(create_test_config(None)).await);

        let first = register!(&app, register_body("http://127.0.0.1:9001/run"));
        let second = register!(&app, register_body("http://127.0.0.1:9001/run"));

        assert_ne!(first["id"], second["id"]);
    }

    #[actix_rt::test]
    async fn http_register_validation_failures_are_422() {
        let app = init_app!(create_test_app_state(create_test_config(None)).await);

        let mut negative_price = register_body("http://127.0.0.1:9001/run");
        negative_price["price_per_call"] = json!(-1.0);
        let mut zero_latency = register_body("http://127.0.0.1:9001/run");
        zero_latency["max_latency_ms"] = json!(0);
        let mut empty_name = register_body("http://127.0.0.1:9001/run");
        empty_name["name"] = json!("");
        let mut missing_endpoint = register_body("http://127.0.0.1:9001/run");
        missing_endpoint.as_object_mut().unwrap().remove("endpoint");

        for body in [negative_price, zero_latency, empty_name, missing_endpoint] {
            let resp = test::call_service(&app, post("/api/v1/agents/register", &body).to_request()).await;
            assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
            let body: Value = test::read_body_json(resp).await;
            assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
        }

        // Malformed JSON
        let req = test::TestRequest::post()
            .uri("/api/v1/agents/register")
            .insert_header(("X-API-Key", TEST_KEY))
            .insert_header(("content-type", "application/json"))
            .set_payload("{not json")
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    // =========================================================================
    // Search
    // =========================================================================

    #[actix_rt::test]
    async fn http_search_ranks_by_reputation_then_price() {
        let app = init_app!(create_test_app_state(create_test_config(None)).await);

        let mut a_body = register_body("http://127.0.0.1:9001/a");
        a_body["price_per_call"] = json!(0.002);
        let a = register!(&app, a_body);
        let b = register!(&app, register_body("http://127.0.0.1:9001/b"));
        let mut other = register_body("http://127.0.0.1:9001/c");
        other["skills"] = json!(["translate"]);
        register!(&app, other);

        // Equal reputation: the cheaper agent wins.
        let resp = test::call_service(&app, get("/api/v1/agents/search?skill=summarize_text").to_request()).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let body: Value = test::read_body_json(resp).await;
        let ids: Vec<Value> = body["data"]
            .as_array()
            .unwrap()
            .iter()
            .map(|a| a["id"].clone())
            .collect();
        assert_eq!(ids, vec![b["id"].clone(), a["id"].clone()]);

        // A success report lifts the pricier agent above the cheaper one.
        let report = json!({"agent_id": a["id"], "success": true});
        let resp = test::call_service(&app, post("/api/v1/agents/report", &report).to_request()).await;
        assert_eq!(resp.status(), StatusCode::OK);

        let resp = test::call_service(&app, get("/api/v1/agents/search?skill=summarize_text").to_request()).await;
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["data"][0]["id"], a["id"]);

        let resp = test::call_service(&app, get("/api/v1/agents/search?min_score=0.5").to_request()).await;
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["data"].as_array().unwrap().len(), 1);
    }

    #[actix_rt::test]
    async fn http_search_rejects_bad_bounds() {
        let app = init_app!(create_test_app_state(create_test_config(None)).await);

        for uri in [
            "/api/v1/agents/search?max_price=-1",
            "/api/v1/agents/search?min_score=1.5",
            "/api/v1/agents/search?min_score=-0.1",
            "/api/v1/agents/search?max_price=cheap",
        ] {
            let resp = test::call_service(&app, get(uri).to_request()).await;
            assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY, "uri {uri}");
        }
    }

    // =========================================================================
    // Calls
    // =========================================================================

    #[actix_rt::test]
    async fn http_call_success_updates_metrics_and_log() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/run")
            .match_body(mockito::Matcher::Json(json!({"text": "hello world"})))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"summary": "hello"}"#)
            .create_async()
            .await;

        let app = init_app!(create_test_app_state(create_test_config(None)).await);
        let agent = register!(&app, register_body(&format!("{}/run", server.url())));

        let call = json!({"agent_id": agent["id"], "payload": {"text": "hello world"}});
        let resp = test::call_service(&app, post("/api/v1/agents/call", &call).to_request()).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let body: Value = test::read_body_json(resp).await;
        mock.assert_async().await;

        assert_eq!(body["data"]["agent_id"], agent["id"]);
        assert_eq!(body["data"]["success"], true);
        assert_eq!(body["data"]["result"], json!({"summary": "hello"}));
        let latency = body["data"]["latency_ms"].as_f64().unwrap();

        let uri = format!("/api/v1/agents/{}", agent["id"]);
        let body: Value = test::read_body_json(test::call_service(&app, get(&uri).to_request()).await).await;
        assert_eq!(body["data"]["total_calls"], 1);
        assert_eq!(body["data"]["successful_calls"], 1);
        assert_eq!(body["data"]["reputation_score"], 1.0);
        assert_eq!(body["data"]["avg_latency"].as_f64().unwrap(), latency);

        let uri = format!("/api/v1/agents/{}/calls", agent["id"]);
        let body: Value = test::read_body_json(test::call_service(&app, get(&uri).to_request()).await).await;
        let logs = body["data"].as_array().unwrap();
        assert_eq!(logs.len(), 1);
        assert_eq!(logs[0]["success"], true);
        assert_eq!(logs[0]["latency_ms"].as_f64().unwrap(), latency);
    }

    #[actix_rt::test]
    async fn http_call_timeout_is_504_and_recorded() {
        let app = init_app!(create_test_app_state(create_test_config(None)).await);
        let mut body = register_body(&silent_endpoint());
        body["max_latency_ms"] = json!(100);
        let agent = register!(&app, body);

        let call = json!({"agent_id": agent["id"], "payload": {}});
        let resp = test::call_service(&app, post("/api/v1/agents/call", &call).to_request()).await;
        assert_eq!(resp.status(), StatusCode::GATEWAY_TIMEOUT);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["error"]["code"], "UPSTREAM_TIMEOUT");
        assert_eq!(body["error"]["message"], "Agent call timed out.");
        assert_eq!(body["error"]["details"]["agent_id"], agent["id"]);
        let latency = body["error"]["details"]["latency_ms"].as_f64().unwrap();
        assert!(latency >= 50.0);

        let uri = format!("/api/v1/agents/{}", agent["id"]);
        let body: Value = test::read_body_json(test::call_service(&app, get(&uri).to_request()).await).await;
        assert_eq!(body["data"]["total_calls"], 1);
        assert_eq!(body["data"]["failed_calls"], 1);
        assert_eq!(body["data"]["successful_calls"], 0);
        assert_eq!(body["data"]["avg_latency"].as_f64().unwrap(), latency);
    }

    #[actix_rt::test]
    async fn http_call_upstream_failures_are_502() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/error")
            .with_status(500)
            .create_async()
            .await;
        server
            .mock("POST", "/text")
            .with_status(200)
            .with_body("plain text")
            .create_async()
            .await;

        let app = init_app!(create_test_app_state(create_test_config(None)).await);
        let cases = [
            (format!("{}/error", server.url()), "UPSTREAM_HTTP_ERROR", "Agent returned HTTP 500."),
            (
                format!("{}/text", server.url()),
                "UPSTREAM_INVALID_RESPONSE",
                "Agent returned a non-JSON response.",
            ),
            (closed_endpoint(), "UPSTREAM_UNREACHABLE", "Failed to reach agent endpoint."),
        ];

        for (endpoint, code, message) in cases {
            let agent = register!(&app, register_body(&endpoint));
            let call = json!({"agent_id": agent["id"]});
            let resp = test::call_service(&app, post("/api/v1/agents/call", &call).to_request()).await;
            assert_eq!(resp.status(), StatusCode::BAD_GATEWAY, "endpoint {endpoint}");
            let body: Value = test::read_body_json(resp).await;
            assert_eq!(body["error"]["code"], code);
            assert_eq!(body["error"]["message"], message);

            let uri = format!("/api/v1/agents/{}/calls", agent["id"]);
            let body: Value = test::read_body_json(test::call_service(&app, get(&uri).to_request()).await).await;
            assert_eq!(body["data"][0]["success"], false);
            assert_eq!(body["data"][0]["error_message"], message);
        }
    }

    #[actix_rt::test]
    async fn http_call_and_report_unknown_agent_is_404() {
        let app = init_app!(create_test_app_state(create_test_config(None)).await);

        let resp = test::call_service(
            &app,
            post("/api/v1/agents/call", &json!({"agent_id": 999, "payload": {}})).to_request(),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["error"]["code"], "NOT_FOUND");

        let resp = test::call_service(
            &app,
            post("/api/v1/agents/report", &json!({"agent_id": 999, "success": true})).to_request(),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);

        let resp = test::call_service(&app, get("/api/v1/agents/999").to_request()).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);

        let resp = test::call_service(
            &app,
            post("/api/v1/agents/call", &json!({"agent_id": 0})).to_request(),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);

        let resp = test::call_service(
            &app,
            post("/api/v1/agents/call", &json!({"agent_id": 999, "payload": [1, 2]})).to_request(),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
    }

    // =========================================================================
    // Reports and deletion
    // =========================================================================

    #[actix_rt::test]
    async fn http_three_reports_update_reputation() {
        let app = init_app!(create_test_app_state(create_test_config(None)).await);
        let agent = register!(&app, register_body("http://127.0.0.1:9001/run"));

        let mut last = Value::Null;
        for success in [true, true, false] {
            let report = json!({"agent_id": agent["id"], "success": success});
            let resp = test::call_service(&app, post("/api/v1/agents/report", &report).to_request()).await;
            assert_eq!(resp.status(), StatusCode::OK);
            let body: Value = test::read_body_json(resp).await;
            last = body["data"].clone();
        }

        assert_eq!(last["total_calls"], 3);
        assert_eq!(last["successful_calls"], 2);
        assert_eq!(last["failed_calls"], 1);
        assert!((last["reputation_score"].as_f64().unwrap() - 2.0 / 3.0).abs() < 1e-9);
        assert_eq!(last["avg_latency"], 0.0);
    }

    #[actix_rt::test]
    async fn http_delete_removes_agent_and_history() {
        let app = init_app!(create_test_app_state(create_test_config(None)).await);
        let agent = register!(&app, register_body("http://127.0.0.1:9001/run"));
        let report = json!({"agent_id": agent["id"], "success": true});
        test::call_service(&app, post("/api/v1/agents/report", &report).to_request()).await;

        let uri = format!("/api/v1/agents/{}", agent["id"]);
        let resp = test::call_service(&app, delete(&uri).to_request()).await;
        assert_eq!(resp.status(), StatusCode::NO_CONTENT);
        let body = test::read_body(resp).await;
        assert!(body.is_empty());

        let resp = test::call_service(&app, get(&uri).to_request()).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        let resp = test::call_service(&app, get(&format!("{uri}/calls")).to_request()).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        let resp = test::call_service(&app, delete(&uri).to_request()).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[actix_rt::test]
    async fn http_non_numeric_agent_id_is_422() {
        let app = init_app!(create_test_app_state(create_test_config(None)).await);

        let resp = test::call_service(&app, get("/api/v1/agents/abc").to_request()).await;
        assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    // =========================================================================
    // Authentication and rate limiting
    // =========================================================================

    #[actix_rt::test]
    async fn http_missing_or_wrong_key_is_401() {
        let app = init_app!(create_test_app_state(create_test_config(None)).await);

        let req = test::TestRequest::get().uri("/api/v1/agents/search").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["error"]["code"], "UNAUTHORIZED");
        assert_eq!(body["error"]["message"], "Invalid or missing API key.");

        let req = test::TestRequest::post()
            .uri("/api/v1/agents/register")
            .insert_header(("X-API-Key", "wrong-key"))
            .set_json(register_body("http://127.0.0.1:9001/run"))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    }

    #[actix_rt::test]
    async fn http_rate_limit_returns_429_with_retry_after() {
        let app = init_app!(create_test_app_state(create_test_config(Some(2))).await);

        for _ in 0..2 {
            let resp = test::call_service(&app, get("/api/v1/agents/search").to_request()).await;
            assert_eq!(resp.status(), StatusCode::OK);
        }

        let resp = test::call_service(&app, get("/api/v1/agents/search").to_request()).await;
        assert_eq!(resp.status(), StatusCode::TOO_MANY_REQUESTS);
        let retry_after: u64 = resp
            .headers()
            .get("Retry-After")
            .expect("Retry-After header")
            .to_str()
            .unwrap()
            .parse()
            .unwrap();
        assert!((1..=60).contains(&retry_after));
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["error"]["code"], "RATE_LIMITED");
        assert_eq!(body["error"]["message"], "Rate limit exceeded.");

        // Rejected keys never reach the limiter.
        let req = test::TestRequest::get()
            .uri("/api/v1/agents/search")
            .insert_header(("X-API-Key", "wrong-key"))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    }

    #[actix_rt::test]
    async fn http_injected_rate_limiter_is_shared_between_apps() {
        let limiter = RateLimiterService::new(RateLimitConfig {
            max_requests: 2,
            window_secs: 60,
        });

        let mut apps = Vec::new();
        for _ in 0..2 {
            let store = Arc::new(memory_store().await);
            let proxy = CallProxy::new("agenthub-test").expect("client should build");
            let state = AppState::new(create_test_config(None), AgentRegistryService::new(store, proxy))
                .with_rate_limiter(limiter.clone());
            apps.push(init_app!(web::Data::new(state)));
        }

        // One admission on each app exhausts the shared quota.
        for app in &apps {
            let resp = test::call_service(app, get("/api/v1/agents/search").to_request()).await;
            assert_eq!(resp.status(), StatusCode::OK);
        }
        for app in &apps {
            let resp = test::call_service(app, get("/api/v1/agents/search").to_request()).await;
            assert_eq!(resp.status(), StatusCode::TOO_MANY_REQUESTS);
        }
    }

    #[actix_rt::test]
    async fn http_health_needs_no_key() {
        let app = init_app!(create_test_app_state(create_test_config(Some(1))).await);

        for uri in ["/health", "/api/v1/health", "/health"] {
            let req = test::TestRequest::get().uri(uri).to_request();
            let resp = test::call_service(&app, req).await;
            assert_eq!(resp.status(), StatusCode::OK);
            let body: Value = test::read_body_json(resp).await;
            assert_eq!(body, json!({"status": "ok"}));
        }
    }
}
