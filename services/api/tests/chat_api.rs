//! Router-level tests for the tutor API.
//!
//! Each test builds a fresh router around a scripted model client, so no
//! network access or credentials are needed.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use serde_json::{Value, json};
use tower::ServiceExt;

use tutor_api::config::{Config, Provider};
use tutor_api::router::create_router;
use tutor_api::state::AppState;
use tutor_core::llm_client::{LLMClient, ModelRequest};
use tutor_core::tutor::{DEFAULT_SESSION, TutorService};

// =============================================================================
// Helpers
// =============================================================================

/// Replays canned replies in order and records every request it receives.
struct ScriptedClient {
    replies: Mutex<VecDeque<anyhow::Result<String>>>,
    requests: Mutex<Vec<ModelRequest>>,
}

impl ScriptedClient {
    fn new(replies: Vec<anyhow::Result<String>>) -> Arc<Self> {
        Arc::new(Self {
            replies: Mutex::new(replies.into()),
            requests: Mutex::new(Vec::new()),
        })
    }

    fn requests(&self) -> Vec<ModelRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl LLMClient for ScriptedClient {
    async fn complete(&self, request: ModelRequest) -> anyhow::Result<String> {
        self.requests.lock().unwrap().push(request);
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(anyhow::anyhow!("no scripted reply left")))
    }
}

fn valid_reply() -> String {
    json!({
        "explanation": [
            {"title": "Overview", "content": "A class is a blueprint for objects."},
            {"title": "Analogy", "content": "A cookie cutter and its cookies."},
            {"title": "Progressive Explanation", "content": "Fields, methods, constructors."},
            {"title": "Relationships", "content": "Objects, inheritance, interfaces."},
            {"title": "Practical Examples", "content": "class Dog { String name; }"},
            {"title": "Technical Details", "content": "Loaded by the class loader."}
        ],
        "verification": {
            "summaryPrompt": "In your own words, what is a class?",
            "followUpQuestions": [
                "What is an object?",
                "What does a constructor do?",
                "How does inheritance work?"
            ]
        }
    })
    .to_string()
}

fn test_config() -> Config {
    Config {
        bind_address: "127.0.0.1:8000".parse().unwrap(),
        provider: Provider::Gemini,
        api_key: "test-key".to_string(),
        chat_model: "gemini-2.5-flash-lite".to_string(),
        log_level: tracing::Level::INFO,
        history_limit: 6,
        max_sessions: 1000,
        session_idle_ttl: std::time::Duration::from_secs(3600),
        subject: "Java".to_string(),
        prompts_path: None,
    }
}

fn make_app(client: Arc<ScriptedClient>) -> (axum::Router, Arc<TutorService>) {
    let limits = test_config().store_limits();
    let tutor = Arc::new(TutorService::new(client, "system".to_string(), limits));
    let state = Arc::new(AppState {
        tutor: tutor.clone(),
        config: Arc::new(test_config()),
    });
    (create_router(state), tutor)
}

fn post_chat(body: Value) -> Request<Body> {
    Request::post("/chat")
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

// =============================================================================
// GET /
// =============================================================================

#[tokio::test]
async fn root_returns_welcome_message() {
    let (app, _) = make_app(ScriptedClient::new(vec![]));

    let response = app
        .oneshot(Request::get("/").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    let message = body["message"].as_str().unwrap();
    assert!(message.contains("Java"));
    assert!(message.contains("/swagger-ui"));
}

#[tokio::test]
async fn openapi_document_lists_chat_route() {
    let (app, _) = make_app(ScriptedClient::new(vec![]));

    let response = app
        .oneshot(
            Request::get("/api-docs/openapi.json")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert!(body["paths"]["/chat"]["post"].is_object());
}

// =============================================================================
// POST /chat
// =============================================================================

#[tokio::test]
async fn chat_returns_structured_response() {
    let client = ScriptedClient::new(vec![Ok(valid_reply())]);
    let (app, tutor) = make_app(client.clone());

    let response = app
        .oneshot(post_chat(json!({"message": "What is a class?"})))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["explanation"].as_array().unwrap().len(), 6);
    assert_eq!(body["explanation"][0]["title"], "Overview");
    assert_eq!(
        body["verification"]["followUpQuestions"][1],
        "What does a constructor do?"
    );
    assert_eq!(client.requests()[0].message, "What is a class?");
    assert_eq!(tutor.store().snapshot(DEFAULT_SESSION).await.len(), 2);
}

#[tokio::test]
async fn chat_strips_code_fences() {
    let client = ScriptedClient::new(vec![Ok(format!("```json\n{}\n```", valid_reply()))]);
    let (app, _) = make_app(client);

    let response = app
        .oneshot(post_chat(json!({"message": "What is a class?"})))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn chat_rejects_non_json_reply_with_bad_gateway() {
    let client = ScriptedClient::new(vec![Ok("I can only help with Java.".to_string())]);
    let (app, tutor) = make_app(client);

    let response = app
        .oneshot(post_chat(json!({"message": "Who won the match?"})))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    let body = body_json(response).await;
    assert!(body["detail"].as_str().unwrap().contains("not valid JSON"));
    assert!(tutor.store().snapshot(DEFAULT_SESSION).await.is_empty());
}

#[tokio::test]
async fn chat_reports_wrong_shape_as_internal_error() {
    let client = ScriptedClient::new(vec![Ok(r#"{"explanation": []}"#.to_string())]);
    let (app, _) = make_app(client);

    let response = app
        .oneshot(post_chat(json!({"message": "What is a class?"})))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = body_json(response).await;
    assert!(body["detail"].is_string());
}

#[tokio::test]
async fn chat_reports_model_failure_with_cause() {
    let client = ScriptedClient::new(vec![Err(anyhow::anyhow!("quota exceeded"))]);
    let (app, _) = make_app(client);

    let response = app
        .oneshot(post_chat(json!({"message": "What is a class?"})))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = body_json(response).await;
    assert!(body["detail"].as_str().unwrap().contains("quota exceeded"));
}

#[tokio::test]
async fn chat_rejects_empty_message() {
    let client = ScriptedClient::new(vec![]);
    let (app, _) = make_app(client.clone());

    let response = app
        .oneshot(post_chat(json!({"message": "  "})))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(client.requests().is_empty());
}

#[tokio::test]
async fn chat_rejects_body_without_message() {
    let (app, _) = make_app(ScriptedClient::new(vec![]));

    let response = app.oneshot(post_chat(json!({}))).await.unwrap();

    assert!(response.status().is_client_error());
}

#[tokio::test]
async fn chat_keeps_sessions_apart() {
    let client = ScriptedClient::new(vec![Ok(valid_reply()), Ok(valid_reply())]);
    let (app, tutor) = make_app(client.clone());

    let first = app
        .clone()
        .oneshot(post_chat(json!({"message": "What is a class?", "session_id": "a"})))
        .await
        .unwrap();
    assert_eq!(first.status(), StatusCode::OK);

    let second = app
        .oneshot(post_chat(json!({"message": "What is a record?", "session_id": "b"})))
        .await
        .unwrap();
    assert_eq!(second.status(), StatusCode::OK);

    let requests = client.requests();
    assert!(requests[1].history.is_empty());
    assert_eq!(tutor.store().snapshot("a").await.len(), 2);
    assert_eq!(tutor.store().snapshot("b").await.len(), 2);
    assert!(tutor.store().snapshot(DEFAULT_SESSION).await.is_empty());
}

#[tokio::test]
async fn failed_chats_with_fresh_session_ids_store_nothing() {
    // Every scripted reply is exhausted, so each call fails upstream.
    let client = ScriptedClient::new(vec![Ok("not json".to_string())]);
    let (app, tutor) = make_app(client.clone());

    for i in 0..20 {
        let response = app
            .clone()
            .oneshot(post_chat(
                json!({"message": "What is a class?", "session_id": format!("s-{i}")}),
            ))
            .await
            .unwrap();
        assert!(response.status().is_server_error());
    }

    assert_eq!(client.requests().len(), 20);
    assert_eq!(tutor.store().session_count().await, 0);
}
