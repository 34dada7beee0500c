use std::{
    collections::HashMap,
    sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    },
};

use api::{
    core::{app_state::AppState, settings::AppSettings},
    router,
};
use async_trait::async_trait;
use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header},
};
use chat_log_store::{
    InteractionLog, LogStore, NewInteractionLog, SqliteLogStore, StorageError,
    errors::Result as StoreResult,
};
use chrono::{DateTime, Duration, Utc};
use rag_chain::{ChatPipeline, RagAnswer, RagChainError, UsageMetadata};
use serde_json::{Value, json};
use tempfile::TempDir;
use tower::ServiceExt;

/* ---------------------------------------------------------------------------
Fakes
--------------------------------------------------------------------------- */

#[derive(Default)]
struct FakePipeline {
    calls: AtomicUsize,
    forgotten: std::sync::Mutex<Vec<String>>,
    evictions: std::sync::Mutex<Vec<std::time::Duration>>,
    fail: bool,
}

#[async_trait]
impl ChatPipeline for FakePipeline {
    async fn answer_with_usage(
        &self,
        question: &str,
        _session_id: &str,
    ) -> Result<RagAnswer, RagChainError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(RagChainError::SearchStatus {
                status: 401,
                snippet: "invalid api-key secret-123".into(),
            });
        }
        Ok(RagAnswer {
            answer: format!("Respuesta a: {question} 📦"),
            usage: UsageMetadata {
                total_tokens: 150,
                prompt_tokens: 100,
                completion_tokens: 50,
                total_cost_usd: 0.00075,
                successful_requests: 1,
            },
        })
    }

    async fn forget(&self, session_id: &str) -> bool {
        self.forgotten.lock().unwrap().push(session_id.to_string());
        true
    }

    async fn evict_idle(&self, max_idle: std::time::Duration) -> usize {
        self.evictions.lock().unwrap().push(max_idle);
        0
    }
}

/// Delegates to SQLite but fails the calls selected by the flags.
struct FlakyStore {
    inner: SqliteLogStore,
    fail_insert: bool,
    fail_sweep: bool,
}

fn broken() -> StorageError {
    StorageError::Remote {
        status: 500,
        message: "connection refused by db-host.internal".into(),
    }
}

#[async_trait]
impl LogStore for FlakyStore {
    async fn initialize(&self) -> StoreResult<()> {
        self.inner.initialize().await
    }
    async fn insert(&self, record: NewInteractionLog) -> StoreResult<InteractionLog> {
        if self.fail_insert {
            return Err(broken());
        }
        self.inner.insert(record).await
    }
    async fn query_by_session(&self, session_id: &str) -> StoreResult<Vec<InteractionLog>> {
        self.inner.query_by_session(session_id).await
    }
    async fn delete_by_session(&self, session_id: &str) -> StoreResult<u64> {
        self.inner.delete_by_session(session_id).await
    }
    async fn delete_older_than(&self, cutoff: DateTime<Utc>) -> StoreResult<u64> {
        if self.fail_sweep {
            return Err(broken());
        }
        self.inner.delete_older_than(cutoff).await
    }
    async fn count_distinct_sessions(&self) -> StoreResult<u64> {
        self.inner.count_distinct_sessions().await
    }
    fn backend_name(&self) -> &'static str {
        "flaky"
    }
}

/* ---------------------------------------------------------------------------
Harness
--------------------------------------------------------------------------- */

fn settings() -> AppSettings {
    let vars: HashMap<&str, &str> = [
        ("AZURE_OPENAI_ENDPOINT", "https://oai.example"),
        ("AZURE_OPENAI_API_KEY", "k1"),
        ("AZURE_SEARCH_NAME", "kb"),
        ("AZURE_SEARCH_API_KEY", "k2"),
        ("ENVIRONMENT", "test"),
    ]
    .into_iter()
    .collect();
    AppSettings::from_lookup(&|k| vars.get(k).map(|v| v.to_string())).unwrap()
}

struct Harness {
    _dir: TempDir,
    app: Router,
    store: Arc<dyn LogStore>,
    pipeline: Arc<FakePipeline>,
}

async fn harness_with(pipeline: FakePipeline, fail_insert: bool, fail_sweep: bool) -> Harness {
    let dir = tempfile::tempdir().unwrap();
    let inner = SqliteLogStore::new(dir.path().join("chatbot.db"), "logs");
    let store: Arc<dyn LogStore> = Arc::new(FlakyStore {
        inner,
        fail_insert,
        fail_sweep,
    });
    store.initialize().await.unwrap();

    let pipeline = Arc::new(pipeline);
    let state = AppState::new(
        Arc::new(settings()),
        pipeline.clone(),
        Arc::clone(&store),
    );
    Harness {
        _dir: dir,
        app: router(state),
        store,
        pipeline,
    }
}

async fn harness() -> Harness {
    harness_with(FakePipeline::default(), false, false).await
}

async fn send(app: &Router, req: Request<Body>) -> (StatusCode, Value) {
    let res = app.clone().oneshot(req).await.unwrap();
    let status = res.status();
    let bytes = axum::body::to_bytes(res.into_body(), usize::MAX)
        .await
        .unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, body)
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::post(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::get(uri).body(Body::empty()).unwrap()
}

fn delete(uri: &str) -> Request<Body> {
    Request::delete(uri).body(Body::empty()).unwrap()
}

fn record(session: &str, at: DateTime<Utc>) -> NewInteractionLog {
    NewInteractionLog {
        session_id: session.into(),
        total_tokens: 3,
        prompt_tokens: 2,
        completion_tokens: 1,
        total_cost_usd: 0.0,
        user_question: "q".into(),
        llm_answer: "a".into(),
        date_processed: at,
    }
}

/* ---------------------------------------------------------------------------
Chat
--------------------------------------------------------------------------- */

#[tokio::test]
async fn chat_answers_and_logs_one_row() {
    let h = harness().await;
    let before = Utc::now();

    let (status, body) = send(
        &h.app,
        post_json(
            "/api/chat",
            json!({"session_id": "abc", "user_question": "¿Cómo gestiono mi inventario?"}),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let answer = body["llm_answer"].as_str().unwrap();
    assert!(!answer.is_empty());
    assert_eq!(h.pipeline.calls.load(Ordering::SeqCst), 1);

    let rows = h.store.query_by_session("abc").await.unwrap();
    assert_eq!(rows.len(), 1);
    let row = &rows[0];
    assert_eq!(row.user_question, "¿Cómo gestiono mi inventario?");
    assert_eq!(row.llm_answer, answer);
    assert_eq!(row.total_tokens, 150);
    assert_eq!(row.prompt_tokens, 100);
    assert_eq!(row.completion_tokens, 50);
    assert!(row.date_processed >= before - Duration::milliseconds(1));
    assert!(row.date_processed <= Utc::now());

    let (status, body) = send(&h.app, get("/api/chat/history/abc")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["session_id"], "abc");
    assert_eq!(body["logs"].as_array().unwrap().len(), 1);
    assert_eq!(body["logs"][0]["user_question"], "¿Cómo gestiono mi inventario?");
}

#[tokio::test]
async fn chat_rejects_bad_bodies_as_json() {
    let h = harness().await;

    let (status, body) = send(&h.app, post_json("/api/chat", json!({"session_id": "abc"}))).await;
    assert!(status.is_client_error());
    assert!(body["error"].is_string());
    assert!(body["message"].is_string());

    let (status, body) = send(
        &h.app,
        post_json("/api/chat", json!({"session_id": " ", "user_question": "hola"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "BAD_REQUEST");

    let req = Request::post("/api/chat")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let res = h.app.clone().oneshot(req).await.unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    assert!(res.headers().contains_key("x-request-id"));

    assert_eq!(h.pipeline.calls.load(Ordering::SeqCst), 0);
    assert_eq!(h.store.count_distinct_sessions().await.unwrap(), 0);
}

#[tokio::test]
async fn upstream_failure_is_redacted_and_nothing_is_logged() {
    let h = harness_with(
        FakePipeline {
            fail: true,
            ..Default::default()
        },
        false,
        false,
    )
    .await;

    let (status, body) = send(
        &h.app,
        post_json("/api/chat", json!({"session_id": "s", "user_question": "hola"})),
    )
    .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "UPSTREAM_ERROR");
    assert!(!body.to_string().contains("secret-123"));
    assert!(h.store.query_by_session("s").await.unwrap().is_empty());
}

#[tokio::test]
async fn storage_failure_is_redacted() {
    let h = harness_with(FakePipeline::default(), true, false).await;

    let (status, body) = send(
        &h.app,
        post_json("/api/chat", json!({"session_id": "s", "user_question": "hola"})),
    )
    .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "STORAGE_ERROR");
    assert!(!body.to_string().contains("db-host.internal"));
}

#[tokio::test]
async fn background_sweep_failure_does_not_reach_the_client() {
    let h = harness_with(FakePipeline::default(), false, true).await;

    let (status, body) = send(
        &h.app,
        post_json("/api/chat", json!({"session_id": "s", "user_question": "hola"})),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert!(body["llm_answer"].is_string());
    assert_eq!(h.store.query_by_session("s").await.unwrap().len(), 1);
}

#[tokio::test]
async fn background_sweep_removes_expired_rows() {
    let h = harness().await;
    h.store
        .insert(record("old", Utc::now() - Duration::hours(100)))
        .await
        .unwrap();

    let (status, _) = send(
        &h.app,
        post_json("/api/chat", json!({"session_id": "new", "user_question": "hola"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    // The sweep is detached; give it a few chances to finish.
    let mut gone = false;
    for _ in 0..50 {
        if h.store.query_by_session("old").await.unwrap().is_empty() {
            gone = true;
            break;
        }
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
    }
    assert!(gone);
    assert_eq!(h.store.query_by_session("new").await.unwrap().len(), 1);
}

#[tokio::test]
async fn background_sweep_evicts_idle_memory_even_when_the_store_fails() {
    let h = harness_with(FakePipeline::default(), false, true).await;

    let (status, _) = send(
        &h.app,
        post_json("/api/chat", json!({"session_id": "s", "user_question": "hola"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let mut evictions = Vec::new();
    for _ in 0..50 {
        evictions = h.pipeline.evictions.lock().unwrap().clone();
        if !evictions.is_empty() {
            break;
        }
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
    }
    assert_eq!(evictions, vec![std::time::Duration::from_secs(72 * 3600)]);
}

/* ---------------------------------------------------------------------------
History
--------------------------------------------------------------------------- */

#[tokio::test]
async fn unknown_session_history_is_not_found() {
    let h = harness().await;

    let (status, body) = send(&h.app, get("/api/chat/history/nonexistent-session")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "NOT_FOUND");

    let (status, _) = send(&h.app, delete("/api/chat/history/nonexistent-session")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn delete_then_get_is_not_found_and_memory_is_dropped() {
    let h = harness().await;
    for q in ["uno", "dos"] {
        let (status, _) = send(
            &h.app,
            post_json("/api/chat", json!({"session_id": "abc", "user_question": q})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
    }
    h.store.insert(record("other", Utc::now())).await.unwrap();

    let (status, body) = send(&h.app, get("/api/chat/history/abc")).await;
    assert_eq!(status, StatusCode::OK);
    let mut questions: Vec<_> = body["logs"]
        .as_array()
        .unwrap()
        .iter()
        .map(|l| l["user_question"].as_str().unwrap().to_string())
        .collect();
    questions.sort();
    assert_eq!(questions, vec!["dos", "uno"]);

    let (status, body) = send(&h.app, delete("/api/chat/history/abc")).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["message"].as_str().unwrap().contains("abc"));
    assert_eq!(*h.pipeline.forgotten.lock().unwrap(), vec!["abc".to_string()]);

    let (status, _) = send(&h.app, get("/api/chat/history/abc")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(h.store.query_by_session("other").await.unwrap().len(), 1);
}

/* ---------------------------------------------------------------------------
Stats & cleanup
--------------------------------------------------------------------------- */

#[tokio::test]
async fn stats_count_distinct_sessions() {
    let h = harness().await;
    for s in ["a", "a", "b"] {
        h.store.insert(record(s, Utc::now())).await.unwrap();
    }

    let (status, body) = send(&h.app, get("/api/chat/stats")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["active_sessions"], 2);
    assert_eq!(body["service_status"], "healthy");
    assert!(body["timestamp"].as_str().unwrap().parse::<DateTime<Utc>>().is_ok());
}

#[tokio::test]
async fn cleanup_keeps_recent_rows_and_is_idempotent() {
    let h = harness().await;
    let now = Utc::now();
    h.store
        .insert(record("old", now - Duration::hours(100)))
        .await
        .unwrap();
    h.store
        .insert(record("recent", now - Duration::hours(10)))
        .await
        .unwrap();

    for _ in 0..2 {
        let req = Request::post("/api/chat/cleanup?max_age_hours=72")
            .body(Body::empty())
            .unwrap();
        let (status, body) = send(&h.app, req).await;
        assert_eq!(status, StatusCode::OK);
        assert!(body["message"].as_str().unwrap().contains("72"));
    }

    assert!(h.store.query_by_session("old").await.unwrap().is_empty());
    assert_eq!(h.store.query_by_session("recent").await.unwrap().len(), 1);
}

#[tokio::test]
async fn cleanup_defaults_and_validates_the_threshold() {
    let h = harness().await;
    h.store
        .insert(record("two-days", Utc::now() - Duration::hours(48)))
        .await
        .unwrap();

    let (status, body) = send(
        &h.app,
        Request::post("/api/chat/cleanup").body(Body::empty()).unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["message"].as_str().unwrap().contains("72"));
    assert_eq!(h.store.query_by_session("two-days").await.unwrap().len(), 1);

    let (status, body) = send(
        &h.app,
        Request::post("/api/chat/cleanup?max_age_hours=-5")
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "BAD_REQUEST");
}

#[tokio::test]
async fn cleanup_with_age_beyond_calendar_range_succeeds() {
    let h = harness().await;
    h.store
        .insert(record("decade", Utc::now() - Duration::days(3650)))
        .await
        .unwrap();

    let (status, body) = send(
        &h.app,
        Request::post("/api/chat/cleanup?max_age_hours=4000000000")
            .body(Body::empty())
            .unwrap(),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert!(body["message"].as_str().unwrap().contains("4000000000"));
    assert_eq!(h.store.query_by_session("decade").await.unwrap().len(), 1);
}

/* ---------------------------------------------------------------------------
Health & banner
--------------------------------------------------------------------------- */

#[tokio::test]
async fn health_endpoints_and_banner() {
    let h = harness().await;

    let (status, body) = send(&h.app, get("/health")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["service"], "chat-service");

    let (status, body) = send(&h.app, get("/api/health")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["service"], "ai-chatbot-backend");
    assert_eq!(body["environment"], "test");
    assert_eq!(body["version"], "1.0.1");

    let (status, body) = send(&h.app, get("/")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "AI Chatbot API");
    assert_eq!(body["status"], "active");
    assert!(body.get("docs").is_none());
}

#[tokio::test]
async fn api_health_is_unavailable_without_database_url() {
    let dir = tempfile::tempdir().unwrap();
    let mut settings = settings();
    settings.store.database_url = String::new();
    let state = AppState::new(
        Arc::new(settings),
        Arc::new(FakePipeline::default()),
        Arc::new(SqliteLogStore::new(dir.path().join("x.db"), "logs")),
    );

    let (status, body) = send(&router(state), get("/api/health")).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["error"], "SERVICE_UNAVAILABLE");
}

#[tokio::test]
async fn api_health_is_unavailable_when_database_url_has_no_path() {
    let dir = tempfile::tempdir().unwrap();
    let mut settings = settings();
    settings.store.database_url = "sqlite:///".into();
    let state = AppState::new(
        Arc::new(settings),
        Arc::new(FakePipeline::default()),
        Arc::new(SqliteLogStore::new(dir.path().join("x.db"), "logs")),
    );

    let (status, body) = send(&router(state), get("/api/health")).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["error"], "SERVICE_UNAVAILABLE");
}

#[tokio::test]
async fn cors_preflight_allows_configured_origin() {
    let h = harness().await;
    let req = Request::builder()
        .method("OPTIONS")
        .uri("/api/chat")
        .header(header::ORIGIN, "http://localhost:5173")
        .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
        .header(header::ACCESS_CONTROL_REQUEST_HEADERS, "content-type")
        .body(Body::empty())
        .unwrap();
    let res = h.app.clone().oneshot(req).await.unwrap();

    assert_eq!(
        res.headers()
            .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
            .and_then(|v| v.to_str().ok()),
        Some("http://localhost:5173")
    );
    assert_eq!(
        res.headers()
            .get(header::ACCESS_CONTROL_ALLOW_CREDENTIALS)
            .and_then(|v| v.to_str().ok()),
        Some("true")
    );
}
