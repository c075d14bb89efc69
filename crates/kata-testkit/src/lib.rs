//! Fake `generateContent` endpoint for tests.
//!
//! The server runs on its own thread and runtime, so it can back both
//! `#[tokio::test]` cases and blocking CLI tests.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::{Json, Router};
use serde_json::{Value, json};

/// Canned answer of the fake endpoint.
#[derive(Debug, Clone)]
pub enum Reply {
    /// Respond with a status and JSON body.
    Json(u16, Value),
    /// Hold the request open before answering.
    Stall(Duration),
}

impl Reply {
    /// A successful answer whose only candidate carries `text`.
    pub fn text(text: &str) -> Self {
        Reply::Json(
            200,
            json!({
                "candidates": [{
                    "content": {"parts": [{"text": text}], "role": "model"},
                    "finishReason": "STOP"
                }]
            }),
        )
    }

    /// An error envelope as the API sends it.
    pub fn error(status: u16, message: &str) -> Self {
        Reply::Json(status, json!({"error": {"code": status, "message": message}}))
    }
}

/// A request the endpoint received.
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub path: String,
    pub query: Option<String>,
    pub api_key: Option<String>,
    pub body: Value,
}

#[derive(Default)]
struct Script {
    replies: VecDeque<Reply>,
    last: Option<Reply>,
    requests: Vec<RecordedRequest>,
}

type Shared = Arc<Mutex<Script>>;

/// Running fake endpoint. Replies are served in order and the last one repeats.
pub struct FakeGemini {
    url: String,
    script: Shared,
}

impl FakeGemini {
    pub fn start(replies: Vec<Reply>) -> Self {
        let script: Shared = Arc::new(Mutex::new(Script {
            replies: replies.into(),
            ..Script::default()
        }));

        let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("bind fake endpoint");
        listener.set_nonblocking(true).expect("non-blocking listener");
        let url = format!("http://{}", listener.local_addr().expect("local address"));

        let app = Router::new().fallback(handle).with_state(script.clone());
        thread::spawn(move || {
            let runtime = tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
                .expect("fake endpoint runtime");
            runtime.block_on(async move {
                let listener =
                    tokio::net::TcpListener::from_std(listener).expect("tokio listener");
                axum::serve(listener, app).await.expect("serve fake endpoint");
            });
        });

        Self { url, script }
    }

    /// Base URL to put into `model.endpoint`.
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Requests received so far, oldest first.
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.script.lock().expect("script lock").requests.clone()
    }
}

async fn handle(State(script): State<Shared>, uri: Uri, headers: HeaderMap, body: Bytes) -> Response {
    let reply = {
        let mut script = script.lock().expect("script lock");
        script.requests.push(RecordedRequest {
            path: uri.path().to_string(),
            query: uri.query().map(str::to_string),
            api_key: headers
                .get("x-goog-api-key")
                .and_then(|v| v.to_str().ok())
                .map(str::to_string),
            body: serde_json::from_slice(&body).unwrap_or(Value::Null),
        });
        let next = script.replies.pop_front().or_else(|| script.last.clone());
        script.last = next.clone();
        next
    };

    match reply {
        Some(Reply::Json(status, body)) => {
            let status = StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
            (status, Json(body)).into_response()
        }
        Some(Reply::Stall(delay)) => {
            tokio::time::sleep(delay).await;
            StatusCode::GATEWAY_TIMEOUT.into_response()
        }
        None => (StatusCode::NOT_FOUND, "no reply scripted").into_response(),
    }
}
