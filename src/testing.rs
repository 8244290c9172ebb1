//! 测试用的模拟上游
//!
//! 在 127.0.0.1 随机端口启动一个 axum 服务，提供多种格式的模型列表与聊天端点，
//! 并统计命中次数。

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use axum::{
    Json, Router,
    body::{Body, Bytes},
    extract::{DefaultBodyLimit, State},
    http::{HeaderMap, StatusCode, Uri, header},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use parking_lot::Mutex;
use serde_json::json;

use crate::config::{ProviderDescriptor, UpstreamConfig};
use crate::upstream::UpstreamClient;

/// 上游收到的聊天请求
#[derive(Debug, Clone)]
pub struct SeenChat {
    pub path: String,
    pub body: String,
    pub authorization: Option<String>,
    pub origin: Option<String>,
}

#[derive(Default)]
struct MockState {
    discovery_hits: AtomicUsize,
    chat_hits: AtomicUsize,
    last_chat: Mutex<Option<SeenChat>>,
}

pub struct MockUpstream {
    host: String,
    state: Arc<MockState>,
}

impl MockUpstream {
    pub async fn start() -> Self {
        let state = Arc::new(MockState::default());

        let app = Router::new()
            .route("/data/models", get(data_models))
            .route("/ollama/tags", get(ollama_tags))
            .route("/bare/models", get(bare_models))
            .route("/slow/models", get(slow_models))
            .route("/stalled/models", get(stalled_models))
            .route("/broken/models", get(broken_models))
            .route("/garbage/models", get(garbage_models))
            .route("/chat/sse", post(chat_sse))
            .route("/chat/plain", post(chat_plain))
            .route("/chat/limited", post(chat_limited))
            .layer(DefaultBodyLimit::disable())
            .with_state(state.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            host: addr.to_string(),
            state,
        }
    }

    pub fn host(&self) -> String {
        self.host.clone()
    }

    pub fn client(&self) -> UpstreamClient {
        self.client_with(UpstreamConfig::default())
    }

    pub fn client_with(&self, config: UpstreamConfig) -> UpstreamClient {
        UpstreamClient::new(&config).unwrap()
    }

    pub fn discovery_hits(&self) -> usize {
        self.state.discovery_hits.load(Ordering::SeqCst)
    }

    pub fn chat_hits(&self) -> usize {
        self.state.chat_hits.load(Ordering::SeqCst)
    }

    pub fn total_hits(&self) -> usize {
        self.discovery_hits() + self.chat_hits()
    }

    pub fn last_chat(&self) -> Option<SeenChat> {
        self.state.last_chat.lock().clone()
    }
}

async fn data_models(State(state): State<Arc<MockState>>) -> Response {
    state.discovery_hits.fetch_add(1, Ordering::SeqCst);
    Json(json!({"object": "list", "data": [{"id": "data-model", "object": "model"}]})).into_response()
}

async fn ollama_tags(State(state): State<Arc<MockState>>) -> Response {
    state.discovery_hits.fetch_add(1, Ordering::SeqCst);
    Json(json!({"models": [{"name": "ollama-model", "size": 1}]})).into_response()
}

async fn bare_models(State(state): State<Arc<MockState>>) -> Response {
    state.discovery_hits.fetch_add(1, Ordering::SeqCst);
    Json(json!([{"id": "bare-id"}, {"name": "bare-name"}])).into_response()
}

async fn slow_models(State(state): State<Arc<MockState>>) -> Response {
    state.discovery_hits.fetch_add(1, Ordering::SeqCst);
    tokio::time::sleep(Duration::from_millis(100)).await;
    Json(json!({"data": [{"id": "shared"}]})).into_response()
}

/// 远超测试中发现超时的响应
async fn stalled_models(State(state): State<Arc<MockState>>) -> Response {
    state.discovery_hits.fetch_add(1, Ordering::SeqCst);
    tokio::time::sleep(Duration::from_secs(5)).await;
    Json(json!({"data": [{"id": "stalled-model"}]})).into_response()
}

async fn broken_models(State(state): State<Arc<MockState>>) -> Response {
    state.discovery_hits.fetch_add(1, Ordering::SeqCst);
    (StatusCode::INTERNAL_SERVER_ERROR, "boom").into_response()
}

async fn garbage_models(State(state): State<Arc<MockState>>) -> Response {
    state.discovery_hits.fetch_add(1, Ordering::SeqCst);
    "<html>not json</html>".into_response()
}

fn record_chat(state: &MockState, uri: &Uri, headers: &HeaderMap, body: &Bytes) {
    state.chat_hits.fetch_add(1, Ordering::SeqCst);
    let read = |name: header::HeaderName| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
    };
    *state.last_chat.lock() = Some(SeenChat {
        path: uri.path().to_string(),
        body: String::from_utf8_lossy(body).into_owned(),
        authorization: read(header::AUTHORIZATION),
        origin: read(header::ORIGIN),
    });
}

async fn chat_sse(
    State(state): State<Arc<MockState>>,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    record_chat(&state, &uri, &headers, &body);
    let events = concat!(
        "data: {\"choices\":[{\"delta\":{\"content\":\"Hel\"}}]}\n\n",
        "data: {\"choices\":[{\"delta\":{\"content\":\"lo\"}}]}\n\n",
        "data: [DONE]\n\n",
    );
    (
        [(header::CONTENT_TYPE, "text/event-stream; charset=utf-8")],
        events,
    )
        .into_response()
}

async fn chat_plain(
    State(state): State<Arc<MockState>>,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    record_chat(&state, &uri, &headers, &body);
    Response::new(Body::from("plain body"))
}

async fn chat_limited(
    State(state): State<Arc<MockState>>,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    record_chat(&state, &uri, &headers, &body);
    (
        StatusCode::TOO_MANY_REQUESTS,
        Json(json!({"error": {"type": "rate_limited"}})),
    )
        .into_response()
}

pub fn dynamic_provider(id: &str, host: &str, models_path: &str) -> ProviderDescriptor {
    ProviderDescriptor {
        id: id.to_string(),
        host: host.to_string(),
        chat_path: "/chat/sse".to_string(),
        models: None,
        models_path: Some(models_path.to_string()),
        scheme: "http".to_string(),
        origin: None,
    }
}

pub fn static_provider(id: &str, host: &str, models: &[&str]) -> ProviderDescriptor {
    ProviderDescriptor {
        models_path: None,
        ..dynamic_provider(id, host, "/unused")
    }
    .with_static_models(models)
}

/// 指向已关闭端口的提供方，连接会被立即拒绝
pub fn unreachable_provider(id: &str) -> ProviderDescriptor {
    dynamic_provider(id, "127.0.0.1:1", "/models")
}

impl ProviderDescriptor {
    pub fn with_chat_path(mut self, path: &str) -> Self {
        self.chat_path = path.to_string();
        self
    }

    pub fn with_static_models(mut self, models: &[&str]) -> Self {
        self.models = Some(models.iter().map(|m| m.to_string()).collect());
        self.models_path = None;
        self
    }
}
