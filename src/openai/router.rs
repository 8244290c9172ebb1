//! OpenAI API 路由配置

use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    extract::{DefaultBodyLimit, State},
    http::{Request, StatusCode, header},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{any, get},
};

use crate::catalog::Catalog;
use crate::common::auth;
use crate::console;
use crate::request_log::DispatchLog;
use crate::upstream::UpstreamClient;

use super::error::GatewayError;
use super::handlers::{AppState, chat_completions, list_models, recent_requests};

/// API Key 认证中间件
async fn auth_middleware(
    State(state): State<AppState>,
    request: Request<Body>,
    next: Next,
) -> Response {
    if auth::is_authorized(request.headers(), &state.api_key) {
        next.run(request).await
    } else {
        GatewayError::Unauthorized.into_response()
    }
}

/// 任意请求到达时确保目录构建已启动（不阻塞）
async fn warm_catalog(State(state): State<AppState>, request: Request<Body>, next: Next) -> Response {
    state.catalog.warm();
    next.run(request).await
}

/// 未匹配的路由
async fn not_found() -> Response {
    (
        StatusCode::NOT_FOUND,
        [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
        "Not Found",
    )
        .into_response()
}

/// CORS 中间件层
fn cors_layer() -> tower_http::cors::CorsLayer {
    use tower_http::cors::{Any, CorsLayer};

    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any)
}

/// 创建网关路由
///
/// # 端点
/// - `GET /v1/models` - 统一模型列表（无需认证，其余方法返回 404）
/// - `POST /v1/chat/completions` - 按模型路由到上游并流式透传
/// - `GET /api/requests` - 最近的转发记录（需要认证）
/// - `GET /` - 测试控制台
///
/// # 认证
/// 聊天与日志端点要求 `Authorization: Bearer <api_key>`，按原文精确比较
///
/// 聊天请求体在认证之后按 `max_body_bytes` 读取
pub fn create_router(
    api_key: impl Into<String>,
    catalog: Arc<Catalog>,
    upstream: UpstreamClient,
    max_body_bytes: usize,
    dispatch_log: Option<Arc<DispatchLog>>,
) -> Router {
    let mut state = AppState::new(api_key, catalog, upstream, max_body_bytes);
    if let Some(log) = dispatch_log {
        state = state.with_dispatch_log(log);
    }

    // 方法与认证校验在 handler 内按顺序进行
    let v1_routes = Router::new()
        .route("/models", get(list_models).fallback(not_found))
        .route(
            "/chat/completions",
            any(chat_completions).layer(DefaultBodyLimit::max(max_body_bytes)),
        );

    let api_routes = Router::new()
        .route("/requests", get(recent_requests))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    Router::new()
        .route("/", get(console::index))
        .route("/console/{*path}", get(console::asset))
        .nest("/v1", v1_routes)
        .nest("/api", api_routes)
        .fallback(not_found)
        .layer(middleware::from_fn_with_state(state.clone(), warm_catalog))
        .layer(cors_layer())
        .with_state(state)
}
