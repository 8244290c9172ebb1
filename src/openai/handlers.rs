//! OpenAI API Handler 函数

use std::sync::Arc;

use axum::{
    body::{Body, to_bytes},
    extract::State,
    http::{HeaderMap, Method},
    response::{IntoResponse, Json, Response},
};

use crate::catalog::{Catalog, CatalogPhase};
use crate::common::auth;
use crate::request_log::{DispatchLog, DispatchRecord};
use crate::upstream::UpstreamClient;

use super::error::GatewayError;
use super::stream::relay_response;
use super::types::{ChatEnvelope, ModelList};

/// 应用状态
#[derive(Clone)]
pub struct AppState {
    pub api_key: String,
    pub catalog: Arc<Catalog>,
    pub upstream: UpstreamClient,
    pub max_body_bytes: usize,
    pub dispatch_log: Option<Arc<DispatchLog>>,
}

impl AppState {
    pub fn new(
        api_key: impl Into<String>,
        catalog: Arc<Catalog>,
        upstream: UpstreamClient,
        max_body_bytes: usize,
    ) -> Self {
        Self {
            api_key: api_key.into(),
            catalog,
            upstream,
            max_body_bytes,
            dispatch_log: None,
        }
    }

    pub fn with_dispatch_log(mut self, log: Arc<DispatchLog>) -> Self {
        self.dispatch_log = Some(log);
        self
    }

    fn record_dispatch(&self, model: &str, provider_id: &str, stream: bool, status: u16) {
        if let Some(log) = &self.dispatch_log {
            log.record(DispatchRecord::new(model, provider_id, stream, status));
        }
    }
}

/// GET /v1/models
///
/// 目录尚未就绪时返回 503，不等待构建
pub async fn list_models(State(state): State<AppState>) -> Result<Json<ModelList>, GatewayError> {
    match state.catalog.snapshot() {
        Some(table) => Ok(Json(ModelList::from_table(&table))),
        None => {
            let reason = match state.catalog.phase() {
                CatalogPhase::Building => "model catalog is still being built",
                _ => "model catalog is not ready",
            };
            Err(GatewayError::ServiceUnavailable(reason.to_string()))
        }
    }
}

/// /v1/chat/completions（任意方法）
///
/// 方法、认证、请求体、模型依次校验，全部通过后才访问上游。
/// 请求体在认证通过后才读取，不受 axum 默认的 2 MiB 提取上限约束。
pub async fn chat_completions(
    State(state): State<AppState>,
    method: Method,
    headers: HeaderMap,
    body: Body,
) -> Response {
    match dispatch_chat(&state, &method, &headers, body).await {
        Ok(response) => response,
        Err(e) => {
            tracing::warn!(status = %e.status(), "聊天请求被拒绝: {}", e);
            e.into_response()
        }
    }
}

async fn dispatch_chat(
    state: &AppState,
    method: &Method,
    headers: &HeaderMap,
    body: Body,
) -> Result<Response, GatewayError> {
    if method != Method::POST {
        return Err(GatewayError::MethodNotAllowed(method.clone()));
    }

    if !auth::is_authorized(headers, &state.api_key) {
        return Err(GatewayError::Unauthorized);
    }

    let body = to_bytes(body, state.max_body_bytes).await.map_err(|e| {
        GatewayError::BadRequest(format!(
            "failed to read body (limit {} bytes): {}",
            state.max_body_bytes, e
        ))
    })?;

    let envelope = ChatEnvelope::from_body(&body)?;

    // 冷启动时首个请求在此等待目录构建完成
    let table = state.catalog.ready().await.ok_or_else(|| {
        GatewayError::ServiceUnavailable("model catalog build failed".to_string())
    })?;

    let entry = table
        .get(&envelope.model)
        .ok_or_else(|| GatewayError::ModelNotFound(envelope.model.clone()))?;

    tracing::info!(
        model = %envelope.model,
        provider = %entry.provider_id,
        stream = envelope.stream,
        bytes = body.len(),
        "Received POST /v1/chat/completions request"
    );

    let upstream = match state.upstream.post_chat(entry, body).await {
        Ok(resp) => resp,
        Err(e) => {
            tracing::error!(model = %envelope.model, provider = %entry.provider_id, "上游 API 调用失败: {}", e);
            let err = GatewayError::BadGateway {
                model: envelope.model.clone(),
                reason: e.to_string(),
            };
            state.record_dispatch(
                &envelope.model,
                &entry.provider_id,
                envelope.stream,
                err.status().as_u16(),
            );
            return Err(err);
        }
    };

    let status = upstream.status();
    if !status.is_success() {
        tracing::warn!(model = %envelope.model, provider = %entry.provider_id, status = %status, "上游返回非成功状态，原样透传");
    }
    state.record_dispatch(
        &envelope.model,
        &entry.provider_id,
        envelope.stream,
        status.as_u16(),
    );

    Ok(relay_response(upstream, &envelope.model))
}

/// GET /api/requests
///
/// 最近的转发记录（最新的在前）
pub async fn recent_requests(State(state): State<AppState>) -> Response {
    let records = state
        .dispatch_log
        .as_ref()
        .map(|log| log.recent())
        .unwrap_or_default();
    Json(records).into_response()
}
