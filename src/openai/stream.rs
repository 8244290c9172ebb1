//! 上游响应流式透传
//!
//! 逐块转发上游响应体（含 SSE），不缓冲完整响应。

use axum::body::Body;
use axum::response::Response;
use futures::TryStreamExt;
use http::{HeaderValue, header};

/// 上游未声明 Content-Type 时的默认值
const DEFAULT_CONTENT_TYPE: &str = "text/event-stream";

/// 将上游响应转换为下游响应
///
/// 透传状态码与 Content-Type，开放 CORS 并禁用缓存；
/// 其余上游响应头不转发。
pub fn relay_response(upstream: reqwest::Response, model: &str) -> Response {
    let status = upstream.status();
    let content_type = upstream
        .headers()
        .get(header::CONTENT_TYPE)
        .cloned()
        .unwrap_or_else(|| HeaderValue::from_static(DEFAULT_CONTENT_TYPE));

    let model = model.to_string();
    let stream = upstream.bytes_stream().inspect_err(move |e| {
        tracing::warn!(model = %model, "读取上游响应流失败: {}", e);
    });

    let mut response = Response::new(Body::from_stream(stream));
    *response.status_mut() = status;

    let headers = response.headers_mut();
    headers.insert(header::CONTENT_TYPE, content_type);
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_ORIGIN,
        HeaderValue::from_static("*"),
    );
    headers.insert(header::CACHE_CONTROL, HeaderValue::from_static("no-cache"));

    response
}
