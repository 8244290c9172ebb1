//! API Key 认证

use axum::http::{HeaderMap, header};
use subtle::ConstantTimeEq;

/// 读取原始 Authorization header
pub fn authorization_header(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
}

/// 常量时间字符串比较
pub fn constant_time_eq(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.as_bytes().ct_eq(b.as_bytes()).into()
}

/// Authorization header 必须与 `Bearer <api_key>` 完全一致
pub fn is_authorized(headers: &HeaderMap, api_key: &str) -> bool {
    match authorization_header(headers) {
        Some(value) => constant_time_eq(value, &format!("Bearer {}", api_key)),
        None => false,
    }
}
