//! 网关错误
//!
//! 每种错误对应一个 HTTP 状态码，响应体为纯文本。

use axum::http::{Method, StatusCode, header};
use axum::response::{IntoResponse, Response};

use super::types::EnvelopeError;

#[derive(Debug)]
pub enum GatewayError {
    MethodNotAllowed(Method),
    Unauthorized,
    BadRequest(String),
    ModelNotFound(String),
    ServiceUnavailable(String),
    BadGateway { model: String, reason: String },
}

impl GatewayError {
    pub fn status(&self) -> StatusCode {
        match self {
            GatewayError::MethodNotAllowed(_) => StatusCode::METHOD_NOT_ALLOWED,
            GatewayError::Unauthorized => StatusCode::UNAUTHORIZED,
            GatewayError::BadRequest(_) => StatusCode::BAD_REQUEST,
            GatewayError::ModelNotFound(_) => StatusCode::NOT_FOUND,
            GatewayError::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            GatewayError::BadGateway { .. } => StatusCode::BAD_GATEWAY,
        }
    }
}

impl std::fmt::Display for GatewayError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GatewayError::MethodNotAllowed(method) => {
                write!(f, "Method {} not allowed, use POST", method)
            }
            GatewayError::Unauthorized => write!(f, "Invalid or missing API key"),
            GatewayError::BadRequest(reason) => write!(f, "Bad request: {}", reason),
            GatewayError::ModelNotFound(model) => write!(f, "Model not found: {}", model),
            GatewayError::ServiceUnavailable(reason) => {
                write!(f, "Service unavailable: {}", reason)
            }
            GatewayError::BadGateway { model, reason } => {
                write!(f, "Upstream request for model {} failed: {}", model, reason)
            }
        }
    }
}

impl std::error::Error for GatewayError {}

impl From<EnvelopeError> for GatewayError {
    fn from(e: EnvelopeError) -> Self {
        match e {
            EnvelopeError::InvalidJson(reason) => {
                GatewayError::BadRequest(format!("body is not valid JSON: {}", reason))
            }
            EnvelopeError::MissingModel => {
                GatewayError::BadRequest("missing \"model\" field".to_string())
            }
        }
    }
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        (
            self.status(),
            [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
            self.to_string(),
        )
            .into_response()
    }
}
