//! OpenAI 兼容 API 模块
//!
//! 对外提供统一的 Chat Completions 与模型列表接口，
//! 按模型 ID 将请求路由到对应的上游提供方。

mod error;
mod handlers;
mod router;
mod stream;
mod types;

pub use router::create_router;
