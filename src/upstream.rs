//! 上游 HTTP 客户端
//!
//! 所有出站请求共用一个 reqwest Client，并统一附加固定的请求头
//! （部分上游会校验 Origin/Referer 与 User-Agent）。

use std::time::Duration;

use bytes::Bytes;
use reqwest::header::{ACCEPT, CONTENT_TYPE, ORIGIN, REFERER, USER_AGENT};
use reqwest::{Client, Proxy, RequestBuilder, StatusCode};
use serde_json::Value;

use crate::catalog::ModelEntry;
use crate::config::{ProviderDescriptor, UpstreamConfig};

/// 模型发现失败原因
#[derive(Debug)]
pub enum DiscoveryError {
    Transport(reqwest::Error),
    Status(StatusCode),
    Decode(reqwest::Error),
}

impl std::fmt::Display for DiscoveryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DiscoveryError::Transport(e) => write!(f, "请求失败: {}", e),
            DiscoveryError::Status(status) => write!(f, "上游返回非成功状态: {}", status),
            DiscoveryError::Decode(e) => write!(f, "响应不是合法 JSON: {}", e),
        }
    }
}

impl std::error::Error for DiscoveryError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            DiscoveryError::Transport(e) | DiscoveryError::Decode(e) => Some(e),
            DiscoveryError::Status(_) => None,
        }
    }
}

/// 共享的上游客户端
#[derive(Clone)]
pub struct UpstreamClient {
    http: Client,
    default_origin: Option<String>,
    user_agent: String,
    discovery_timeout: Duration,
}

impl UpstreamClient {
    pub fn new(config: &UpstreamConfig) -> anyhow::Result<Self> {
        let mut builder =
            Client::builder().connect_timeout(Duration::from_secs(config.connect_timeout_secs));

        // 只使用显式配置的代理，不读取环境变量
        builder = match &config.proxy_url {
            Some(url) => builder.proxy(Proxy::all(url)?),
            None => builder.no_proxy(),
        };

        Ok(Self {
            http: builder.build()?,
            default_origin: config.origin.clone(),
            user_agent: config.user_agent.clone(),
            discovery_timeout: Duration::from_secs(config.discovery_timeout_secs),
        })
    }

    /// Origin 解析顺序：提供方覆盖 → 全局配置 → 上游自身地址
    fn resolve_origin(&self, provider_origin: Option<&str>, base_url: String) -> String {
        provider_origin
            .map(str::to_string)
            .or_else(|| self.default_origin.clone())
            .unwrap_or(base_url)
    }

    fn with_browser_headers(&self, request: RequestBuilder, origin: String) -> RequestBuilder {
        let referer = format!("{}/", origin.trim_end_matches('/'));
        request
            .header(ORIGIN, origin)
            .header(REFERER, referer)
            .header(USER_AGENT, &self.user_agent)
    }

    /// GET 提供方模型列表并解析为 JSON
    pub async fn fetch_models(
        &self,
        provider: &ProviderDescriptor,
        path: &str,
    ) -> Result<Value, DiscoveryError> {
        let url = provider.url(path);
        let origin = self.resolve_origin(provider.origin.as_deref(), provider.base_url());

        tracing::debug!(provider = %provider.id, url = %url, "拉取模型列表");

        let request = self
            .http
            .get(&url)
            .timeout(self.discovery_timeout)
            .header(ACCEPT, "application/json");
        let response = self
            .with_browser_headers(request, origin)
            .send()
            .await
            .map_err(DiscoveryError::Transport)?;

        let status = response.status();
        if !status.is_success() {
            return Err(DiscoveryError::Status(status));
        }

        response.json::<Value>().await.map_err(DiscoveryError::Decode)
    }

    /// POST 聊天请求，请求体原样转发
    ///
    /// 不设置总超时，流式响应可能持续很久；仅受连接超时约束。
    pub async fn post_chat(
        &self,
        entry: &ModelEntry,
        body: Bytes,
    ) -> Result<reqwest::Response, reqwest::Error> {
        let origin = self.resolve_origin(entry.origin.as_deref(), entry.base_url());
        let request = self
            .http
            .post(entry.chat_url())
            .header(CONTENT_TYPE, "application/json")
            .header(ACCEPT, "text/event-stream, application/json")
            .body(body);

        self.with_browser_headers(request, origin).send().await
    }
}
