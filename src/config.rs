//! 网关配置
//!
//! 从 JSON 配置文件加载监听地址、API 密钥、上游客户端参数以及提供方注册表。

use std::collections::HashSet;
use std::path::Path;

use anyhow::{Context, bail};
use serde::Deserialize;

/// 默认浏览器 User-Agent，部分上游会拒绝非浏览器请求
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
     (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36";

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8990
}

fn default_scheme() -> String {
    "https".to_string()
}

fn default_user_agent() -> String {
    DEFAULT_USER_AGENT.to_string()
}

fn default_connect_timeout() -> u64 {
    10
}

fn default_discovery_timeout() -> u64 {
    30
}

fn default_max_body_bytes() -> usize {
    64 * 1024 * 1024
}

/// 网关配置
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// 调用方必须携带的静态密钥（`Authorization: Bearer <apiKey>`）
    pub api_key: String,

    /// 启动时即在后台构建模型目录
    #[serde(default)]
    pub prefetch_catalog: bool,

    /// 聊天请求体上限（字节），图片等 base64 内容可能很大
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,

    #[serde(default)]
    pub upstream: UpstreamConfig,

    pub providers: Vec<ProviderDescriptor>,
}

/// 上游 HTTP 客户端配置
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpstreamConfig {
    /// 默认 Origin，未设置时使用提供方自身地址
    #[serde(default)]
    pub origin: Option<String>,

    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// 出站代理，支持 http/https/socks5
    #[serde(default)]
    pub proxy_url: Option<String>,

    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,

    /// 单个提供方模型列表请求的超时
    #[serde(default = "default_discovery_timeout")]
    pub discovery_timeout_secs: u64,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            origin: None,
            user_agent: default_user_agent(),
            proxy_url: None,
            connect_timeout_secs: default_connect_timeout(),
            discovery_timeout_secs: default_discovery_timeout(),
        }
    }
}

/// 上游提供方描述，进程生命周期内不可变
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ProviderDescriptor {
    pub id: String,
    pub host: String,
    pub chat_path: String,
    /// 静态模型列表（无需网络请求）
    #[serde(default)]
    pub models: Option<Vec<String>>,
    /// 动态模型列表路径
    #[serde(default)]
    pub models_path: Option<String>,
    #[serde(default = "default_scheme")]
    pub scheme: String,
    /// 覆盖该提供方的 Origin/Referer
    #[serde(default)]
    pub origin: Option<String>,
}

/// 提供方的模型来源
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelSource<'a> {
    Static(&'a [String]),
    Dynamic(&'a str),
    Missing,
}

impl ProviderDescriptor {
    /// 动态路径优先；仅声明静态列表时不访问网络
    pub fn model_source(&self) -> ModelSource<'_> {
        match (&self.models_path, &self.models) {
            (Some(path), _) => ModelSource::Dynamic(path),
            (None, Some(models)) => ModelSource::Static(models),
            (None, None) => ModelSource::Missing,
        }
    }

    pub fn base_url(&self) -> String {
        format!("{}://{}", self.scheme, self.host)
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url(), path)
    }
}

impl Config {
    /// 从文件加载并校验配置
    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("读取配置文件失败: {}", path.display()))?;
        let config: Config = serde_json::from_str(&content)
            .with_context(|| format!("解析配置文件失败: {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.api_key.trim().is_empty() {
            bail!("apiKey 不能为空");
        }
        if self.max_body_bytes == 0 {
            bail!("maxBodyBytes 必须大于 0");
        }
        if self.providers.is_empty() {
            bail!("至少需要配置一个提供方");
        }

        let mut seen = HashSet::new();
        for provider in &self.providers {
            if provider.id.trim().is_empty() {
                bail!("提供方 id 不能为空");
            }
            if !seen.insert(provider.id.as_str()) {
                bail!("提供方 id 重复: {}", provider.id);
            }
            if provider.host.trim().is_empty() {
                bail!("提供方 {} 的 host 不能为空", provider.id);
            }
            if !matches!(provider.scheme.as_str(), "http" | "https") {
                bail!("提供方 {} 的 scheme 无效: {}", provider.id, provider.scheme);
            }
            let paths = std::iter::once(&provider.chat_path).chain(provider.models_path.as_ref());
            for path in paths {
                if !path.starts_with('/') {
                    bail!("提供方 {} 的路径必须以 / 开头: {}", provider.id, path);
                }
            }
        }

        Ok(())
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
