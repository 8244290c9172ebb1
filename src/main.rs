mod args;
mod catalog;
mod common;
mod config;
mod console;
mod openai;
mod request_log;
mod upstream;

#[cfg(test)]
mod testing;

use std::sync::Arc;

use anyhow::Context;
use clap::Parser;

use args::Args;
use catalog::{Catalog, CatalogBuilder};
use config::Config;
use request_log::DispatchLog;
use upstream::UpstreamClient;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("modelmux=info")),
        )
        .init();

    let args = Args::parse();

    let mut config = Config::load(&args.config)?;
    if let Some(host) = args.host {
        config.host = host;
    }
    if let Some(port) = args.port {
        config.port = port;
    }

    tracing::info!(
        config = %args.config,
        providers = config.providers.len(),
        prefetch = config.prefetch_catalog,
        proxy = %config.upstream.proxy_url.as_deref().unwrap_or("none"),
        "配置已加载"
    );

    let upstream = UpstreamClient::new(&config.upstream).context("创建上游 HTTP 客户端失败")?;
    let catalog = Arc::new(Catalog::new(
        config.providers.clone(),
        CatalogBuilder::new(upstream.clone()),
    ));

    for provider in catalog.providers() {
        tracing::info!(
            provider = %provider.id,
            url = %provider.url(&provider.chat_path),
            dynamic = provider.models_path.is_some(),
            "已注册提供方"
        );
    }

    if config.prefetch_catalog {
        catalog.warm();
    }

    let app = openai::create_router(
        config.api_key.clone(),
        catalog,
        upstream,
        config.max_body_bytes,
        Some(Arc::new(DispatchLog::new())),
    );

    let addr = config.bind_addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("监听 {} 失败", addr))?;

    tracing::info!("启动 modelmux 服务: http://{}", addr);
    tracing::info!("可用 API:");
    tracing::info!("  GET  /v1/models");
    tracing::info!("  POST /v1/chat/completions");
    tracing::info!("  GET  /  (测试控制台)");

    axum::serve(listener, app).await?;
    Ok(())
}
