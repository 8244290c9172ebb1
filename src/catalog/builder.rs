//! 模型目录构建
//!
//! 并发查询所有提供方的模型列表，等待全部完成后合并为一张路由表。
//! 单个提供方失败只会让它贡献零个模型，不影响整体构建。

use std::time::Instant;

use futures::future::join_all;

use crate::config::{ModelSource, ProviderDescriptor};
use crate::upstream::{DiscoveryError, UpstreamClient};

use super::normalize::normalize_model_list;
use super::table::{ModelEntry, RoutingTable};

pub struct CatalogBuilder {
    client: UpstreamClient,
}

impl CatalogBuilder {
    pub fn new(client: UpstreamClient) -> Self {
        Self { client }
    }

    /// 构建路由表，本身不会失败
    ///
    /// 所有查询先全部发出再统一等待；结果按注册表声明顺序合并，
    /// 模型 ID 冲突时先声明的提供方胜出。
    pub async fn build(&self, providers: &[ProviderDescriptor]) -> RoutingTable {
        let started = Instant::now();
        let outcomes = join_all(providers.iter().map(|p| self.discover(p))).await;

        let mut table = RoutingTable::new();
        let mut failed = 0;

        for (provider, outcome) in providers.iter().zip(outcomes) {
            let model_ids = match outcome {
                Ok(ids) => ids,
                Err(e) => {
                    failed += 1;
                    tracing::warn!(provider = %provider.id, error = %e, "模型发现失败，跳过该提供方");
                    continue;
                }
            };

            tracing::info!(provider = %provider.id, models = model_ids.len(), "提供方模型已加载");

            for model_id in model_ids {
                let entry = ModelEntry::new(model_id, provider);
                if !table.register(entry) {
                    tracing::debug!(provider = %provider.id, "模型 ID 已被先声明的提供方占用，忽略");
                }
            }
        }

        if table.is_empty() {
            tracing::warn!("所有提供方均未返回模型，路由表为空");
        }

        tracing::info!(
            models = table.len(),
            providers = providers.len(),
            failed,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "模型目录构建完成"
        );

        table
    }

    async fn discover(&self, provider: &ProviderDescriptor) -> Result<Vec<String>, DiscoveryError> {
        match provider.model_source() {
            ModelSource::Static(models) => Ok(models.to_vec()),
            ModelSource::Dynamic(path) => {
                let body = self.client.fetch_models(provider, path).await?;
                Ok(normalize_model_list(&body))
            }
            ModelSource::Missing => {
                tracing::warn!(provider = %provider.id, "提供方既无静态模型列表也无 modelsPath");
                Ok(Vec::new())
            }
        }
    }
}
