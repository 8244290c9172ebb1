//! 模型路由表

use std::collections::BTreeMap;
use std::collections::btree_map::Entry;

use crate::config::ProviderDescriptor;

/// 单个模型的分发信息，构建时从所属提供方复制
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelEntry {
    pub model_id: String,
    pub provider_id: String,
    pub scheme: String,
    pub upstream_host: String,
    pub chat_path: String,
    /// 提供方的 Origin 覆盖
    pub origin: Option<String>,
}

impl ModelEntry {
    pub fn new(model_id: impl Into<String>, provider: &ProviderDescriptor) -> Self {
        Self {
            model_id: model_id.into(),
            provider_id: provider.id.clone(),
            scheme: provider.scheme.clone(),
            upstream_host: provider.host.clone(),
            chat_path: provider.chat_path.clone(),
            origin: provider.origin.clone(),
        }
    }

    pub fn base_url(&self) -> String {
        format!("{}://{}", self.scheme, self.upstream_host)
    }

    pub fn chat_url(&self) -> String {
        format!("{}{}", self.base_url(), self.chat_path)
    }
}

/// model_id → ModelEntry 映射
///
/// 由 [`CatalogBuilder`](super::CatalogBuilder) 构建，构建完成后只读。
#[derive(Debug, Default)]
pub struct RoutingTable {
    entries: BTreeMap<String, ModelEntry>,
}

impl RoutingTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// 注册模型；ID 已存在时保留先注册的条目并返回 false
    pub fn register(&mut self, entry: ModelEntry) -> bool {
        match self.entries.entry(entry.model_id.clone()) {
            Entry::Vacant(slot) => {
                slot.insert(entry);
                true
            }
            Entry::Occupied(_) => false,
        }
    }

    pub fn get(&self, model_id: &str) -> Option<&ModelEntry> {
        self.entries.get(model_id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// 按模型 ID 排序遍历
    pub fn iter(&self) -> impl Iterator<Item = &ModelEntry> {
        self.entries.values()
    }
}
