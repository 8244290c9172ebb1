//! 模型目录生命周期
//!
//! 路由表是进程内唯一的共享可变状态：`Unbuilt → Building → Ready`。
//! 构建在独立任务中执行，构建期间到达的请求共享同一个构建句柄，
//! 保证每个进程只进行一轮模型发现；构建任务崩溃时由监督任务把状态重置为 Unbuilt。

use std::sync::Arc;

use futures::FutureExt;
use futures::future::{BoxFuture, Shared};
use parking_lot::Mutex;

use crate::config::ProviderDescriptor;

use super::builder::CatalogBuilder;
use super::table::RoutingTable;

/// 构建中的共享句柄，构建任务异常退出时输出 None
type PendingBuild = Shared<BoxFuture<'static, Option<Arc<RoutingTable>>>>;

enum CatalogState {
    Unbuilt,
    Building(PendingBuild),
    Ready(Arc<RoutingTable>),
}

/// 目录所处阶段
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CatalogPhase {
    Unbuilt,
    Building,
    Ready,
}

pub struct Catalog {
    providers: Arc<[ProviderDescriptor]>,
    builder: Arc<CatalogBuilder>,
    state: Arc<Mutex<CatalogState>>,
}

impl Catalog {
    pub fn new(providers: Vec<ProviderDescriptor>, builder: CatalogBuilder) -> Self {
        Self {
            providers: providers.into(),
            builder: Arc::new(builder),
            state: Arc::new(Mutex::new(CatalogState::Unbuilt)),
        }
    }

    pub fn providers(&self) -> &[ProviderDescriptor] {
        &self.providers
    }

    pub fn phase(&self) -> CatalogPhase {
        match &*self.state.lock() {
            CatalogState::Unbuilt => CatalogPhase::Unbuilt,
            CatalogState::Building(_) => CatalogPhase::Building,
            CatalogState::Ready(_) => CatalogPhase::Ready,
        }
    }

    /// 已就绪的路由表，不触发构建
    pub fn snapshot(&self) -> Option<Arc<RoutingTable>> {
        match &*self.state.lock() {
            CatalogState::Ready(table) => Some(table.clone()),
            _ => None,
        }
    }

    /// 未构建时在后台启动构建，立即返回
    pub fn warm(&self) {
        let _ = self.pending();
    }

    /// 等待路由表就绪；构建任务异常退出时返回 None
    pub async fn ready(&self) -> Option<Arc<RoutingTable>> {
        match self.pending() {
            Ok(table) => Some(table),
            Err(pending) => pending.await,
        }
    }

    /// 就绪时返回路由表，否则返回（必要时新建的）构建句柄
    fn pending(&self) -> Result<Arc<RoutingTable>, PendingBuild> {
        let mut state = self.state.lock();
        match &*state {
            CatalogState::Ready(table) => Ok(table.clone()),
            CatalogState::Building(pending) => Err(pending.clone()),
            CatalogState::Unbuilt => {
                tracing::info!(providers = self.providers.len(), "开始构建模型目录");
                let pending = self.spawn_build(self.build_future());
                *state = CatalogState::Building(pending.clone());
                Err(pending)
            }
        }
    }

    fn build_future(&self) -> BoxFuture<'static, RoutingTable> {
        let providers = self.providers.clone();
        let builder = self.builder.clone();
        async move { builder.build(&providers).await }.boxed()
    }

    /// 构建与结果回写各占一个任务，状态迁移不依赖是否有人等待句柄。
    /// 调用方需持有状态锁，直到新句柄写入状态。
    fn spawn_build(&self, build: BoxFuture<'static, RoutingTable>) -> PendingBuild {
        let state = self.state.clone();
        let handle = tokio::spawn(build);

        let supervisor = tokio::spawn(async move {
            match handle.await {
                Ok(table) => {
                    let table = Arc::new(table);
                    *state.lock() = CatalogState::Ready(table.clone());
                    Some(table)
                }
                Err(e) => {
                    tracing::error!("模型目录构建任务异常退出: {}", e);
                    *state.lock() = CatalogState::Unbuilt;
                    None
                }
            }
        });

        async move { supervisor.await.ok().flatten() }
            .boxed()
            .shared()
    }
}
