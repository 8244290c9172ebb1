//! 转发记录
//!
//! 每个被路由到上游的聊天请求留下一条记录（模型、提供方、最终状态码），
//! 只保留最近的若干条，供控制台通过 `GET /api/requests` 查看路由结果。
//! 在分发之前就被拒绝的请求（405/401/400/404/503）不记录。

use std::collections::VecDeque;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::Serialize;

/// 默认保留的记录条数
pub const DEFAULT_CAPACITY: usize = 50;

/// 一次分发的结果
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DispatchRecord {
    pub id: String,
    pub dispatched_at: DateTime<Utc>,
    pub model: String,
    pub provider_id: String,
    pub stream: bool,
    /// 上游状态码；连接失败时为 502
    pub status: u16,
}

impl DispatchRecord {
    pub fn new(model: &str, provider_id: &str, stream: bool, status: u16) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            dispatched_at: Utc::now(),
            model: model.to_string(),
            provider_id: provider_id.to_string(),
            stream,
            status,
        }
    }

    pub fn succeeded(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// 定长的转发记录，写满后淘汰最早的一条
pub struct DispatchLog {
    capacity: usize,
    records: Mutex<VecDeque<DispatchRecord>>,
}

impl DispatchLog {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            capacity,
            records: Mutex::new(VecDeque::with_capacity(capacity)),
        }
    }

    pub fn record(&self, record: DispatchRecord) {
        if self.capacity == 0 {
            return;
        }
        let mut records = self.records.lock();
        while records.len() >= self.capacity {
            records.pop_front();
        }
        records.push_back(record);
    }

    /// 最新的在前
    pub fn recent(&self) -> Vec<DispatchRecord> {
        self.records.lock().iter().rev().cloned().collect()
    }
}

impl Default for DispatchLog {
    fn default() -> Self {
        Self::new()
    }
}
