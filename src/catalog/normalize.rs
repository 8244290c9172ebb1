//! 上游模型列表归一化
//!
//! 各提供方返回的模型列表格式不一致，这里按优先级依次尝试已知格式：
//! 1. 顶层数组 `[{"id": ...}]`，缺少 `id` 时回退到 `name`
//! 2. `{"data": [{"id": ...}]}`（OpenAI 风格）
//! 3. `{"models": [{"name": ...}]}`（Ollama 风格）
//!
//! 无法识别的格式得到空列表，缺少目标字段的条目被静默丢弃。

use serde::Deserialize;
use serde_json::Value;

/// 已知的模型列表格式，`untagged` 按声明顺序匹配
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ModelListShape {
    Bare(Vec<Value>),
    Data { data: Vec<Value> },
    Models { models: Vec<Value> },
}

impl ModelListShape {
    fn into_model_ids(self) -> Vec<String> {
        match self {
            ModelListShape::Bare(items) => items
                .iter()
                .filter_map(|item| string_field(item, "id").or_else(|| string_field(item, "name")))
                .collect(),
            ModelListShape::Data { data } => data
                .iter()
                .filter_map(|item| string_field(item, "id"))
                .collect(),
            ModelListShape::Models { models } => models
                .iter()
                .filter_map(|item| string_field(item, "name"))
                .collect(),
        }
    }
}

/// 取对象中的非空字符串字段，非对象条目返回 None
fn string_field(item: &Value, key: &str) -> Option<String> {
    item.get(key)
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// 将任意上游 JSON 归一化为模型 ID 列表，永不失败
pub fn normalize_model_list(body: &Value) -> Vec<String> {
    ModelListShape::deserialize(body)
        .map(ModelListShape::into_model_ids)
        .unwrap_or_default()
}
