//! OpenAI API 类型定义

use serde::Serialize;
use serde_json::Value;

use crate::catalog::RoutingTable;

// === 模型列表 ===

/// `GET /v1/models` 响应
#[derive(Debug, Serialize)]
pub struct ModelList {
    pub object: &'static str,
    pub data: Vec<ModelCard>,
}

/// 单个模型条目，`owned_by` 为所属提供方 ID
#[derive(Debug, Serialize)]
pub struct ModelCard {
    pub id: String,
    pub object: &'static str,
    pub owned_by: String,
}

impl ModelList {
    /// 路由表的只读投影
    pub fn from_table(table: &RoutingTable) -> Self {
        Self {
            object: "list",
            data: table
                .iter()
                .map(|entry| ModelCard {
                    id: entry.model_id.clone(),
                    object: "model",
                    owned_by: entry.provider_id.clone(),
                })
                .collect(),
        }
    }
}

// === Chat Completions 请求 ===

/// 从请求体中读取的路由所需字段，请求体本身原样转发
#[derive(Debug)]
pub struct ChatEnvelope {
    pub model: String,
    pub stream: bool,
}

/// 请求体解析错误
#[derive(Debug, PartialEq, Eq)]
pub enum EnvelopeError {
    InvalidJson(String),
    MissingModel,
}

impl ChatEnvelope {
    pub fn from_body(body: &[u8]) -> Result<Self, EnvelopeError> {
        let value: Value =
            serde_json::from_slice(body).map_err(|e| EnvelopeError::InvalidJson(e.to_string()))?;

        let model = value
            .get("model")
            .and_then(Value::as_str)
            .filter(|m| !m.is_empty())
            .ok_or(EnvelopeError::MissingModel)?;

        Ok(Self {
            model: model.to_string(),
            stream: value.get("stream").and_then(Value::as_bool).unwrap_or(false),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::ModelEntry;
    use crate::config::ProviderDescriptor;

    #[test]
    fn test_envelope_reads_model_and_stream() {
        let env = ChatEnvelope::from_body(
            br#"{"model":"gpt-x","stream":true,"messages":[{"role":"user","content":"hi"}]}"#,
        )
        .unwrap();
        assert_eq!(env.model, "gpt-x");
        assert!(env.stream);

        let env = ChatEnvelope::from_body(br#"{"model":"gpt-x"}"#).unwrap();
        assert!(!env.stream);
    }

    #[test]
    fn test_envelope_errors() {
        assert!(matches!(
            ChatEnvelope::from_body(b"not json"),
            Err(EnvelopeError::InvalidJson(_))
        ));
        assert_eq!(
            ChatEnvelope::from_body(br#"{"messages":[]}"#).unwrap_err(),
            EnvelopeError::MissingModel
        );
        assert_eq!(
            ChatEnvelope::from_body(br#"{"model":""}"#).unwrap_err(),
            EnvelopeError::MissingModel
        );
        assert_eq!(
            ChatEnvelope::from_body(br#"{"model":42}"#).unwrap_err(),
            EnvelopeError::MissingModel
        );
        assert_eq!(
            ChatEnvelope::from_body(br#"["model"]"#).unwrap_err(),
            EnvelopeError::MissingModel
        );
    }

    #[test]
    fn test_model_list_projection() {
        let provider = ProviderDescriptor {
            id: "alpha".to_string(),
            host: "a".to_string(),
            chat_path: "/c".to_string(),
            models: None,
            models_path: None,
            scheme: "https".to_string(),
            origin: None,
        };
        let mut table = RoutingTable::new();
        table.register(ModelEntry::new("m-1", &provider));
        table.register(ModelEntry::new("m-2", &provider));

        let json = serde_json::to_value(ModelList::from_table(&table)).unwrap();
        assert_eq!(json["object"], "list");
        assert_eq!(json["data"].as_array().unwrap().len(), 2);
        assert_eq!(json["data"][0]["id"], "m-1");
        assert_eq!(json["data"][0]["object"], "model");
        assert_eq!(json["data"][1]["owned_by"], "alpha");
    }
}
