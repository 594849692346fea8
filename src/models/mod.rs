//! 数据模型

pub mod auth;
pub mod hr;
pub mod query;

pub use auth::{ForgotPasswordRequest, LoginRequest, ResetPasswordRequest, UserProfile, VerifyRequest};
pub use hr::*;
pub use query::ListQuery;

use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// 将 JSON 字符串或数字规范为字符串 ID，空字符串视为缺失
pub fn id_from_value(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// 反序列化字符串或数字 ID
pub(crate) fn deserialize_id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    id_from_value(&value).ok_or_else(|| serde::de::Error::custom("expected a string or numeric id"))
}

/// 可选 ID 的反序列化
pub(crate) fn deserialize_optional_id<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(id_from_value))
}
