//! 统一错误模型
//! 定义客户端所有错误类型

use reqwest::StatusCode;
use thiserror::Error;

/// 客户端错误类型
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("HTTP transport error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error ({status}): {message}")]
    Api { status: StatusCode, message: String },

    #[error("Session rejected by server")]
    Unauthorized,

    #[error("Authentication error: {0}")]
    Authentication(String),

    #[error("Request cancelled")]
    Cancelled,

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
}

impl ClientError {
    /// 服务端返回的 HTTP 状态码（若有）
    pub fn status_code(&self) -> Option<StatusCode> {
        match self {
            ClientError::Api { status, .. } => Some(*status),
            ClientError::Unauthorized => Some(StatusCode::UNAUTHORIZED),
            ClientError::Http(e) => e.status(),
            _ => None,
        }
    }

    /// 获取用户友好的错误消息（不包含传输层细节）
    pub fn user_message(&self) -> String {
        match self {
            ClientError::Http(_) => "Unable to reach the server".to_string(),
            ClientError::Api { message, .. } => message.clone(),
            ClientError::Unauthorized => "Your session has ended, please sign in again".to_string(),
            ClientError::Authentication(msg) => msg.clone(),
            ClientError::Cancelled => "Request cancelled".to_string(),
            ClientError::Storage(_) | ClientError::Io(_) => {
                "Unable to access local session storage".to_string()
            }
            ClientError::Serialization(_) => "Unexpected response from server".to_string(),
            ClientError::Config(_) => "Configuration error".to_string(),
            ClientError::Validation(msg) => msg.clone(),
            ClientError::InvalidUrl(_) => "Invalid request URL".to_string(),
        }
    }

    /// 获取错误码（无 HTTP 状态时为 0）
    pub fn code(&self) -> u16 {
        self.status_code().map(|s| s.as_u16()).unwrap_or(0)
    }

    /// 是否为调用方主动取消
    pub fn is_cancelled(&self) -> bool {
        matches!(self, ClientError::Cancelled)
    }

    /// 校验错误
    pub fn validation(errors: &validator::ValidationErrors) -> Self {
        ClientError::Validation(errors.to_string())
    }
}

/// 从 config::ConfigError 转换
impl From<config::ConfigError> for ClientError {
    fn from(e: config::ConfigError) -> Self {
        ClientError::Config(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, ClientError>;
