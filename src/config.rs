//! 配置系统
//! 从环境变量加载客户端配置（前缀 HRMS_）

use config::{Config, ConfigError, Environment};
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    /// REST 根地址，例如 "https://hrms.example.com/api/v1"
    pub base_url: String,
    /// 单次请求超时时间（秒）
    pub timeout_secs: u64,
    /// 会话失效后跳转的登录入口
    pub login_url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    /// 存储后端: file, memory
    pub backend: String,
    /// 会话文件路径（仅 file 后端使用）
    pub path: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// 日志级别: trace, debug, info, warn, error
    pub level: String,
    /// 日志格式: json, pretty
    pub format: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ClientConfig {
    pub api: ApiConfig,
    pub storage: StorageConfig,
    pub logging: LoggingConfig,
}

impl ClientConfig {
    /// 从环境变量加载配置
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut settings = Config::builder();

        settings = settings
            .set_default("api.base_url", "http://localhost:8000/api/v1")?
            .set_default("api.timeout_secs", 30)?
            .set_default("api.login_url", "/login")?
            .set_default("storage.backend", "file")?
            .set_default("storage.path", ".hrms/session.json")?
            .set_default("logging.level", "info")?
            .set_default("logging.format", "pretty")?;

        // 环境变量覆盖，例如 HRMS_API__BASE_URL
        settings = settings.add_source(
            Environment::with_prefix("HRMS")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let config: ClientConfig = settings.build()?.try_deserialize()?;

        config.validate()?;

        Ok(config)
    }

    /// 验证配置合法性
    pub fn validate(&self) -> Result<(), ConfigError> {
        let base_url = reqwest::Url::parse(&self.api.base_url).map_err(|e| {
            ConfigError::Message(format!("Invalid api.base_url '{}': {}", self.api.base_url, e))
        })?;

        match base_url.scheme() {
            "http" | "https" => {}
            other => {
                return Err(ConfigError::Message(format!(
                    "Unsupported api.base_url scheme: {}. Must be http or https",
                    other
                )))
            }
        }

        if self.api.timeout_secs == 0 || self.api.timeout_secs > 300 {
            return Err(ConfigError::Message(
                "api.timeout_secs must be between 1 and 300".to_string(),
            ));
        }

        if self.api.login_url.trim().is_empty() {
            return Err(ConfigError::Message("api.login_url must not be empty".to_string()));
        }

        match self.storage.backend.to_lowercase().as_str() {
            "file" => {
                if self.storage.path.trim().is_empty() {
                    return Err(ConfigError::Message(
                        "storage.path is required for the file backend".to_string(),
                    ));
                }
            }
            "memory" => {}
            _ => {
                return Err(ConfigError::Message(format!(
                    "Invalid storage backend: {}. Must be one of: file, memory",
                    self.storage.backend
                )))
            }
        }

        match self.logging.level.to_lowercase().as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            _ => {
                return Err(ConfigError::Message(format!(
                    "Invalid log level: {}. Must be one of: trace, debug, info, warn, error",
                    self.logging.level
                )))
            }
        }

        match self.logging.format.to_lowercase().as_str() {
            "json" | "pretty" => {}
            _ => {
                return Err(ConfigError::Message(format!(
                    "Invalid log format: {}. Must be one of: json, pretty",
                    self.logging.format
                )))
            }
        }

        Ok(())
    }
}
