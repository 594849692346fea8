//! 响应信封与错误转换

use crate::auth::SessionStore;
use crate::error::{ClientError, Result};
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// 服务端统一响应信封，`data` 原样透传
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope<T> {
    pub status: bool,
    #[serde(default)]
    pub message: String,
    pub data: T,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_count: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_count: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_size: Option<u64>,
}

/// 分页信息
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    pub total_count: u64,
    pub page_count: Option<u64>,
    pub page: Option<u64>,
    pub page_size: Option<u64>,
}

impl<T> Envelope<T> {
    pub fn into_data(self) -> T {
        self.data
    }

    /// 仅当服务端返回 total_count 时视为分页响应
    pub fn pagination(&self) -> Option<Pagination> {
        Some(Pagination {
            total_count: self.total_count?,
            page_count: self.page_count,
            page: self.page,
            page_size: self.page_size,
        })
    }
}

/// 会话失效后跳转登录入口
pub trait LoginRedirect: Send + Sync {
    fn redirect_to_login(&self, login_url: &str);
}

/// 默认实现：记录日志，由调用方（界面或命令行）负责真正的跳转
#[derive(Debug, Default)]
pub struct LogRedirect;

impl LoginRedirect for LogRedirect {
    fn redirect_to_login(&self, login_url: &str) {
        tracing::warn!(login_url, "Session rejected, sign in again");
    }
}

/// 错误转换器：401 清空会话并跳转，其余错误原样上抛
#[derive(Clone)]
pub struct ResponseTranslator {
    session: SessionStore,
    redirect: Arc<dyn LoginRedirect>,
    login_url: String,
}

impl std::fmt::Debug for ResponseTranslator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResponseTranslator")
            .field("login_url", &self.login_url)
            .finish()
    }
}

impl ResponseTranslator {
    pub fn new(session: SessionStore, redirect: Arc<dyn LoginRedirect>, login_url: impl Into<String>) -> Self {
        Self {
            session,
            redirect,
            login_url: login_url.into(),
        }
    }

    /// 检查状态码；`body` 仅用于提取错误消息
    pub fn check_status(&self, status: StatusCode, body: &str) -> Result<()> {
        if status == StatusCode::UNAUTHORIZED {
            self.reject_session();
            return Err(ClientError::Unauthorized);
        }

        if !status.is_success() {
            return Err(ClientError::Api {
                status,
                message: error_message(status, body),
            });
        }

        Ok(())
    }

    /// 终止会话：同步清空存储后跳转，不重试也不重放请求
    pub fn reject_session(&self) {
        if let Err(e) = self.session.clear() {
            tracing::error!(error = %e, "Failed to clear rejected session");
        }
        metrics::counter!("hrms_client_session_teardowns_total").increment(1);
        self.redirect.redirect_to_login(&self.login_url);
    }

    /// 解析信封
    pub fn unwrap<T: DeserializeOwned>(&self, body: &str) -> Result<Envelope<T>> {
        Ok(serde_json::from_str(body)?)
    }

    /// 状态检查 + 解析
    pub fn translate<T: DeserializeOwned>(&self, status: StatusCode, body: &str) -> Result<Envelope<T>> {
        self.check_status(status, body)?;
        self.unwrap(body)
    }
}

/// 优先使用信封中的 message，其次是原始文本，最后是状态码原因短语
fn error_message(status: StatusCode, body: &str) -> String {
    #[derive(Deserialize)]
    struct ErrorBody {
        message: Option<String>,
    }

    if let Ok(ErrorBody { message: Some(message) }) = serde_json::from_str::<ErrorBody>(body) {
        if !message.is_empty() {
            return message;
        }
    }

    let text = body.trim();
    if !text.is_empty() && text.len() <= 200 && !text.starts_with('<') {
        return text.to_string();
    }

    status.canonical_reason().unwrap_or("Request failed").to_string()
}
