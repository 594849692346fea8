//! HRMS API 客户端库
//! 会话与令牌存储、组织 ID 注入、响应信封与会话失效处理

pub mod auth;
pub mod client;
pub mod config;
pub mod error;
pub mod models;
pub mod request;
pub mod response;
pub mod services;
pub mod storage;
pub mod telemetry;

pub use auth::{SessionState, SessionStore};
pub use client::{ApiClient, SupersedingRequests};
pub use error::{ClientError, Result};
pub use request::{augment, ApiRequest, HttpMethod, RequestBody, RequestOptions};
pub use response::{Envelope, LoginRedirect};
