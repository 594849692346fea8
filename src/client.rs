//! HRMS REST API 客户端
//!
//! 每次调用依次经过：组织 ID 注入 -> 认证头 -> 发送 -> 状态码转换 -> 信封解析。

use crate::auth::SessionStore;
use crate::config::{ApiConfig, ClientConfig};
use crate::error::{ClientError, Result};
use crate::models::{
    AttendancePolicy, Department, Designation, Employee, Holiday, LeaveRequest, Payroll, PayrollCycle,
    Shift,
};
use crate::request::{ApiRequest, MultipartBody, RequestAugmentor, RequestBody, RequestOptions};
use crate::response::{Envelope, LogRedirect, LoginRedirect, ResponseTranslator};
use crate::services::{AuthService, Resource, ResourceService};
use crate::storage;
use reqwest::header::{HeaderValue, CONTENT_TYPE};
use reqwest::multipart::{Form, Part};
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

/// HRMS API 客户端
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: Client,
    base_url: String,
    session: SessionStore,
    augmentor: RequestAugmentor,
    translator: ResponseTranslator,
}

impl ApiClient {
    /// 使用默认跳转处理（写日志）创建客户端
    pub fn new(config: &ApiConfig, session: SessionStore) -> Result<Self> {
        Self::with_redirect(config, session, Arc::new(LogRedirect))
    }

    pub fn with_redirect(
        config: &ApiConfig,
        session: SessionStore,
        redirect: Arc<dyn LoginRedirect>,
    ) -> Result<Self> {
        let base_url = reqwest::Url::parse(&config.base_url)
            .map_err(|e| ClientError::InvalidUrl(format!("{}: {}", config.base_url, e)))?;

        let http = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(concat!("hrms-client/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            http,
            base_url: base_url.as_str().trim_end_matches('/').to_string(),
            augmentor: RequestAugmentor::new(session.clone()),
            translator: ResponseTranslator::new(session.clone(), redirect, config.login_url.clone()),
            session,
        })
    }

    /// 按完整配置打开存储并创建客户端
    pub fn from_config(config: &ClientConfig) -> Result<Self> {
        let store = storage::open_store(&config.storage)?;
        Self::new(&config.api, SessionStore::new(store))
    }

    pub fn session(&self) -> &SessionStore {
        &self.session
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// 相对路径拼接到 base_url，完整 URL 原样返回
    pub fn url_for(&self, url: &str) -> String {
        if url.starts_with("http://") || url.starts_with("https://") {
            return url.to_string();
        }
        format!("{}/{}", self.base_url, url.trim_start_matches('/'))
    }

    /// 发送请求并解析信封
    pub async fn send<T: DeserializeOwned>(
        &self,
        request: ApiRequest,
        options: &RequestOptions,
    ) -> Result<Envelope<T>> {
        let request = self.augmentor.augment(request, options);
        let method = request.method;
        let url = self.url_for(&request.url);
        let request_id = Uuid::new_v4().to_string();

        let mut builder = self
            .http
            .request(method.into(), &url)
            .header("X-Request-Id", &request_id);

        if !request.params.is_empty() {
            builder = builder.query(&query_pairs(&request.params));
        }

        if let Some(token) = self.session.token() {
            builder = builder.bearer_auth(token);
        }

        builder = match request.body {
            RequestBody::Empty => builder.header(CONTENT_TYPE, HeaderValue::from_static("application/json")),
            RequestBody::Json(body) => builder.json(&body),
            RequestBody::Multipart(form) => builder.multipart(into_form(form)?),
        };

        tracing::debug!(method = %method, url = %url, request_id = %request_id, "Sending API request");

        let response = builder.send().await.map_err(|e| {
            tracing::warn!(method = %method, url = %url, error = %e, "API request failed");
            ClientError::Http(e)
        })?;

        let status = response.status();
        let body = response.text().await?;

        metrics::counter!(
            "hrms_client_requests_total",
            "method" => method.as_str(),
            "status" => status.as_u16().to_string()
        )
        .increment(1);

        tracing::debug!(
            method = %method,
            url = %url,
            request_id = %request_id,
            status = status.as_u16(),
            "API response received"
        );

        self.translator.translate(status, &body)
    }

    /// 可取消的请求；取消时返回 `ClientError::Cancelled`
    pub async fn send_cancellable<T: DeserializeOwned>(
        &self,
        request: ApiRequest,
        options: &RequestOptions,
        cancel: &CancellationToken,
    ) -> Result<Envelope<T>> {
        let url = request.url.clone();
        tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                tracing::debug!(url = %url, "API request cancelled");
                Err(ClientError::Cancelled)
            }
            result = self.send(request, options) => result,
        }
    }

    pub async fn get<T: DeserializeOwned>(&self, url: &str, params: Map<String, Value>) -> Result<Envelope<T>> {
        self.send(ApiRequest::get(url).params(params), &RequestOptions::default())
            .await
    }

    pub async fn post<T: DeserializeOwned>(&self, url: &str, body: Value) -> Result<Envelope<T>> {
        self.send(ApiRequest::post(url).json(body), &RequestOptions::default())
            .await
    }

    pub async fn put<T: DeserializeOwned>(&self, url: &str, body: Value) -> Result<Envelope<T>> {
        self.send(ApiRequest::put(url).json(body), &RequestOptions::default())
            .await
    }

    pub async fn patch<T: DeserializeOwned>(&self, url: &str, body: Value) -> Result<Envelope<T>> {
        self.send(ApiRequest::patch(url).json(body), &RequestOptions::default())
            .await
    }

    pub async fn delete<T: DeserializeOwned>(&self, url: &str) -> Result<Envelope<T>> {
        self.send(ApiRequest::delete(url), &RequestOptions::default())
            .await
    }

    /// 文件上传
    pub async fn upload<T: DeserializeOwned>(&self, url: &str, form: MultipartBody) -> Result<Envelope<T>> {
        self.send(ApiRequest::post(url).multipart(form), &RequestOptions::default())
            .await
    }

    // ===== 服务入口 =====

    pub fn auth(&self) -> AuthService<'_> {
        AuthService::new(self)
    }

    pub fn resource<T: DeserializeOwned>(&self, resource: Resource) -> ResourceService<'_, T> {
        ResourceService::new(self, resource)
    }

    pub fn employees(&self) -> ResourceService<'_, Employee> {
        self.resource(Resource::Employees)
    }

    pub fn departments(&self) -> ResourceService<'_, Department> {
        self.resource(Resource::Departments)
    }

    pub fn designations(&self) -> ResourceService<'_, Designation> {
        self.resource(Resource::Designations)
    }

    pub fn shifts(&self) -> ResourceService<'_, Shift> {
        self.resource(Resource::Shifts)
    }

    pub fn attendance_policies(&self) -> ResourceService<'_, AttendancePolicy> {
        self.resource(Resource::AttendancePolicies)
    }

    pub fn leave_requests(&self) -> ResourceService<'_, LeaveRequest> {
        self.resource(Resource::LeaveRequests)
    }

    pub fn holidays(&self) -> ResourceService<'_, Holiday> {
        self.resource(Resource::Holidays)
    }

    pub fn payroll_cycles(&self) -> ResourceService<'_, PayrollCycle> {
        self.resource(Resource::PayrollCycles)
    }

    pub fn payrolls(&self) -> ResourceService<'_, Payroll> {
        self.resource(Resource::Payrolls)
    }
}

/// 查询参数展开：null 跳过，数组展开为重复键，对象序列化为 JSON 字符串
fn query_pairs(params: &Map<String, Value>) -> Vec<(String, String)> {
    fn scalar(value: &Value) -> Option<String> {
        match value {
            Value::Null => None,
            Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }

    let mut pairs = Vec::with_capacity(params.len());
    for (key, value) in params {
        match value {
            Value::Array(items) => {
                pairs.extend(items.iter().filter_map(scalar).map(|v| (key.clone(), v)));
            }
            other => {
                if let Some(v) = scalar(other) {
                    pairs.push((key.clone(), v));
                }
            }
        }
    }
    pairs
}

fn into_form(body: MultipartBody) -> Result<Form> {
    let mut form = Form::new();
    for (name, value) in body.fields {
        form = form.text(name, value);
    }
    for file in body.files {
        let mut part = Part::bytes(file.bytes).file_name(file.file_name);
        if let Some(content_type) = file.content_type {
            part = part.mime_str(&content_type)?;
        }
        form = form.part(file.field, part);
    }
    Ok(form)
}

/// 同一调用点的请求互相取代：开始新请求时取消上一个
///
/// 用于分页或筛选条件变化时丢弃过期的列表请求。
#[derive(Debug, Default)]
pub struct SupersedingRequests {
    current: Mutex<Option<CancellationToken>>,
}

impl SupersedingRequests {
    pub fn new() -> Self {
        Self::default()
    }

    /// 取消上一个请求并返回新请求的令牌
    pub fn begin(&self) -> CancellationToken {
        let token = CancellationToken::new();
        let mut current = self.current.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(previous) = current.replace(token.clone()) {
            previous.cancel();
        }
        token
    }

    pub fn cancel_all(&self) {
        let mut current = self.current.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(previous) = current.take() {
            previous.cancel();
        }
    }
}
