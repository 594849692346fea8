//! 请求描述与组织 ID 注入
//!
//! `augment` 是纯函数：输入请求描述与当前组织 ID，返回新的请求描述。
//! 传输层在发送前显式调用它，不通过拦截器隐式修改请求。

use crate::auth::SessionStore;
use serde_json::{Map, Value};
use std::borrow::Cow;
use std::fmt;

/// 注入的字段名
pub const ORGANISATION_ID_KEY: &str = "organisation_id";

/// 身份引导类接口，永不注入组织 ID
pub const AUTH_BOOTSTRAP_PATHS: [&str; 7] = [
    "/login",
    "/register",
    "/forgot-password",
    "/reset-password",
    "/refresh-token",
    "/verify",
    "/logout",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HttpMethod {
    Get,
    Head,
    Delete,
    Post,
    Put,
    Patch,
}

/// 组织 ID 的放置位置
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placement {
    Query,
    Body,
}

impl HttpMethod {
    /// 读取与删除类请求放在查询参数，写入类请求放在请求体
    pub fn placement(self) -> Placement {
        match self {
            HttpMethod::Get | HttpMethod::Head | HttpMethod::Delete => Placement::Query,
            HttpMethod::Post | HttpMethod::Put | HttpMethod::Patch => Placement::Body,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Head => "HEAD",
            HttpMethod::Delete => "DELETE",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Patch => "PATCH",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<HttpMethod> for reqwest::Method {
    fn from(method: HttpMethod) -> Self {
        match method {
            HttpMethod::Get => reqwest::Method::GET,
            HttpMethod::Head => reqwest::Method::HEAD,
            HttpMethod::Delete => reqwest::Method::DELETE,
            HttpMethod::Post => reqwest::Method::POST,
            HttpMethod::Put => reqwest::Method::PUT,
            HttpMethod::Patch => reqwest::Method::PATCH,
        }
    }
}

/// multipart 上传的文件部分
#[derive(Debug, Clone, PartialEq)]
pub struct FilePart {
    pub field: String,
    pub file_name: String,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

/// multipart 表单
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MultipartBody {
    pub fields: Vec<(String, String)>,
    pub files: Vec<FilePart>,
}

impl MultipartBody {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.push((name.into(), value.into()));
        self
    }

    pub fn file(
        mut self,
        field: impl Into<String>,
        file_name: impl Into<String>,
        content_type: Option<&str>,
        bytes: Vec<u8>,
    ) -> Self {
        self.files.push(FilePart {
            field: field.into(),
            file_name: file_name.into(),
            content_type: content_type.map(str::to_string),
            bytes,
        });
        self
    }

    /// 替换同名文本字段（全部旧值被移除）
    pub fn set_text(&mut self, name: &str, value: &str) {
        self.fields.retain(|(k, _)| k != name);
        self.fields.push((name.to_string(), value.to_string()));
    }

    pub fn text_value(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub enum RequestBody {
    #[default]
    Empty,
    Json(Value),
    Multipart(MultipartBody),
}

/// 出站请求描述
#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    pub method: HttpMethod,
    /// 相对 base_url 的路径，或完整 URL
    pub url: String,
    pub body: RequestBody,
    pub params: Map<String, Value>,
}

impl ApiRequest {
    pub fn new(method: HttpMethod, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            body: RequestBody::Empty,
            params: Map::new(),
        }
    }

    pub fn get(url: impl Into<String>) -> Self {
        Self::new(HttpMethod::Get, url)
    }

    pub fn delete(url: impl Into<String>) -> Self {
        Self::new(HttpMethod::Delete, url)
    }

    pub fn post(url: impl Into<String>) -> Self {
        Self::new(HttpMethod::Post, url)
    }

    pub fn put(url: impl Into<String>) -> Self {
        Self::new(HttpMethod::Put, url)
    }

    pub fn patch(url: impl Into<String>) -> Self {
        Self::new(HttpMethod::Patch, url)
    }

    pub fn json(mut self, body: Value) -> Self {
        self.body = RequestBody::Json(body);
        self
    }

    pub fn multipart(mut self, body: MultipartBody) -> Self {
        self.body = RequestBody::Multipart(body);
        self
    }

    pub fn params(mut self, params: Map<String, Value>) -> Self {
        self.params = params;
        self
    }

    pub fn param(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }

    /// 请求路径（去掉 scheme/host 与查询串），相对路径补齐前导 `/`
    pub fn path(&self) -> Cow<'_, str> {
        let without_query = self.url.split(['?', '#']).next().unwrap_or_default();
        let path = match without_query.find("://") {
            Some(idx) => {
                let rest = &without_query[idx + 3..];
                rest.find('/').map(|slash| &rest[slash..]).unwrap_or("/")
            }
            None => without_query,
        };

        if path.starts_with('/') {
            Cow::Borrowed(path)
        } else {
            Cow::Owned(format!("/{}", path))
        }
    }

    pub fn is_auth_bootstrap(&self) -> bool {
        is_auth_bootstrap(&self.path())
    }

    /// 把 URL 中的查询串并入 `params`，URL 只保留路径部分
    ///
    /// 同名键以 `params` 中已有的值为准；URL 中重复的键合并为数组。
    pub fn lift_url_query(mut self) -> Self {
        let Some((base, rest)) = self.url.split_once('?') else {
            return self;
        };
        let query = rest.split('#').next().unwrap_or_default();

        let parsed = match reqwest::Url::parse(&format!("http://query.invalid/?{}", query)) {
            Ok(parsed) => parsed,
            Err(_) => return self,
        };

        let mut from_url = Map::new();
        for (key, value) in parsed.query_pairs() {
            let value = Value::String(value.into_owned());
            match from_url.get_mut(key.as_ref()) {
                None => {
                    from_url.insert(key.into_owned(), value);
                }
                Some(Value::Array(items)) => items.push(value),
                Some(existing) => {
                    let first = existing.take();
                    *existing = Value::Array(vec![first, value]);
                }
            }
        }

        for (key, value) in from_url {
            self.params.entry(key).or_insert(value);
        }
        self.url = base.to_string();
        self
    }
}

/// 单次请求选项
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RequestOptions {
    /// None 表示默认注入
    pub include_organisation_id: Option<bool>,
}

impl RequestOptions {
    pub fn without_organisation() -> Self {
        Self {
            include_organisation_id: Some(false),
        }
    }

    pub fn with_organisation() -> Self {
        Self {
            include_organisation_id: Some(true),
        }
    }

    pub fn includes_organisation(&self) -> bool {
        self.include_organisation_id != Some(false)
    }
}

/// 路径中含有任一引导片段即豁免；不带前导 `/` 的相对路径按补齐后的形式匹配
pub fn is_auth_bootstrap(path: &str) -> bool {
    let path = if path.starts_with('/') {
        Cow::Borrowed(path)
    } else {
        Cow::Owned(format!("/{}", path))
    };
    AUTH_BOOTSTRAP_PATHS.iter().any(|fragment| path.contains(fragment))
}

/// 按规则注入当前组织 ID
///
/// 规则优先级：身份引导接口豁免 > 显式关闭 > 无组织 ID 不处理 > 会话值覆盖调用方的值。
/// 注入时 URL 查询串先并入 `params`，调用方写在任何位置的组织 ID 都只会留下会话值一份。
pub fn augment(
    mut request: ApiRequest,
    options: &RequestOptions,
    active_organisation_id: Option<&str>,
) -> ApiRequest {
    if request.is_auth_bootstrap() || !options.includes_organisation() {
        return request;
    }

    let organisation_id = match active_organisation_id.map(str::trim) {
        Some(id) if !id.is_empty() => id,
        _ => return request,
    };

    request = request.lift_url_query();

    match request.method.placement() {
        Placement::Query => {
            request.params.insert(
                ORGANISATION_ID_KEY.to_string(),
                Value::String(organisation_id.to_string()),
            );
        }
        Placement::Body => {
            request.params.remove(ORGANISATION_ID_KEY);
            request.body = match request.body {
                RequestBody::Json(Value::Object(mut map)) => {
                    map.insert(
                        ORGANISATION_ID_KEY.to_string(),
                        Value::String(organisation_id.to_string()),
                    );
                    RequestBody::Json(Value::Object(map))
                }
                RequestBody::Multipart(mut form) => {
                    form.set_text(ORGANISATION_ID_KEY, organisation_id);
                    RequestBody::Multipart(form)
                }
                RequestBody::Empty | RequestBody::Json(_) => {
                    let mut map = Map::new();
                    map.insert(
                        ORGANISATION_ID_KEY.to_string(),
                        Value::String(organisation_id.to_string()),
                    );
                    RequestBody::Json(Value::Object(map))
                }
            };
        }
    }

    request
}

/// 从会话读取组织 ID 的注入器
#[derive(Debug, Clone)]
pub struct RequestAugmentor {
    session: SessionStore,
}

impl RequestAugmentor {
    pub fn new(session: SessionStore) -> Self {
        Self { session }
    }

    pub fn augment(&self, request: ApiRequest, options: &RequestOptions) -> ApiRequest {
        let active = self.session.active_organisation_id();
        augment(request, options, active.as_deref())
    }
}
