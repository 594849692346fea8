//! 测试公共模块
//! 提供令牌生成、会话构造和进程内假 API 服务

#![allow(dead_code)]

use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, Method, StatusCode, Uri},
    response::{IntoResponse, Json, Response},
    Router,
};
use hrms_client::{
    config::ApiConfig, response::LoginRedirect, storage::MemoryStore, ApiClient, SessionStore,
};
use jsonwebtoken::{encode, EncodingKey, Header};
use serde_json::{json, Value};
use std::sync::{Arc, Mutex};

/// 服务端签名密钥，客户端永远不知道它
const SERVER_SECRET: &[u8] = b"test-secret-key-for-testing-only-min-32-chars";

/// 生成访问令牌，exp 为相对当前时间的秒数
pub fn mint_token(exp_offset_secs: i64, extra: Value) -> String {
    let mut claims = json!({
        "sub": "42",
        "exp": chrono::Utc::now().timestamp() + exp_offset_secs,
    });
    if let (Some(claims), Some(extra)) = (claims.as_object_mut(), extra.as_object()) {
        for (k, v) in extra {
            claims.insert(k.clone(), v.clone());
        }
    }
    encode(&Header::default(), &claims, &EncodingKey::from_secret(SERVER_SECRET))
        .expect("Failed to mint token")
}

/// 手工拼接令牌，头部 alg 任意，签名段为占位符
pub fn unsigned_token(alg: &str, exp_offset_secs: i64) -> String {
    use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};

    let header = json!({ "alg": alg, "typ": "JWT" });
    let claims = json!({ "sub": "42", "exp": chrono::Utc::now().timestamp() + exp_offset_secs });
    format!(
        "{}.{}.c2lnbmF0dXJl",
        URL_SAFE_NO_PAD.encode(header.to_string()),
        URL_SAFE_NO_PAD.encode(claims.to_string())
    )
}

pub fn live_token() -> String {
    mint_token(3600, json!({}))
}

pub fn expired_token() -> String {
    mint_token(-60, json!({}))
}

pub fn memory_session() -> SessionStore {
    SessionStore::new(Arc::new(MemoryStore::new()))
}

/// 记录跳转调用
#[derive(Debug, Default)]
pub struct RecordingRedirect {
    pub calls: Mutex<Vec<String>>,
}

impl RecordingRedirect {
    pub fn count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

impl LoginRedirect for RecordingRedirect {
    fn redirect_to_login(&self, login_url: &str) {
        self.calls.lock().unwrap().push(login_url.to_string());
    }
}

/// 假服务收到的请求
#[derive(Debug, Clone)]
pub struct Recorded {
    pub method: String,
    pub path: String,
    pub query: Option<String>,
    pub authorization: Option<String>,
    pub content_type: Option<String>,
    pub request_id: Option<String>,
    pub body: Value,
    /// 原始请求体（multipart 等非 JSON 内容）
    pub raw_body: String,
}

impl Recorded {
    /// 解析后的查询参数
    pub fn query_pairs(&self) -> Vec<(String, String)> {
        self.query
            .as_deref()
            .unwrap_or_default()
            .split('&')
            .filter(|p| !p.is_empty())
            .map(|pair| {
                let (k, v) = pair.split_once('=').unwrap_or((pair, ""));
                (k.to_string(), v.to_string())
            })
            .collect()
    }

    pub fn query_value(&self, key: &str) -> Option<String> {
        self.query_pairs()
            .into_iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v)
    }
}

#[derive(Clone, Default)]
pub struct FakeApi {
    pub requests: Arc<Mutex<Vec<Recorded>>>,
}

impl FakeApi {
    pub fn recorded(&self) -> Vec<Recorded> {
        self.requests.lock().unwrap().clone()
    }

    pub fn last(&self) -> Recorded {
        self.recorded().last().cloned().expect("no request recorded")
    }
}

fn header(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}

fn envelope(status: StatusCode, body: Value) -> Response {
    (status, Json(body)).into_response()
}

async fn handle(
    State(api): State<FakeApi>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let recorded = Recorded {
        method: method.to_string(),
        path: uri.path().to_string(),
        query: uri.query().map(str::to_string),
        authorization: header(&headers, "authorization"),
        content_type: header(&headers, "content-type"),
        request_id: header(&headers, "x-request-id"),
        body: serde_json::from_slice(&body).unwrap_or(Value::Null),
        raw_body: String::from_utf8_lossy(&body).into_owned(),
    };
    api.requests.lock().unwrap().push(recorded.clone());

    let path = recorded.path.trim_start_matches("/api/v1");

    match (method.as_str(), path) {
        ("POST", "/auth/login") => {
            if recorded.body["password"] == "wrong" {
                return envelope(
                    StatusCode::UNAUTHORIZED,
                    json!({ "status": false, "message": "Invalid credentials" }),
                );
            }
            envelope(
                StatusCode::OK,
                json!({
                    "status": true,
                    "message": "Login successful",
                    "data": {
                        "access_token": mint_token(3600, json!({ "user": { "id": 42, "name": "Ann" } })),
                        "refresh_token": "refresh-abc",
                        "admin": {
                            "id": 42,
                            "name": "Ann",
                            "email": "ann@example.com",
                            "role": "hr_admin",
                            "organisations": [{ "id": "org-7" }, { "id": "org-8" }]
                        }
                    }
                }),
            )
        }
        ("POST", "/auth/verify") => match recorded.body["code"].as_str() {
            Some("123456") => envelope(
                StatusCode::OK,
                json!({
                    "status": true,
                    "message": "Verified",
                    "data": {
                        "token": mint_token(3600, json!({})),
                        "user": { "id": 9, "name": "Bo", "email": "bo@example.com", "role": "employee", "organisation_id": "org-9" }
                    }
                }),
            ),
            Some("4321") => envelope(
                StatusCode::OK,
                json!({
                    "status": true,
                    "message": "Email verified",
                    "data": { "organisation_id": "org-11" }
                }),
            ),
            _ => envelope(
                StatusCode::OK,
                json!({ "status": false, "message": "Invalid code", "data": null }),
            ),
        },
        ("POST", "/auth/forgot-password") => envelope(
            StatusCode::OK,
            json!({ "status": true, "message": "Reset link sent", "data": null }),
        ),
        ("POST", "/auth/reset-password") => {
            if recorded.body["token"] == "stale" {
                return envelope(
                    StatusCode::UNPROCESSABLE_ENTITY,
                    json!({ "status": false, "message": "Reset token expired" }),
                );
            }
            envelope(StatusCode::OK, json!({ "status": true, "message": "Password updated" }))
        }
        ("POST", "/auth/logout") => {
            envelope(StatusCode::OK, json!({ "status": true, "message": "Logged out" }))
        }
        (_, "/expired") => envelope(
            StatusCode::UNAUTHORIZED,
            json!({ "status": false, "message": "Token expired" }),
        ),
        (_, "/employees/missing") => envelope(
            StatusCode::NOT_FOUND,
            json!({ "status": false, "message": "Employee not found" }),
        ),
        (_, "/slow") => {
            tokio::time::sleep(std::time::Duration::from_secs(5)).await;
            envelope(StatusCode::OK, json!({ "status": true, "message": "late", "data": null }))
        }
        ("GET", "/employees") => envelope(
            StatusCode::OK,
            json!({
                "status": true,
                "message": "Employees fetched",
                "data": [
                    { "id": 1, "name": "Ann", "department_id": 3 },
                    { "id": "2", "name": "Ben", "status": "active" }
                ],
                "total_count": 12,
                "page_count": 6,
                "page": 1,
                "page_size": 2
            }),
        ),
        _ => envelope(
            StatusCode::OK,
            json!({
                "status": true,
                "message": "ok",
                "data": { "echo": recorded.body, "query": recorded.query }
            }),
        ),
    }
}

/// 启动假 API，返回 base_url
pub async fn spawn_fake_api() -> (String, FakeApi) {
    let api = FakeApi::default();
    let app = Router::new().fallback(handle).with_state(api.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind fake API");
    let addr = listener.local_addr().expect("Failed to read local addr");

    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("Fake API crashed");
    });

    (format!("http://{}/api/v1", addr), api)
}

pub fn api_config(base_url: &str) -> ApiConfig {
    ApiConfig {
        base_url: base_url.to_string(),
        timeout_secs: 10,
        login_url: "/login".to_string(),
    }
}

/// 假 API + 内存会话 + 记录跳转的客户端
pub async fn test_client() -> (ApiClient, FakeApi, Arc<RecordingRedirect>) {
    let (base_url, api) = spawn_fake_api().await;
    let redirect = Arc::new(RecordingRedirect::default());
    let client = ApiClient::with_redirect(&api_config(&base_url), memory_session(), redirect.clone())
        .expect("Failed to build client");
    (client, api, redirect)
}
