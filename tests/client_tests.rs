//! API 客户端集成测试
//!
//! 使用进程内 axum 假服务验证请求头、组织 ID 注入、401 处理与取消

mod common;

use common::{live_token, test_client};
use hrms_client::{
    models::{ForgotPasswordRequest, ListQuery, LoginRequest, ResetPasswordRequest, VerifyRequest},
    request::MultipartBody,
    ApiRequest, ClientError, Envelope, RequestOptions, SessionState, SupersedingRequests,
};
use reqwest::StatusCode;
use secrecy::Secret;
use serde_json::{json, Value};

// ==================== 请求头 ====================

#[tokio::test]
async fn test_bearer_header_and_request_id() {
    let (client, api, _) = test_client().await;
    let token = live_token();
    client.session().set_token(&token).unwrap();

    let _: Envelope<Value> = client.get("/departments", Default::default()).await.unwrap();

    let recorded = api.last();
    assert_eq!(recorded.authorization, Some(format!("Bearer {}", token)));
    assert_eq!(recorded.content_type.as_deref(), Some("application/json"));
    assert!(recorded.request_id.is_some());
}

#[tokio::test]
async fn test_no_authorization_without_token() {
    let (client, api, _) = test_client().await;

    let _: Envelope<Value> = client.get("/holidays", Default::default()).await.unwrap();

    assert!(api.last().authorization.is_none());
}

// ==================== 组织 ID 注入 ====================

#[tokio::test]
async fn test_get_carries_organisation_in_query() {
    let (client, api, _) = test_client().await;
    client.session().set_active_organisation_id(Some("org-42")).unwrap();

    let envelope = client
        .employees()
        .list(&ListQuery::page(1, 2).search("ann"))
        .await
        .unwrap();

    let recorded = api.last();
    assert_eq!(recorded.path, "/api/v1/employees");
    assert_eq!(recorded.query_value("organisation_id").as_deref(), Some("org-42"));
    assert_eq!(recorded.query_value("page").as_deref(), Some("1"));
    assert_eq!(recorded.query_value("search").as_deref(), Some("ann"));

    assert_eq!(envelope.data.len(), 2);
    assert_eq!(envelope.data[0].id, "1");
    assert_eq!(envelope.data[1].id, "2");
    assert_eq!(envelope.pagination().unwrap().total_count, 12);
}

#[tokio::test]
async fn test_create_carries_organisation_in_body() {
    let (client, api, _) = test_client().await;
    client.session().set_active_organisation_id(Some("org-42")).unwrap();

    let _: Envelope<Value> = client
        .post("/employees/create", json!({ "name": "Ann", "organisation_id": "stale" }))
        .await
        .unwrap();

    let recorded = api.last();
    assert_eq!(recorded.method, "POST");
    assert_eq!(recorded.body, json!({ "name": "Ann", "organisation_id": "org-42" }));
    assert!(recorded.query.is_none());
}

#[tokio::test]
async fn test_opt_out_sends_body_untouched() {
    let (client, api, _) = test_client().await;
    client.session().set_active_organisation_id(Some("org-42")).unwrap();

    let _: Envelope<Value> = client
        .send(
            ApiRequest::patch("/payroll-cycles/4").json(json!({ "status": "closed" })),
            &RequestOptions::without_organisation(),
        )
        .await
        .unwrap();

    assert_eq!(api.last().body, json!({ "status": "closed" }));
}

#[tokio::test]
async fn test_delete_carries_organisation_in_query() {
    let (client, api, _) = test_client().await;
    client.session().set_active_organisation_id(Some("org-42")).unwrap();

    let envelope = client.shifts().delete("9").await.unwrap();
    assert!(envelope.status);

    let recorded = api.last();
    assert_eq!(recorded.method, "DELETE");
    assert_eq!(recorded.path, "/api/v1/shifts/9");
    assert_eq!(recorded.query_value("organisation_id").as_deref(), Some("org-42"));
}

#[tokio::test]
async fn test_upload_is_multipart_with_organisation_field() {
    let (client, api, _) = test_client().await;
    client.session().set_active_organisation_id(Some("org-42")).unwrap();

    let form = MultipartBody::new()
        .text("employee_id", "1")
        .file("document", "id.pdf", Some("application/pdf"), b"%PDF-1.4".to_vec());
    let _: Envelope<Value> = client.upload("/employees/1/documents", form).await.unwrap();

    let recorded = api.last();
    let content_type = recorded.content_type.clone().unwrap_or_default();
    assert!(content_type.starts_with("multipart/form-data"), "got {}", content_type);

    let raw = &recorded.raw_body;
    let at = raw
        .find("name=\"organisation_id\"")
        .expect("organisation_id field missing from multipart body");
    let value = raw[at..]
        .split("\r\n\r\n")
        .nth(1)
        .and_then(|rest| rest.split("\r\n").next());
    assert_eq!(value, Some("org-42"));
    assert_eq!(raw.matches("name=\"organisation_id\"").count(), 1);
    assert!(raw.contains("name=\"employee_id\""));
}

#[tokio::test]
async fn test_url_query_identifier_is_replaced_not_duplicated() {
    let (client, api, _) = test_client().await;
    client.session().set_active_organisation_id(Some("B")).unwrap();

    let _: Envelope<Value> = client
        .get("/departments?organisation_id=A&search=ops", Default::default())
        .await
        .unwrap();

    let recorded = api.last();
    assert_eq!(recorded.path, "/api/v1/departments");
    let orgs: Vec<_> = recorded
        .query_pairs()
        .into_iter()
        .filter(|(k, _)| k == "organisation_id")
        .map(|(_, v)| v)
        .collect();
    assert_eq!(orgs, vec!["B".to_string()]);
    assert_eq!(recorded.query_value("search").as_deref(), Some("ops"));
}

#[tokio::test]
async fn test_relative_login_path_is_not_augmented() {
    let (client, api, _) = test_client().await;
    client.session().set_active_organisation_id(Some("org-42")).unwrap();

    let _: Envelope<Value> = client
        .send(
            ApiRequest::post("register").json(json!({ "email": "ann@example.com" })),
            &RequestOptions::with_organisation(),
        )
        .await
        .unwrap();

    let recorded = api.last();
    assert_eq!(recorded.path, "/api/v1/register");
    assert_eq!(recorded.body, json!({ "email": "ann@example.com" }));
}

// ==================== 登录与登出 ====================

#[tokio::test]
async fn test_login_establishes_session() {
    let (client, api, _) = test_client().await;
    client.session().set_active_organisation_id(Some("org-stale")).unwrap();

    let envelope = client
        .auth()
        .login(&LoginRequest::new("ann@example.com", "secret"))
        .await
        .unwrap();
    assert_eq!(envelope.message, "Login successful");

    let recorded = api.last();
    assert_eq!(recorded.path, "/api/v1/auth/login");
    // 登录请求不带组织 ID
    assert!(recorded.body.get("organisation_id").is_none());
    assert_eq!(recorded.body["email"], "ann@example.com");

    let session = client.session();
    assert!(session.is_authenticated());
    assert_eq!(session.active_organisation_id(), Some("org-7".to_string()));
    assert_eq!(session.refresh_token(), Some("refresh-abc".to_string()));
    assert_eq!(session.user_profile().unwrap().role, "hr_admin");
    assert_eq!(session.user_info().unwrap()["name"], "Ann");
}

#[tokio::test]
async fn test_login_validation_happens_before_network() {
    let (client, api, _) = test_client().await;

    let result = client.auth().login(&LoginRequest::new("not-an-email", "secret")).await;

    assert!(matches!(result, Err(ClientError::Validation(_))));
    assert!(api.recorded().is_empty());
}

#[tokio::test]
async fn test_logout_clears_session_and_calls_server() {
    let (client, api, _) = test_client().await;
    client
        .auth()
        .login(&LoginRequest::new("ann@example.com", "secret"))
        .await
        .unwrap();

    client.auth().logout().await.unwrap();

    assert_eq!(api.last().path, "/api/v1/auth/logout");
    assert!(client.session().token().is_none());
    assert!(client.session().refresh_token().is_none());
    assert!(client.session().active_organisation_id().is_none());
}

#[tokio::test]
async fn test_verify_with_token_establishes_session() {
    let (client, api, _) = test_client().await;

    let envelope = client
        .auth()
        .verify(&VerifyRequest {
            email: "bo@example.com".to_string(),
            code: "123456".to_string(),
        })
        .await
        .unwrap();
    assert_eq!(envelope.message, "Verified");

    let recorded = api.last();
    assert_eq!(recorded.path, "/api/v1/auth/verify");
    assert!(recorded.body.get("organisation_id").is_none());

    let session = client.session();
    assert!(session.is_authenticated());
    assert_eq!(session.active_organisation_id(), Some("org-9".to_string()));
    assert_eq!(session.user_profile().unwrap().name, "Bo");
}

#[tokio::test]
async fn test_verify_without_token_keeps_session() {
    let (client, _, _) = test_client().await;
    let token = live_token();
    client.session().set_token(&token).unwrap();

    let envelope = client
        .auth()
        .verify(&VerifyRequest {
            email: "ann@example.com".to_string(),
            code: "4321".to_string(),
        })
        .await
        .unwrap();
    assert_eq!(envelope.message, "Email verified");

    let session = client.session();
    assert_eq!(session.token(), Some(token));
    assert_eq!(session.active_organisation_id(), Some("org-11".to_string()));
}

#[tokio::test]
async fn test_verify_rejected_code() {
    let (client, _, _) = test_client().await;

    let result = client
        .auth()
        .verify(&VerifyRequest {
            email: "ann@example.com".to_string(),
            code: "0000".to_string(),
        })
        .await;

    match result {
        Err(ClientError::Authentication(message)) => assert_eq!(message, "Invalid code"),
        other => panic!("unexpected result: {:?}", other.map(|e| e.message)),
    }
    assert!(!client.session().is_authenticated());
}

#[tokio::test]
async fn test_forgot_password() {
    let (client, api, _) = test_client().await;
    client.session().set_active_organisation_id(Some("org-42")).unwrap();

    let envelope = client
        .auth()
        .forgot_password(&ForgotPasswordRequest {
            email: "ann@example.com".to_string(),
        })
        .await
        .unwrap();

    assert_eq!(envelope.message, "Reset link sent");
    assert!(envelope.data.is_none());
    assert_eq!(api.last().body, json!({ "email": "ann@example.com" }));
}

#[tokio::test]
async fn test_reset_password() {
    let (client, api, _) = test_client().await;
    client.session().set_active_organisation_id(Some("org-42")).unwrap();

    let envelope = client
        .auth()
        .reset_password(&ResetPasswordRequest {
            token: "reset-1".to_string(),
            password: Secret::new("n3w-secret".to_string()),
        })
        .await
        .unwrap();
    assert_eq!(envelope.message, "Password updated");
    assert_eq!(
        api.last().body,
        json!({ "token": "reset-1", "password": "n3w-secret" })
    );

    let result = client
        .auth()
        .reset_password(&ResetPasswordRequest {
            token: "stale".to_string(),
            password: Secret::new("n3w-secret".to_string()),
        })
        .await;
    match result {
        Err(ClientError::Api { status, message }) => {
            assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
            assert_eq!(message, "Reset token expired");
        }
        other => panic!("unexpected result: {:?}", other.map(|e| e.message)),
    }
    // 会话保持不变
    assert_eq!(client.session().active_organisation_id(), Some("org-42".to_string()));
}

// ==================== 401 处理 ====================

#[tokio::test]
async fn test_unauthorized_tears_down_session_and_redirects() {
    let (client, api, redirect) = test_client().await;
    client.session().set_token(&live_token()).unwrap();
    client.session().set_refresh_token("refresh-1").unwrap();
    client.session().set_active_organisation_id(Some("org-42")).unwrap();

    let result: Result<Envelope<Value>, _> = client.get("/expired", Default::default()).await;

    assert!(matches!(result, Err(ClientError::Unauthorized)));
    assert!(client.session().token().is_none());
    assert!(client.session().refresh_token().is_none());
    assert!(client.session().active_organisation_id().is_none());
    assert_eq!(client.session().state(), SessionState::Unauthenticated);
    assert_eq!(redirect.calls.lock().unwrap().as_slice(), ["/login".to_string()]);

    // 不重试
    assert_eq!(api.recorded().len(), 1);
}

#[tokio::test]
async fn test_wrong_password_is_rejected() {
    let (client, _, redirect) = test_client().await;

    let result = client.auth().login(&LoginRequest::new("ann@example.com", "wrong")).await;

    assert!(matches!(result, Err(ClientError::Unauthorized)));
    assert!(!client.session().is_authenticated());
    assert_eq!(redirect.count(), 1);
}

#[tokio::test]
async fn test_other_errors_propagate_unchanged() {
    let (client, _, redirect) = test_client().await;
    client.session().set_token(&live_token()).unwrap();

    let result = client.employees().get("missing").await;

    match result {
        Err(ClientError::Api { status, message }) => {
            assert_eq!(status, StatusCode::NOT_FOUND);
            assert_eq!(message, "Employee not found");
        }
        other => panic!("unexpected result: {:?}", other.map(|e| e.message)),
    }

    // 会话保持不变
    assert!(client.session().is_authenticated());
    assert_eq!(redirect.count(), 0);
}

// ==================== 取消 ====================

#[tokio::test]
async fn test_cancelled_request_returns_cancelled() {
    let (client, _, _) = test_client().await;
    let slot = SupersedingRequests::new();

    let first = slot.begin();
    let pending = {
        let client = client.clone();
        let first = first.clone();
        tokio::spawn(async move {
            client
                .send_cancellable::<Value>(ApiRequest::get("/slow"), &RequestOptions::default(), &first)
                .await
        })
    };

    tokio::time::sleep(std::time::Duration::from_millis(50)).await;
    let _second = slot.begin();

    let result = pending.await.unwrap();
    assert!(matches!(result, Err(ClientError::Cancelled)));
    assert!(result.unwrap_err().is_cancelled());
}

#[tokio::test]
async fn test_already_cancelled_token_short_circuits() {
    let (client, api, _) = test_client().await;
    let token = tokio_util::sync::CancellationToken::new();
    token.cancel();

    let result = client
        .holidays()
        .list_cancellable(&ListQuery::default(), &token)
        .await;

    assert!(matches!(result, Err(ClientError::Cancelled)));
    assert!(api.recorded().is_empty());
}
