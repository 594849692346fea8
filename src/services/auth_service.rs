//! 认证服务：登录、验证、登出、找回密码

use crate::auth::find_access_token;
use crate::client::ApiClient;
use crate::error::{ClientError, Result};
use crate::models::{ForgotPasswordRequest, LoginRequest, ResetPasswordRequest, VerifyRequest};
use crate::request::{ApiRequest, RequestOptions};
use crate::response::Envelope;
use serde_json::Value;
use validator::Validate;

pub const LOGIN_PATH: &str = "/auth/login";
pub const VERIFY_PATH: &str = "/auth/verify";
pub const LOGOUT_PATH: &str = "/auth/logout";
pub const FORGOT_PASSWORD_PATH: &str = "/auth/forgot-password";
pub const RESET_PASSWORD_PATH: &str = "/auth/reset-password";

pub struct AuthService<'a> {
    client: &'a ApiClient,
}

impl<'a> AuthService<'a> {
    pub fn new(client: &'a ApiClient) -> Self {
        Self { client }
    }

    async fn post_auth(&self, path: &str, body: Value) -> Result<Envelope<Value>> {
        self.client
            .send(ApiRequest::post(path).json(body), &RequestOptions::without_organisation())
            .await
    }

    /// 用户登录，成功后建立会话
    pub async fn login(&self, req: &LoginRequest) -> Result<Envelope<Value>> {
        req.check()?;

        let envelope = self.post_auth(LOGIN_PATH, req.to_body()).await?;
        self.establish(&envelope)?;

        tracing::info!(email = %req.email, "Logged in");
        Ok(envelope)
    }

    /// 验证码校验
    ///
    /// 响应带令牌时建立新会话；不带令牌时只更新组织 ID（若有），其余会话保持不变。
    pub async fn verify(&self, req: &VerifyRequest) -> Result<Envelope<Value>> {
        req.validate().map_err(|e| ClientError::validation(&e))?;

        let envelope = self.post_auth(VERIFY_PATH, serde_json::to_value(req)?).await?;
        let raw = accepted(&envelope)?;

        if find_access_token(&raw).is_some() {
            self.client.session().login(&raw)?;
        } else {
            self.client.session().process_login_response(&raw);
            tracing::debug!(email = %req.email, "Verification accepted without a token");
        }

        Ok(envelope)
    }

    /// 登出：服务端失败只记日志，本地会话总会清除
    pub async fn logout(&self) -> Result<()> {
        if self.client.session().token().is_some() {
            let result: Result<Envelope<Option<Value>>> = self
                .client
                .send(ApiRequest::post(LOGOUT_PATH), &RequestOptions::without_organisation())
                .await;

            if let Err(e) = result {
                tracing::warn!(error = %e, "Server-side logout failed, clearing local session anyway");
            }
        }

        self.client.session().logout()
    }

    pub async fn forgot_password(&self, req: &ForgotPasswordRequest) -> Result<Envelope<Option<Value>>> {
        req.validate().map_err(|e| ClientError::validation(&e))?;

        self.client
            .send(
                ApiRequest::post(FORGOT_PASSWORD_PATH).json(serde_json::to_value(req)?),
                &RequestOptions::without_organisation(),
            )
            .await
    }

    pub async fn reset_password(&self, req: &ResetPasswordRequest) -> Result<Envelope<Option<Value>>> {
        req.validate().map_err(|e| ClientError::validation(&e))?;

        self.client
            .send(
                ApiRequest::post(RESET_PASSWORD_PATH).json(req.to_body()),
                &RequestOptions::without_organisation(),
            )
            .await
    }

    fn establish(&self, envelope: &Envelope<Value>) -> Result<()> {
        let raw = accepted(envelope)?;
        self.client.session().login(&raw)
    }
}

/// status=false 视为认证失败，否则返回完整响应供会话解析
fn accepted(envelope: &Envelope<Value>) -> Result<Value> {
    if !envelope.status {
        return Err(ClientError::Authentication(if envelope.message.is_empty() {
            "Login was not accepted".to_string()
        } else {
            envelope.message.clone()
        }));
    }

    Ok(serde_json::to_value(envelope)?)
}
