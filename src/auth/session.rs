//! 会话存储
//!
//! 访问令牌、刷新令牌、当前组织 ID 与用户资料的唯一读写入口。
//! 读取操作从不返回错误：存储故障或令牌无法解码都按“未登录”处理。

use crate::auth::token::{decode_claims, TokenClaims};
use crate::error::{ClientError, Result};
use crate::models::{id_from_value, UserProfile};
use crate::storage::KeyValueStore;
use chrono::Utc;
use serde_json::Value;
use std::sync::Arc;

pub const ACCESS_TOKEN_KEY: &str = "hrms.access_token";
pub const REFRESH_TOKEN_KEY: &str = "hrms.refresh_token";
pub const ACTIVE_ORGANISATION_KEY: &str = "hrms.active_organisation_id";
pub const USER_PROFILE_KEY: &str = "hrms.user_profile";

const SESSION_KEYS: [&str; 4] = [
    ACCESS_TOKEN_KEY,
    REFRESH_TOKEN_KEY,
    ACTIVE_ORGANISATION_KEY,
    USER_PROFILE_KEY,
];

/// 会话状态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Unauthenticated,
    Authenticated,
    /// 令牌可解码但已过期（或缺少 exp），需重新登录
    Expired,
}

/// 会话存储
#[derive(Clone)]
pub struct SessionStore {
    store: Arc<dyn KeyValueStore>,
}

impl std::fmt::Debug for SessionStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionStore")
            .field("state", &self.state())
            .finish()
    }
}

impl SessionStore {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    fn read(&self, key: &str) -> Option<String> {
        match self.store.get(key) {
            Ok(value) => value.filter(|v| !v.is_empty()),
            Err(e) => {
                tracing::warn!(key, error = %e, "Failed to read session key");
                None
            }
        }
    }

    // ===== 访问令牌 =====

    pub fn set_token(&self, token: &str) -> Result<()> {
        self.store.set(ACCESS_TOKEN_KEY, token)
    }

    pub fn token(&self) -> Option<String> {
        self.read(ACCESS_TOKEN_KEY)
    }

    pub fn clear_token(&self) -> Result<()> {
        self.store.remove(ACCESS_TOKEN_KEY)
    }

    // ===== 刷新令牌（只保存，不参与续期） =====

    pub fn set_refresh_token(&self, token: &str) -> Result<()> {
        self.store.set(REFRESH_TOKEN_KEY, token)
    }

    pub fn refresh_token(&self) -> Option<String> {
        self.read(REFRESH_TOKEN_KEY)
    }

    // ===== 身份 =====

    /// 解码当前访问令牌；缺失或无法解码时返回 None
    pub fn claims(&self) -> Option<TokenClaims> {
        let token = self.token()?;
        match decode_claims(&token) {
            Ok(claims) => Some(claims),
            Err(e) => {
                tracing::debug!(error = %e, "Stored access token is undecodable");
                None
            }
        }
    }

    pub fn state_at(&self, now: i64) -> SessionState {
        match self.claims() {
            None => SessionState::Unauthenticated,
            Some(claims) if claims.is_live_at(now) => SessionState::Authenticated,
            Some(_) => SessionState::Expired,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state_at(Utc::now().timestamp())
    }

    /// exp 严格大于当前时间才视为已登录
    pub fn is_authenticated(&self) -> bool {
        self.state() == SessionState::Authenticated
    }

    /// 令牌中的 `user` 声明，没有时返回完整载荷
    pub fn user_info(&self) -> Option<Value> {
        self.claims().map(|claims| claims.user_info())
    }

    // ===== 当前组织 =====

    /// 空值不会覆盖已有的组织 ID
    pub fn set_active_organisation_id(&self, id: Option<&str>) -> Result<()> {
        match id.map(str::trim) {
            Some(id) if !id.is_empty() => self.store.set(ACTIVE_ORGANISATION_KEY, id),
            _ => Ok(()),
        }
    }

    pub fn active_organisation_id(&self) -> Option<String> {
        self.read(ACTIVE_ORGANISATION_KEY)
    }

    /// 从登录/验证响应中查找组织 ID 并保存，形状不符时什么也不做
    pub fn process_login_response(&self, response: &Value) -> Option<String> {
        let organisation_id = find_organisation_id(response)?;

        if let Err(e) = self.set_active_organisation_id(Some(&organisation_id)) {
            tracing::warn!(error = %e, "Failed to persist active organisation");
            return None;
        }

        tracing::debug!(organisation_id = %organisation_id, "Active organisation updated");
        Some(organisation_id)
    }

    // ===== 用户资料缓存 =====

    pub fn set_user_profile(&self, profile: &UserProfile) -> Result<()> {
        self.store.set(USER_PROFILE_KEY, &serde_json::to_string(profile)?)
    }

    pub fn user_profile(&self) -> Option<UserProfile> {
        let raw = self.read(USER_PROFILE_KEY)?;
        serde_json::from_str(&raw).ok()
    }

    // ===== 生命周期 =====

    /// 以登录/验证响应建立新会话
    ///
    /// 响应中必须带有可解码的访问令牌。旧会话的全部键与新值在同一批次内替换。
    pub fn login(&self, response: &Value) -> Result<()> {
        let token = find_access_token(response).ok_or_else(|| {
            ClientError::Authentication("Login response did not contain an access token".to_string())
        })?;

        decode_claims(&token).map_err(|e| {
            ClientError::Authentication(format!("Login response contained an unusable token: {}", e))
        })?;

        let mut batch: Vec<(&str, String)> = vec![(ACCESS_TOKEN_KEY, token)];

        if let Some(refresh) = find_string(response, &["refresh_token"]) {
            batch.push((REFRESH_TOKEN_KEY, refresh));
        }

        if let Some(profile) = find_user_profile(response) {
            batch.push((USER_PROFILE_KEY, serde_json::to_string(&profile)?));
        }

        let organisation_id = find_organisation_id(response);
        if let Some(id) = &organisation_id {
            batch.push((ACTIVE_ORGANISATION_KEY, id.clone()));
        }

        self.store.write_batch(&batch, &SESSION_KEYS)?;

        tracing::info!(
            organisation_id = organisation_id.as_deref().unwrap_or("-"),
            "Session established"
        );
        Ok(())
    }

    /// 原子清除全部会话键
    pub fn clear(&self) -> Result<()> {
        self.store.remove_all(&SESSION_KEYS)
    }

    pub fn logout(&self) -> Result<()> {
        self.clear()?;
        tracing::info!("Session cleared");
        Ok(())
    }
}

/// 依次在 响应根 -> data -> data.user 中查找
fn auth_scopes(response: &Value) -> impl Iterator<Item = &Value> {
    [
        Some(response),
        response.get("data"),
        response.get("data").and_then(|d| d.get("user")),
    ]
    .into_iter()
    .flatten()
}

/// 访问令牌可能以 access_token 或 token 出现
pub fn find_access_token(response: &Value) -> Option<String> {
    find_string(response, &["access_token", "token"])
}

fn find_string(response: &Value, keys: &[&str]) -> Option<String> {
    auth_scopes(response).find_map(|scope| {
        keys.iter()
            .filter_map(|key| scope.get(*key))
            .filter_map(Value::as_str)
            .find(|v| !v.is_empty())
            .map(str::to_string)
    })
}

/// 组织 ID 查找顺序：
/// organisation_id -> data.organisation_id -> data.user.organisation_id
/// -> data.admin.organisations[0].id
pub fn find_organisation_id(response: &Value) -> Option<String> {
    auth_scopes(response)
        .find_map(|scope| scope.get("organisation_id").and_then(id_from_value))
        .or_else(|| {
            response
                .pointer("/data/admin/organisations/0/id")
                .and_then(id_from_value)
        })
}

fn find_user_profile(response: &Value) -> Option<UserProfile> {
    let candidates = [
        response.pointer("/data/user"),
        response.pointer("/data/admin"),
        response.get("user"),
    ];

    candidates
        .into_iter()
        .flatten()
        .find_map(|v| serde_json::from_value::<UserProfile>(v.clone()).ok())
}
