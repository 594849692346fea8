//! Authentication-related models

use secrecy::{ExposeSecret, Secret};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use validator::Validate;

/// Login request
#[derive(Debug, Validate)]
pub struct LoginRequest {
    #[validate(email)]
    pub email: String,
    pub password: Secret<String>,
}

impl LoginRequest {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: Secret::new(password.into()),
        }
    }

    /// Secret 不实现 Serialize，只在发送时暴露
    pub fn to_body(&self) -> Value {
        json!({
            "email": self.email,
            "password": self.password.expose_secret(),
        })
    }

    pub fn check(&self) -> Result<(), crate::error::ClientError> {
        self.validate().map_err(|e| crate::error::ClientError::validation(&e))?;
        if self.password.expose_secret().is_empty() {
            return Err(crate::error::ClientError::Validation(
                "password must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

/// OTP / email verification request
#[derive(Debug, Serialize, Validate)]
pub struct VerifyRequest {
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 4, max = 12))]
    pub code: String,
}

/// Forgot password request
#[derive(Debug, Serialize, Validate)]
pub struct ForgotPasswordRequest {
    #[validate(email)]
    pub email: String,
}

/// Reset password request
#[derive(Debug, Validate)]
pub struct ResetPasswordRequest {
    #[validate(length(min = 1))]
    pub token: String,
    pub password: Secret<String>,
}

impl ResetPasswordRequest {
    pub fn to_body(&self) -> Value {
        json!({
            "token": self.token,
            "password": self.password.expose_secret(),
        })
    }
}

/// 缓存的用户资料，独立于 token 保存以便同步读取
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    #[serde(deserialize_with = "super::deserialize_id")]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub role: String,
}
