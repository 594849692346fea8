//! Access token claim decoding
//!
//! The client never holds the signing key, so only the payload segment is
//! read. The header (and its `alg`) is not interpreted. Decoding fails
//! closed: any malformed token yields an error here and "not authenticated"
//! for callers of the session store.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use serde_json::{Map, Value};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TokenDecodeError {
    #[error("token is empty")]
    Empty,

    #[error("token must have three dot-separated segments, found {0}")]
    Segments(usize),

    #[error("payload is not base64url: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("payload is not JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("payload is not a JSON object")]
    NotAnObject,
}

/// Decoded token payload
#[derive(Debug, Clone, PartialEq)]
pub struct TokenClaims {
    payload: Map<String, Value>,
}

impl TokenClaims {
    pub fn from_payload(payload: Map<String, Value>) -> Self {
        Self { payload }
    }

    /// Expiration (seconds since epoch)
    pub fn exp(&self) -> Option<i64> {
        match self.payload.get("exp")? {
            Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f.floor() as i64)),
            _ => None,
        }
    }

    /// A token is live only while `exp` is strictly in the future.
    /// Tokens without `exp` are never live.
    pub fn is_live_at(&self, now: i64) -> bool {
        self.exp().is_some_and(|exp| exp > now)
    }

    /// The `user` claim when present, otherwise the whole payload
    pub fn user_info(&self) -> Value {
        match self.payload.get("user") {
            Some(user) if !user.is_null() => user.clone(),
            _ => Value::Object(self.payload.clone()),
        }
    }

    pub fn get(&self, claim: &str) -> Option<&Value> {
        self.payload.get(claim)
    }

    pub fn payload(&self) -> &Map<String, Value> {
        &self.payload
    }
}

/// Decode the claims of a JWT-shaped token without verifying its signature.
pub fn decode_claims(token: &str) -> Result<TokenClaims, TokenDecodeError> {
    let token = token.trim();
    if token.is_empty() {
        return Err(TokenDecodeError::Empty);
    }

    let segments: Vec<&str> = token.split('.').collect();
    if segments.len() != 3 {
        return Err(TokenDecodeError::Segments(segments.len()));
    }

    // 部分签发方会保留 base64 填充
    let bytes = URL_SAFE_NO_PAD.decode(segments[1].trim_end_matches('='))?;

    match serde_json::from_slice::<Value>(&bytes)? {
        Value::Object(payload) => Ok(TokenClaims::from_payload(payload)),
        _ => Err(TokenDecodeError::NotAnObject),
    }
}
