//! Session and token handling

pub mod session;
pub mod token;

pub use session::{find_access_token, SessionState, SessionStore};
pub use token::{decode_claims, TokenClaims, TokenDecodeError};
