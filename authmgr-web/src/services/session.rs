/// Auth Manager - Signed session cookies.
///
/// Sessions are issued by the login service or the `issue_session` tool and
/// carry the user's name, permissions and expiry, signed with the secret key.
use serde::{Deserialize, Serialize};
use time::{Duration, OffsetDateTime};

use crate::error::{AppError, AppResult};
use crate::signing::{base64_decode, base64_encode, sign_value, verify_signed};

/// Cookie name for sessions.
pub const SESSION_COOKIE_NAME: &str = "__authmgr_session";

/// Session payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionClaims {
    pub username: String,
    pub permissions: Vec<String>,
    /// Unix timestamp in seconds.
    pub expires_at: i64,
}

impl SessionClaims {
    pub fn new(username: impl Into<String>, permissions: Vec<String>, lifetime: Duration) -> Self {
        Self {
            username: username.into(),
            permissions,
            expires_at: (OffsetDateTime::now_utc() + lifetime).unix_timestamp(),
        }
    }

    pub fn is_expired_at(&self, now: OffsetDateTime) -> bool {
        self.expires_at <= now.unix_timestamp()
    }

    pub fn is_expired(&self) -> bool {
        self.is_expired_at(OffsetDateTime::now_utc())
    }
}

/// Signed cookie value: base64(json).signature
pub fn encode_session(secret_key: &[u8], claims: &SessionClaims) -> AppResult<String> {
    let json = serde_json::to_vec(claims)
        .map_err(|e| AppError::Internal(anyhow::anyhow!("Failed to encode session: {}", e)))?;
    Ok(sign_value(secret_key, &base64_encode(&json)))
}

/// Decode a session cookie. Returns `None` when it is forged, malformed or expired.
pub fn decode_session(secret_key: &[u8], value: &str) -> Option<SessionClaims> {
    let encoded = verify_signed(secret_key, value)?;
    let json = base64_decode(encoded)?;
    let claims: SessionClaims = serde_json::from_slice(&json).ok()?;
    if claims.is_expired() {
        tracing::debug!(username = %claims.username, "Session expired");
        return None;
    }
    Some(claims)
}
