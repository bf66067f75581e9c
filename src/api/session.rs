//! Signed session cookies.
//!
//! A session is the user id plus an HMAC-SHA256 tag over it, issued as an
//! `HttpOnly` cookie at login. Verification recomputes the tag, so there
//! is no server-side session table.

use std::fmt;

use axum::http::{HeaderMap, header};
use ring::hmac;

use crate::domain::UserId;
use crate::error::GatewayError;

/// Name of the session cookie.
pub const SESSION_COOKIE: &str = "arcpay_session";

/// Issues and verifies signed session cookie values.
#[derive(Clone)]
pub struct SessionKeys {
    key: hmac::Key,
}

impl fmt::Debug for SessionKeys {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionKeys").finish_non_exhaustive()
    }
}

impl SessionKeys {
    /// Derives the signing key from the configured secret.
    #[must_use]
    pub fn new(secret: &str) -> Self {
        Self {
            key: hmac::Key::new(hmac::HMAC_SHA256, secret.as_bytes()),
        }
    }

    /// Issues a signed session value of the form `<uuid>.<hex tag>`.
    #[must_use]
    pub fn issue(&self, user_id: UserId) -> String {
        let payload = user_id.as_uuid().to_string();
        let tag = hmac::sign(&self.key, payload.as_bytes());
        format!("{payload}.{}", hex::encode(tag.as_ref()))
    }

    /// Verifies a session value and returns the embedded user id.
    #[must_use]
    pub fn verify(&self, value: &str) -> Option<UserId> {
        let (payload, tag_hex) = value.split_once('.')?;
        let tag = hex::decode(tag_hex).ok()?;
        hmac::verify(&self.key, payload.as_bytes(), &tag).ok()?;
        let uuid = uuid::Uuid::parse_str(payload).ok()?;
        Some(UserId::from_uuid(uuid))
    }
}

/// Renders the `Set-Cookie` value establishing a session.
#[must_use]
pub fn session_cookie(value: &str) -> String {
    format!("{SESSION_COOKIE}={value}; Path=/; HttpOnly; SameSite=Lax")
}

/// Renders the `Set-Cookie` value clearing the session.
#[must_use]
pub fn clear_session_cookie() -> String {
    format!("{SESSION_COOKIE}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0")
}

/// Extracts and verifies the session from request headers.
///
/// # Errors
///
/// Returns [`GatewayError::Unauthorized`] when the cookie is missing,
/// malformed, or carries an invalid signature.
pub fn authenticate(keys: &SessionKeys, headers: &HeaderMap) -> Result<UserId, GatewayError> {
    let cookies = headers
        .get(header::COOKIE)
        .and_then(|v| v.to_str().ok())
        .ok_or(GatewayError::Unauthorized)?;

    for pair in cookies.split(';') {
        if let Some((name, value)) = pair.trim().split_once('=')
            && name == SESSION_COOKIE
            && let Some(user_id) = keys.verify(value)
        {
            return Ok(user_id);
        }
    }
    Err(GatewayError::Unauthorized)
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn issue_then_verify_round_trips() {
        let keys = SessionKeys::new("secret");
        let user_id = UserId::new();

        let value = keys.issue(user_id);
        assert_eq!(keys.verify(&value), Some(user_id));
    }

    #[test]
    fn tampered_payload_is_rejected() {
        let keys = SessionKeys::new("secret");
        let value = keys.issue(UserId::new());

        let other = UserId::new();
        let Some((_, tag)) = value.split_once('.') else {
            panic!("malformed session value");
        };
        let forged = format!("{}.{tag}", other.as_uuid());
        assert_eq!(keys.verify(&forged), None);
    }

    #[test]
    fn different_secret_is_rejected() {
        let keys = SessionKeys::new("secret");
        let value = keys.issue(UserId::new());

        let other = SessionKeys::new("other-secret");
        assert_eq!(other.verify(&value), None);
    }

    #[test]
    fn authenticate_reads_the_cookie_header() {
        let keys = SessionKeys::new("secret");
        let user_id = UserId::new();
        let value = keys.issue(user_id);

        let mut headers = HeaderMap::new();
        let cookie = format!("other=1; {SESSION_COOKIE}={value}");
        let Ok(header_value) = HeaderValue::from_str(&cookie) else {
            panic!("invalid header value");
        };
        headers.insert(header::COOKIE, header_value);

        let Ok(authenticated) = authenticate(&keys, &headers) else {
            panic!("authentication failed");
        };
        assert_eq!(authenticated, user_id);
    }

    #[test]
    fn missing_cookie_is_unauthorized() {
        let keys = SessionKeys::new("secret");
        let headers = HeaderMap::new();
        assert!(matches!(
            authenticate(&keys, &headers),
            Err(GatewayError::Unauthorized)
        ));
    }
}
