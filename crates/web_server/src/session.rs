//! Signed session cookie.
//!
//! Each browser gets a random session id tagged with an HMAC-SHA256 under the configured
//! secret. Requests carrying a missing or tampered id receive a fresh cookie on the response.

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::{header, HeaderMap, HeaderValue},
    middleware::Next,
    response::Response,
};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use tracing::{debug, warn};
use uuid::Uuid;

/// Session cookie name.
pub const SESSION_COOKIE: &str = "sid";
/// Session lifetime in seconds (24 hours).
pub const SESSION_MAX_AGE_SECS: u64 = 24 * 60 * 60;

type SessionMac = Hmac<Sha256>;

/// Cookie signing settings shared by every request.
#[derive(Debug, Clone)]
pub struct SessionSettings {
    secret: Arc<str>,
    secure: bool,
}

impl SessionSettings {
    /// Creates settings; `secure` adds the `Secure` cookie attribute.
    pub fn new(secret: impl Into<Arc<str>>, secure: bool) -> Self {
        Self {
            secret: secret.into(),
            secure,
        }
    }

    /// Signs `id` as `<id>.<hex hmac-sha256(secret, id)>`.
    pub fn sign(&self, id: &str) -> Option<String> {
        let tag = self.mac(id)?.finalize().into_bytes();
        Some(format!("{id}.{}", hex::encode(tag)))
    }

    /// Returns the session id when `value` carries a valid tag.
    ///
    /// The tag comparison runs in constant time.
    pub fn verify<'a>(&self, value: &'a str) -> Option<&'a str> {
        let (id, tag) = value.rsplit_once('.')?;
        if id.is_empty() {
            return None;
        }
        let tag = hex::decode(tag).ok()?;
        self.mac(id)?.verify_slice(&tag).ok()?;
        Some(id)
    }

    /// Builds the `Set-Cookie` value for a freshly signed id.
    pub fn cookie(&self, id: &str) -> Option<String> {
        let mut cookie = format!(
            "{SESSION_COOKIE}={}; Path=/; Max-Age={SESSION_MAX_AGE_SECS}; HttpOnly; SameSite=Lax",
            self.sign(id)?
        );
        if self.secure {
            cookie.push_str("; Secure");
        }
        Some(cookie)
    }

    fn mac(&self, id: &str) -> Option<SessionMac> {
        let mut mac = SessionMac::new_from_slice(self.secret.as_bytes()).ok()?;
        mac.update(id.as_bytes());
        Some(mac)
    }
}

fn session_cookie_value(headers: &HeaderMap) -> Option<&str> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == SESSION_COOKIE)
        .map(|(_, value)| value)
}

/// Middleware issuing a signed session cookie when the request has no valid one.
pub async fn session_layer(
    State(settings): State<SessionSettings>,
    request: Request,
    next: Next,
) -> Response {
    let has_session = session_cookie_value(request.headers())
        .and_then(|value| settings.verify(value))
        .is_some();

    let mut response = next.run(request).await;
    if has_session {
        return response;
    }

    let id = Uuid::new_v4().to_string();
    match settings
        .cookie(&id)
        .and_then(|cookie| HeaderValue::from_str(&cookie).ok())
    {
        Some(value) => {
            debug!(session = %id, "issued session cookie");
            response.headers_mut().append(header::SET_COOKIE, value);
        }
        None => warn!("failed to build session cookie"),
    }
    response
}
