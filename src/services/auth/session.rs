//! Cookie-backed browser sessions.
//!
//! The session cookie holds the token bundle issued by the authorization
//! server. Resolving a session may rotate it (refresh) or clear it (refresh
//! rejected); the caller must copy `SessionResolution::set_cookies` onto the
//! response it finally returns, whatever that response is.
use std::sync::Arc;

use async_trait::async_trait;
use axum::http::{HeaderMap, HeaderValue, header};
use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use thiserror::Error;
use tracing::warn;

use crate::config::Config;
use crate::services::auth::principal::Principal;
use crate::services::auth::server::{AuthServerError, AuthorizationServer, SessionTokens};

const VALUE_PREFIX: &str = "base64-";
// Browsers cap a single cookie at ~4 KiB, so large sessions arrive split as `<name>.0`, `<name>.1`, ...
const MAX_CHUNKS: usize = 10;

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("malformed session cookie: {0}")]
    Malformed(String),
    #[error("session cookie cannot be encoded as a header")]
    Header,
    #[error(transparent)]
    Server(#[from] AuthServerError),
}

/// Outcome of resolving the session for one request.
#[derive(Debug, Default)]
pub struct SessionResolution {
    pub principal: Option<Principal>,
    pub set_cookies: Vec<HeaderValue>,
}

impl SessionResolution {
    pub fn anonymous() -> Self {
        Self::default()
    }
}

#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn resolve(&self, headers: &HeaderMap) -> Result<SessionResolution, SessionError>;
}

/// Name and attributes of the session cookie.
#[derive(Debug, Clone)]
pub struct SessionCookie {
    name: String,
    secure: bool,
    max_age_seconds: u64,
}

impl SessionCookie {
    pub fn new(name: impl Into<String>, secure: bool, max_age_seconds: u64) -> Self {
        Self {
            name: name.into(),
            secure,
            max_age_seconds,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            config.session_cookie_name.clone(),
            config.secure_cookies(),
            config.session_cookie_max_age_seconds,
        )
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Read the (possibly chunked) cookie value from the request.
    pub fn read(&self, headers: &HeaderMap) -> Option<String> {
        if let Some(value) = cookie_value(headers, &self.name) {
            return Some(value);
        }

        let mut joined = String::new();
        for i in 0..MAX_CHUNKS {
            match cookie_value(headers, &self.chunk_name(i)) {
                Some(chunk) => joined.push_str(&chunk),
                None => break,
            }
        }
        Some(joined).filter(|v| !v.is_empty())
    }

    pub fn encode(&self, tokens: &SessionTokens) -> Result<HeaderValue, SessionError> {
        let value = encode_tokens(tokens)?;
        self.header(&self.name, &value, self.max_age_seconds)
    }

    pub fn clear(&self) -> Result<HeaderValue, SessionError> {
        self.header(&self.name, "", 0)
    }

    /// Clears for every session cookie the request carries, chunks included.
    /// Always clears `<name>` even when nothing was sent.
    pub fn clear_all(&self, headers: &HeaderMap) -> Result<Vec<HeaderValue>, SessionError> {
        let mut cleared = vec![self.clear()?];
        cleared.extend(self.clear_chunks(headers)?);
        Ok(cleared)
    }

    /// Clears for the `<name>.N` chunks the request carries.
    pub fn clear_chunks(&self, headers: &HeaderMap) -> Result<Vec<HeaderValue>, SessionError> {
        (0..MAX_CHUNKS)
            .map(|i| self.chunk_name(i))
            .filter(|name| cookie_value(headers, name).is_some())
            .map(|name| self.header(&name, "", 0))
            .collect()
    }

    fn chunk_name(&self, index: usize) -> String {
        format!("{}.{}", self.name, index)
    }

    fn header(&self, name: &str, value: &str, max_age: u64) -> Result<HeaderValue, SessionError> {
        let mut cookie = format!(
            "{}={}; Path=/; HttpOnly; SameSite=Lax; Max-Age={}",
            name, value, max_age
        );
        if self.secure {
            cookie.push_str("; Secure");
        }
        HeaderValue::from_str(&cookie).map_err(|_| SessionError::Header)
    }
}

pub fn encode_tokens(tokens: &SessionTokens) -> Result<String, SessionError> {
    let json = serde_json::to_vec(tokens).map_err(|e| SessionError::Malformed(e.to_string()))?;
    Ok(format!("{}{}", VALUE_PREFIX, URL_SAFE_NO_PAD.encode(json)))
}

pub fn decode_tokens(raw: &str) -> Result<SessionTokens, SessionError> {
    let encoded = raw
        .strip_prefix(VALUE_PREFIX)
        .ok_or_else(|| SessionError::Malformed("missing prefix".into()))?;
    let json = URL_SAFE_NO_PAD
        .decode(encoded.trim_end_matches('='))
        .map_err(|e| SessionError::Malformed(e.to_string()))?;
    serde_json::from_slice(&json).map_err(|e| SessionError::Malformed(e.to_string()))
}

fn cookie_value(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|raw| raw.split(';'))
        .find_map(|pair| {
            let (key, value) = pair.trim().split_once('=')?;
            (key.trim() == name).then(|| value.trim().to_string())
        })
        .filter(|v| !v.is_empty())
}

/// Session store backed by the authorization server.
pub struct CookieSessionStore {
    server: Arc<dyn AuthorizationServer>,
    cookie: SessionCookie,
    refresh_margin_seconds: i64,
}

impl CookieSessionStore {
    pub fn new(
        server: Arc<dyn AuthorizationServer>,
        cookie: SessionCookie,
        refresh_margin_seconds: i64,
    ) -> Self {
        Self {
            server,
            cookie,
            refresh_margin_seconds,
        }
    }

    async fn resolve_at(
        &self,
        headers: &HeaderMap,
        now: i64,
    ) -> Result<SessionResolution, SessionError> {
        let Some(raw) = self.cookie.read(headers) else {
            return Ok(SessionResolution::anonymous());
        };

        let mut tokens = match decode_tokens(&raw) {
            Ok(tokens) => tokens,
            Err(err) => {
                warn!(error = ?err, "discarding unreadable session cookie");
                return self.invalidated(headers);
            }
        };

        let mut set_cookies = Vec::new();

        if tokens.expires_within(now, self.refresh_margin_seconds) {
            match self.server.refresh_session(&tokens.refresh_token).await {
                Ok(rotated) => {
                    // Written whole, so any chunks it came in are dropped.
                    set_cookies.push(self.cookie.encode(&rotated)?);
                    set_cookies.extend(self.cookie.clear_chunks(headers)?);
                    tokens = rotated;
                }
                Err(err) if err.is_rejection() => {
                    warn!(error = ?err, "session refresh rejected");
                    return self.invalidated(headers);
                }
                Err(err) => return Err(err.into()),
            }
        }

        match self.server.get_user(&tokens.access_token).await {
            Ok(user) => Ok(SessionResolution {
                principal: Some(Principal::new(user, tokens.access_token)),
                set_cookies,
            }),
            Err(err) if err.is_rejection() => {
                warn!(error = ?err, "session token rejected");
                self.invalidated(headers)
            }
            Err(err) => {
                // The refresh token may already be rotated server-side; keep the new cookie.
                warn!(error = ?err, "session user lookup failed");
                Ok(SessionResolution {
                    principal: None,
                    set_cookies,
                })
            }
        }
    }

    fn invalidated(&self, headers: &HeaderMap) -> Result<SessionResolution, SessionError> {
        Ok(SessionResolution {
            principal: None,
            set_cookies: self.cookie.clear_all(headers)?,
        })
    }
}

#[async_trait]
impl SessionStore for CookieSessionStore {
    async fn resolve(&self, headers: &HeaderMap) -> Result<SessionResolution, SessionError> {
        self.resolve_at(headers, chrono::Utc::now().timestamp())
            .await
    }
}
