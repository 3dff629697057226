//! Authorization server interface used by the gateway (session refresh, bearer
//! verification, consent decisions).
//!
//! The server is the source of truth for users, sessions and pending
//! authorization requests; nothing here is stored locally.
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub type AuthServerResult<T> = Result<T, AuthServerError>;

/// Authorization-server errors.
///
/// `Api` carries the server's own message so the consent flow can show it as-is.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AuthServerError {
    #[error("authorization server request timed out")]
    Timeout,
    #[error("authorization server unreachable: {0}")]
    Transport(String),
    #[error("{message}")]
    Api { status: u16, message: String },
    #[error("unexpected authorization server response: {0}")]
    Decode(String),
}

impl AuthServerError {
    /// The server answered and refused the credential (as opposed to being unreachable).
    pub fn is_rejection(&self) -> bool {
        matches!(self, Self::Api { status, .. } if (400..500).contains(status))
    }
}

/// User resolved from an access token.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct AuthUser {
    pub id: String,
    #[serde(default)]
    pub email: Option<String>,
}

/// Credential bundle persisted in the session cookie.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SessionTokens {
    pub access_token: String,
    pub refresh_token: String,
    // unix seconds
    pub expires_at: i64,
}

impl SessionTokens {
    pub fn expires_within(&self, now: i64, margin_seconds: i64) -> bool {
        self.expires_at - now <= margin_seconds
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct OAuthClientInfo {
    #[serde(alias = "client_name")]
    pub name: String,
    #[serde(default)]
    pub client_id: Option<String>,
}

/// A pending authorization request, keyed by `authorization_id`.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct AuthorizationDetails {
    #[serde(default)]
    pub authorization_id: String,
    pub client: OAuthClientInfo,
    #[serde(alias = "redirect_uri")]
    pub redirect_url: String,
    // space-separated
    #[serde(default)]
    pub scope: Option<String>,
}

impl AuthorizationDetails {
    pub fn scopes(&self) -> Vec<&str> {
        self.scope
            .as_deref()
            .map(|s| s.split_whitespace().collect())
            .unwrap_or_default()
    }
}

#[async_trait]
pub trait AuthorizationServer: Send + Sync {
    // Resolve the user owning `access_token`.
    async fn get_user(&self, access_token: &str) -> AuthServerResult<AuthUser>;

    async fn sign_in_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> AuthServerResult<SessionTokens>;

    // Exchange a refresh token for a rotated token pair.
    async fn refresh_session(&self, refresh_token: &str) -> AuthServerResult<SessionTokens>;

    async fn sign_out(&self, access_token: &str) -> AuthServerResult<()>;

    async fn get_authorization_details(
        &self,
        authorization_id: &str,
        access_token: &str,
    ) -> AuthServerResult<AuthorizationDetails>;

    // Returns the redirect URL back to the OAuth client (carrying the code).
    async fn approve_authorization(
        &self,
        authorization_id: &str,
        access_token: &str,
    ) -> AuthServerResult<String>;

    // Returns the redirect URL back to the OAuth client (carrying the error).
    async fn deny_authorization(
        &self,
        authorization_id: &str,
        access_token: &str,
    ) -> AuthServerResult<String>;
}
