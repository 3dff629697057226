//! GoTrue (Supabase Auth) HTTP client implementing `AuthorizationServer`.
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use tracing::debug;
use url::Url;

use crate::services::auth::server::{
    AuthServerError, AuthServerResult, AuthUser, AuthorizationDetails, AuthorizationServer,
    SessionTokens,
};

/// Access tokens without an explicit lifetime are assumed to live this long.
const DEFAULT_EXPIRES_IN_SECONDS: i64 = 3600;

#[derive(Clone)]
pub struct GoTrueClient {
    client: Client,
    base_url: Url,
    anon_key: String,
}

impl std::fmt::Debug for GoTrueClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Do not print the anon key
        f.debug_struct("GoTrueClient")
            .field("base_url", &self.base_url.as_str())
            .finish()
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    refresh_token: String,
    #[serde(default)]
    expires_in: Option<i64>,
    #[serde(default)]
    expires_at: Option<i64>,
}

impl TokenResponse {
    fn into_tokens(self, now: i64) -> SessionTokens {
        let expires_at = self
            .expires_at
            .unwrap_or_else(|| now + self.expires_in.unwrap_or(DEFAULT_EXPIRES_IN_SECONDS));
        SessionTokens {
            access_token: self.access_token,
            refresh_token: self.refresh_token,
            expires_at,
        }
    }
}

#[derive(Serialize)]
struct PasswordGrant<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Serialize)]
struct RefreshGrant<'a> {
    refresh_token: &'a str,
}

#[derive(Serialize)]
struct ConsentRequest<'a> {
    action: &'a str,
}

#[derive(Deserialize)]
struct ConsentResponse {
    #[serde(alias = "redirect_to")]
    redirect_url: String,
}

impl GoTrueClient {
    /// `timeout` bounds every round trip; an elapsed request becomes `AuthServerError::Timeout`.
    pub fn new(
        base_url: &str,
        anon_key: impl Into<String>,
        timeout: Duration,
    ) -> AuthServerResult<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AuthServerError::Transport(e.to_string()))?;

        let base_url = Url::parse(base_url.trim_end_matches('/'))
            .map_err(|e| AuthServerError::Transport(format!("invalid base url: {e}")))?;

        Ok(Self {
            client,
            base_url,
            anon_key: anon_key.into(),
        })
    }

    fn url(&self, segments: &[&str]) -> AuthServerResult<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| AuthServerError::Transport("base url cannot be a base".into()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    // Every call carries the project key; user calls additionally carry the user's token.
    fn request(&self, method: Method, url: Url, access_token: Option<&str>) -> RequestBuilder {
        let bearer = access_token.unwrap_or(&self.anon_key);
        self.client
            .request(method, url)
            .header("apikey", &self.anon_key)
            .bearer_auth(bearer)
    }

    async fn send(&self, request: RequestBuilder) -> AuthServerResult<reqwest::Response> {
        let response = request.send().await.map_err(transport_error)?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        debug!(status = %status, "authorization server returned an error");
        Err(AuthServerError::Api {
            status: status.as_u16(),
            message: error_message(&body, status.canonical_reason().unwrap_or("request failed")),
        })
    }

    async fn send_json<T: DeserializeOwned>(&self, request: RequestBuilder) -> AuthServerResult<T> {
        self.send(request)
            .await?
            .json::<T>()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    AuthServerError::Timeout
                } else {
                    AuthServerError::Decode(e.to_string())
                }
            })
    }

    async fn token_grant<B: Serialize>(
        &self,
        grant_type: &str,
        body: &B,
    ) -> AuthServerResult<SessionTokens> {
        let url = self.url(&["token"])?;
        let request = self
            .request(Method::POST, url, None)
            .query(&[("grant_type", grant_type)])
            .json(body);

        let response: TokenResponse = self.send_json(request).await?;
        Ok(response.into_tokens(chrono::Utc::now().timestamp()))
    }

    async fn consent(
        &self,
        authorization_id: &str,
        access_token: &str,
        action: &str,
    ) -> AuthServerResult<String> {
        let url = self.url(&["oauth", "authorizations", authorization_id, "consent"])?;
        let request = self
            .request(Method::POST, url, Some(access_token))
            .json(&ConsentRequest { action });

        let response: ConsentResponse = self.send_json(request).await?;
        Ok(response.redirect_url)
    }
}

fn transport_error(e: reqwest::Error) -> AuthServerError {
    if e.is_timeout() {
        AuthServerError::Timeout
    } else {
        AuthServerError::Transport(e.to_string())
    }
}

// GoTrue reports errors under different keys depending on the endpoint.
fn error_message(body: &str, fallback: &str) -> String {
    let parsed = serde_json::from_str::<serde_json::Value>(body).ok();
    let from_json = parsed.as_ref().and_then(|value| {
        ["msg", "message", "error_description", "error"]
            .iter()
            .find_map(|key| value.get(key).and_then(|v| v.as_str()))
            .map(str::to_string)
    });

    match from_json {
        Some(message) => message,
        None if parsed.is_none() && !body.trim().is_empty() => body.trim().to_string(),
        None => fallback.to_string(),
    }
}

#[async_trait]
impl AuthorizationServer for GoTrueClient {
    async fn get_user(&self, access_token: &str) -> AuthServerResult<AuthUser> {
        let url = self.url(&["user"])?;
        self.send_json(self.request(Method::GET, url, Some(access_token)))
            .await
    }

    async fn sign_in_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> AuthServerResult<SessionTokens> {
        self.token_grant("password", &PasswordGrant { email, password })
            .await
    }

    async fn refresh_session(&self, refresh_token: &str) -> AuthServerResult<SessionTokens> {
        self.token_grant("refresh_token", &RefreshGrant { refresh_token })
            .await
    }

    async fn sign_out(&self, access_token: &str) -> AuthServerResult<()> {
        let url = self.url(&["logout"])?;
        self.send(self.request(Method::POST, url, Some(access_token)))
            .await?;
        Ok(())
    }

    async fn get_authorization_details(
        &self,
        authorization_id: &str,
        access_token: &str,
    ) -> AuthServerResult<AuthorizationDetails> {
        let url = self.url(&["oauth", "authorizations", authorization_id])?;
        self.send_json(self.request(Method::GET, url, Some(access_token)))
            .await
    }

    async fn approve_authorization(
        &self,
        authorization_id: &str,
        access_token: &str,
    ) -> AuthServerResult<String> {
        self.consent(authorization_id, access_token, "approve").await
    }

    async fn deny_authorization(
        &self,
        authorization_id: &str,
        access_token: &str,
    ) -> AuthServerResult<String> {
        self.consent(authorization_id, access_token, "deny").await
    }
}
