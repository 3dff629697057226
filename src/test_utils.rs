//! Test helpers: a scripted in-memory authorization server, a test `Config`
//! and a fully layered router built on top of them.
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::Router;

use crate::app::build_router;
use crate::config::Config;
use crate::services::auth::factory::AuthServices;
use crate::services::auth::server::{
    AuthServerError, AuthServerResult, AuthUser, AuthorizationDetails, AuthorizationServer,
    OAuthClientInfo, SessionTokens,
};
use crate::services::auth::session::encode_tokens;
use crate::state::AppState;

pub const TEST_COOKIE_NAME: &str = "sb-auth-token";

pub fn session_tokens(access: &str, refresh: &str, expires_at: i64) -> SessionTokens {
    SessionTokens {
        access_token: access.to_string(),
        refresh_token: refresh.to_string(),
        expires_at,
    }
}

/// Development config: public base `http://localhost:3000`, empty CORS allowlist.
pub fn test_config(auth_server_url: &str) -> Config {
    let auth_server_url = auth_server_url.to_string();
    Config::from_lookup(move |key| match key {
        "AUTH_SERVER_URL" => Some(auth_server_url.clone()),
        "SUPABASE_ANON_KEY" => Some("anon-key".to_string()),
        _ => None,
    })
    .unwrap()
}

/// Full application router around `server`.
pub fn test_app(server: FakeAuthServer) -> (Arc<FakeAuthServer>, Router) {
    test_app_with(server, test_config("http://auth.test"))
}

pub fn test_app_with(server: FakeAuthServer, config: Config) -> (Arc<FakeAuthServer>, Router) {
    let server = Arc::new(server);
    let auth = AuthServices::with_server(&config, server.clone());
    (server, build_router(AppState::new(config, auth)))
}

/// `Cookie` header value carrying `tokens` as the session.
pub fn session_cookie(tokens: &SessionTokens) -> String {
    format!("{}={}", TEST_COOKIE_NAME, encode_tokens(tokens).unwrap())
}

struct Authorization {
    details: AuthorizationDetails,
    approve_url: String,
    deny_url: String,
}

/// Scripted authorization server.
///
/// Unknown tokens are rejected the way a real server rejects them (4xx);
/// `unavailable()` turns every call into a transport failure.
#[derive(Default)]
pub struct FakeAuthServer {
    users: HashMap<String, AuthUser>,
    passwords: HashMap<(String, String), SessionTokens>,
    refreshes: HashMap<String, SessionTokens>,
    authorizations: HashMap<String, Authorization>,
    unavailable: bool,
    latency: Option<Duration>,
    calls: Mutex<Vec<String>>,
}

impl FakeAuthServer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_user(mut self, access_token: &str, id: &str, email: Option<&str>) -> Self {
        self.users.insert(
            access_token.to_string(),
            AuthUser {
                id: id.to_string(),
                email: email.map(str::to_string),
            },
        );
        self
    }

    pub fn with_password(mut self, email: &str, password: &str, tokens: SessionTokens) -> Self {
        self.passwords
            .insert((email.to_string(), password.to_string()), tokens);
        self
    }

    pub fn with_refresh(mut self, refresh_token: &str, rotated: SessionTokens) -> Self {
        self.refreshes.insert(refresh_token.to_string(), rotated);
        self
    }

    pub fn with_authorization(
        mut self,
        authorization_id: &str,
        client_name: &str,
        approve_url: &str,
        deny_url: &str,
    ) -> Self {
        self.authorizations.insert(
            authorization_id.to_string(),
            Authorization {
                details: AuthorizationDetails {
                    authorization_id: authorization_id.to_string(),
                    client: OAuthClientInfo {
                        name: client_name.to_string(),
                        client_id: Some(format!("{}-client", authorization_id)),
                    },
                    redirect_url: "https://client.example.com/callback".to_string(),
                    scope: Some("openid email".to_string()),
                },
                approve_url: approve_url.to_string(),
                deny_url: deny_url.to_string(),
            },
        );
        self
    }

    pub fn unavailable(mut self) -> Self {
        self.unavailable = true;
        self
    }

    /// Delay every user lookup by `latency`.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Method names in call order.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn get_user_calls(&self) -> usize {
        self.calls().iter().filter(|c| *c == "get_user").count()
    }

    fn record(&self, method: &str) -> AuthServerResult<()> {
        self.calls.lock().unwrap().push(method.to_string());
        if self.unavailable {
            return Err(AuthServerError::Transport("connection refused".into()));
        }
        Ok(())
    }

    fn user(&self, access_token: &str) -> AuthServerResult<AuthUser> {
        self.users
            .get(access_token)
            .cloned()
            .ok_or_else(|| rejected(401, "invalid JWT"))
    }

    fn authorization(&self, authorization_id: &str, access_token: &str) -> AuthServerResult<&Authorization> {
        self.user(access_token)?;
        self.authorizations
            .get(authorization_id)
            .ok_or_else(|| rejected(404, "authorization not found"))
    }
}

fn rejected(status: u16, message: &str) -> AuthServerError {
    AuthServerError::Api {
        status,
        message: message.to_string(),
    }
}

#[async_trait]
impl AuthorizationServer for FakeAuthServer {
    async fn get_user(&self, access_token: &str) -> AuthServerResult<AuthUser> {
        self.record("get_user")?;
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
        self.user(access_token)
    }

    async fn sign_in_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> AuthServerResult<SessionTokens> {
        self.record("sign_in_with_password")?;
        self.passwords
            .get(&(email.to_string(), password.to_string()))
            .cloned()
            .ok_or_else(|| rejected(400, "Invalid login credentials"))
    }

    async fn refresh_session(&self, refresh_token: &str) -> AuthServerResult<SessionTokens> {
        self.record("refresh_session")?;
        self.refreshes
            .get(refresh_token)
            .cloned()
            .ok_or_else(|| rejected(400, "Invalid Refresh Token: Refresh Token Not Found"))
    }

    async fn sign_out(&self, access_token: &str) -> AuthServerResult<()> {
        self.record("sign_out")?;
        self.user(access_token).map(|_| ())
    }

    async fn get_authorization_details(
        &self,
        authorization_id: &str,
        access_token: &str,
    ) -> AuthServerResult<AuthorizationDetails> {
        self.record("get_authorization_details")?;
        self.authorization(authorization_id, access_token)
            .map(|a| a.details.clone())
    }

    async fn approve_authorization(
        &self,
        authorization_id: &str,
        access_token: &str,
    ) -> AuthServerResult<String> {
        self.record("approve_authorization")?;
        self.authorization(authorization_id, access_token)
            .map(|a| a.approve_url.clone())
    }

    async fn deny_authorization(
        &self,
        authorization_id: &str,
        access_token: &str,
    ) -> AuthServerResult<String> {
        self.record("deny_authorization")?;
        self.authorization(authorization_id, access_token)
            .map(|a| a.deny_url.clone())
    }
}
