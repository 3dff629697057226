/// Factory: build the auth services from application `Config`.
use std::sync::Arc;

use crate::config::Config;
use crate::services::auth::gotrue::GoTrueClient;
use crate::services::auth::server::{AuthServerResult, AuthorizationServer};
use crate::services::auth::session::{CookieSessionStore, SessionCookie, SessionStore};
use crate::services::auth::BearerVerifier;

/// Process-level auth services shared through `AppState`.
#[derive(Clone)]
pub struct AuthServices {
    pub server: Arc<dyn AuthorizationServer>,
    pub sessions: Arc<dyn SessionStore>,
    pub bearer: BearerVerifier,
    pub cookie: SessionCookie,
}

impl AuthServices {
    /// Wire the services around an already-built authorization server.
    pub fn with_server(config: &Config, server: Arc<dyn AuthorizationServer>) -> Self {
        let cookie = SessionCookie::from_config(config);
        let sessions = CookieSessionStore::new(
            server.clone(),
            cookie.clone(),
            config.session_refresh_margin_seconds,
        );

        Self {
            bearer: BearerVerifier::new(server.clone()),
            sessions: Arc::new(sessions),
            server,
            cookie,
        }
    }
}

pub fn build_auth_services(config: &Config) -> AuthServerResult<AuthServices> {
    let server = GoTrueClient::new(
        &config.auth_server_url,
        config.auth_anon_key.clone(),
        config.auth_server_timeout,
    )?;

    Ok(AuthServices::with_server(config, Arc::new(server)))
}
