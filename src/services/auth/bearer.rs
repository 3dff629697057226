//! Bearer token verification for machine-auth routes.
//!
//! Every failure mode (no token, rejected token, unreachable server, timeout)
//! collapses into `None` so callers cannot tell them apart.
use std::sync::Arc;

use axum::http::{HeaderMap, header};
use tracing::warn;

use crate::services::auth::principal::Principal;
use crate::services::auth::server::AuthorizationServer;

/// Scope granted to every verified tool caller.
pub const DEFAULT_TOOL_SCOPE: &str = "read:stuff";

#[derive(Clone)]
pub struct BearerVerifier {
    server: Arc<dyn AuthorizationServer>,
}

impl BearerVerifier {
    pub fn new(server: Arc<dyn AuthorizationServer>) -> Self {
        Self { server }
    }

    pub async fn verify(&self, bearer_token: Option<&str>) -> Option<Principal> {
        let token = bearer_token.map(str::trim).filter(|t| !t.is_empty())?;

        match self.server.get_user(token).await {
            Ok(user) if !user.id.is_empty() => {
                Some(Principal::new(user, token).with_scopes([DEFAULT_TOOL_SCOPE]))
            }
            Ok(_) => None,
            Err(err) => {
                warn!(error = ?err, "bearer token verification failed");
                None
            }
        }
    }
}

/// Extract the token from `Authorization: Bearer <token>`.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let raw = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = raw.split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    Some(token.trim()).filter(|t| !t.is_empty())
}

#[cfg(test)]
mod tests {
    use axum::http::HeaderValue;

    use super::*;
    use crate::test_utils::FakeAuthServer;

    #[tokio::test]
    async fn valid_token_yields_principal_with_fixed_scope() {
        let server = FakeAuthServer::new().with_user("tok-1", "user-1", Some("ada@example.com"));
        let verifier = BearerVerifier::new(Arc::new(server));

        let principal = verifier.verify(Some("tok-1")).await.unwrap();

        assert_eq!(principal.subject_id, "user-1");
        assert_eq!(principal.email.as_deref(), Some("ada@example.com"));
        assert_eq!(principal.token, "tok-1");
        assert!(principal.has_scope(DEFAULT_TOOL_SCOPE));
        assert_eq!(principal.scopes.len(), 1);
    }

    #[tokio::test]
    async fn missing_and_rejected_tokens_are_indistinguishable() {
        let server = Arc::new(FakeAuthServer::new());
        let verifier = BearerVerifier::new(server.clone());

        let missing = verifier.verify(None).await;
        let empty = verifier.verify(Some("   ")).await;
        let rejected = verifier.verify(Some("forged")).await;

        assert_eq!(missing, None);
        assert_eq!(empty, None);
        assert_eq!(rejected, None);
        // Empty tokens never reach the server.
        assert_eq!(server.get_user_calls(), 1);
    }

    #[tokio::test]
    async fn server_outage_fails_closed() {
        let server = FakeAuthServer::new()
            .with_user("tok-1", "user-1", None)
            .unavailable();
        let verifier = BearerVerifier::new(Arc::new(server));

        assert_eq!(verifier.verify(Some("tok-1")).await, None);
    }

    #[test]
    fn bearer_token_parses_scheme_case_insensitively() {
        let mut headers = HeaderMap::new();
        assert_eq!(bearer_token(&headers), None);

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("bearer abc"));
        assert_eq!(bearer_token(&headers), Some("abc"));

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Basic abc"));
        assert_eq!(bearer_token(&headers), None);

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer "));
        assert_eq!(bearer_token(&headers), None);
    }
}
