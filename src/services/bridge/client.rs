//! Session-aware client handed to embedded UI components.
//!
//! Components receive this capability explicitly instead of discovering it.
//! Without a bridged token it behaves as an anonymous client.
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::warn;

use crate::services::auth::principal::Principal;
use crate::services::auth::server::{AuthServerResult, AuthorizationServer};
use crate::services::bridge::token::BridgeState;

#[async_trait]
pub trait SessionClient: Send + Sync {
    async fn current_principal(&self) -> Option<Principal>;

    async fn sign_in(&self, email: &str, password: &str) -> AuthServerResult<Principal>;

    // Best effort: the local token is dropped even if the server call fails.
    async fn sign_out(&self);
}

/// Client authenticated with a token held only in process memory.
pub struct BridgedSessionClient {
    server: Arc<dyn AuthorizationServer>,
    token: RwLock<Option<String>>,
}

impl BridgedSessionClient {
    pub fn new(server: Arc<dyn AuthorizationServer>, token: Option<String>) -> Self {
        Self {
            server,
            token: RwLock::new(token),
        }
    }

    /// Build the client from a finished bridge; `None` while still pending.
    pub fn from_bridge(server: Arc<dyn AuthorizationServer>, state: &BridgeState) -> Option<Self> {
        match state {
            BridgeState::Pending => None,
            BridgeState::Resolved(token) => Some(Self::new(server, token.clone())),
        }
    }

    pub async fn is_anonymous(&self) -> bool {
        self.token.read().await.is_none()
    }
}

#[async_trait]
impl SessionClient for BridgedSessionClient {
    async fn current_principal(&self) -> Option<Principal> {
        let token = self.token.read().await.clone()?;
        match self.server.get_user(&token).await {
            Ok(user) => Some(Principal::new(user, token)),
            Err(err) => {
                warn!(error = ?err, "bridged session is not valid");
                None
            }
        }
    }

    async fn sign_in(&self, email: &str, password: &str) -> AuthServerResult<Principal> {
        let tokens = self.server.sign_in_with_password(email, password).await?;
        let user = self.server.get_user(&tokens.access_token).await?;
        *self.token.write().await = Some(tokens.access_token.clone());
        Ok(Principal::new(user, tokens.access_token))
    }

    async fn sign_out(&self) {
        let Some(token) = self.token.write().await.take() else {
            return;
        };
        if let Err(err) = self.server.sign_out(&token).await {
            warn!(error = ?err, "sign out failed at the authorization server");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{FakeAuthServer, session_tokens};

    #[tokio::test]
    async fn pending_bridge_yields_no_client() {
        let server: Arc<dyn AuthorizationServer> = Arc::new(FakeAuthServer::new());
        assert!(BridgedSessionClient::from_bridge(server, &BridgeState::Pending).is_none());
    }

    #[tokio::test]
    async fn missing_token_degrades_to_anonymous() {
        let server = Arc::new(FakeAuthServer::new());
        let client =
            BridgedSessionClient::from_bridge(server.clone(), &BridgeState::Resolved(None)).unwrap();

        assert!(client.is_anonymous().await);
        assert_eq!(client.current_principal().await, None);
        assert!(server.calls().is_empty());
    }

    #[tokio::test]
    async fn bridged_token_resolves_the_user() {
        let server = Arc::new(FakeAuthServer::new().with_user("tok", "user-1", None));
        let client = BridgedSessionClient::from_bridge(
            server,
            &BridgeState::Resolved(Some("tok".into())),
        )
        .unwrap();

        let principal = client.current_principal().await.unwrap();
        assert_eq!(principal.subject_id, "user-1");
    }

    #[tokio::test]
    async fn sign_in_then_sign_out() {
        let server = Arc::new(
            FakeAuthServer::new()
                .with_password("ada@example.com", "pw", session_tokens("a1", "r1", 2_000_000_000))
                .with_user("a1", "user-1", Some("ada@example.com")),
        );
        let client = BridgedSessionClient::new(server.clone(), None);

        let principal = client.sign_in("ada@example.com", "pw").await.unwrap();
        assert_eq!(principal.token, "a1");
        assert!(!client.is_anonymous().await);

        client.sign_out().await;
        assert!(client.is_anonymous().await);
        assert_eq!(
            server.calls(),
            vec!["sign_in_with_password", "get_user", "sign_out"]
        );
    }
}
