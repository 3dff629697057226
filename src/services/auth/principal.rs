/*
 * Responsibility
 * - Handler から見える「認証済み主体」の型
 * - Session Gate / Bearer Verifier がリクエストごとに生成し、request extensions に格納する
 * - キャッシュしない (寿命 = 1 リクエスト)
 */
use std::collections::BTreeSet;

use crate::services::auth::server::AuthUser;

/// Verified identity attached to one request.
///
/// - `subject_id` is the authorization server's user id
/// - `email` is contextual metadata only; it is not part of the trust decision
/// - `token` is the raw access token, threaded into calls made on the user's behalf
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    pub subject_id: String,
    pub email: Option<String>,
    pub scopes: BTreeSet<String>,
    pub token: String,
}

impl Principal {
    pub fn new(user: AuthUser, token: impl Into<String>) -> Self {
        Self {
            subject_id: user.id,
            email: user.email,
            scopes: BTreeSet::new(),
            token: token.into(),
        }
    }

    pub fn with_scopes<I, S>(mut self, scopes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.scopes = scopes.into_iter().map(Into::into).collect();
        self
    }

    pub fn has_scope(&self, scope: &str) -> bool {
        self.scopes.contains(scope)
    }
}
