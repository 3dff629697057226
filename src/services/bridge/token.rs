//! Token Bridge: obtain the end user's bearer token through the embedded host's
//! tool-call channel, once per mount.
//!
//! The state is `Pending` until the single resolution attempt finishes, then
//! `Resolved(Some(token))` or `Resolved(None)`. Failures are logged and end in
//! `Resolved(None)`; nothing is retried.
use async_trait::async_trait;
use serde_json::{Value, json};
use thiserror::Error;
use tracing::{debug, warn};

/// Tool exposed by the tool endpoint that hands the caller its own token.
pub const TOKEN_TOOL_NAME: &str = "get_auth_token";

#[derive(Debug, Error)]
pub enum BridgeError {
    #[error("tool host unreachable: {0}")]
    Transport(String),
    #[error("tool call failed: {0}")]
    ToolCall(String),
    #[error("unexpected tool response: {0}")]
    Decode(String),
}

/// The hosting environment's tool-call capability.
#[async_trait]
pub trait ToolHost: Send + Sync {
    // `Ok(None)` means the call succeeded but produced no result text.
    async fn call_tool(&self, name: &str, arguments: Value) -> Result<Option<String>, BridgeError>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BridgeState {
    Pending,
    Resolved(Option<String>),
}

impl BridgeState {
    /// Children render only once resolution finished (with or without a token).
    pub fn is_ready(&self) -> bool {
        matches!(self, Self::Resolved(_))
    }

    pub fn token(&self) -> Option<&str> {
        match self {
            Self::Resolved(Some(token)) => Some(token),
            _ => None,
        }
    }
}

pub struct TokenBridge<H> {
    host: H,
    state: BridgeState,
}

impl<H: ToolHost> TokenBridge<H> {
    pub fn new(host: H) -> Self {
        Self {
            host,
            state: BridgeState::Pending,
        }
    }

    pub fn state(&self) -> &BridgeState {
        &self.state
    }

    /// Run the one resolution attempt for this mount.
    ///
    /// Calling it again after it resolved returns the stored state without
    /// contacting the host.
    pub async fn resolve(&mut self) -> &BridgeState {
        if self.state.is_ready() {
            return &self.state;
        }

        let token = match self.host.call_tool(TOKEN_TOOL_NAME, json!({})).await {
            Ok(Some(result)) => extract_token(&result),
            Ok(None) => None,
            Err(err) => {
                warn!(error = ?err, "failed to fetch auth token");
                None
            }
        };

        debug!(has_token = token.is_some(), "token bridge resolved");
        self.state = BridgeState::Resolved(token);
        &self.state
    }
}

/// Pull the token out of a tool result.
///
/// The result may be a JSON envelope (`{"token": ..}` or
/// `{"structuredContent": {"token": ..}}`) or the bare token. An envelope
/// without either field falls back to the raw text.
pub fn extract_token(raw: &str) -> Option<String> {
    let parsed = serde_json::from_str::<Value>(raw).ok();
    let candidate = parsed
        .as_ref()
        .and_then(|envelope| {
            non_empty_str(envelope.get("token")).or_else(|| {
                non_empty_str(
                    envelope
                        .get("structuredContent")
                        .and_then(|sc| sc.get("token")),
                )
            })
        })
        .unwrap_or(raw);

    let trimmed = candidate.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

fn non_empty_str(value: Option<&Value>) -> Option<&str> {
    value.and_then(Value::as_str).filter(|s| !s.is_empty())
}
