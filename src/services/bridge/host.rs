//! `ToolHost` over the tool endpoint's JSON-RPC transport.
//!
//! Used when the bridge runs outside a browser host: the call is sent to the
//! tool endpoint with the host's own bearer credential.
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{Value, json};
use url::Url;

use crate::services::bridge::token::{BridgeError, ToolHost};

#[derive(Clone)]
pub struct McpToolHost {
    client: Client,
    endpoint: Url,
    bearer: String,
}

#[derive(Debug, Deserialize)]
struct RpcResponse {
    #[serde(default)]
    result: Option<Value>,
    #[serde(default)]
    error: Option<RpcError>,
}

#[derive(Debug, Deserialize)]
struct RpcError {
    message: String,
}

impl McpToolHost {
    pub fn new(client: Client, endpoint: Url, bearer: impl Into<String>) -> Self {
        Self {
            client,
            endpoint,
            bearer: bearer.into(),
        }
    }
}

#[async_trait]
impl ToolHost for McpToolHost {
    async fn call_tool(&self, name: &str, arguments: Value) -> Result<Option<String>, BridgeError> {
        let request = json!({
            "jsonrpc": "2.0",
            "id": 1,
            "method": "tools/call",
            "params": { "name": name, "arguments": arguments },
        });

        let response = self
            .client
            .post(self.endpoint.clone())
            .bearer_auth(&self.bearer)
            .json(&request)
            .send()
            .await
            .map_err(|e| BridgeError::Transport(e.to_string()))?;

        if !response.status().is_success() {
            return Err(BridgeError::Transport(format!("HTTP {}", response.status())));
        }

        let body: RpcResponse = response
            .json()
            .await
            .map_err(|e| BridgeError::Decode(e.to_string()))?;

        if let Some(error) = body.error {
            return Err(BridgeError::ToolCall(error.message));
        }
        let Some(result) = body.result else {
            return Ok(None);
        };
        if result.get("isError").and_then(Value::as_bool) == Some(true) {
            return Err(BridgeError::ToolCall(first_text(&result).unwrap_or_default()));
        }

        // Prefer the text content; otherwise hand back the whole envelope so a
        // nested `structuredContent.token` can still be found.
        Ok(first_text(&result).or_else(|| Some(result.to_string())))
    }
}

fn first_text(result: &Value) -> Option<String> {
    result
        .get("content")?
        .as_array()?
        .iter()
        .find(|item| item.get("type").and_then(Value::as_str) == Some("text"))
        .and_then(|item| item.get("text"))
        .and_then(Value::as_str)
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;
    use crate::services::bridge::token::{BridgeState, TokenBridge};

    fn host_for(server: &MockServer) -> McpToolHost {
        let endpoint = Url::parse(&format!("{}/mcp", server.uri())).unwrap();
        McpToolHost::new(Client::new(), endpoint, "host-credential")
    }

    #[tokio::test]
    async fn bridge_reads_token_from_tool_text() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/mcp"))
            .and(header("authorization", "Bearer host-credential"))
            .and(body_partial_json(json!({
                "method": "tools/call",
                "params": {"name": "get_auth_token"}
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "jsonrpc": "2.0",
                "id": 1,
                "result": {
                    "content": [{"type": "text", "text": "{\"token\":\"user-token\"}"}],
                    "structuredContent": {"token": "user-token"}
                }
            })))
            .expect(1)
            .mount(&server)
            .await;

        let mut bridge = TokenBridge::new(host_for(&server));
        assert_eq!(bridge.resolve().await.token(), Some("user-token"));
    }

    #[tokio::test]
    async fn structured_only_result_still_yields_token() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/mcp"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "jsonrpc": "2.0",
                "id": 1,
                "result": {"content": [], "structuredContent": {"token": "nested"}}
            })))
            .mount(&server)
            .await;

        let mut bridge = TokenBridge::new(host_for(&server));
        assert_eq!(bridge.resolve().await.token(), Some("nested"));
    }

    #[tokio::test]
    async fn unauthorized_host_degrades_to_no_token() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/mcp"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;

        let mut bridge = TokenBridge::new(host_for(&server));
        assert_eq!(bridge.resolve().await, &BridgeState::Resolved(None));
    }

    #[tokio::test]
    async fn rpc_error_is_a_tool_failure() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/mcp"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "jsonrpc": "2.0",
                "id": 1,
                "error": {"code": -32602, "message": "Unknown tool"}
            })))
            .mount(&server)
            .await;

        let err = host_for(&server)
            .call_tool("get_auth_token", json!({}))
            .await
            .unwrap_err();
        assert!(matches!(err, BridgeError::ToolCall(msg) if msg == "Unknown tool"));
    }
}
