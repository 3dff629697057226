//! Tools exposed on the tool endpoint.
//!
//! Every call runs on behalf of a verified `Principal`; tool logic never sees
//! unauthenticated requests.
use chrono::{SecondsFormat, Utc};
use serde_json::{Value, json};
use thiserror::Error;

use crate::services::auth::Principal;
use crate::services::auth::bearer::DEFAULT_TOOL_SCOPE;
use crate::services::bridge::token::TOKEN_TOOL_NAME;

pub const SHOW_CONTENT_TOOL_NAME: &str = "show_content";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ToolError {
    #[error("Unknown tool: {0}")]
    UnknownTool(String),
    #[error("Invalid arguments: {0}")]
    InvalidArguments(&'static str),
    #[error("Missing scope: {0}")]
    InsufficientScope(&'static str),
}

/// `tools/list` result.
pub fn list_tools() -> Value {
    json!({
        "tools": [
            {
                "name": SHOW_CONTENT_TOOL_NAME,
                "title": "Show Content",
                "description": "Fetch and display the homepage content with the name of the user",
                "inputSchema": {
                    "type": "object",
                    "properties": {
                        "name": {
                            "type": "string",
                            "description": "The name of the user to display on the homepage"
                        }
                    },
                    "required": ["name"]
                }
            },
            {
                "name": TOKEN_TOOL_NAME,
                "title": "Get Auth Token",
                "description": "Return the caller's session token for the embedded UI",
                "inputSchema": { "type": "object", "properties": {} }
            }
        ]
    })
}

/// `tools/call` result for `name`.
pub fn call_tool(principal: &Principal, name: &str, arguments: &Value) -> Result<Value, ToolError> {
    if !principal.has_scope(DEFAULT_TOOL_SCOPE) {
        return Err(ToolError::InsufficientScope(DEFAULT_TOOL_SCOPE));
    }

    match name {
        SHOW_CONTENT_TOOL_NAME => show_content(arguments),
        TOKEN_TOOL_NAME => Ok(auth_token(principal)),
        other => Err(ToolError::UnknownTool(other.to_string())),
    }
}

fn show_content(arguments: &Value) -> Result<Value, ToolError> {
    let name = arguments
        .get("name")
        .and_then(Value::as_str)
        .ok_or(ToolError::InvalidArguments("name must be a string"))?;

    Ok(json!({
        "content": [{ "type": "text", "text": format!("Hello, {}!", name) }],
        "structuredContent": {
            "name": name,
            "timestamp": Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
        }
    }))
}

// Counterpart of the token bridge: hands the verified bearer back to the embedded UI.
fn auth_token(principal: &Principal) -> Value {
    let envelope = json!({ "token": principal.token });
    json!({
        "content": [{ "type": "text", "text": envelope.to_string() }],
        "structuredContent": envelope,
    })
}
