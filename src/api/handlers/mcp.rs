/*
 * Responsibility
 * - /mcp (bearer gate の内側)
 * - 最小限の JSON-RPC 2.0: initialize / ping / tools/list / tools/call
 * - notification (id なし) は 202 で受けるだけ
 */
use axum::{
    Json,
    body::Bytes,
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use serde_json::{Value, json};
use tracing::debug;

use crate::api::dto::mcp::{ErrorCode, JSONRPC_VERSION, JsonRpcRequest, JsonRpcResponse, ToolCallParams};
use crate::api::extractors::PrincipalExtractor;
use crate::services::auth::Principal;
use crate::services::tools::{self, ToolError};

const LATEST_PROTOCOL_VERSION: &str = "2025-06-18";

type RpcResult = Result<Value, (ErrorCode, String)>;

pub async fn handle_rpc(PrincipalExtractor(principal): PrincipalExtractor, body: Bytes) -> Response {
    let raw: Value = match serde_json::from_slice(&body) {
        Ok(raw) => raw,
        Err(err) => {
            debug!(error = %err, "unparseable JSON-RPC body");
            return rpc_failure(Value::Null, ErrorCode::PARSE_ERROR, "Parse error");
        }
    };

    let request: JsonRpcRequest = match serde_json::from_value(raw) {
        Ok(request) => request,
        Err(_) => return rpc_failure(Value::Null, ErrorCode::INVALID_REQUEST, "Invalid Request"),
    };

    if request.jsonrpc.as_deref() != Some(JSONRPC_VERSION) {
        let id = request.id.unwrap_or(Value::Null);
        return rpc_failure(id, ErrorCode::INVALID_REQUEST, "Invalid Request");
    }

    let Some(id) = request.id else {
        debug!(method = %request.method, "notification accepted");
        return StatusCode::ACCEPTED.into_response();
    };

    let response = match dispatch(&principal, &request.method, request.params) {
        Ok(result) => JsonRpcResponse::success(id, result),
        Err((code, message)) => JsonRpcResponse::failure(id, code, message),
    };
    Json(response).into_response()
}

/// Streaming (SSE) is not offered; clients use POST.
pub async fn reject_stream(_principal: PrincipalExtractor) -> Response {
    (StatusCode::METHOD_NOT_ALLOWED, [(header::ALLOW, "POST")]).into_response()
}

fn dispatch(principal: &Principal, method: &str, params: Option<Value>) -> RpcResult {
    match method {
        "initialize" => Ok(initialize(params.as_ref())),
        "ping" => Ok(json!({})),
        "tools/list" => Ok(tools::list_tools()),
        "tools/call" => {
            let params: ToolCallParams = params
                .and_then(|p| serde_json::from_value(p).ok())
                .ok_or_else(|| (ErrorCode::INVALID_PARAMS, "Invalid params".to_string()))?;
            let arguments = params.arguments.unwrap_or(Value::Null);

            tools::call_tool(principal, &params.name, &arguments).map_err(|err| match err {
                ToolError::UnknownTool(_) | ToolError::InvalidArguments(_) => {
                    (ErrorCode::INVALID_PARAMS, err.to_string())
                }
                ToolError::InsufficientScope(_) => (ErrorCode::INVALID_REQUEST, err.to_string()),
            })
        }
        other => Err((
            ErrorCode::METHOD_NOT_FOUND,
            format!("Method not found: {}", other),
        )),
    }
}

fn initialize(params: Option<&Value>) -> Value {
    let protocol_version = params
        .and_then(|p| p.get("protocolVersion"))
        .and_then(Value::as_str)
        .unwrap_or(LATEST_PROTOCOL_VERSION);

    json!({
        "protocolVersion": protocol_version,
        "capabilities": { "tools": {} },
        "serverInfo": {
            "name": env!("CARGO_PKG_NAME"),
            "version": env!("CARGO_PKG_VERSION"),
        }
    })
}

fn rpc_failure(id: Value, code: ErrorCode, message: &str) -> Response {
    (
        StatusCode::BAD_REQUEST,
        Json(JsonRpcResponse::failure(id, code, message)),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::auth::bearer::DEFAULT_TOOL_SCOPE;
    use crate::services::auth::server::AuthUser;

    fn principal() -> Principal {
        Principal::new(
            AuthUser {
                id: "user-1".into(),
                email: None,
            },
            "user-token",
        )
        .with_scopes([DEFAULT_TOOL_SCOPE])
    }

    #[test]
    fn initialize_echoes_requested_protocol() {
        let result = dispatch(
            &principal(),
            "initialize",
            Some(json!({"protocolVersion": "2025-03-26"})),
        )
        .unwrap();
        assert_eq!(result["protocolVersion"], "2025-03-26");
        assert_eq!(result["serverInfo"]["name"], env!("CARGO_PKG_NAME"));
    }

    #[test]
    fn unknown_method_and_tool_map_to_rpc_codes() {
        let (code, _) = dispatch(&principal(), "resources/list", None).unwrap_err();
        assert_eq!(code, ErrorCode::METHOD_NOT_FOUND);

        let (code, message) = dispatch(
            &principal(),
            "tools/call",
            Some(json!({"name": "nope", "arguments": {}})),
        )
        .unwrap_err();
        assert_eq!(code, ErrorCode::INVALID_PARAMS);
        assert_eq!(message, "Unknown tool: nope");
    }

    #[test]
    fn tools_call_without_params_is_invalid() {
        let (code, _) = dispatch(&principal(), "tools/call", None).unwrap_err();
        assert_eq!(code, ErrorCode::INVALID_PARAMS);
    }
}
