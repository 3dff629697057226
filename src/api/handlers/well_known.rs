//! Protected Resource Metadata (RFC 9728).
//!
//! Tool clients fetch this after a 401 from the tool endpoint to learn which
//! authorization server issues tokens for this resource.
//!
//! `GET /.well-known/oauth-protected-resource`       → resource = public base URL
//! `GET /.well-known/oauth-protected-resource/<path>` → resource = base URL + `/<path>`

use axum::{
    Json,
    extract::{Path, State},
};
use serde::Serialize;

use crate::services::auth::bearer::DEFAULT_TOOL_SCOPE;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct ProtectedResourceMetadata {
    pub resource: String,
    pub authorization_servers: Vec<String>,
    pub bearer_methods_supported: Vec<&'static str>,
    pub scopes_supported: Vec<&'static str>,
}

pub async fn protected_resource(State(state): State<AppState>) -> Json<ProtectedResourceMetadata> {
    Json(metadata(&state, ""))
}

pub async fn protected_resource_for(
    State(state): State<AppState>,
    Path(resource_path): Path<String>,
) -> Json<ProtectedResourceMetadata> {
    Json(metadata(&state, &resource_path))
}

fn metadata(state: &AppState, resource_path: &str) -> ProtectedResourceMetadata {
    let base = &state.config.public_base_url;
    let resource_path = resource_path.trim_matches('/');
    let resource = if resource_path.is_empty() {
        base.clone()
    } else {
        format!("{}/{}", base, resource_path)
    };

    ProtectedResourceMetadata {
        resource,
        authorization_servers: vec![state.config.auth_server_url.clone()],
        // header only (RFC 6750 §2.1)
        bearer_methods_supported: vec!["header"],
        scopes_supported: vec![DEFAULT_TOOL_SCOPE],
    }
}
