/*
 * Responsibility
 * - URL 構造を定義
 * - /mcp は bearer gate を route_layer で掛ける (session は見ない)
 * - それ以外の認証は gateway (middleware::gateway) が分類して決める
 */
use axum::{
    Router,
    routing::{get, post},
};

use crate::api::handlers::{
    consent::consent_page,
    embedded::embedded_entry,
    home::home,
    mcp::{handle_rpc, reject_stream},
    oauth::decide,
    session::{current_user, login, login_form, logout},
    well_known::{protected_resource, protected_resource_for},
};
use crate::middleware;
use crate::state::AppState;

pub fn routes(state: AppState) -> Router<AppState> {
    let tool_endpoint = Router::new().route("/mcp", post(handle_rpc).get(reject_stream));
    let tool_endpoint = middleware::auth::bearer::apply(tool_endpoint, state);

    Router::new()
        .route("/", get(home))
        .route("/auth/login", get(login_form).post(login))
        .route("/login", get(login_form))
        .route("/auth/logout", post(logout))
        .route("/api/auth/user", get(current_user))
        .route("/api/oauth/decision", post(decide))
        .route("/oauth/consent", get(consent_page))
        .route(
            "/.well-known/oauth-protected-resource",
            get(protected_resource),
        )
        .route(
            "/.well-known/oauth-protected-resource/{*resource_path}",
            get(protected_resource_for),
        )
        .route("/chatgpt", get(embedded_entry))
        .merge(tool_endpoint)
}
