//! Bearer auth for machine-auth routes (tool endpoint).
//!
//! `Authorization: Bearer <token>` → verify against the authorization server
//! → Principal in extensions. Any failure is a 401 pointing the client at the
//! protected-resource metadata, so it can discover where to obtain a token.

use axum::{
    Router,
    body::Body,
    extract::State,
    http::{HeaderValue, Request, header},
    middleware::{self, Next},
    response::{IntoResponse, Response},
};

use crate::error::AppError;
use crate::services::auth::bearer::bearer_token;
use crate::services::routing::RESOURCE_METADATA_PREFIX;
use crate::state::AppState;

/// Require a verified bearer on every route of `router`.
pub fn apply(router: Router<AppState>, state: AppState) -> Router<AppState> {
    // axum 0.8: State を受け取るため from_fn_with_state を使う
    router.route_layer(middleware::from_fn_with_state(state, bearer_middleware))
}

async fn bearer_middleware(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Response {
    let token = bearer_token(req.headers()).map(str::to_owned);

    match state.auth.bearer.verify(token.as_deref()).await {
        Some(principal) => {
            req.extensions_mut().insert(principal);
            next.run(req).await
        }
        None => unauthorized(&state.config.public_base_url),
    }
}

fn unauthorized(public_base_url: &str) -> Response {
    let mut response = AppError::Unauthorized.into_response();
    let challenge = format!(
        "Bearer resource_metadata=\"{}{}\"",
        public_base_url, RESOURCE_METADATA_PREFIX
    );
    if let Ok(value) = HeaderValue::from_str(&challenge) {
        response
            .headers_mut()
            .insert(header::WWW_AUTHENTICATE, value);
    }
    response
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;

    use super::*;

    #[test]
    fn challenge_points_at_resource_metadata() {
        let response = unauthorized("https://app.example.com");

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            response.headers()[header::WWW_AUTHENTICATE],
            "Bearer resource_metadata=\"https://app.example.com/.well-known/oauth-protected-resource\""
        );
    }
}
