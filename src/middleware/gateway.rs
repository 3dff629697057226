//! Request gateway: classify once, dispatch to exactly one gate.
//!
//! - Preflight: answered here with an empty 204 (CORS headers come from
//!   `middleware::cors`, which wraps everything)
//! - Asset / MachineAuth: passed through untouched (machine routes carry their
//!   own bearer check, see `middleware::auth::bearer`)
//! - SessionGated: `middleware::auth::session::gate`

use axum::{
    Router,
    body::Body,
    extract::State,
    http::{Request, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
};
use tracing::debug;

use crate::middleware::auth::session;
use crate::services::routing::{Classification, classify};
use crate::state::AppState;

pub fn apply(router: Router<AppState>, state: AppState) -> Router<AppState> {
    router.layer(middleware::from_fn_with_state(state, gateway_middleware))
}

async fn gateway_middleware(
    State(state): State<AppState>,
    req: Request<Body>,
    next: Next,
) -> Response {
    let classification = classify(req.method(), req.uri().path());

    debug!(
        method = %req.method(),
        path = %req.uri().path(),
        ?classification,
        "classified request"
    );

    match classification {
        Classification::Preflight => StatusCode::NO_CONTENT.into_response(),
        Classification::Asset | Classification::MachineAuth => next.run(req).await,
        Classification::SessionGated => session::gate(&state, req, next).await,
    }
}
