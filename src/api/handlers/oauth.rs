/*
 * Responsibility
 * - POST /api/oauth/decision (consent の approve / deny)
 * - 認可サーバの approve/deny を呼び、OAuth client への redirect URL を返す
 *   - JSON: 200 {"redirect_url"}
 *   - form: 302 Location
 */
use axum::{
    Json,
    extract::State,
    response::{IntoResponse, Response},
};
use tracing::{info, warn};

use crate::api::dto::decision::DecisionResponse;
use crate::api::extractors::{DecisionCommand, DecisionOutcome, PrincipalExtractor, SubmissionMode};
use crate::api::redirect::found;
use crate::error::AppError;
use crate::services::auth::AuthServerError;
use crate::state::AppState;

pub async fn decide(
    State(state): State<AppState>,
    PrincipalExtractor(principal): PrincipalExtractor,
    command: DecisionCommand,
) -> Result<Response, AppError> {
    let server = &state.auth.server;
    let id = command.authorization_id.as_str();

    let result = match command.outcome {
        DecisionOutcome::Approve => server.approve_authorization(id, &principal.token).await,
        DecisionOutcome::Deny => server.deny_authorization(id, &principal.token).await,
    };

    let redirect_url = result.map_err(|err| {
        warn!(
            error = ?err,
            authorization_id = id,
            decision = command.outcome.as_str(),
            "authorization decision failed"
        );
        AppError::bad_request(failure_message(command.outcome, &err))
    })?;

    info!(
        authorization_id = id,
        decision = command.outcome.as_str(),
        subject_id = %principal.subject_id,
        "authorization decided"
    );

    match command.mode {
        SubmissionMode::Json => Ok(Json(DecisionResponse { redirect_url }).into_response()),
        SubmissionMode::Form => found(&redirect_url),
    }
}

fn failure_message(outcome: DecisionOutcome, err: &AuthServerError) -> String {
    match err {
        AuthServerError::Api { message, .. } if !message.is_empty() => message.clone(),
        _ => format!("Failed to {} authorization", outcome.as_str()),
    }
}
