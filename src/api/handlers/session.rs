/*
 * Responsibility
 * - session のライフサイクル (login / logout) と現在ユーザー API
 *   - GET  /auth/login   : sign-in form
 *   - POST /auth/login   : password grant → session cookie → redirect
 *   - POST /auth/logout  : 認可サーバで revoke (best effort) → cookie clear
 *   - GET  /api/auth/user: {"user": {"id", "email"}}
 * - ここで書いた session cookie は gate のローテーションより優先される
 */
use axum::{
    Json,
    extract::{Query, State},
    http::{HeaderValue, StatusCode, header},
    response::{Html, IntoResponse, Response},
};
use tracing::{info, warn};

use crate::api::dto::session::{
    CurrentUserResponse, LoginQuery, LoginRequest, LoginResponse,
};
use crate::api::extractors::{FormOrJson, MaybePrincipal, PrincipalExtractor, SubmissionMode};
use crate::api::html::{escape, page};
use crate::api::redirect::{found, sanitize_redirect};
use crate::error::AppError;
use crate::middleware::auth::session::LOGIN_PATH;
use crate::services::auth::AuthServerError;
use crate::state::AppState;

pub async fn login_form(
    MaybePrincipal(principal): MaybePrincipal,
    Query(query): Query<LoginQuery>,
) -> Result<Response, AppError> {
    let target = sanitize_redirect(query.redirect.as_deref());

    // Already signed in: go straight to the destination.
    if principal.is_some() {
        return found(&target);
    }

    Ok(Html(render_login(&target, None)).into_response())
}

pub async fn login(
    State(state): State<AppState>,
    FormOrJson { body, mode }: FormOrJson<LoginRequest>,
) -> Result<Response, AppError> {
    let target = sanitize_redirect(body.redirect.as_deref());
    let email = body.email.trim();

    if email.is_empty() || body.password.is_empty() {
        return Ok(login_failed(mode, &target, "Email and password are required"));
    }

    let tokens = match state.auth.server.sign_in_with_password(email, &body.password).await {
        Ok(tokens) => tokens,
        Err(err) => {
            warn!(error = ?err, "sign in failed");
            let message = match err {
                AuthServerError::Api { message, .. } if !message.is_empty() => message,
                _ => "Sign in failed".to_string(),
            };
            return Ok(login_failed(mode, &target, &message));
        }
    };

    let cookie = state.auth.cookie.encode(&tokens).map_err(|err| {
        warn!(error = ?err, "session cookie could not be encoded");
        AppError::Internal
    })?;

    info!("session started");

    let mut response = match mode {
        SubmissionMode::Form => found(&target)?,
        SubmissionMode::Json => Json(LoginResponse {
            redirect_url: target,
        })
        .into_response(),
    };
    response.headers_mut().append(header::SET_COOKIE, cookie);
    Ok(response)
}

pub async fn logout(
    State(state): State<AppState>,
    MaybePrincipal(principal): MaybePrincipal,
) -> Result<Response, AppError> {
    if let Some(principal) = principal
        && let Err(err) = state.auth.server.sign_out(&principal.token).await
    {
        warn!(error = ?err, "sign out failed at the authorization server");
    }

    let cleared: HeaderValue = state.auth.cookie.clear().map_err(|_| AppError::Internal)?;

    let mut response = found(LOGIN_PATH)?;
    response.headers_mut().append(header::SET_COOKIE, cleared);
    Ok(response)
}

pub async fn current_user(PrincipalExtractor(principal): PrincipalExtractor) -> impl IntoResponse {
    Json(CurrentUserResponse {
        user: principal.into(),
    })
}

fn login_failed(mode: SubmissionMode, target: &str, message: &str) -> Response {
    match mode {
        SubmissionMode::Json => AppError::bad_request(message).into_response(),
        SubmissionMode::Form => (
            StatusCode::BAD_REQUEST,
            Html(render_login(target, Some(message))),
        )
            .into_response(),
    }
}

fn render_login(target: &str, error: Option<&str>) -> String {
    let alert = error
        .map(|e| format!("<p role=\"alert\">{}</p>\n", escape(e)))
        .unwrap_or_default();

    let body = format!(
        "<h1>Sign in</h1>\n{alert}\
         <form action=\"{LOGIN_PATH}\" method=\"POST\">\n\
         <input type=\"hidden\" name=\"redirect\" value=\"{}\">\n\
         <label>Email <input type=\"email\" name=\"email\" autocomplete=\"email\" required></label>\n\
         <label>Password <input type=\"password\" name=\"password\" autocomplete=\"current-password\" required></label>\n\
         <button type=\"submit\">Sign in</button>\n\
         </form>",
        escape(target)
    );

    page("Sign in", &body)
}
