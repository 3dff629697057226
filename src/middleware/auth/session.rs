//! Session Gate: cookie session → Principal in extensions, or reject.
//!
//! - API paths without a session get 401 JSON (never a redirect)
//! - page paths without a session get 302 to the login entry point, carrying
//!   the original path + query in `redirect`
//! - login/auth paths are always let through
//!
//! Cookies rotated or cleared while resolving the session are appended to
//! whatever response goes out, redirects and 401s included.

use axum::{
    body::Body,
    http::{HeaderValue, Request, Uri, header},
    middleware::Next,
    response::{IntoResponse, Response},
};
use tracing::warn;

use crate::api::redirect::found;
use crate::error::AppError;
use crate::services::auth::session::SessionResolution;
use crate::state::AppState;

pub const LOGIN_PATH: &str = "/auth/login";

const API_PREFIX: &str = "/api";
const PUBLIC_PREFIXES: &[&str] = &["/auth", "/login"];

pub async fn gate(state: &AppState, mut req: Request<Body>, next: Next) -> Response {
    let SessionResolution {
        principal,
        set_cookies,
    } = match state.auth.sessions.resolve(req.headers()).await {
        Ok(resolution) => resolution,
        Err(err) => {
            warn!(error = ?err, "session resolution failed");
            SessionResolution::anonymous()
        }
    };

    let path = req.uri().path();
    let is_api = path.starts_with(API_PREFIX);
    let is_public = PUBLIC_PREFIXES.iter().any(|p| path.starts_with(p));

    let mut response = match principal {
        Some(principal) => {
            req.extensions_mut().insert(principal);
            next.run(req).await
        }
        None if is_api => AppError::Unauthorized.into_response(),
        None if is_public => next.run(req).await,
        None => login_redirect(req.uri()),
    };

    // A handler that wrote the session cookie itself (login / logout) wins;
    // chunk clears still go out.
    let name = state.auth.cookie.name();
    let handler_wrote_session = response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .any(|v| names_cookie(v, name));
    for cookie in set_cookies {
        if handler_wrote_session && names_cookie(&cookie, name) {
            continue;
        }
        response.headers_mut().append(header::SET_COOKIE, cookie);
    }

    response
}

/// 302 to the login page with `redirect=<path+query>`.
pub fn login_redirect(uri: &Uri) -> Response {
    let original = uri.path_and_query().map(|pq| pq.as_str()).unwrap_or("/");
    let query = url::form_urlencoded::Serializer::new(String::new())
        .append_pair("redirect", original)
        .finish();

    found(&format!("{}?{}", LOGIN_PATH, query)).unwrap_or_else(IntoResponse::into_response)
}

fn names_cookie(set_cookie: &HeaderValue, name: &str) -> bool {
    set_cookie
        .to_str()
        .ok()
        .and_then(|v| v.split_once('='))
        .is_some_and(|(key, _)| key == name)
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;

    use super::*;

    fn redirect_param(location: &str) -> String {
        let (path, query) = location.split_once('?').unwrap();
        assert_eq!(path, LOGIN_PATH);
        url::form_urlencoded::parse(query.as_bytes())
            .find(|(k, _)| k == "redirect")
            .map(|(_, v)| v.into_owned())
            .unwrap()
    }

    #[test]
    fn redirect_round_trips_path_and_query() {
        for original in [
            "/",
            "/oauth/consent?authorization_id=az_1",
            "/dashboard?q=a%20b&tags=x,y&next=/c?d=e",
            "/reports/2024?name=J%C3%BCrgen&flag",
        ] {
            let uri: Uri = original.parse().unwrap();
            let response = login_redirect(&uri);

            assert_eq!(response.status(), StatusCode::FOUND);
            let location = response.headers()[header::LOCATION].to_str().unwrap();
            assert_eq!(redirect_param(location), original);
        }
    }
}
