//! Redirect helpers.
//!
//! axum's `Redirect` only offers 303/307/308; browser flows here use a plain 302.

use axum::{
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};

use crate::error::AppError;

/// `302 Found` to `location`.
pub fn found(location: &str) -> Result<Response, AppError> {
    let location = HeaderValue::from_str(location).map_err(|_| AppError::Internal)?;
    Ok((StatusCode::FOUND, [(header::LOCATION, location)]).into_response())
}

/// Keep only same-site relative targets; anything else becomes `/`.
///
/// Rejects absolute URLs, protocol-relative `//host` and backslash tricks so
/// the login flow cannot be turned into an open redirect.
pub fn sanitize_redirect(target: Option<&str>) -> String {
    match target.map(str::trim) {
        Some(t) if t.starts_with('/') && !t.starts_with("//") && !t.contains('\\') => {
            t.to_string()
        }
        _ => "/".to_string(),
    }
}
