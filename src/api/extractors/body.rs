//! Request body accepted as either JSON or an HTML form post.
//!
//! Browser form submissions (`application/x-www-form-urlencoded`) and
//! programmatic callers hit the same endpoints; the mode is kept so the
//! handler can answer each caller in its own shape (redirect vs JSON).

use axum::{
    body::Bytes,
    extract::{FromRequest, Request},
    http::header,
};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use crate::error::AppError;

const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmissionMode {
    Json,
    Form,
}

#[derive(Debug)]
pub struct FormOrJson<T> {
    pub body: T,
    pub mode: SubmissionMode,
}

impl<T, S> FromRequest<S> for FormOrJson<T>
where
    T: DeserializeOwned + Send,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let mode = submission_mode(req.headers().get(header::CONTENT_TYPE));
        let bytes = Bytes::from_request(req, state)
            .await
            .map_err(|_| AppError::bad_request("Invalid request body"))?;

        let body = match mode {
            SubmissionMode::Form => parse_form(&bytes),
            SubmissionMode::Json => parse_json(&bytes),
        }
        .ok_or_else(|| AppError::bad_request("Invalid request body"))?;

        Ok(Self { body, mode })
    }
}

fn submission_mode(content_type: Option<&axum::http::HeaderValue>) -> SubmissionMode {
    let is_form = content_type
        .and_then(|v| v.to_str().ok())
        .map(|ct| {
            ct.split(';')
                .next()
                .unwrap_or_default()
                .trim()
                .eq_ignore_ascii_case(FORM_CONTENT_TYPE)
        })
        .unwrap_or(false);

    if is_form {
        SubmissionMode::Form
    } else {
        SubmissionMode::Json
    }
}

// Form fields are all strings; route them through serde_json so one DTO serves both modes.
pub(crate) fn parse_form<T: DeserializeOwned>(bytes: &[u8]) -> Option<T> {
    let fields: Map<String, Value> = url::form_urlencoded::parse(bytes)
        .map(|(k, v)| (k.into_owned(), Value::String(v.into_owned())))
        .collect();
    serde_json::from_value(Value::Object(fields)).ok()
}

pub(crate) fn parse_json<T: DeserializeOwned>(bytes: &[u8]) -> Option<T> {
    serde_json::from_slice(bytes).ok()
}

#[cfg(test)]
mod tests {
    use axum::http::HeaderValue;

    use super::*;
    use crate::api::dto::decision::DecisionRequest;

    #[test]
    fn content_type_selects_the_parser() {
        assert_eq!(
            submission_mode(Some(&HeaderValue::from_static(
                "application/x-www-form-urlencoded; charset=UTF-8"
            ))),
            SubmissionMode::Form
        );
        assert_eq!(
            submission_mode(Some(&HeaderValue::from_static("application/json"))),
            SubmissionMode::Json
        );
        assert_eq!(submission_mode(None), SubmissionMode::Json);
    }

    #[test]
    fn form_and_json_decode_to_the_same_request() {
        let form: DecisionRequest =
            parse_form(b"authorization_id=az%201&decision=approve").unwrap();
        let json: DecisionRequest =
            parse_json(br#"{"authorization_id":"az 1","decision":"approve"}"#).unwrap();

        assert_eq!(form.authorization_id, json.authorization_id);
        assert_eq!(form.decision, json.decision);
    }

    #[test]
    fn unparseable_json_is_rejected() {
        assert!(parse_json::<DecisionRequest>(b"not json").is_none());
        assert!(parse_json::<DecisionRequest>(b"").is_none());
    }
}
