//! `DecisionCommand`: the single value both submission modes decode into.
//!
//! Validation happens here, before the handler (and therefore before any call
//! to the authorization server) runs.

use axum::extract::{FromRequest, Request};

use crate::api::dto::decision::DecisionRequest;
use crate::api::extractors::body::{FormOrJson, SubmissionMode};
use crate::error::AppError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecisionOutcome {
    Approve,
    Deny,
}

impl DecisionOutcome {
    // Anything other than an explicit approval is a denial.
    fn parse(raw: Option<&str>) -> Self {
        match raw.map(str::trim) {
            Some("approve") => Self::Approve,
            _ => Self::Deny,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Approve => "approve",
            Self::Deny => "deny",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecisionCommand {
    pub authorization_id: String,
    pub outcome: DecisionOutcome,
    pub mode: SubmissionMode,
}

impl DecisionCommand {
    pub fn from_request_body(body: DecisionRequest, mode: SubmissionMode) -> Result<Self, AppError> {
        let authorization_id = body
            .authorization_id
            .map(|id| id.trim().to_string())
            .filter(|id| !id.is_empty())
            .ok_or_else(|| AppError::bad_request("Missing authorization_id"))?;

        Ok(Self {
            authorization_id,
            outcome: DecisionOutcome::parse(body.decision.as_deref()),
            mode,
        })
    }
}

impl<S> FromRequest<S> for DecisionCommand
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let FormOrJson { body, mode } = FormOrJson::<DecisionRequest>::from_request(req, state).await?;
        Self::from_request_body(body, mode)
    }
}
