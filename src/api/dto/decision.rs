use serde::{Deserialize, Serialize};

/// Body of `POST /api/oauth/decision`, in either JSON or form encoding.
#[derive(Debug, Default, Deserialize)]
pub struct DecisionRequest {
    #[serde(default)]
    pub decision: Option<String>,
    #[serde(default)]
    pub authorization_id: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct DecisionResponse {
    pub redirect_url: String,
}
