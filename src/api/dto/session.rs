use serde::{Deserialize, Serialize};

use crate::services::auth::Principal;

#[derive(Debug, Default, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub redirect: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct LoginQuery {
    #[serde(default)]
    pub redirect: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct LoginResponse {
    pub redirect_url: String,
}

#[derive(Debug, Serialize)]
pub struct CurrentUserResponse {
    pub user: UserDto,
}

#[derive(Debug, Serialize)]
pub struct UserDto {
    pub id: String,
    pub email: Option<String>,
}

impl From<Principal> for UserDto {
    fn from(principal: Principal) -> Self {
        Self {
            id: principal.subject_id,
            email: principal.email,
        }
    }
}
