use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::account::repo_types::{Country, User};

/// Request body for user registration.
#[derive(Debug, Clone, Deserialize)]
pub struct SignUpRequest {
    pub email: String,
    pub password: String,
    pub name: String,
    #[serde(default)]
    pub phone: Option<String>,
    /// Country short code, e.g. "US".
    #[serde(default)]
    pub country: Option<String>,
}

/// Request body for login.
#[derive(Debug, Clone, Deserialize)]
pub struct SignInRequest {
    pub email: String,
    pub password: String,
}

/// Partial profile update; absent fields are left untouched and an empty
/// `phone` clears it.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateProfileRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
}

/// Public part of the user returned to the client.
#[derive(Debug, Clone, Serialize)]
pub struct UserResponse {
    pub uuid: Uuid,
    pub email: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl From<&User> for UserResponse {
    fn from(u: &User) -> Self {
        Self {
            uuid: u.uuid,
            email: u.email.clone(),
            name: u.name.clone(),
            phone: u.phone.clone(),
            created_at: u.created_at,
        }
    }
}

/// Response returned after signup or signin.
#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub message: String,
    pub user: UserResponse,
    pub token: String,
}

#[derive(Debug, Serialize)]
pub struct ProfileResponse {
    pub user: UserResponse,
    pub country: Option<Country>,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: i32,
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}
