use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

/// JWT claims carried by every access token.
///
/// Role slugs are embedded so route guards can authorize without a
/// database round-trip.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String, // user id
    pub username: String,
    pub roles: Vec<String>,
    pub exp: usize,
    pub iat: usize,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct LoginRequest {
    #[validate(length(min = 1, message = "username is required"))]
    pub username: String,
    #[validate(length(min = 1, message = "password is required"))]
    pub password: String,
}

/// Login response. `teacher_id` / `student_id` are populated when the user
/// owns the corresponding teacher or student record.
#[derive(Debug, Serialize, ToSchema)]
pub struct JwtResponse {
    pub access_token: String,
    pub token_type: String,
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub full_name: String,
    pub roles: Vec<String>,
    pub teacher_id: Option<Uuid>,
    pub student_id: Option<Uuid>,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct RegisterRequest {
    #[validate(length(min = 3, max = 20, message = "username must be 3-20 characters"))]
    pub username: String,
    #[validate(email(message = "email must be valid"))]
    pub email: String,
    #[validate(length(min = 6, max = 40, message = "password must be 6-40 characters"))]
    pub password: String,
    #[validate(length(min = 1, message = "full_name is required"))]
    pub full_name: String,
    pub phone: Option<String>,
    /// Role names to grant; empty or unknown names fall back to student.
    pub roles: Option<Vec<String>>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}
