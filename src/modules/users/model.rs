//! User data models and DTOs.
//!
//! # Core Types
//!
//! - [`User`] - base user entity from the database
//! - [`UserResponse`] - user plus assigned role slugs
//! - [`UserRole`] - the fixed role set {admin, teacher, student}
//!
//! # Request DTOs
//!
//! - [`CreateUserRequest`] - admin user creation
//! - [`UpdateUserRequest`] - admin user update
//! - [`UpdateProfileRequest`] - self-service profile update (no email)
//! - [`ChangePasswordRequest`] - self-service password change

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

/// A user account. Students and teachers own an additional 1:1 record in
/// their respective tables, provisioned at registration time.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub full_name: String,
    pub phone: Option<String>,
    pub avatar_url: Option<String>,
    pub is_active: bool,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

/// User with assigned role slugs, the shape returned by the API.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct UserResponse {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub full_name: String,
    pub phone: Option<String>,
    pub avatar_url: Option<String>,
    pub is_active: bool,
    pub roles: Vec<String>,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

impl UserResponse {
    pub fn from_parts(user: User, roles: Vec<String>) -> Self {
        Self {
            id: user.id,
            username: user.username,
            email: user.email,
            full_name: user.full_name,
            phone: user.phone,
            avatar_url: user.avatar_url,
            is_active: user.is_active,
            roles,
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateUserRequest {
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

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct UpdateUserRequest {
    #[validate(email(message = "email must be valid"))]
    pub email: Option<String>,
    #[validate(length(min = 1, message = "full_name must not be empty"))]
    pub full_name: Option<String>,
    pub phone: Option<String>,
    pub avatar_url: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct UpdateProfileRequest {
    #[validate(length(min = 1, message = "full_name must not be empty"))]
    pub full_name: Option<String>,
    pub phone: Option<String>,
    pub avatar_url: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct ChangePasswordRequest {
    #[validate(length(min = 1, message = "current_password is required"))]
    #[serde(alias = "old_password")]
    pub current_password: String,
    #[validate(length(min = 6, max = 40, message = "new_password must be 6-40 characters"))]
    pub new_password: String,
}

/// The fixed role set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    Admin,
    Teacher,
    Student,
}

impl UserRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::Admin => "admin",
            UserRole::Teacher => "teacher",
            UserRole::Student => "student",
        }
    }

    /// Strict, case-insensitive parse. Used where an unknown role name is
    /// an error (e.g. the `/users/role/{role}` listing).
    pub fn parse(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "admin" => Some(UserRole::Admin),
            "teacher" => Some(UserRole::Teacher),
            "student" => Some(UserRole::Student),
            _ => None,
        }
    }

    /// Registration-time mapping: unknown names fall back to student.
    pub fn from_requested_name(name: &str) -> Self {
        Self::parse(name).unwrap_or(UserRole::Student)
    }
}

/// Well-known role ids, seeded by migration.
pub mod system_roles {
    use uuid::Uuid;

    pub const ADMIN: Uuid = Uuid::from_u128(0x00000000_0000_0000_0000_000000000001);
    pub const TEACHER: Uuid = Uuid::from_u128(0x00000000_0000_0000_0000_000000000002);
    pub const STUDENT: Uuid = Uuid::from_u128(0x00000000_0000_0000_0000_000000000003);

    pub fn id_for(role: super::UserRole) -> Uuid {
        match role {
            super::UserRole::Admin => ADMIN,
            super::UserRole::Teacher => TEACHER,
            super::UserRole::Student => STUDENT,
        }
    }
}
