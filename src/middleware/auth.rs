use axum::{
    extract::FromRequestParts,
    http::{header, request::Parts},
};

use crate::modules::auth::model::Claims;
use crate::state::AppState;
use crate::utils::errors::AppError;
use crate::utils::jwt::verify_token;

/// Extractor that validates the bearer token and exposes the caller's
/// claims. Role slugs ride in the token, so authorization checks need no
/// database access.
#[derive(Debug, Clone)]
pub struct AuthUser(pub Claims);

impl AuthUser {
    pub fn user_id(&self) -> Result<uuid::Uuid, AppError> {
        uuid::Uuid::parse_str(&self.0.sub)
            .map_err(|_| AppError::unauthorized(anyhow::anyhow!("Invalid user id in token")))
    }

    pub fn username(&self) -> &str {
        &self.0.username
    }

    pub fn has_role(&self, role: &str) -> bool {
        self.0.roles.iter().any(|r| r == role)
    }

    pub fn has_any_role(&self, roles: &[&str]) -> bool {
        roles.iter().any(|r| self.has_role(r))
    }

    pub fn is_admin(&self) -> bool {
        self.has_role("admin")
    }
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .ok_or_else(|| {
                AppError::unauthorized(anyhow::anyhow!("Missing authorization header"))
            })?;

        let token = auth_header.strip_prefix("Bearer ").ok_or_else(|| {
            AppError::unauthorized(anyhow::anyhow!("Invalid authorization header format"))
        })?;

        let claims = verify_token(token, &state.jwt_config)?;

        Ok(AuthUser(claims))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn claims_with_roles(roles: &[&str]) -> Claims {
        Claims {
            sub: Uuid::new_v4().to_string(),
            username: "test".to_string(),
            roles: roles.iter().map(|r| r.to_string()).collect(),
            exp: 9999999999,
            iat: 1234567890,
        }
    }

    #[test]
    fn test_has_role() {
        let auth_user = AuthUser(claims_with_roles(&["student"]));
        assert!(auth_user.has_role("student"));
        assert!(!auth_user.has_role("admin"));
        assert!(!auth_user.is_admin());
    }

    #[test]
    fn test_has_any_role() {
        let auth_user = AuthUser(claims_with_roles(&["teacher"]));
        assert!(auth_user.has_any_role(&["admin", "teacher"]));
        assert!(!auth_user.has_any_role(&["admin", "student"]));
    }

    #[test]
    fn test_user_id() {
        let user_id = Uuid::new_v4();
        let mut claims = claims_with_roles(&["admin"]);
        claims.sub = user_id.to_string();
        assert_eq!(AuthUser(claims).user_id().unwrap(), user_id);

        let mut bad = claims_with_roles(&[]);
        bad.sub = "not-a-uuid".to_string();
        assert!(AuthUser(bad).user_id().is_err());
    }
}
