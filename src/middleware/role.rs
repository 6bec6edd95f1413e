//! Role-based authorization guards.
//!
//! Route-level access control is expressed as explicit middleware layered
//! onto routers via `axum::middleware::from_fn_with_state`, keyed on the
//! role set {admin, teacher, student} carried in the token claims.

use axum::{
    extract::{FromRequestParts, Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::middleware::auth::AuthUser;
use crate::state::AppState;
use crate::utils::errors::AppError;

/// Check the authenticated caller against an allowed-role list, then run
/// the inner handler.
pub async fn require_roles(
    State(state): State<AppState>,
    req: Request,
    next: Next,
    allowed_roles: &[&str],
) -> Result<Response, AppError> {
    let (mut parts, body) = req.into_parts();

    let auth_user = AuthUser::from_request_parts(&mut parts, &state).await?;

    if !auth_user.has_any_role(allowed_roles) {
        return Err(AppError::forbidden(anyhow::anyhow!(
            "Access denied. Required one of roles: {}",
            allowed_roles.join(", ")
        )));
    }

    let req = Request::from_parts(parts, body);
    Ok(next.run(req).await)
}

/// Admin-only routes.
pub async fn require_admin(State(state): State<AppState>, req: Request, next: Next) -> Response {
    match require_roles(State(state), req, next, &["admin"]).await {
        Ok(response) => response,
        Err(err) => err.into_response(),
    }
}

/// Staff routes (admin or teacher).
pub async fn require_staff(State(state): State<AppState>, req: Request, next: Next) -> Response {
    match require_roles(State(state), req, next, &["admin", "teacher"]).await {
        Ok(response) => response,
        Err(err) => err.into_response(),
    }
}

/// In-handler guard for routes whose gate varies per method.
pub fn check_any_role(auth_user: &AuthUser, allowed_roles: &[&str]) -> Result<(), AppError> {
    if !auth_user.has_any_role(allowed_roles) {
        return Err(AppError::forbidden(anyhow::anyhow!(
            "Access denied. Required one of roles: {}",
            allowed_roles.join(", ")
        )));
    }

    Ok(())
}
