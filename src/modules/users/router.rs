use crate::modules::users::controller::{
    activate_user, change_password, create_user, deactivate_user, delete_user, get_profile,
    get_user, get_users, get_users_by_role, update_profile, update_user,
};
use crate::state::AppState;
use axum::{
    Router,
    routing::{get, put},
};

/// Self-service routes, open to any authenticated user.
pub fn init_users_profile_router() -> Router<AppState> {
    Router::new()
        .route("/profile", get(get_profile).put(update_profile))
        .route("/change-password", put(change_password))
}

/// Staff routes (admin or teacher).
pub fn init_users_staff_router() -> Router<AppState> {
    Router::new().route("/role/{role}", get(get_users_by_role))
}

/// Admin-only user administration.
pub fn init_users_admin_router() -> Router<AppState> {
    Router::new()
        .route("/", get(get_users).post(create_user))
        .route("/{id}", get(get_user).put(update_user).delete(delete_user))
        .route("/{id}/activate", put(activate_user))
        .route("/{id}/deactivate", put(deactivate_user))
}
