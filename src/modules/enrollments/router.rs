use crate::modules::enrollments::controller::{
    create_enrollment, delete_enrollment, get_enrollment, get_enrollments,
    get_enrollments_by_class, get_enrollments_by_student, update_enrollment_status,
};
use crate::state::AppState;
use axum::{
    Router,
    routing::{get, put},
};

pub fn init_enrollments_router() -> Router<AppState> {
    Router::new()
        .route("/", get(get_enrollments).post(create_enrollment))
        .route("/{id}", get(get_enrollment).delete(delete_enrollment))
        .route("/{id}/status", put(update_enrollment_status))
        .route("/student/{student_id}", get(get_enrollments_by_student))
        .route("/class/{class_id}", get(get_enrollments_by_class))
}
