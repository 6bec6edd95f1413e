use crate::modules::grades::controller::{
    create_grade, delete_grade, get_grade, get_grade_by_enrollment, get_grades_by_class,
    get_grades_by_student, update_grade,
};
use crate::state::AppState;
use axum::{
    Router,
    routing::{get, post},
};

pub fn init_grades_router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_grade))
        .route("/{id}", get(get_grade).put(update_grade).delete(delete_grade))
        .route("/enrollment/{enrollment_id}", get(get_grade_by_enrollment))
        .route("/student/{student_id}", get(get_grades_by_student))
        .route("/class/{class_id}", get(get_grades_by_class))
}
