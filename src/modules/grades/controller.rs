use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use tracing::instrument;
use uuid::Uuid;

use crate::middleware::auth::AuthUser;
use crate::middleware::role::check_any_role;
use crate::modules::auth::controller::ErrorResponse;
use crate::modules::auth::model::MessageResponse;
use crate::modules::grades::model::{CreateGradeRequest, Grade, UpdateGradeRequest};
use crate::modules::grades::service::GradeService;
use crate::state::AppState;
use crate::utils::errors::AppError;

/// Record a grade for an enrollment
#[utoipa::path(
    post,
    path = "/api/grades",
    request_body = CreateGradeRequest,
    responses(
        (status = 201, description = "Grade created", body = Grade),
        (status = 403, description = "Forbidden - staff only", body = ErrorResponse),
        (status = 404, description = "Enrollment not found", body = ErrorResponse),
        (status = 409, description = "Enrollment already has a grade", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Grades"
)]
#[instrument(skip(state, auth_user, dto))]
pub async fn create_grade(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Json(dto): Json<CreateGradeRequest>,
) -> Result<(StatusCode, Json<Grade>), AppError> {
    check_any_role(&auth_user, &["admin", "teacher"])?;

    let grade = GradeService::create_grade(&state.db, dto, auth_user.user_id()?).await?;
    Ok((StatusCode::CREATED, Json(grade)))
}

/// Update a grade's component scores
#[utoipa::path(
    put,
    path = "/api/grades/{id}",
    params(("id" = Uuid, Path, description = "Grade id")),
    request_body = UpdateGradeRequest,
    responses(
        (status = 200, description = "Updated grade with recomputed total", body = Grade),
        (status = 403, description = "Forbidden - staff only", body = ErrorResponse),
        (status = 404, description = "Grade not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Grades"
)]
#[instrument(skip(state, auth_user, dto))]
pub async fn update_grade(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<Uuid>,
    Json(dto): Json<UpdateGradeRequest>,
) -> Result<Json<Grade>, AppError> {
    check_any_role(&auth_user, &["admin", "teacher"])?;

    let grade = GradeService::update_grade(&state.db, id, dto).await?;
    Ok(Json(grade))
}

/// Get a grade by id
#[utoipa::path(
    get,
    path = "/api/grades/{id}",
    params(("id" = Uuid, Path, description = "Grade id")),
    responses(
        (status = 200, description = "Grade", body = Grade),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 404, description = "Grade not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Grades"
)]
#[instrument(skip(state, _auth_user))]
pub async fn get_grade(
    State(state): State<AppState>,
    _auth_user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<Grade>, AppError> {
    let grade = GradeService::get_grade(&state.db, id).await?;
    Ok(Json(grade))
}

/// Get the grade recorded for an enrollment
#[utoipa::path(
    get,
    path = "/api/grades/enrollment/{enrollment_id}",
    params(("enrollment_id" = Uuid, Path, description = "Enrollment id")),
    responses(
        (status = 200, description = "Grade", body = Grade),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 404, description = "Grade not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Grades"
)]
#[instrument(skip(state, _auth_user))]
pub async fn get_grade_by_enrollment(
    State(state): State<AppState>,
    _auth_user: AuthUser,
    Path(enrollment_id): Path<Uuid>,
) -> Result<Json<Grade>, AppError> {
    let grade = GradeService::get_grade_by_enrollment(&state.db, enrollment_id).await?;
    Ok(Json(grade))
}

/// List a student's grades
#[utoipa::path(
    get,
    path = "/api/grades/student/{student_id}",
    params(("student_id" = Uuid, Path, description = "Student id")),
    responses(
        (status = 200, description = "Grades for the student", body = [Grade]),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Grades"
)]
#[instrument(skip(state, _auth_user))]
pub async fn get_grades_by_student(
    State(state): State<AppState>,
    _auth_user: AuthUser,
    Path(student_id): Path<Uuid>,
) -> Result<Json<Vec<Grade>>, AppError> {
    let grades = GradeService::list_grades_by_student(&state.db, student_id).await?;
    Ok(Json(grades))
}

/// List a class's grades
#[utoipa::path(
    get,
    path = "/api/grades/class/{class_id}",
    params(("class_id" = Uuid, Path, description = "Class id")),
    responses(
        (status = 200, description = "Grades for the class", body = [Grade]),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Grades"
)]
#[instrument(skip(state, _auth_user))]
pub async fn get_grades_by_class(
    State(state): State<AppState>,
    _auth_user: AuthUser,
    Path(class_id): Path<Uuid>,
) -> Result<Json<Vec<Grade>>, AppError> {
    let grades = GradeService::list_grades_by_class(&state.db, class_id).await?;
    Ok(Json(grades))
}

/// Delete a grade
#[utoipa::path(
    delete,
    path = "/api/grades/{id}",
    params(("id" = Uuid, Path, description = "Grade id")),
    responses(
        (status = 200, description = "Grade deleted", body = MessageResponse),
        (status = 403, description = "Forbidden - admin only", body = ErrorResponse),
        (status = 404, description = "Grade not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Grades"
)]
#[instrument(skip(state, auth_user))]
pub async fn delete_grade(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<MessageResponse>, AppError> {
    check_any_role(&auth_user, &["admin"])?;

    GradeService::delete_grade(&state.db, id).await?;
    Ok(Json(MessageResponse::new("Grade deleted successfully")))
}
