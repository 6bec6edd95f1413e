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
use crate::modules::enrollments::model::{
    CreateEnrollmentRequest, EnrollmentResponse, UpdateEnrollmentStatusRequest,
};
use crate::modules::enrollments::service::EnrollmentService;
use crate::state::AppState;
use crate::utils::errors::AppError;

/// List all enrollments
#[utoipa::path(
    get,
    path = "/api/enrollments",
    responses(
        (status = 200, description = "All enrollments", body = [EnrollmentResponse]),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 403, description = "Forbidden - staff only", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Enrollments"
)]
#[instrument(skip(state, auth_user))]
pub async fn get_enrollments(
    State(state): State<AppState>,
    auth_user: AuthUser,
) -> Result<Json<Vec<EnrollmentResponse>>, AppError> {
    check_any_role(&auth_user, &["admin", "teacher"])?;

    let enrollments = EnrollmentService::list_enrollments(&state.db).await?;
    Ok(Json(enrollments))
}

/// Get an enrollment by id
#[utoipa::path(
    get,
    path = "/api/enrollments/{id}",
    params(("id" = Uuid, Path, description = "Enrollment id")),
    responses(
        (status = 200, description = "Enrollment", body = EnrollmentResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 404, description = "Enrollment not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Enrollments"
)]
#[instrument(skip(state, _auth_user))]
pub async fn get_enrollment(
    State(state): State<AppState>,
    _auth_user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<EnrollmentResponse>, AppError> {
    let enrollment = EnrollmentService::get_enrollment(&state.db, id).await?;
    Ok(Json(enrollment))
}

/// List a student's enrollments
#[utoipa::path(
    get,
    path = "/api/enrollments/student/{student_id}",
    params(("student_id" = Uuid, Path, description = "Student id")),
    responses(
        (status = 200, description = "Enrollments for the student", body = [EnrollmentResponse]),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Enrollments"
)]
#[instrument(skip(state, _auth_user))]
pub async fn get_enrollments_by_student(
    State(state): State<AppState>,
    _auth_user: AuthUser,
    Path(student_id): Path<Uuid>,
) -> Result<Json<Vec<EnrollmentResponse>>, AppError> {
    let enrollments = EnrollmentService::list_enrollments_by_student(&state.db, student_id).await?;
    Ok(Json(enrollments))
}

/// List a class's enrollments
#[utoipa::path(
    get,
    path = "/api/enrollments/class/{class_id}",
    params(("class_id" = Uuid, Path, description = "Class id")),
    responses(
        (status = 200, description = "Enrollments for the class", body = [EnrollmentResponse]),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Enrollments"
)]
#[instrument(skip(state, _auth_user))]
pub async fn get_enrollments_by_class(
    State(state): State<AppState>,
    _auth_user: AuthUser,
    Path(class_id): Path<Uuid>,
) -> Result<Json<Vec<EnrollmentResponse>>, AppError> {
    let enrollments = EnrollmentService::list_enrollments_by_class(&state.db, class_id).await?;
    Ok(Json(enrollments))
}

/// Enroll a student into a class
#[utoipa::path(
    post,
    path = "/api/enrollments",
    request_body = CreateEnrollmentRequest,
    responses(
        (status = 201, description = "Enrollment created", body = EnrollmentResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 404, description = "Student or class not found", body = ErrorResponse),
        (status = 409, description = "Student is already enrolled in this class", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Enrollments"
)]
#[instrument(skip(state, _auth_user, dto))]
pub async fn create_enrollment(
    State(state): State<AppState>,
    _auth_user: AuthUser,
    Json(dto): Json<CreateEnrollmentRequest>,
) -> Result<(StatusCode, Json<EnrollmentResponse>), AppError> {
    let enrollment = EnrollmentService::create_enrollment(&state.db, dto).await?;
    Ok((StatusCode::CREATED, Json(enrollment)))
}

/// Update an enrollment's status
#[utoipa::path(
    put,
    path = "/api/enrollments/{id}/status",
    params(("id" = Uuid, Path, description = "Enrollment id")),
    request_body = UpdateEnrollmentStatusRequest,
    responses(
        (status = 200, description = "Updated enrollment", body = EnrollmentResponse),
        (status = 403, description = "Forbidden - staff only", body = ErrorResponse),
        (status = 404, description = "Enrollment not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Enrollments"
)]
#[instrument(skip(state, auth_user, dto))]
pub async fn update_enrollment_status(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<Uuid>,
    Json(dto): Json<UpdateEnrollmentStatusRequest>,
) -> Result<Json<EnrollmentResponse>, AppError> {
    check_any_role(&auth_user, &["admin", "teacher"])?;

    let enrollment = EnrollmentService::update_enrollment_status(&state.db, id, dto.status).await?;
    Ok(Json(enrollment))
}

/// Delete an enrollment
#[utoipa::path(
    delete,
    path = "/api/enrollments/{id}",
    params(("id" = Uuid, Path, description = "Enrollment id")),
    responses(
        (status = 200, description = "Enrollment deleted", body = MessageResponse),
        (status = 403, description = "Forbidden - admin only", body = ErrorResponse),
        (status = 404, description = "Enrollment not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Enrollments"
)]
#[instrument(skip(state, auth_user))]
pub async fn delete_enrollment(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<MessageResponse>, AppError> {
    check_any_role(&auth_user, &["admin"])?;

    EnrollmentService::delete_enrollment(&state.db, id).await?;
    Ok(Json(MessageResponse::new("Enrollment deleted successfully")))
}
