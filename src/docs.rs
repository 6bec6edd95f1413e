use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::modules::auth::controller::ErrorResponse;
use crate::modules::auth::model::{JwtResponse, LoginRequest, MessageResponse, RegisterRequest};
use crate::modules::classes::model::{
    Class, ClassStatus, CreateClassRequest, PaginatedClassesResponse, UpdateClassRequest,
};
use crate::modules::enrollments::model::{
    CreateEnrollmentRequest, EnrollmentResponse, EnrollmentStatus, UpdateEnrollmentStatusRequest,
};
use crate::modules::grades::model::{CreateGradeRequest, Grade, UpdateGradeRequest};
use crate::modules::users::model::{
    ChangePasswordRequest, CreateUserRequest, UpdateProfileRequest, UpdateUserRequest, User,
    UserResponse, UserRole,
};
use crate::utils::pagination::{PaginationMeta, PaginationParams};

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::modules::auth::controller::login,
        crate::modules::auth::controller::register,
        crate::modules::auth::controller::me,
        crate::modules::auth::controller::logout,
        crate::modules::users::controller::get_users,
        crate::modules::users::controller::get_profile,
        crate::modules::users::controller::update_profile,
        crate::modules::users::controller::change_password,
        crate::modules::users::controller::get_user,
        crate::modules::users::controller::get_users_by_role,
        crate::modules::users::controller::create_user,
        crate::modules::users::controller::update_user,
        crate::modules::users::controller::delete_user,
        crate::modules::users::controller::activate_user,
        crate::modules::users::controller::deactivate_user,
        crate::modules::classes::controller::get_classes,
        crate::modules::classes::controller::get_class,
        crate::modules::classes::controller::create_class,
        crate::modules::classes::controller::update_class,
        crate::modules::classes::controller::delete_class,
        crate::modules::enrollments::controller::get_enrollments,
        crate::modules::enrollments::controller::get_enrollment,
        crate::modules::enrollments::controller::get_enrollments_by_student,
        crate::modules::enrollments::controller::get_enrollments_by_class,
        crate::modules::enrollments::controller::create_enrollment,
        crate::modules::enrollments::controller::update_enrollment_status,
        crate::modules::enrollments::controller::delete_enrollment,
        crate::modules::grades::controller::create_grade,
        crate::modules::grades::controller::update_grade,
        crate::modules::grades::controller::get_grade,
        crate::modules::grades::controller::get_grade_by_enrollment,
        crate::modules::grades::controller::get_grades_by_student,
        crate::modules::grades::controller::get_grades_by_class,
        crate::modules::grades::controller::delete_grade,
    ),
    components(
        schemas(
            LoginRequest,
            JwtResponse,
            RegisterRequest,
            MessageResponse,
            ErrorResponse,
            User,
            UserResponse,
            UserRole,
            CreateUserRequest,
            UpdateUserRequest,
            UpdateProfileRequest,
            ChangePasswordRequest,
            Class,
            ClassStatus,
            CreateClassRequest,
            UpdateClassRequest,
            PaginatedClassesResponse,
            EnrollmentStatus,
            EnrollmentResponse,
            CreateEnrollmentRequest,
            UpdateEnrollmentStatusRequest,
            Grade,
            CreateGradeRequest,
            UpdateGradeRequest,
            PaginationMeta,
            PaginationParams,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Authentication", description = "Login, registration and session endpoints"),
        (name = "Users", description = "User administration and self-service profile"),
        (name = "Classes", description = "Class management endpoints"),
        (name = "Enrollments", description = "Enrollment lifecycle and capacity bookkeeping"),
        (name = "Grades", description = "Grade recording and weighted totals")
    ),
    info(
        title = "Rollbook API",
        version = "0.1.0",
        description = "A student management REST API built with Rust, Axum, and PostgreSQL: authentication, user and role administration, class enrollment, and grade computation.",
        license(
            name = "MIT"
        )
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            )
        }
    }
}
