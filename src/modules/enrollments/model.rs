use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::modules::classes::model::ClassStatus;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "enrollment_status")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EnrollmentStatus {
    #[sqlx(rename = "PENDING")]
    Pending,
    #[sqlx(rename = "ACTIVE")]
    Active,
    #[sqlx(rename = "COMPLETED")]
    Completed,
    #[sqlx(rename = "CANCELLED")]
    Cancelled,
}

/// An enrollment links one student to one class. At most one enrollment
/// may exist per (student, class) pair.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Enrollment {
    pub id: Uuid,
    pub student_id: Uuid,
    pub class_id: Uuid,
    pub status: EnrollmentStatus,
    pub enrollment_date: chrono::DateTime<chrono::Utc>,
    pub note: Option<String>,
}

/// Enrollment joined with student, class, course and teacher display
/// fields, the shape returned by the API.
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
pub struct EnrollmentResponse {
    pub id: Uuid,
    pub enrollment_date: chrono::DateTime<chrono::Utc>,
    pub status: EnrollmentStatus,
    pub note: Option<String>,
    pub student_id: Uuid,
    pub student_code: String,
    pub student_name: String,
    pub class_id: Uuid,
    pub class_code: String,
    pub class_name: String,
    pub course_name: String,
    pub teacher_name: String,
    pub class_status: ClassStatus,
    pub schedule: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub room: Option<String>,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct CreateEnrollmentRequest {
    /// Either a user id or a student id; user-to-student resolution is
    /// tried first, then the value is taken as a student id.
    pub student_id: Uuid,
    pub class_id: Uuid,
    pub status: Option<EnrollmentStatus>,
    pub note: Option<String>,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct UpdateEnrollmentStatusRequest {
    pub status: EnrollmentStatus,
}
