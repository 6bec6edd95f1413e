//! Enrollment lifecycle and class-capacity bookkeeping.
//!
//! `current_students` and `is_registration_open` on a class are derived
//! from enrollment mutations. Every mutation here runs inside one
//! database transaction: the enrollment write and the capacity adjustment
//! commit or roll back together, with the class row locked `FOR UPDATE`
//! so concurrent enrollments into the same class serialize on the
//! database rather than on anything in-process.

use anyhow::anyhow;
use sqlx::{PgPool, Postgres, Transaction};
use tracing::{debug, instrument};
use uuid::Uuid;

use crate::modules::enrollments::model::{
    CreateEnrollmentRequest, EnrollmentResponse, EnrollmentStatus,
};
use crate::utils::errors::AppError;

const ENROLLMENT_RESPONSE_SELECT: &str = "SELECT e.id, e.enrollment_date, e.status, e.note,
            e.student_id, s.student_code, su.full_name AS student_name,
            e.class_id, c.code AS class_code, c.name AS class_name,
            co.name AS course_name, tu.full_name AS teacher_name,
            c.status AS class_status, c.schedule, c.start_date, c.end_date, c.room
     FROM enrollments e
     JOIN students s ON s.id = e.student_id
     JOIN users su ON su.id = s.user_id
     JOIN classes c ON c.id = e.class_id
     JOIN courses co ON co.id = c.course_id
     JOIN teachers t ON t.id = c.teacher_id
     JOIN users tu ON tu.id = t.user_id";

/// Headcount after an enrollment is added. Registration closes once the
/// class is full; it is never reopened by an enrollment.
fn headcount_after_enroll(current: i32, max: i32, open: bool) -> (i32, bool) {
    let new_count = current + 1;
    let open_after = if new_count >= max { false } else { open };
    (new_count, open_after)
}

/// Headcount after an enrollment is cancelled or deleted. The counter is
/// floored at zero and registration reopens whenever the class drops
/// below capacity.
fn headcount_after_release(current: i32, max: i32, open: bool) -> (i32, bool) {
    let new_count = (current - 1).max(0);
    let open_after = if new_count < max { true } else { open };
    (new_count, open_after)
}

#[derive(sqlx::FromRow)]
struct ClassCapacityRow {
    current_students: i32,
    max_students: i32,
    is_registration_open: bool,
}

async fn lock_class_capacity(
    tx: &mut Transaction<'_, Postgres>,
    class_id: Uuid,
) -> Result<ClassCapacityRow, AppError> {
    sqlx::query_as::<_, ClassCapacityRow>(
        "SELECT current_students, max_students, is_registration_open
         FROM classes WHERE id = $1
         FOR UPDATE",
    )
    .bind(class_id)
    .fetch_optional(&mut **tx)
    .await?
    .ok_or_else(|| AppError::not_found(anyhow!("Class with id {} not found", class_id)))
}

async fn store_class_capacity(
    tx: &mut Transaction<'_, Postgres>,
    class_id: Uuid,
    current_students: i32,
    is_registration_open: bool,
) -> Result<(), AppError> {
    sqlx::query(
        "UPDATE classes
         SET current_students = $1, is_registration_open = $2, updated_at = NOW()
         WHERE id = $3",
    )
    .bind(current_students)
    .bind(is_registration_open)
    .bind(class_id)
    .execute(&mut **tx)
    .await?;

    Ok(())
}

pub struct EnrollmentService;

impl EnrollmentService {
    #[instrument(skip(db))]
    pub async fn list_enrollments(db: &PgPool) -> Result<Vec<EnrollmentResponse>, AppError> {
        let enrollments = sqlx::query_as::<_, EnrollmentResponse>(&format!(
            "{ENROLLMENT_RESPONSE_SELECT} ORDER BY e.enrollment_date DESC"
        ))
        .fetch_all(db)
        .await?;

        Ok(enrollments)
    }

    #[instrument(skip(db))]
    pub async fn get_enrollment(db: &PgPool, id: Uuid) -> Result<EnrollmentResponse, AppError> {
        let enrollment = sqlx::query_as::<_, EnrollmentResponse>(&format!(
            "{ENROLLMENT_RESPONSE_SELECT} WHERE e.id = $1"
        ))
        .bind(id)
        .fetch_optional(db)
        .await?
        .ok_or_else(|| AppError::not_found(anyhow!("Enrollment with id {} not found", id)))?;

        Ok(enrollment)
    }

    #[instrument(skip(db))]
    pub async fn list_enrollments_by_student(
        db: &PgPool,
        student_id: Uuid,
    ) -> Result<Vec<EnrollmentResponse>, AppError> {
        let enrollments = sqlx::query_as::<_, EnrollmentResponse>(&format!(
            "{ENROLLMENT_RESPONSE_SELECT} WHERE e.student_id = $1 ORDER BY e.enrollment_date DESC"
        ))
        .bind(student_id)
        .fetch_all(db)
        .await?;

        Ok(enrollments)
    }

    #[instrument(skip(db))]
    pub async fn list_enrollments_by_class(
        db: &PgPool,
        class_id: Uuid,
    ) -> Result<Vec<EnrollmentResponse>, AppError> {
        let enrollments = sqlx::query_as::<_, EnrollmentResponse>(&format!(
            "{ENROLLMENT_RESPONSE_SELECT} WHERE e.class_id = $1 ORDER BY e.enrollment_date DESC"
        ))
        .bind(class_id)
        .fetch_all(db)
        .await?;

        Ok(enrollments)
    }

    /// Enroll a student into a class.
    ///
    /// The caller-supplied `student_id` may be either a user id or a
    /// student id: the user-to-student link is tried first, then the
    /// value is taken as a student id, and anything else is NotFound.
    #[instrument(skip(db, dto))]
    pub async fn create_enrollment(
        db: &PgPool,
        dto: CreateEnrollmentRequest,
    ) -> Result<EnrollmentResponse, AppError> {
        let mut tx = db.begin().await?;

        let student_id = resolve_student_ref(&mut tx, dto.student_id).await?;

        let already_enrolled = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM enrollments WHERE student_id = $1 AND class_id = $2)",
        )
        .bind(student_id)
        .bind(dto.class_id)
        .fetch_one(&mut *tx)
        .await?;

        if already_enrolled {
            return Err(AppError::conflict(anyhow!(
                "Student is already enrolled in this class"
            )));
        }

        let capacity = lock_class_capacity(&mut tx, dto.class_id).await?;

        let status = dto.status.unwrap_or(EnrollmentStatus::Pending);
        let enrollment_id = sqlx::query_scalar::<_, Uuid>(
            "INSERT INTO enrollments (student_id, class_id, status, note)
             VALUES ($1, $2, $3, $4)
             RETURNING id",
        )
        .bind(student_id)
        .bind(dto.class_id)
        .bind(status)
        .bind(&dto.note)
        .fetch_one(&mut *tx)
        .await?;

        let (new_count, open_after) = headcount_after_enroll(
            capacity.current_students,
            capacity.max_students,
            capacity.is_registration_open,
        );
        store_class_capacity(&mut tx, dto.class_id, new_count, open_after).await?;

        let response = sqlx::query_as::<_, EnrollmentResponse>(&format!(
            "{ENROLLMENT_RESPONSE_SELECT} WHERE e.id = $1"
        ))
        .bind(enrollment_id)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(response)
    }

    /// Change an enrollment's status. Transitioning into CANCELLED from a
    /// non-cancelled state releases the student's seat; every other
    /// transition only changes the status.
    #[instrument(skip(db))]
    pub async fn update_enrollment_status(
        db: &PgPool,
        id: Uuid,
        new_status: EnrollmentStatus,
    ) -> Result<EnrollmentResponse, AppError> {
        let mut tx = db.begin().await?;

        let (old_status, class_id) = sqlx::query_as::<_, (EnrollmentStatus, Uuid)>(
            "SELECT status, class_id FROM enrollments WHERE id = $1 FOR UPDATE",
        )
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| AppError::not_found(anyhow!("Enrollment with id {} not found", id)))?;

        sqlx::query("UPDATE enrollments SET status = $1 WHERE id = $2")
            .bind(new_status)
            .bind(id)
            .execute(&mut *tx)
            .await?;

        if new_status == EnrollmentStatus::Cancelled && old_status != EnrollmentStatus::Cancelled {
            let capacity = lock_class_capacity(&mut tx, class_id).await?;
            let (new_count, open_after) = headcount_after_release(
                capacity.current_students,
                capacity.max_students,
                capacity.is_registration_open,
            );
            store_class_capacity(&mut tx, class_id, new_count, open_after).await?;
        }

        let response = sqlx::query_as::<_, EnrollmentResponse>(&format!(
            "{ENROLLMENT_RESPONSE_SELECT} WHERE e.id = $1"
        ))
        .bind(id)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(response)
    }

    /// Delete an enrollment. Unlike cancellation, the seat is released
    /// regardless of the enrollment's prior status: deleting an
    /// already-cancelled enrollment decrements the counter a second time.
    #[instrument(skip(db))]
    pub async fn delete_enrollment(db: &PgPool, id: Uuid) -> Result<(), AppError> {
        let mut tx = db.begin().await?;

        let class_id = sqlx::query_scalar::<_, Uuid>(
            "SELECT class_id FROM enrollments WHERE id = $1 FOR UPDATE",
        )
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| AppError::not_found(anyhow!("Enrollment with id {} not found", id)))?;

        sqlx::query("DELETE FROM enrollments WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        let capacity = lock_class_capacity(&mut tx, class_id).await?;
        let (new_count, open_after) = headcount_after_release(
            capacity.current_students,
            capacity.max_students,
            capacity.is_registration_open,
        );
        store_class_capacity(&mut tx, class_id, new_count, open_after).await?;

        tx.commit().await?;

        Ok(())
    }
}

/// Resolve a caller-supplied reference that may be a user id or a student
/// id, preferring the user-to-student link.
async fn resolve_student_ref(
    tx: &mut Transaction<'_, Postgres>,
    student_ref: Uuid,
) -> Result<Uuid, AppError> {
    let by_user = sqlx::query_scalar::<_, Uuid>("SELECT id FROM students WHERE user_id = $1")
        .bind(student_ref)
        .fetch_optional(&mut **tx)
        .await?;

    if let Some(student_id) = by_user {
        debug!(%student_ref, %student_id, "resolved user id to student id");
        return Ok(student_id);
    }

    let exists = sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM students WHERE id = $1)")
        .bind(student_ref)
        .fetch_one(&mut **tx)
        .await?;

    if exists {
        return Ok(student_ref);
    }

    Err(AppError::not_found(anyhow!(
        "Student not found for user or student id {}",
        student_ref
    )))
}
