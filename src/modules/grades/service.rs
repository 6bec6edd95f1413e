use anyhow::anyhow;
use sqlx::PgPool;
use tracing::instrument;
use uuid::Uuid;

use crate::modules::grades::model::{
    CreateGradeRequest, Grade, UpdateGradeRequest, compute_total_score,
};
use crate::utils::errors::AppError;

const GRADE_COLUMNS: &str = "id, enrollment_id, attendance_score, midterm_score, final_score, \
     total_score, comment, graded_by, graded_at, updated_at";

pub struct GradeService;

impl GradeService {
    #[instrument(skip(db, dto))]
    pub async fn create_grade(
        db: &PgPool,
        dto: CreateGradeRequest,
        graded_by: Uuid,
    ) -> Result<Grade, AppError> {
        let enrollment_exists =
            sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM enrollments WHERE id = $1)")
                .bind(dto.enrollment_id)
                .fetch_one(db)
                .await?;

        if !enrollment_exists {
            return Err(AppError::not_found(anyhow!(
                "Enrollment with id {} not found",
                dto.enrollment_id
            )));
        }

        let total_score =
            compute_total_score(dto.attendance_score, dto.midterm_score, dto.final_score);

        let grade = sqlx::query_as::<_, Grade>(&format!(
            "INSERT INTO grades
                 (enrollment_id, attendance_score, midterm_score, final_score, total_score,
                  comment, graded_by)
             VALUES ($1, $2, $3, $4, $5, $6, $7)
             RETURNING {GRADE_COLUMNS}"
        ))
        .bind(dto.enrollment_id)
        .bind(dto.attendance_score)
        .bind(dto.midterm_score)
        .bind(dto.final_score)
        .bind(total_score)
        .bind(&dto.comment)
        .bind(graded_by)
        .fetch_one(db)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(db_err) = &e {
                if db_err.is_unique_violation() {
                    return AppError::conflict(anyhow!(
                        "Enrollment {} already has a grade",
                        dto.enrollment_id
                    ));
                }
            }
            AppError::database(anyhow::Error::from(e))
        })?;

        Ok(grade)
    }

    #[instrument(skip(db, dto))]
    pub async fn update_grade(
        db: &PgPool,
        id: Uuid,
        dto: UpdateGradeRequest,
    ) -> Result<Grade, AppError> {
        let existing = Self::get_grade(db, id).await?;

        let attendance_score = dto.attendance_score.or(existing.attendance_score);
        let midterm_score = dto.midterm_score.or(existing.midterm_score);
        let final_score = dto.final_score.or(existing.final_score);
        let comment = dto.comment.or(existing.comment);

        let total_score = compute_total_score(attendance_score, midterm_score, final_score);

        let grade = sqlx::query_as::<_, Grade>(&format!(
            "UPDATE grades
             SET attendance_score = $1, midterm_score = $2, final_score = $3,
                 total_score = $4, comment = $5, updated_at = NOW()
             WHERE id = $6
             RETURNING {GRADE_COLUMNS}"
        ))
        .bind(attendance_score)
        .bind(midterm_score)
        .bind(final_score)
        .bind(total_score)
        .bind(&comment)
        .bind(id)
        .fetch_one(db)
        .await?;

        Ok(grade)
    }

    #[instrument(skip(db))]
    pub async fn get_grade(db: &PgPool, id: Uuid) -> Result<Grade, AppError> {
        let grade = sqlx::query_as::<_, Grade>(&format!(
            "SELECT {GRADE_COLUMNS} FROM grades WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(db)
        .await?
        .ok_or_else(|| AppError::not_found(anyhow!("Grade with id {} not found", id)))?;

        Ok(grade)
    }

    #[instrument(skip(db))]
    pub async fn get_grade_by_enrollment(
        db: &PgPool,
        enrollment_id: Uuid,
    ) -> Result<Grade, AppError> {
        let grade = sqlx::query_as::<_, Grade>(&format!(
            "SELECT {GRADE_COLUMNS} FROM grades WHERE enrollment_id = $1"
        ))
        .bind(enrollment_id)
        .fetch_optional(db)
        .await?
        .ok_or_else(|| {
            AppError::not_found(anyhow!(
                "Grade for enrollment {} not found",
                enrollment_id
            ))
        })?;

        Ok(grade)
    }

    #[instrument(skip(db))]
    pub async fn list_grades_by_student(
        db: &PgPool,
        student_id: Uuid,
    ) -> Result<Vec<Grade>, AppError> {
        let grades = sqlx::query_as::<_, Grade>(
            "SELECT g.id, g.enrollment_id, g.attendance_score, g.midterm_score, g.final_score,
                    g.total_score, g.comment, g.graded_by, g.graded_at, g.updated_at
             FROM grades g
             JOIN enrollments e ON e.id = g.enrollment_id
             WHERE e.student_id = $1
             ORDER BY g.graded_at DESC",
        )
        .bind(student_id)
        .fetch_all(db)
        .await?;

        Ok(grades)
    }

    #[instrument(skip(db))]
    pub async fn list_grades_by_class(db: &PgPool, class_id: Uuid) -> Result<Vec<Grade>, AppError> {
        let grades = sqlx::query_as::<_, Grade>(
            "SELECT g.id, g.enrollment_id, g.attendance_score, g.midterm_score, g.final_score,
                    g.total_score, g.comment, g.graded_by, g.graded_at, g.updated_at
             FROM grades g
             JOIN enrollments e ON e.id = g.enrollment_id
             WHERE e.class_id = $1
             ORDER BY g.graded_at DESC",
        )
        .bind(class_id)
        .fetch_all(db)
        .await?;

        Ok(grades)
    }

    #[instrument(skip(db))]
    pub async fn delete_grade(db: &PgPool, id: Uuid) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM grades WHERE id = $1")
            .bind(id)
            .execute(db)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found(anyhow!(
                "Grade with id {} not found",
                id
            )));
        }

        Ok(())
    }
}
