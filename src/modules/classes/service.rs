use anyhow::anyhow;
use sqlx::PgPool;
use tracing::instrument;
use uuid::Uuid;

use crate::modules::classes::model::{Class, CreateClassRequest, UpdateClassRequest};
use crate::utils::errors::AppError;
use crate::utils::pagination::PaginationParams;

const CLASS_COLUMNS: &str = "id, code, name, schedule, room, start_date, end_date, max_students, \
     current_students, is_registration_open, status, course_id, teacher_id, created_at, updated_at";

pub struct ClassService;

impl ClassService {
    #[instrument(skip(db, dto))]
    pub async fn create_class(db: &PgPool, dto: CreateClassRequest) -> Result<Class, AppError> {
        let course_exists =
            sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM courses WHERE id = $1)")
                .bind(dto.course_id)
                .fetch_one(db)
                .await?;

        if !course_exists {
            return Err(AppError::not_found(anyhow!(
                "Course with id {} not found",
                dto.course_id
            )));
        }

        let teacher_exists =
            sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM teachers WHERE id = $1)")
                .bind(dto.teacher_id)
                .fetch_one(db)
                .await?;

        if !teacher_exists {
            return Err(AppError::not_found(anyhow!(
                "Teacher with id {} not found",
                dto.teacher_id
            )));
        }

        let class = sqlx::query_as::<_, Class>(&format!(
            "INSERT INTO classes
                 (code, name, schedule, room, start_date, end_date, max_students, course_id, teacher_id)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
             RETURNING {CLASS_COLUMNS}"
        ))
        .bind(&dto.code)
        .bind(&dto.name)
        .bind(&dto.schedule)
        .bind(&dto.room)
        .bind(dto.start_date)
        .bind(dto.end_date)
        .bind(dto.max_students)
        .bind(dto.course_id)
        .bind(dto.teacher_id)
        .fetch_one(db)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(db_err) = &e {
                if db_err.is_unique_violation() {
                    return AppError::conflict(anyhow!(
                        "Class with code {} already exists",
                        dto.code
                    ));
                }
            }
            AppError::database(anyhow::Error::from(e))
        })?;

        Ok(class)
    }

    #[instrument(skip(db))]
    pub async fn list_classes(
        db: &PgPool,
        pagination: &PaginationParams,
    ) -> Result<(Vec<Class>, i64), AppError> {
        let total = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM classes")
            .fetch_one(db)
            .await?;

        let classes = sqlx::query_as::<_, Class>(&format!(
            "SELECT {CLASS_COLUMNS} FROM classes ORDER BY code LIMIT $1 OFFSET $2"
        ))
        .bind(pagination.limit())
        .bind(pagination.offset())
        .fetch_all(db)
        .await?;

        Ok((classes, total))
    }

    #[instrument(skip(db))]
    pub async fn get_class(db: &PgPool, id: Uuid) -> Result<Class, AppError> {
        let class = sqlx::query_as::<_, Class>(&format!(
            "SELECT {CLASS_COLUMNS} FROM classes WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(db)
        .await?
        .ok_or_else(|| AppError::not_found(anyhow!("Class with id {} not found", id)))?;

        Ok(class)
    }

    #[instrument(skip(db, dto))]
    pub async fn update_class(
        db: &PgPool,
        id: Uuid,
        dto: UpdateClassRequest,
    ) -> Result<Class, AppError> {
        let existing = Self::get_class(db, id).await?;

        let name = dto.name.unwrap_or(existing.name);
        let schedule = dto.schedule.or(existing.schedule);
        let room = dto.room.or(existing.room);
        let start_date = dto.start_date.or(existing.start_date);
        let end_date = dto.end_date.or(existing.end_date);
        let status = dto.status.unwrap_or(existing.status);

        let class = sqlx::query_as::<_, Class>(&format!(
            "UPDATE classes
             SET name = $1, schedule = $2, room = $3, start_date = $4, end_date = $5,
                 status = $6, updated_at = NOW()
             WHERE id = $7
             RETURNING {CLASS_COLUMNS}"
        ))
        .bind(&name)
        .bind(&schedule)
        .bind(&room)
        .bind(start_date)
        .bind(end_date)
        .bind(status)
        .bind(id)
        .fetch_one(db)
        .await?;

        Ok(class)
    }

    #[instrument(skip(db))]
    pub async fn delete_class(db: &PgPool, id: Uuid) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM classes WHERE id = $1")
            .bind(id)
            .execute(db)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found(anyhow!(
                "Class with id {} not found",
                id
            )));
        }

        Ok(())
    }
}
