use anyhow::anyhow;
use sqlx::{PgPool, Postgres, Transaction};
use tracing::{info, instrument};
use uuid::Uuid;

use crate::config::jwt::JwtConfig;
use crate::modules::users::model::{UserRole, system_roles};
use crate::modules::users::service::UserService;
use crate::utils::errors::AppError;
use crate::utils::jwt::create_access_token;
use crate::utils::password::{hash_password, verify_password};

use super::model::{JwtResponse, LoginRequest, MessageResponse, RegisterRequest};

pub struct AuthService;

#[derive(sqlx::FromRow)]
struct UserAuthRow {
    id: Uuid,
    username: String,
    email: String,
    password: String,
    full_name: String,
    is_active: bool,
}

impl AuthService {
    #[instrument(skip(db, dto, jwt_config))]
    pub async fn login(
        db: &PgPool,
        dto: LoginRequest,
        jwt_config: &JwtConfig,
    ) -> Result<JwtResponse, AppError> {
        let row = sqlx::query_as::<_, UserAuthRow>(
            "SELECT id, username, email, password, full_name, is_active
             FROM users WHERE username = $1",
        )
        .bind(&dto.username)
        .fetch_optional(db)
        .await?
        .ok_or_else(|| AppError::unauthorized(anyhow!("Invalid username or password")))?;

        if !verify_password(&dto.password, &row.password)? {
            return Err(AppError::unauthorized(anyhow!(
                "Invalid username or password"
            )));
        }

        if !row.is_active {
            return Err(AppError::unauthorized(anyhow!("Account is deactivated")));
        }

        let roles = UserService::get_role_slugs(db, row.id).await?;

        // Surface the linked teacher/student record id for clients that
        // address those resources directly.
        let teacher_id = if roles.iter().any(|r| r == "teacher") {
            sqlx::query_scalar::<_, Uuid>("SELECT id FROM teachers WHERE user_id = $1")
                .bind(row.id)
                .fetch_optional(db)
                .await?
        } else {
            None
        };

        let student_id = if roles.iter().any(|r| r == "student") {
            sqlx::query_scalar::<_, Uuid>("SELECT id FROM students WHERE user_id = $1")
                .bind(row.id)
                .fetch_optional(db)
                .await?
        } else {
            None
        };

        let access_token = create_access_token(row.id, &row.username, &roles, jwt_config)?;

        Ok(JwtResponse {
            access_token,
            token_type: "Bearer".to_string(),
            id: row.id,
            username: row.username,
            email: row.email,
            full_name: row.full_name,
            roles,
            teacher_id,
            student_id,
        })
    }

    #[instrument(skip(db, dto))]
    pub async fn register(db: &PgPool, dto: RegisterRequest) -> Result<MessageResponse, AppError> {
        let mut tx = db.begin().await?;

        let username_taken = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM users WHERE username = $1)",
        )
        .bind(&dto.username)
        .fetch_one(&mut *tx)
        .await?;

        if username_taken {
            return Err(AppError::conflict(anyhow!(
                "Username {} is already taken",
                dto.username
            )));
        }

        let email_taken =
            sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM users WHERE email = $1)")
                .bind(&dto.email)
                .fetch_one(&mut *tx)
                .await?;

        if email_taken {
            return Err(AppError::conflict(anyhow!(
                "Email {} is already registered",
                dto.email
            )));
        }

        let hashed_password = hash_password(&dto.password)?;

        let user_id = sqlx::query_scalar::<_, Uuid>(
            "INSERT INTO users (username, email, password, full_name, phone)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING id",
        )
        .bind(&dto.username)
        .bind(&dto.email)
        .bind(&hashed_password)
        .bind(&dto.full_name)
        .bind(&dto.phone)
        .fetch_one(&mut *tx)
        .await?;

        let roles = resolve_requested_roles(dto.roles.as_deref());
        assign_roles_and_provision(&mut tx, user_id, &roles).await?;

        tx.commit().await?;

        info!(%user_id, username = %dto.username, "registered user");
        Ok(MessageResponse::new("User registered successfully"))
    }
}

/// Map requested role names onto the fixed role set. An empty or missing
/// request grants student; unknown names also fall back to student.
pub(crate) fn resolve_requested_roles(names: Option<&[String]>) -> Vec<UserRole> {
    let names = match names {
        Some(names) if !names.is_empty() => names,
        _ => return vec![UserRole::Student],
    };

    let mut roles = Vec::new();
    for name in names {
        let role = UserRole::from_requested_name(name);
        if !roles.contains(&role) {
            roles.push(role);
        }
    }
    roles
}

/// Assign roles and auto-provision the 1:1 student/teacher record for each
/// granted role, all within the caller's transaction.
pub(crate) async fn assign_roles_and_provision(
    tx: &mut Transaction<'_, Postgres>,
    user_id: Uuid,
    roles: &[UserRole],
) -> Result<(), AppError> {
    for role in roles {
        sqlx::query("INSERT INTO user_roles (user_id, role_id) VALUES ($1, $2) ON CONFLICT DO NOTHING")
            .bind(user_id)
            .bind(system_roles::id_for(*role))
            .execute(&mut **tx)
            .await?;

        match role {
            UserRole::Student => {
                let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM students")
                    .fetch_one(&mut **tx)
                    .await?;
                let student_code = format_student_code(count + 1);

                sqlx::query(
                    "INSERT INTO students (user_id, student_code, enrollment_date)
                     VALUES ($1, $2, CURRENT_DATE)",
                )
                .bind(user_id)
                .bind(&student_code)
                .execute(&mut **tx)
                .await?;

                info!(%user_id, %student_code, "provisioned student record");
            }
            UserRole::Teacher => {
                let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM teachers")
                    .fetch_one(&mut **tx)
                    .await?;
                let employee_code = format_employee_code(count + 1);

                sqlx::query(
                    "INSERT INTO teachers (user_id, employee_code, hire_date)
                     VALUES ($1, $2, CURRENT_DATE)",
                )
                .bind(user_id)
                .bind(&employee_code)
                .execute(&mut **tx)
                .await?;

                info!(%user_id, %employee_code, "provisioned teacher record");
            }
            UserRole::Admin => {}
        }
    }

    Ok(())
}

fn format_student_code(seq: i64) -> String {
    format!("STU{:05}", seq)
}

fn format_employee_code(seq: i64) -> String {
    format!("TCH{:05}", seq)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_defaults_to_student() {
        assert_eq!(resolve_requested_roles(None), vec![UserRole::Student]);
        assert_eq!(resolve_requested_roles(Some(&[])), vec![UserRole::Student]);
    }

    #[test]
    fn test_resolve_maps_and_dedupes() {
        let names = vec![
            "TEACHER".to_string(),
            "teacher".to_string(),
            "Admin".to_string(),
        ];
        assert_eq!(resolve_requested_roles(Some(&names)), vec![
            UserRole::Teacher,
            UserRole::Admin
        ]);
    }

    #[test]
    fn test_resolve_unknown_falls_back_to_student() {
        let names = vec!["janitor".to_string()];
        assert_eq!(resolve_requested_roles(Some(&names)), vec![
            UserRole::Student
        ]);
    }

    #[test]
    fn test_code_formats() {
        assert_eq!(format_student_code(1), "STU00001");
        assert_eq!(format_student_code(42), "STU00042");
        assert_eq!(format_employee_code(7), "TCH00007");
        assert_eq!(format_student_code(123456), "STU123456");
    }
}
