use std::collections::HashMap;

use anyhow::anyhow;
use sqlx::PgPool;
use tracing::instrument;
use uuid::Uuid;

use crate::modules::auth::service::{assign_roles_and_provision, resolve_requested_roles};
use crate::modules::users::model::{
    ChangePasswordRequest, CreateUserRequest, UpdateProfileRequest, UpdateUserRequest, User,
    UserResponse, UserRole,
};
use crate::utils::errors::AppError;
use crate::utils::password::{hash_password, verify_password};

const USER_COLUMNS: &str =
    "id, username, email, full_name, phone, avatar_url, is_active, created_at, updated_at";

pub struct UserService;

impl UserService {
    pub(crate) async fn get_role_slugs(db: &PgPool, user_id: Uuid) -> Result<Vec<String>, AppError> {
        let slugs = sqlx::query_scalar::<_, String>(
            "SELECT r.slug FROM roles r
             JOIN user_roles ur ON ur.role_id = r.id
             WHERE ur.user_id = $1
             ORDER BY r.slug",
        )
        .bind(user_id)
        .fetch_all(db)
        .await?;

        Ok(slugs)
    }

    #[instrument(skip(db))]
    pub async fn list_users(db: &PgPool) -> Result<Vec<UserResponse>, AppError> {
        let users = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users ORDER BY created_at"
        ))
        .fetch_all(db)
        .await?;

        attach_roles(db, users).await
    }

    #[instrument(skip(db))]
    pub async fn get_user(db: &PgPool, id: Uuid) -> Result<UserResponse, AppError> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(db)
        .await?
        .ok_or_else(|| AppError::not_found(anyhow!("User with id {} not found", id)))?;

        let roles = Self::get_role_slugs(db, user.id).await?;
        Ok(UserResponse::from_parts(user, roles))
    }

    #[instrument(skip(db))]
    pub async fn list_users_by_role(
        db: &PgPool,
        role: UserRole,
    ) -> Result<Vec<UserResponse>, AppError> {
        let users = sqlx::query_as::<_, User>(
            "SELECT u.id, u.username, u.email, u.full_name, u.phone, u.avatar_url,
                    u.is_active, u.created_at, u.updated_at
             FROM users u
             JOIN user_roles ur ON ur.user_id = u.id
             JOIN roles r ON r.id = ur.role_id
             WHERE r.slug = $1
             ORDER BY u.created_at",
        )
        .bind(role.as_str())
        .fetch_all(db)
        .await?;

        attach_roles(db, users).await
    }

    #[instrument(skip(db, dto))]
    pub async fn create_user(db: &PgPool, dto: CreateUserRequest) -> Result<UserResponse, AppError> {
        let mut tx = db.begin().await?;

        let hashed_password = hash_password(&dto.password)?;

        let user = sqlx::query_as::<_, User>(&format!(
            "INSERT INTO users (username, email, password, full_name, phone)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING {USER_COLUMNS}"
        ))
        .bind(&dto.username)
        .bind(&dto.email)
        .bind(&hashed_password)
        .bind(&dto.full_name)
        .bind(&dto.phone)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| duplicate_or_database(e, "Username or email already exists"))?;

        let roles = resolve_requested_roles(dto.roles.as_deref());
        assign_roles_and_provision(&mut tx, user.id, &roles).await?;

        tx.commit().await?;

        let slugs = roles.iter().map(|r| r.as_str().to_string()).collect();
        Ok(UserResponse::from_parts(user, slugs))
    }

    #[instrument(skip(db, dto))]
    pub async fn update_user(
        db: &PgPool,
        id: Uuid,
        dto: UpdateUserRequest,
    ) -> Result<UserResponse, AppError> {
        let existing = Self::get_user(db, id).await?;

        let email = dto.email.unwrap_or(existing.email);
        let full_name = dto.full_name.unwrap_or(existing.full_name);
        let phone = dto.phone.or(existing.phone);
        let avatar_url = dto.avatar_url.or(existing.avatar_url);

        let user = sqlx::query_as::<_, User>(&format!(
            "UPDATE users
             SET email = $1, full_name = $2, phone = $3, avatar_url = $4, updated_at = NOW()
             WHERE id = $5
             RETURNING {USER_COLUMNS}"
        ))
        .bind(&email)
        .bind(&full_name)
        .bind(&phone)
        .bind(&avatar_url)
        .bind(id)
        .fetch_one(db)
        .await
        .map_err(|e| duplicate_or_database(e, "Email already in use"))?;

        let roles = Self::get_role_slugs(db, user.id).await?;
        Ok(UserResponse::from_parts(user, roles))
    }

    #[instrument(skip(db))]
    pub async fn delete_user(db: &PgPool, id: Uuid) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(db)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found(anyhow!("User with id {} not found", id)));
        }

        Ok(())
    }

    #[instrument(skip(db))]
    pub async fn set_active(db: &PgPool, id: Uuid, active: bool) -> Result<UserResponse, AppError> {
        let user = sqlx::query_as::<_, User>(&format!(
            "UPDATE users SET is_active = $1, updated_at = NOW()
             WHERE id = $2
             RETURNING {USER_COLUMNS}"
        ))
        .bind(active)
        .bind(id)
        .fetch_optional(db)
        .await?
        .ok_or_else(|| AppError::not_found(anyhow!("User with id {} not found", id)))?;

        let roles = Self::get_role_slugs(db, user.id).await?;
        Ok(UserResponse::from_parts(user, roles))
    }

    #[instrument(skip(db, dto))]
    pub async fn update_profile(
        db: &PgPool,
        user_id: Uuid,
        dto: UpdateProfileRequest,
    ) -> Result<UserResponse, AppError> {
        let existing = Self::get_user(db, user_id).await?;

        let full_name = dto.full_name.unwrap_or(existing.full_name);
        let phone = dto.phone.or(existing.phone);
        let avatar_url = dto.avatar_url.or(existing.avatar_url);

        let user = sqlx::query_as::<_, User>(&format!(
            "UPDATE users
             SET full_name = $1, phone = $2, avatar_url = $3, updated_at = NOW()
             WHERE id = $4
             RETURNING {USER_COLUMNS}"
        ))
        .bind(&full_name)
        .bind(&phone)
        .bind(&avatar_url)
        .bind(user_id)
        .fetch_one(db)
        .await?;

        let roles = Self::get_role_slugs(db, user.id).await?;
        Ok(UserResponse::from_parts(user, roles))
    }

    #[instrument(skip(db, dto))]
    pub async fn change_password(
        db: &PgPool,
        user_id: Uuid,
        dto: ChangePasswordRequest,
    ) -> Result<(), AppError> {
        let current_hash =
            sqlx::query_scalar::<_, String>("SELECT password FROM users WHERE id = $1")
                .bind(user_id)
                .fetch_optional(db)
                .await?
                .ok_or_else(|| AppError::not_found(anyhow!("User with id {} not found", user_id)))?;

        if !verify_password(&dto.current_password, &current_hash)? {
            return Err(AppError::bad_request(anyhow!(
                "Current password is incorrect"
            )));
        }

        let new_hash = hash_password(&dto.new_password)?;

        sqlx::query("UPDATE users SET password = $1, updated_at = NOW() WHERE id = $2")
            .bind(&new_hash)
            .bind(user_id)
            .execute(db)
            .await?;

        Ok(())
    }
}

/// Fetch role slugs for a batch of users in one query.
async fn attach_roles(db: &PgPool, users: Vec<User>) -> Result<Vec<UserResponse>, AppError> {
    let ids: Vec<Uuid> = users.iter().map(|u| u.id).collect();

    let pairs = sqlx::query_as::<_, (Uuid, String)>(
        "SELECT ur.user_id, r.slug FROM user_roles ur
         JOIN roles r ON r.id = ur.role_id
         WHERE ur.user_id = ANY($1)
         ORDER BY r.slug",
    )
    .bind(&ids)
    .fetch_all(db)
    .await?;

    let mut by_user: HashMap<Uuid, Vec<String>> = HashMap::new();
    for (user_id, slug) in pairs {
        by_user.entry(user_id).or_default().push(slug);
    }

    Ok(users
        .into_iter()
        .map(|user| {
            let roles = by_user.remove(&user.id).unwrap_or_default();
            UserResponse::from_parts(user, roles)
        })
        .collect())
}

fn duplicate_or_database(e: sqlx::Error, message: &str) -> AppError {
    if let sqlx::Error::Database(db_err) = &e {
        if db_err.is_unique_violation() {
            return AppError::conflict(anyhow!("{}", message));
        }
    }
    AppError::database(anyhow::Error::from(e))
}
