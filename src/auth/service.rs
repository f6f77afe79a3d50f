use secrecy::Secret;
use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use crate::category::service::CategoryService;
use crate::errors::AppError;

use super::jwt::{create_access_token, create_refresh_token, revoke_all_user_tokens};
use super::models::{AuthTokenResponse, CreateUserDto, Role, UpdateProfileDto, User};
use super::password::{hash_password, verify_password, INVALID_CREDENTIALS};

pub(crate) const USER_COLUMNS: &str =
    "id, username, email, password_hash, role, is_active, created_at, updated_at";

/// Authentication service handling user registration and login logic
pub struct AuthService;

impl AuthService {
    /// Register a new user, seed their default categories and return auth tokens
    pub async fn register(
        pool: &PgPool,
        jwt_secret: &Secret<String>,
        dto: &CreateUserDto,
        role: Role,
    ) -> Result<AuthTokenResponse, AppError> {
        // Check if email already exists
        let existing_user =
            sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM users WHERE email = $1")
                .bind(&dto.email)
                .fetch_one(pool)
                .await
                .map_err(|e| AppError::InternalError(e.to_string()))?;

        if existing_user > 0 {
            return Err(AppError::Conflict("Email already exists".to_string()));
        }

        // Hash password
        let password_hash = hash_password(&dto.password)?;

        let mut tx = pool
            .begin()
            .await
            .map_err(|e| AppError::InternalError(format!("Failed to begin transaction: {e}")))?;

        // Insert user
        let user = sqlx::query_as::<_, User>(&format!(
            r#"
            INSERT INTO users (username, email, password_hash, role)
            VALUES ($1, $2, $3, $4)
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(&dto.username)
        .bind(&dto.email)
        .bind(&password_hash)
        .bind(role.as_str())
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| match &e {
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                AppError::Conflict("Email already exists".to_string())
            }
            _ => AppError::InternalError(e.to_string()),
        })?;

        // A new ledger starts with the default categories
        CategoryService::create_defaults(&mut tx, user.id).await?;

        tx.commit()
            .await
            .map_err(|e| AppError::InternalError(format!("Failed to commit transaction: {e}")))?;

        info!(user_id = %user.id, role = role.as_str(), "Registered user");

        // Create tokens
        let access_token = create_access_token(&user, jwt_secret)?;
        let refresh_token = create_refresh_token(pool, user.id).await?;

        Ok(AuthTokenResponse::new(access_token, refresh_token, &user))
    }

    /// Authenticate a user by email and password, return auth tokens
    pub async fn login(
        pool: &PgPool,
        jwt_secret: &Secret<String>,
        email: &str,
        password: &str,
    ) -> Result<AuthTokenResponse, AppError> {
        // Find user by email
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = $1"
        ))
        .bind(email)
        .fetch_optional(pool)
        .await
        .map_err(|e| AppError::InternalError(e.to_string()))?
        .ok_or_else(|| AppError::Unauthorized(INVALID_CREDENTIALS.to_string()))?;

        verify_password(password, &user.password_hash)?;
        user.ensure_active()?;

        // Create tokens
        let access_token = create_access_token(&user, jwt_secret)?;
        let refresh_token = create_refresh_token(pool, user.id).await?;

        Ok(AuthTokenResponse::new(access_token, refresh_token, &user))
    }

    /// Get user by ID
    pub async fn get_user_by_id(pool: &PgPool, user_id: Uuid) -> Result<User, AppError> {
        sqlx::query_as::<_, User>(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1"))
            .bind(user_id)
            .fetch_optional(pool)
            .await
            .map_err(|e| AppError::InternalError(e.to_string()))?
            .ok_or_else(|| AppError::Unauthorized("User not found".to_string()))
    }

    /// Replace a user's password and end every session they hold.
    pub async fn set_password(
        pool: &PgPool,
        user_id: Uuid,
        new_password: &str,
    ) -> Result<(), AppError> {
        let password_hash = hash_password(new_password)?;

        let result = sqlx::query(
            "UPDATE users SET password_hash = $2, updated_at = NOW() WHERE id = $1",
        )
        .bind(user_id)
        .bind(&password_hash)
        .execute(pool)
        .await
        .map_err(|e| AppError::InternalError(e.to_string()))?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("User not found".to_string()));
        }

        let revoked = revoke_all_user_tokens(pool, user_id).await?;
        info!(%user_id, revoked_sessions = revoked, "Password changed");
        Ok(())
    }

    /// Update the caller's own username and/or password.
    /// A new password is only accepted together with the current one.
    pub async fn update_profile(
        pool: &PgPool,
        user_id: Uuid,
        dto: &UpdateProfileDto,
    ) -> Result<User, AppError> {
        let user = Self::get_user_by_id(pool, user_id).await?;

        if let Some(new_password) = &dto.new_password {
            let current = dto.current_password.as_deref().ok_or_else(|| {
                AppError::ValidationError("Current password is required".to_string())
            })?;
            verify_password(current, &user.password_hash).map_err(|e| match e {
                AppError::Unauthorized(_) => {
                    AppError::ValidationError("Current password is incorrect".to_string())
                }
                other => other,
            })?;
            Self::set_password(pool, user_id, new_password).await?;
        }

        sqlx::query_as::<_, User>(&format!(
            r#"
            UPDATE users
            SET username = COALESCE($2, username), updated_at = NOW()
            WHERE id = $1
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(user_id)
        .bind(dto.username.as_deref())
        .fetch_optional(pool)
        .await
        .map_err(|e| AppError::InternalError(e.to_string()))?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))
    }
}
