use sqlx::PgPool;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::auth::jwt::revoke_all_user_tokens;
use crate::auth::models::User;
use crate::auth::service::{AuthService, USER_COLUMNS};
use crate::auth::Role;
use crate::errors::AppError;

use super::models::AdminUpdateUserDto;

/// User management on behalf of an administrator
pub struct AdminService;

impl AdminService {
    /// Administrators may not lock themselves out of their own account
    fn ensure_not_self(actor: Uuid, target: Uuid, action: &str) -> Result<(), AppError> {
        if actor == target {
            return Err(AppError::Forbidden(format!(
                "Administrators cannot {action} their own account"
            )));
        }
        Ok(())
    }

    /// Every registered user, oldest first
    pub async fn list_users(pool: &PgPool) -> Result<Vec<User>, AppError> {
        sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users ORDER BY created_at ASC, id ASC"
        ))
        .fetch_all(pool)
        .await
        .map_err(|e| AppError::InternalError(e.to_string()))
    }

    /// Change username, email or role of any user
    #[instrument(skip(pool, dto), fields(%actor, %target))]
    pub async fn update_user(
        pool: &PgPool,
        actor: Uuid,
        target: Uuid,
        dto: &AdminUpdateUserDto,
    ) -> Result<User, AppError> {
        if dto.role.is_some_and(|role| role != Role::Admin) {
            Self::ensure_not_self(actor, target, "demote")?;
        }

        let user = sqlx::query_as::<_, User>(&format!(
            r#"
            UPDATE users
            SET username = COALESCE($2, username),
                email = COALESCE($3, email),
                role = COALESCE($4, role),
                updated_at = NOW()
            WHERE id = $1
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(target)
        .bind(dto.username.as_deref())
        .bind(dto.email.as_deref())
        .bind(dto.role.map(|role| role.as_str()))
        .fetch_optional(pool)
        .await
        .map_err(|e| match &e {
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                AppError::Conflict("Email already exists".to_string())
            }
            _ => AppError::InternalError(e.to_string()),
        })?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

        info!(role = %user.role, "Updated user");
        Ok(user)
    }

    /// Set a new password for any user; their sessions are revoked
    pub async fn change_password(
        pool: &PgPool,
        target: Uuid,
        new_password: &str,
    ) -> Result<(), AppError> {
        AuthService::set_password(pool, target, new_password).await
    }

    /// Flip a user between active and disabled. Disabling revokes their sessions.
    #[instrument(skip(pool), fields(%actor, %target))]
    pub async fn toggle_status(pool: &PgPool, actor: Uuid, target: Uuid) -> Result<bool, AppError> {
        Self::ensure_not_self(actor, target, "deactivate")?;

        let is_active = sqlx::query_scalar::<_, bool>(
            r#"
            UPDATE users
            SET is_active = NOT is_active, updated_at = NOW()
            WHERE id = $1
            RETURNING is_active
            "#,
        )
        .bind(target)
        .fetch_optional(pool)
        .await
        .map_err(|e| AppError::InternalError(e.to_string()))?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

        if !is_active {
            revoke_all_user_tokens(pool, target).await?;
        }

        info!(is_active, "Changed user status");
        Ok(is_active)
    }

    /// Delete a user. Their categories, transactions and sessions go with them.
    #[instrument(skip(pool), fields(%actor, %target))]
    pub async fn delete_user(pool: &PgPool, actor: Uuid, target: Uuid) -> Result<(), AppError> {
        Self::ensure_not_self(actor, target, "delete")?;

        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(target)
            .execute(pool)
            .await
            .map_err(|e| AppError::InternalError(e.to_string()))?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("User not found".to_string()));
        }

        info!("Deleted user");
        Ok(())
    }

    /// Grant the admin role to an existing account; used at start-up.
    pub async fn promote(pool: &PgPool, email: &str) -> Result<u64, AppError> {
        let result = sqlx::query(
            "UPDATE users SET role = 'admin', updated_at = NOW() WHERE LOWER(email) = LOWER($1) AND role <> 'admin'",
        )
        .bind(email)
        .execute(pool)
        .await
        .map_err(|e| AppError::InternalError(e.to_string()))?;

        Ok(result.rows_affected())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_self_management_forbidden() {
        let admin = Uuid::new_v4();

        let result = AdminService::ensure_not_self(admin, admin, "delete");

        assert!(matches!(result, Err(AppError::Forbidden(msg)) if msg.contains("delete")));
    }

    #[test]
    fn test_managing_others_allowed() {
        assert!(AdminService::ensure_not_self(Uuid::new_v4(), Uuid::new_v4(), "delete").is_ok());
    }
}
