use sqlx::{PgPool, Postgres};
use tracing::info;
use uuid::Uuid;

use super::models::{Category, CreateCategoryDto, UpdateCategoryDto, DEFAULT_CATEGORIES};
use crate::errors::AppError;

const CATEGORY_COLUMNS: &str =
    "id, owner_id, name, category_type, color_hex, created_at, updated_at";

/// Service layer for category business logic.
pub struct CategoryService;

impl CategoryService {
    /// Get category by ID, scoped to its owner
    pub async fn get_by_id(
        pool: &PgPool,
        category_id: Uuid,
        user_id: Uuid,
    ) -> Result<Category, AppError> {
        sqlx::query_as::<_, Category>(&format!(
            "SELECT {CATEGORY_COLUMNS} FROM categories WHERE id = $1 AND owner_id = $2"
        ))
        .bind(category_id)
        .bind(user_id)
        .fetch_optional(pool)
        .await
        .map_err(|e| AppError::InternalError(e.to_string()))?
        .ok_or_else(|| AppError::NotFound("Category not found".to_string()))
    }

    /// Get all categories for user in insertion order
    pub async fn get_all_for_user(pool: &PgPool, user_id: Uuid) -> Result<Vec<Category>, AppError> {
        sqlx::query_as::<_, Category>(&format!(
            "SELECT {CATEGORY_COLUMNS} FROM categories WHERE owner_id = $1 ORDER BY created_at ASC, id ASC"
        ))
        .bind(user_id)
        .fetch_all(pool)
        .await
        .map_err(|e| AppError::InternalError(e.to_string()))
    }

    /// Create a new category
    pub async fn create(
        pool: &PgPool,
        dto: &CreateCategoryDto,
        user_id: Uuid,
    ) -> Result<Category, AppError> {
        // Trim and sanitize name
        let name = dto.name.trim().to_string();
        if name.is_empty() {
            return Err(AppError::ValidationError(
                "Name cannot be empty".to_string(),
            ));
        }

        sqlx::query_as::<_, Category>(&format!(
            r#"
            INSERT INTO categories (owner_id, name, category_type, color_hex)
            VALUES ($1, $2, $3, $4)
            RETURNING {CATEGORY_COLUMNS}
            "#
        ))
        .bind(user_id)
        .bind(&name)
        .bind(dto.category_type)
        .bind(&dto.color_hex)
        .fetch_one(pool)
        .await
        .map_err(|e| AppError::InternalError(e.to_string()))
    }

    /// Seed the default category set for a freshly registered user
    pub async fn create_defaults(
        tx: &mut sqlx::Transaction<'_, Postgres>,
        user_id: Uuid,
    ) -> Result<(), AppError> {
        for (name, category_type, color_hex) in DEFAULT_CATEGORIES {
            sqlx::query(
                "INSERT INTO categories (owner_id, name, category_type, color_hex) VALUES ($1, $2, $3, $4)",
            )
            .bind(user_id)
            .bind(name)
            .bind(category_type)
            .bind(color_hex)
            .execute(&mut **tx)
            .await
            .map_err(|e| AppError::InternalError(e.to_string()))?;
        }

        info!(%user_id, count = DEFAULT_CATEGORIES.len(), "Seeded default categories");
        Ok(())
    }

    /// Update name and color of an existing category; the type never changes
    pub async fn update(
        pool: &PgPool,
        category_id: Uuid,
        dto: &UpdateCategoryDto,
        user_id: Uuid,
    ) -> Result<Category, AppError> {
        if dto.category_type.is_some() {
            return Err(AppError::ValidationError(
                "Category type cannot be changed".to_string(),
            ));
        }

        // First verify the category exists and user has access
        let existing = Self::get_by_id(pool, category_id, user_id).await?;

        let new_name = match &dto.name {
            Some(n) => {
                let trimmed = n.trim().to_string();
                if trimmed.is_empty() {
                    return Err(AppError::ValidationError(
                        "Name cannot be empty".to_string(),
                    ));
                }
                trimmed
            }
            None => existing.name,
        };

        let new_color_hex = dto.color_hex.as_ref().unwrap_or(&existing.color_hex);

        sqlx::query_as::<_, Category>(&format!(
            r#"
            UPDATE categories
            SET name = $2, color_hex = $3, updated_at = NOW()
            WHERE id = $1
            RETURNING {CATEGORY_COLUMNS}
            "#
        ))
        .bind(category_id)
        .bind(&new_name)
        .bind(new_color_hex)
        .fetch_one(pool)
        .await
        .map_err(|e| AppError::InternalError(e.to_string()))
    }

    /// Delete a category together with every transaction filed under it
    pub async fn delete(pool: &PgPool, category_id: Uuid, user_id: Uuid) -> Result<u64, AppError> {
        let mut tx = pool
            .begin()
            .await
            .map_err(|e| AppError::InternalError(e.to_string()))?;

        // Lock the category so no transaction can be filed under it meanwhile
        sqlx::query_scalar::<_, Uuid>(
            "SELECT id FROM categories WHERE id = $1 AND owner_id = $2 FOR UPDATE",
        )
        .bind(category_id)
        .bind(user_id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| AppError::InternalError(e.to_string()))?
        .ok_or_else(|| AppError::NotFound("Category not found".to_string()))?;

        let removed = sqlx::query("DELETE FROM transactions WHERE category_id = $1")
            .bind(category_id)
            .execute(&mut *tx)
            .await
            .map_err(|e| AppError::InternalError(e.to_string()))?
            .rows_affected();

        sqlx::query("DELETE FROM categories WHERE id = $1")
            .bind(category_id)
            .execute(&mut *tx)
            .await
            .map_err(|e| AppError::InternalError(e.to_string()))?;

        tx.commit()
            .await
            .map_err(|e| AppError::InternalError(e.to_string()))?;

        info!(%category_id, removed_transactions = removed, "Deleted category");
        Ok(removed)
    }
}
