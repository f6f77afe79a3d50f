use sqlx::{PgPool, Postgres};
use tracing::debug;
use uuid::Uuid;

use super::models::{CreateTransactionDto, Transaction, UpdateTransactionDto};
use crate::errors::AppError;
use crate::models::EntryType;

const TRANSACTION_COLUMNS: &str = "id, owner_id, category_id, transaction_type, amount, \
     description, transaction_date, created_at, updated_at";

/// Service layer for transaction business logic.
pub struct TransactionService;

impl TransactionService {
    /// Look up the type of a category the user owns.
    /// Returns NotFound for missing categories and for categories of other users alike.
    async fn owned_category_type(
        tx: &mut sqlx::Transaction<'_, Postgres>,
        category_id: Uuid,
        user_id: Uuid,
    ) -> Result<EntryType, AppError> {
        sqlx::query_scalar::<_, EntryType>(
            "SELECT category_type FROM categories WHERE id = $1 AND owner_id = $2 FOR SHARE",
        )
        .bind(category_id)
        .bind(user_id)
        .fetch_optional(&mut **tx)
        .await
        .map_err(|e| AppError::InternalError(e.to_string()))?
        .ok_or_else(|| AppError::NotFound("Category not found or access denied".to_string()))
    }

    fn ensure_type_matches(
        transaction_type: EntryType,
        category_type: EntryType,
    ) -> Result<(), AppError> {
        if transaction_type != category_type {
            return Err(AppError::ValidationError(format!(
                "Transaction type '{}' does not match category type '{}'",
                transaction_type.as_str(),
                category_type.as_str()
            )));
        }
        Ok(())
    }

    /// Create a transaction under one of the user's categories.
    pub async fn create_transaction(
        pool: &PgPool,
        user_id: Uuid,
        dto: CreateTransactionDto,
    ) -> Result<Transaction, AppError> {
        let mut tx = pool
            .begin()
            .await
            .map_err(|e| AppError::InternalError(e.to_string()))?;

        // 1. Category must belong to the user and carry the same type
        let category_type = Self::owned_category_type(&mut tx, dto.category_id, user_id).await?;
        Self::ensure_type_matches(dto.transaction_type, category_type)?;

        // 2. Insert the transaction
        let transaction = sqlx::query_as::<_, Transaction>(&format!(
            r#"
            INSERT INTO transactions
                (owner_id, category_id, transaction_type, amount, description, transaction_date)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {TRANSACTION_COLUMNS}
            "#
        ))
        .bind(user_id)
        .bind(dto.category_id)
        .bind(dto.transaction_type)
        .bind(dto.amount)
        .bind(dto.description.trim())
        .bind(dto.date)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| AppError::InternalError(e.to_string()))?;

        tx.commit()
            .await
            .map_err(|e| AppError::InternalError(e.to_string()))?;

        debug!(transaction_id = %transaction.id, %user_id, "Created transaction");
        Ok(transaction)
    }

    /// Delete a transaction. Nothing cascades from it.
    pub async fn delete_transaction(
        pool: &PgPool,
        user_id: Uuid,
        transaction_id: Uuid,
    ) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM transactions WHERE id = $1 AND owner_id = $2")
            .bind(transaction_id)
            .bind(user_id)
            .execute(pool)
            .await
            .map_err(|e| AppError::InternalError(e.to_string()))?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Transaction not found".to_string()));
        }

        Ok(())
    }

    /// Update amount, description, date or category of a transaction.
    /// The type itself is fixed; a new category must share it.
    pub async fn update_transaction(
        pool: &PgPool,
        user_id: Uuid,
        transaction_id: Uuid,
        dto: UpdateTransactionDto,
    ) -> Result<Transaction, AppError> {
        let mut tx = pool
            .begin()
            .await
            .map_err(|e| AppError::InternalError(e.to_string()))?;

        // 1. Fetch and lock the existing transaction
        let old = sqlx::query_as::<_, Transaction>(&format!(
            "SELECT {TRANSACTION_COLUMNS} FROM transactions WHERE id = $1 AND owner_id = $2 FOR UPDATE"
        ))
        .bind(transaction_id)
        .bind(user_id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| AppError::InternalError(e.to_string()))?
        .ok_or_else(|| AppError::NotFound("Transaction not found".to_string()))?;

        // 2. Validate new category if changing
        let new_category_id = dto.category_id.unwrap_or(old.category_id);
        if new_category_id != old.category_id {
            let category_type =
                Self::owned_category_type(&mut tx, new_category_id, user_id).await?;
            Self::ensure_type_matches(old.transaction_type, category_type)?;
        }

        let new_amount = dto.amount.unwrap_or(old.amount);
        let new_date = dto.date.unwrap_or(old.transaction_date);
        let new_description = dto
            .description
            .map(|d| d.trim().to_string())
            .unwrap_or(old.description);

        let updated = sqlx::query_as::<_, Transaction>(&format!(
            r#"
            UPDATE transactions SET
                category_id = $2,
                amount = $3,
                transaction_date = $4,
                description = $5,
                updated_at = NOW()
            WHERE id = $1
            RETURNING {TRANSACTION_COLUMNS}
            "#
        ))
        .bind(transaction_id)
        .bind(new_category_id)
        .bind(new_amount)
        .bind(new_date)
        .bind(&new_description)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| AppError::InternalError(e.to_string()))?;

        tx.commit()
            .await
            .map_err(|e| AppError::InternalError(e.to_string()))?;

        Ok(updated)
    }

    /// Get a single transaction by ID
    pub async fn get_transaction(
        pool: &PgPool,
        user_id: Uuid,
        transaction_id: Uuid,
    ) -> Result<Transaction, AppError> {
        sqlx::query_as::<_, Transaction>(&format!(
            "SELECT {TRANSACTION_COLUMNS} FROM transactions WHERE id = $1 AND owner_id = $2"
        ))
        .bind(transaction_id)
        .bind(user_id)
        .fetch_optional(pool)
        .await
        .map_err(|e| AppError::InternalError(e.to_string()))?
        .ok_or_else(|| AppError::NotFound("Transaction not found".to_string()))
    }

    /// List the user's transactions, newest first
    /// Newest date first; transactions sharing a date keep insertion order,
    /// matching the recent activity on the dashboard.
    pub async fn list_transactions(
        pool: &PgPool,
        user_id: Uuid,
        transaction_type: Option<EntryType>,
    ) -> Result<Vec<Transaction>, AppError> {
        sqlx::query_as::<_, Transaction>(&format!(
            r#"
            SELECT {TRANSACTION_COLUMNS}
            FROM transactions
            WHERE owner_id = $1
              AND ($2::entry_type IS NULL OR transaction_type = $2)
            ORDER BY transaction_date DESC, created_at ASC, id ASC
            "#
        ))
        .bind(user_id)
        .bind(transaction_type)
        .fetch_all(pool)
        .await
        .map_err(|e| AppError::InternalError(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_type_match_accepts_equal_types() {
        for kind in EntryType::ALL {
            assert!(TransactionService::ensure_type_matches(kind, kind).is_ok());
        }
    }

    #[test]
    fn test_type_mismatch_is_validation_error() {
        let result =
            TransactionService::ensure_type_matches(EntryType::Expense, EntryType::Saving);
        assert!(matches!(result, Err(AppError::ValidationError(_))));
    }
}
