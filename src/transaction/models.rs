use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::models::EntryType;

/// Largest amount the `NUMERIC(14,2)` column stores
pub const MAX_AMOUNT: Decimal = Decimal::from_parts(276_447_231, 23_283, 0, false, 2);

/// Validate an amount against what the ledger stores: non-negative (the sign
/// lives in the entry type), at most two decimal places and within `MAX_AMOUNT`.
fn validate_amount_value(amount: &Decimal) -> Result<(), ValidationError> {
    if *amount < Decimal::ZERO {
        return Err(ValidationError::new("amount_must_be_non_negative")
            .with_message("Amount must not be negative".into()));
    }
    if amount.normalize().scale() > 2 {
        return Err(ValidationError::new("amount_too_precise")
            .with_message("Amount cannot have more than 2 decimal places".into()));
    }
    if *amount > MAX_AMOUNT {
        return Err(ValidationError::new("amount_out_of_range")
            .with_message("Amount cannot exceed 999999999999.99".into()));
    }
    Ok(())
}

/// Database model for transactions
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Transaction {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub category_id: Uuid,
    pub transaction_type: EntryType,
    pub amount: Decimal,
    pub description: String,
    pub transaction_date: NaiveDate,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Transaction information returned in responses
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TransactionResponse {
    /// Unique transaction identifier
    pub id: Uuid,
    /// Category this transaction belongs to
    pub category_id: Uuid,
    /// Transaction type (income, expense, saving)
    #[serde(rename = "type")]
    pub transaction_type: EntryType,
    /// Transaction amount (never negative)
    #[schema(example = 50.00)]
    pub amount: Decimal,
    /// Free-form description
    #[schema(example = "Weekly groceries")]
    pub description: String,
    /// Calendar date of the transaction
    pub date: NaiveDate,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
    /// Last update timestamp
    pub updated_at: DateTime<Utc>,
}

impl From<Transaction> for TransactionResponse {
    fn from(t: Transaction) -> Self {
        Self {
            id: t.id,
            category_id: t.category_id,
            transaction_type: t.transaction_type,
            amount: t.amount,
            description: t.description,
            date: t.transaction_date,
            created_at: t.created_at,
            updated_at: t.updated_at,
        }
    }
}

/// Request body for creating a transaction
#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateTransactionDto {
    /// Category this transaction belongs to; must share the transaction's type
    pub category_id: Uuid,

    /// Transaction type
    #[serde(rename = "type")]
    pub transaction_type: EntryType,

    /// Transaction amount (non-negative, at most 2 decimal places)
    #[validate(custom(function = "validate_amount_value"))]
    #[schema(example = 50.00)]
    pub amount: Decimal,

    /// Calendar date of the transaction
    pub date: NaiveDate,

    /// Description (max 200 chars)
    #[validate(length(max = 200, message = "Description cannot exceed 200 characters"))]
    #[serde(default)]
    #[schema(example = "Weekly groceries")]
    pub description: String,
}

/// Request body for updating a transaction (PATCH - all fields optional)
#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTransactionDto {
    /// Category ID; the new category must have the same type
    pub category_id: Option<Uuid>,

    /// Transaction amount
    #[schema(example = 75.00)]
    pub amount: Option<Decimal>,

    /// Calendar date
    pub date: Option<NaiveDate>,

    /// Description
    #[validate(length(max = 200, message = "Description cannot exceed 200 characters"))]
    #[schema(example = "Updated description")]
    pub description: Option<String>,
}

impl UpdateTransactionDto {
    /// Validate amount if provided
    pub fn validate_amount(&self) -> Result<(), ValidationError> {
        if let Some(amount) = &self.amount {
            validate_amount_value(amount)?;
        }
        Ok(())
    }
}

/// Query parameters for listing transactions
#[derive(Debug, Deserialize, IntoParams)]
pub struct TransactionFilters {
    /// Filter by type (income, expense, saving)
    #[serde(rename = "type")]
    #[param(example = "expense")]
    pub transaction_type: Option<EntryType>,
}

/// Path parameters for transaction ID
#[derive(Debug, Deserialize, IntoParams)]
pub struct TransactionIdPath {
    /// Transaction UUID
    pub id: Uuid,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dec(s: &str) -> Decimal {
        s.parse().expect("Should parse decimal")
    }

    #[test]
    fn test_non_negative_amount_validation() {
        assert!(validate_amount_value(&dec("0")).is_ok());
        assert!(validate_amount_value(&dec("12.50")).is_ok());
        assert!(validate_amount_value(&dec("-0.01")).is_err());
    }

    #[test]
    fn test_amount_precision_validation() {
        assert!(validate_amount_value(&dec("10.000")).is_ok());
        assert!(validate_amount_value(&dec("0.01")).is_ok());
        let err = validate_amount_value(&dec("0.001")).expect_err("Should reject");
        assert_eq!(err.code, "amount_too_precise");
    }

    #[test]
    fn test_amount_range_validation() {
        assert_eq!(MAX_AMOUNT, dec("999999999999.99"));
        assert!(validate_amount_value(&dec("999999999999.99")).is_ok());
        let err = validate_amount_value(&dec("1000000000000")).expect_err("Should reject");
        assert_eq!(err.code, "amount_out_of_range");
        assert!(validate_amount_value(&Decimal::MAX).is_err());
    }

    #[test]
    fn test_create_dto_rejects_unstorable_amounts() {
        for amount in ["\"12.345\"", "\"1000000000000\"", "\"79228162514264337593543950335\""] {
            let dto: CreateTransactionDto = serde_json::from_str(&format!(
                r#"{{"categoryId":"6f1c1c1e-5b1a-4d59-9a43-1c2d3e4f5a6b","type":"expense","amount":{amount},"date":"2024-03-01"}}"#
            ))
            .expect("Should parse");
            assert!(dto.validate().is_err(), "{amount} should be rejected");
        }
    }

    #[test]
    fn test_create_dto_parses_type_and_date() {
        let dto: CreateTransactionDto = serde_json::from_str(
            r#"{"categoryId":"6f1c1c1e-5b1a-4d59-9a43-1c2d3e4f5a6b","type":"saving","amount":"10.00","date":"2024-03-01"}"#,
        )
        .expect("Should parse");

        assert_eq!(dto.transaction_type, EntryType::Saving);
        assert_eq!(dto.date, NaiveDate::from_ymd_opt(2024, 3, 1).unwrap());
        assert!(dto.description.is_empty());
        assert!(dto.validate().is_ok());
    }

    #[test]
    fn test_update_rejects_negative_amount() {
        let dto: UpdateTransactionDto =
            serde_json::from_str(r#"{"amount":"-5"}"#).expect("Should parse");
        assert!(dto.validate_amount().is_err());
    }

    #[test]
    fn test_update_rejects_sub_cent_amount() {
        let dto: UpdateTransactionDto =
            serde_json::from_str(r#"{"amount":"5.005"}"#).expect("Should parse");
        assert!(dto.validate_amount().is_err());
    }
}
