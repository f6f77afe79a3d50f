use std::collections::HashMap;

use rust_decimal::Decimal;
use uuid::Uuid;

use super::models::LedgerSnapshot;
use crate::category::models::Category;
use crate::errors::AppError;
use crate::transaction::models::Transaction;

/// Reject a negative amount anywhere in the slice.
pub fn ensure_non_negative(transactions: &[Transaction]) -> Result<(), AppError> {
    match transactions.iter().find(|t| t.amount < Decimal::ZERO) {
        Some(t) => Err(AppError::ValidationError(format!(
            "Transaction {} has negative amount {}",
            t.id, t.amount
        ))),
        None => Ok(()),
    }
}

/// Boundary check run by the reporting service before aggregation.
///
/// Rejects records owned by someone other than the snapshot owner, negative
/// amounts, and transactions filed under a category of a different type.
/// A transaction whose category is absent from the snapshot is accepted:
/// it is aggregated as uncategorized.
pub fn validate_snapshot(snapshot: &LedgerSnapshot) -> Result<(), AppError> {
    if let Some(c) = snapshot
        .categories
        .iter()
        .find(|c| c.owner_id != snapshot.owner_id)
    {
        return Err(AppError::ValidationError(format!(
            "Category {} does not belong to ledger owner",
            c.id
        )));
    }

    ensure_non_negative(&snapshot.transactions)?;

    let categories: HashMap<Uuid, &Category> =
        snapshot.categories.iter().map(|c| (c.id, c)).collect();

    for t in &snapshot.transactions {
        if t.owner_id != snapshot.owner_id {
            return Err(AppError::ValidationError(format!(
                "Transaction {} does not belong to ledger owner",
                t.id
            )));
        }
        if let Some(category) = categories.get(&t.category_id) {
            if category.category_type != t.transaction_type {
                return Err(AppError::ValidationError(format!(
                    "Transaction {} is '{}' but category {} is '{}'",
                    t.id,
                    t.transaction_type.as_str(),
                    category.id,
                    category.category_type.as_str()
                )));
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::EntryType;
    use crate::stats::fixtures::{category, transaction};

    #[test]
    fn test_valid_snapshot_passes() {
        let owner = Uuid::new_v4();
        let food = category(owner, "Food", EntryType::Expense);
        let snapshot = LedgerSnapshot::new(
            owner,
            vec![food.clone()],
            vec![transaction(owner, &food, "12.50", "2024-01-01")],
        );
        assert!(validate_snapshot(&snapshot).is_ok());
    }

    #[test]
    fn test_negative_amount_rejected() {
        let owner = Uuid::new_v4();
        let food = category(owner, "Food", EntryType::Expense);
        let snapshot = LedgerSnapshot::new(
            owner,
            vec![food.clone()],
            vec![transaction(owner, &food, "-1", "2024-01-01")],
        );
        assert!(matches!(
            validate_snapshot(&snapshot),
            Err(AppError::ValidationError(_))
        ));
    }

    #[test]
    fn test_type_mismatch_rejected() {
        let owner = Uuid::new_v4();
        let food = category(owner, "Food", EntryType::Expense);
        let mut t = transaction(owner, &food, "10", "2024-01-01");
        t.transaction_type = EntryType::Income;
        let snapshot = LedgerSnapshot::new(owner, vec![food], vec![t]);
        assert!(matches!(
            validate_snapshot(&snapshot),
            Err(AppError::ValidationError(_))
        ));
    }

    #[test]
    fn test_foreign_transaction_rejected() {
        let owner = Uuid::new_v4();
        let food = category(owner, "Food", EntryType::Expense);
        let mut t = transaction(owner, &food, "10", "2024-01-01");
        t.owner_id = Uuid::new_v4();
        let snapshot = LedgerSnapshot::new(owner, vec![food], vec![t]);
        assert!(validate_snapshot(&snapshot).is_err());
    }

    #[test]
    fn test_dangling_category_accepted() {
        let owner = Uuid::new_v4();
        let deleted = category(owner, "Gone", EntryType::Income);
        let snapshot = LedgerSnapshot::new(
            owner,
            Vec::new(),
            vec![transaction(owner, &deleted, "10", "2024-01-01")],
        );
        assert!(validate_snapshot(&snapshot).is_ok());
    }
}
