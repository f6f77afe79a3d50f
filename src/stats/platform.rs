use rust_decimal::Decimal;

use super::arith::add;
use super::models::{LedgerSnapshot, PlatformStatistics};
use super::validation::ensure_non_negative;
use crate::errors::AppError;
use crate::models::EntryType;
use crate::transaction::models::Transaction;

/// Partial platform rollup. Merging is associative and commutative, so
/// partials computed for disjoint groups of users merge in any order.
/// A merge whose sums leave the decimal range is an `AggregationError`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PlatformTotals {
    pub transactions: u64,
    pub income: Decimal,
    pub expenses: Decimal,
}

impl PlatformTotals {
    /// Contribution of one user's transactions. Savings are counted but not summed.
    pub fn from_transactions(transactions: &[Transaction]) -> Result<Self, AppError> {
        ensure_non_negative(transactions)?;

        transactions.iter().try_fold(Self::default(), |mut acc, t| {
            acc.transactions += 1;
            match t.transaction_type {
                EntryType::Income => acc.income = add(acc.income, t.amount)?,
                EntryType::Expense => acc.expenses = add(acc.expenses, t.amount)?,
                EntryType::Saving => {}
            }
            Ok(acc)
        })
    }

    pub fn from_snapshots<'a, I>(snapshots: I) -> Result<Self, AppError>
    where
        I: IntoIterator<Item = &'a LedgerSnapshot>,
    {
        snapshots.into_iter().try_fold(Self::default(), |acc, s| {
            acc.merge(Self::from_transactions(&s.transactions)?)
        })
    }

    pub fn merge(self, other: Self) -> Result<Self, AppError> {
        Ok(Self {
            transactions: self.transactions + other.transactions,
            income: add(self.income, other.income)?,
            expenses: add(self.expenses, other.expenses)?,
        })
    }

    /// Merge any number of partials, starting from the empty rollup.
    pub fn combine<I>(partials: I) -> Result<Self, AppError>
    where
        I: IntoIterator<Item = Self>,
    {
        partials
            .into_iter()
            .try_fold(Self::default(), |acc, partial| acc.merge(partial))
    }

    pub fn into_statistics(self, total_users: u64) -> PlatformStatistics {
        PlatformStatistics {
            total_users,
            total_transactions: self.transactions,
            platform_income: self.income,
            platform_expenses: self.expenses,
        }
    }
}

/// Fold every user's snapshot into the admin rollup.
///
/// `user_count` comes from the user directory so that users without any
/// transactions are still counted.
pub fn compute_platform_statistics<'a, I>(
    snapshots: I,
    user_count: u64,
) -> Result<PlatformStatistics, AppError>
where
    I: IntoIterator<Item = &'a LedgerSnapshot>,
{
    Ok(PlatformTotals::from_snapshots(snapshots)?.into_statistics(user_count))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::AggregationFault;
    use crate::stats::fixtures::{category, transaction};
    use uuid::Uuid;

    fn dec(s: &str) -> Decimal {
        s.parse().expect("Should parse decimal")
    }

    fn snapshot(income: &str, expense: &str, saving: &str) -> LedgerSnapshot {
        let owner = Uuid::new_v4();
        let salary = category(owner, "Salary", EntryType::Income);
        let food = category(owner, "Food", EntryType::Expense);
        let fund = category(owner, "Fund", EntryType::Saving);
        let transactions = vec![
            transaction(owner, &salary, income, "2024-01-01"),
            transaction(owner, &food, expense, "2024-01-02"),
            transaction(owner, &fund, saving, "2024-01-03"),
        ];
        LedgerSnapshot::new(owner, vec![salary, food, fund], transactions)
    }

    #[test]
    fn test_empty_platform_is_all_zero() {
        let snapshots: Vec<LedgerSnapshot> = Vec::new();
        let stats = compute_platform_statistics(&snapshots, 0).expect("Should aggregate");

        assert_eq!(stats.total_users, 0);
        assert_eq!(stats.total_transactions, 0);
        assert_eq!(stats.platform_income, Decimal::ZERO);
        assert_eq!(stats.platform_expenses, Decimal::ZERO);
    }

    #[test]
    fn test_savings_excluded_but_counted() {
        let snapshots = vec![snapshot("100", "40", "25"), snapshot("50", "10", "5")];

        let stats = compute_platform_statistics(&snapshots, 2).expect("Should aggregate");

        assert_eq!(stats.total_transactions, 6);
        assert_eq!(stats.platform_income, dec("150"));
        assert_eq!(stats.platform_expenses, dec("50"));
    }

    #[test]
    fn test_user_count_is_external() {
        let snapshots = vec![snapshot("1", "1", "1")];

        let stats = compute_platform_statistics(&snapshots, 10).expect("Should aggregate");

        assert_eq!(stats.total_users, 10);
    }

    #[test]
    fn test_merge_is_order_independent() {
        let snapshots = vec![
            snapshot("100", "40", "25"),
            snapshot("50.25", "10.75", "5"),
            snapshot("0", "999", "1"),
        ];

        let whole = PlatformTotals::from_snapshots(&snapshots).expect("Should aggregate");
        let left = PlatformTotals::from_snapshots(&snapshots[..1]).expect("Should aggregate");
        let right = PlatformTotals::from_snapshots(&snapshots[1..]).expect("Should aggregate");

        assert_eq!(left.merge(right).expect("Should merge"), whole);
        assert_eq!(right.merge(left).expect("Should merge"), whole);
    }

    #[test]
    fn test_merge_beyond_decimal_range_is_aggregation_error() {
        let huge = PlatformTotals {
            transactions: 1,
            income: Decimal::MAX,
            expenses: Decimal::ZERO,
        };
        let one = PlatformTotals {
            transactions: 1,
            income: Decimal::ONE,
            expenses: Decimal::ZERO,
        };

        assert!(matches!(
            PlatformTotals::combine([huge, one]),
            Err(AppError::AggregationError(AggregationFault::Overflow))
        ));
    }

    #[test]
    fn test_user_income_beyond_decimal_range_is_aggregation_error() {
        let owner = Uuid::new_v4();
        let salary = category(owner, "Salary", EntryType::Income);
        let mut huge = transaction(owner, &salary, "0", "2024-01-01");
        huge.amount = Decimal::MAX;
        let one = transaction(owner, &salary, "1", "2024-01-02");
        let snapshots = vec![LedgerSnapshot::new(owner, vec![salary], vec![huge, one])];

        assert!(compute_platform_statistics(&snapshots, 1).is_err());
    }

    #[test]
    fn test_negative_amount_rejected() {
        let snapshots = vec![snapshot("100", "-1", "0")];
        assert!(compute_platform_statistics(&snapshots, 1).is_err());
    }
}
