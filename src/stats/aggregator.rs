use std::collections::{BTreeMap, HashMap};

use rust_decimal::Decimal;
use uuid::Uuid;

use super::arith::{add, sub};
use super::models::{CategoryBreakdown, RecentTransaction, UserStatistics};
use super::validation::ensure_non_negative;
use crate::category::models::Category;
use crate::config::DEFAULT_RECENT_TRANSACTIONS_LIMIT;
use crate::errors::AppError;
use crate::models::EntryType;
use crate::transaction::models::Transaction;

/// Pure reduction of one ledger snapshot into [`UserStatistics`].
///
/// Holds no state besides its settings; the same input always yields the
/// same output.
#[derive(Debug, Clone, Copy)]
pub struct Aggregator {
    recent_limit: usize,
}

impl Default for Aggregator {
    fn default() -> Self {
        Self::new(DEFAULT_RECENT_TRANSACTIONS_LIMIT)
    }
}

impl Aggregator {
    pub fn new(recent_limit: usize) -> Self {
        Self { recent_limit }
    }

    /// Compute statistics in a single pass over `transactions`.
    ///
    /// Transactions whose category is missing from `categories` still count
    /// towards the type totals but get no `by_category` entry. A negative
    /// amount or a sum beyond the decimal range fails the whole computation.
    pub fn compute(
        &self,
        categories: &[Category],
        transactions: &[Transaction],
    ) -> Result<UserStatistics, AppError> {
        ensure_non_negative(transactions)?;

        let lookup: HashMap<Uuid, &Category> = categories.iter().map(|c| (c.id, c)).collect();

        let mut total_income = Decimal::ZERO;
        let mut total_expenses = Decimal::ZERO;
        let mut total_savings = Decimal::ZERO;
        let mut by_category: BTreeMap<Uuid, CategoryBreakdown> = BTreeMap::new();

        for t in transactions {
            let type_total = match t.transaction_type {
                EntryType::Income => &mut total_income,
                EntryType::Expense => &mut total_expenses,
                EntryType::Saving => &mut total_savings,
            };
            *type_total = add(*type_total, t.amount)?;

            if let Some(category) = lookup.get(&t.category_id) {
                let entry = by_category
                    .entry(category.id)
                    .or_insert_with(|| CategoryBreakdown::empty(category));
                entry.total = add(entry.total, t.amount)?;
                entry.count += 1;
            }
        }

        Ok(UserStatistics {
            total_income,
            total_expenses,
            total_savings,
            balance: sub(sub(total_income, total_expenses)?, total_savings)?,
            recent_transactions: self.recent(transactions),
            by_category,
        })
    }

    /// Newest first; `sort_by` is stable so equal dates keep snapshot order.
    fn recent(&self, transactions: &[Transaction]) -> Vec<RecentTransaction> {
        let mut ordered: Vec<&Transaction> = transactions.iter().collect();
        ordered.sort_by(|a, b| b.transaction_date.cmp(&a.transaction_date));
        ordered
            .into_iter()
            .take(self.recent_limit)
            .map(RecentTransaction::from)
            .collect()
    }
}

/// Compute statistics with the default recent-activity length.
pub fn compute_user_statistics(
    categories: &[Category],
    transactions: &[Transaction],
) -> Result<UserStatistics, AppError> {
    Aggregator::default().compute(categories, transactions)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::AggregationFault;
    use crate::stats::fixtures::{category, transaction};
    use chrono::NaiveDate;

    fn dec(s: &str) -> Decimal {
        s.parse().expect("Should parse decimal")
    }

    #[test]
    fn test_empty_ledger_is_all_zero() {
        let stats = compute_user_statistics(&[], &[]).expect("Should aggregate");

        assert_eq!(stats.total_income, Decimal::ZERO);
        assert_eq!(stats.total_expenses, Decimal::ZERO);
        assert_eq!(stats.total_savings, Decimal::ZERO);
        assert_eq!(stats.balance, Decimal::ZERO);
        assert!(stats.recent_transactions.is_empty());
        assert!(stats.by_category.is_empty());
    }

    #[test]
    fn test_totals_and_balance() {
        let owner = Uuid::new_v4();
        let salary = category(owner, "Salary", EntryType::Income);
        let food = category(owner, "Food", EntryType::Expense);
        let fund = category(owner, "Emergency fund", EntryType::Saving);
        let transactions = vec![
            transaction(owner, &salary, "3000", "2024-01-31"),
            transaction(owner, &food, "120.50", "2024-02-02"),
            transaction(owner, &food, "79.50", "2024-02-09"),
            transaction(owner, &fund, "500", "2024-02-01"),
        ];

        let stats = compute_user_statistics(&[salary, food.clone(), fund], &transactions)
            .expect("Should aggregate");

        assert_eq!(stats.total_income, dec("3000"));
        assert_eq!(stats.total_expenses, dec("200.00"));
        assert_eq!(stats.total_savings, dec("500"));
        assert_eq!(stats.balance, dec("2300.00"));

        let food_entry = &stats.by_category[&food.id];
        assert_eq!(food_entry.total, dec("200.00"));
        assert_eq!(food_entry.count, 2);
        assert_eq!(food_entry.name, "Food");
        assert_eq!(food_entry.category_type, EntryType::Expense);
    }

    #[test]
    fn test_categories_without_transactions_omitted() {
        let owner = Uuid::new_v4();
        let salary = category(owner, "Salary", EntryType::Income);
        let unused = category(owner, "Housing", EntryType::Expense);
        let transactions = vec![transaction(owner, &salary, "10", "2024-01-01")];

        let stats = compute_user_statistics(&[salary.clone(), unused.clone()], &transactions)
            .expect("Should aggregate");

        assert!(stats.by_category.contains_key(&salary.id));
        assert!(!stats.by_category.contains_key(&unused.id));
    }

    #[test]
    fn test_dangling_reference_counts_in_totals_only() {
        let owner = Uuid::new_v4();
        let deleted = category(owner, "Deleted", EntryType::Expense);
        let transactions = vec![transaction(owner, &deleted, "42", "2024-01-01")];

        let stats = compute_user_statistics(&[], &transactions).expect("Should aggregate");

        assert_eq!(stats.total_expenses, dec("42"));
        assert!(stats.by_category.is_empty());
        assert_eq!(stats.recent_transactions.len(), 1);
    }

    #[test]
    fn test_recent_ordering_by_date_desc() {
        let owner = Uuid::new_v4();
        let food = category(owner, "Food", EntryType::Expense);
        let jan = transaction(owner, &food, "1", "2024-01-01");
        let mar = transaction(owner, &food, "3", "2024-03-01");
        let feb = transaction(owner, &food, "2", "2024-02-01");

        let stats = Aggregator::new(2)
            .compute(&[food], &[jan, mar.clone(), feb.clone()])
            .expect("Should aggregate");

        let ids: Vec<Uuid> = stats.recent_transactions.iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![mar.id, feb.id]);
        assert_eq!(
            stats.recent_transactions[0].date,
            NaiveDate::from_ymd_opt(2024, 3, 1).unwrap()
        );
    }

    #[test]
    fn test_recent_ties_keep_snapshot_order() {
        let owner = Uuid::new_v4();
        let food = category(owner, "Food", EntryType::Expense);
        let first = transaction(owner, &food, "1", "2024-05-05");
        let second = transaction(owner, &food, "2", "2024-05-05");
        let third = transaction(owner, &food, "3", "2024-05-05");

        let stats = compute_user_statistics(
            &[food],
            &[first.clone(), second.clone(), third.clone()],
        )
        .expect("Should aggregate");

        let ids: Vec<Uuid> = stats.recent_transactions.iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![first.id, second.id, third.id]);
    }

    #[test]
    fn test_recent_limit_applied() {
        let owner = Uuid::new_v4();
        let food = category(owner, "Food", EntryType::Expense);
        let transactions: Vec<Transaction> = (1..=9)
            .map(|day| transaction(owner, &food, "1", &format!("2024-01-0{day}")))
            .collect();

        let stats = compute_user_statistics(&[food], &transactions).expect("Should aggregate");

        assert_eq!(
            stats.recent_transactions.len(),
            DEFAULT_RECENT_TRANSACTIONS_LIMIT
        );
        assert_eq!(stats.recent_transactions[0].id, transactions[8].id);
    }

    #[test]
    fn test_negative_amount_fails_without_partial_result() {
        let owner = Uuid::new_v4();
        let food = category(owner, "Food", EntryType::Expense);
        let transactions = vec![
            transaction(owner, &food, "10", "2024-01-01"),
            transaction(owner, &food, "-5", "2024-01-02"),
        ];

        let result = compute_user_statistics(&[food], &transactions);
        assert!(matches!(result, Err(AppError::ValidationError(_))));
    }

    #[test]
    fn test_sum_beyond_decimal_range_is_aggregation_error() {
        let owner = Uuid::new_v4();
        let salary = category(owner, "Salary", EntryType::Income);
        let mut huge = transaction(owner, &salary, "0", "2024-01-01");
        huge.amount = Decimal::MAX;
        let one = transaction(owner, &salary, "1", "2024-01-02");

        let result = compute_user_statistics(&[salary], &[huge, one]);

        assert!(matches!(
            result,
            Err(AppError::AggregationError(AggregationFault::Overflow))
        ));
    }

    #[test]
    fn test_balance_beyond_decimal_range_is_aggregation_error() {
        let owner = Uuid::new_v4();
        let food = category(owner, "Food", EntryType::Expense);
        let fund = category(owner, "Fund", EntryType::Saving);
        let mut spent = transaction(owner, &food, "0", "2024-01-01");
        spent.amount = Decimal::MAX;
        let mut saved = transaction(owner, &fund, "0", "2024-01-02");
        saved.amount = Decimal::MAX;

        let result = compute_user_statistics(&[food, fund], &[spent, saved]);

        assert!(result.is_err());
    }

    #[test]
    fn test_repeated_calls_serialize_identically() {
        let owner = Uuid::new_v4();
        let salary = category(owner, "Salary", EntryType::Income);
        let food = category(owner, "Food", EntryType::Expense);
        let categories = vec![salary.clone(), food.clone()];
        let transactions = vec![
            transaction(owner, &salary, "1000", "2024-01-01"),
            transaction(owner, &food, "12.34", "2024-01-02"),
            transaction(owner, &food, "56.78", "2024-01-02"),
        ];

        let first = serde_json::to_string(
            &compute_user_statistics(&categories, &transactions).expect("Should aggregate"),
        )
        .expect("Should serialize");
        let second = serde_json::to_string(
            &compute_user_statistics(&categories, &transactions).expect("Should aggregate"),
        )
        .expect("Should serialize");

        assert_eq!(first, second);
    }
}
