use std::collections::BTreeMap;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::category::models::Category;
use crate::models::EntryType;
use crate::transaction::models::Transaction;

/// Read-only copy of one user's ledger, as handed to the aggregators
#[derive(Debug, Clone, Default)]
pub struct LedgerSnapshot {
    pub owner_id: Uuid,
    /// Categories in insertion order
    pub categories: Vec<Category>,
    /// Transactions in insertion order; this order breaks recency ties
    pub transactions: Vec<Transaction>,
}

impl LedgerSnapshot {
    pub fn new(owner_id: Uuid, categories: Vec<Category>, transactions: Vec<Transaction>) -> Self {
        Self {
            owner_id,
            categories,
            transactions,
        }
    }
}

/// Settings the reporting handlers pass to the engine on every request
#[derive(Debug, Clone, Copy)]
pub struct StatsSettings {
    pub recent_transactions_limit: usize,
}

/// Condensed transaction shown in the recent activity list
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct RecentTransaction {
    pub id: Uuid,
    pub category_id: Uuid,
    #[schema(example = "Weekly groceries")]
    pub description: String,
    #[schema(example = 50.00)]
    pub amount: Decimal,
    pub date: NaiveDate,
    #[serde(rename = "type")]
    pub transaction_type: EntryType,
}

impl From<&Transaction> for RecentTransaction {
    fn from(t: &Transaction) -> Self {
        Self {
            id: t.id,
            category_id: t.category_id,
            description: t.description.clone(),
            amount: t.amount,
            date: t.transaction_date,
            transaction_type: t.transaction_type,
        }
    }
}

/// Per-category totals; metadata is copied from the category record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct CategoryBreakdown {
    #[schema(example = "Food")]
    pub name: String,
    #[schema(example = "#ef4444")]
    pub color: String,
    #[serde(rename = "type")]
    pub category_type: EntryType,
    #[schema(example = 350.00)]
    pub total: Decimal,
    #[schema(example = 7)]
    pub count: u64,
}

impl CategoryBreakdown {
    pub fn empty(category: &Category) -> Self {
        Self {
            name: category.name.clone(),
            color: category.color_hex.clone(),
            category_type: category.category_type,
            total: Decimal::ZERO,
            count: 0,
        }
    }
}

/// Derived statistics for one user's ledger. Never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct UserStatistics {
    #[schema(example = 3000.00)]
    pub total_income: Decimal,
    #[schema(example = 1800.00)]
    pub total_expenses: Decimal,
    #[schema(example = 500.00)]
    pub total_savings: Decimal,
    /// income - expenses - savings
    #[schema(example = 700.00)]
    pub balance: Decimal,
    pub recent_transactions: Vec<RecentTransaction>,
    /// Keyed by category id; only categories with at least one transaction
    pub by_category: BTreeMap<Uuid, CategoryBreakdown>,
}

/// Platform-wide rollup for administrators
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct PlatformStatistics {
    #[schema(example = 42)]
    pub total_users: u64,
    #[schema(example = 1234)]
    pub total_transactions: u64,
    #[schema(example = 125000.00)]
    pub platform_income: Decimal,
    #[schema(example = 98000.00)]
    pub platform_expenses: Decimal,
}

/// Percentage and angular range of one entry in a radial chart
#[derive(Debug, Clone, Copy, PartialEq, Serialize, ToSchema)]
pub struct Share {
    #[schema(example = 20.0)]
    pub percentage: f64,
    #[schema(example = 36.0)]
    pub start_angle: f64,
    #[schema(example = 108.0)]
    pub end_angle: f64,
}

/// One category slice of a chart for a single entry type
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct ShareSlice {
    pub category_id: Uuid,
    #[schema(example = "Food")]
    pub name: String,
    #[schema(example = "#ef4444")]
    pub color: String,
    #[schema(example = 350.00)]
    pub value: Decimal,
    #[schema(example = 20.0)]
    pub percentage: f64,
    #[schema(example = 36.0)]
    pub start_angle: f64,
    #[schema(example = 108.0)]
    pub end_angle: f64,
}

/// Query parameters for the share endpoint
#[derive(Debug, Deserialize, IntoParams)]
pub struct ShareQuery {
    /// Entry type whose categories are charted
    #[serde(rename = "type")]
    #[param(example = "expense")]
    pub entry_type: EntryType,
}
