use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Kind of money movement, shared by categories and the transactions filed under them
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema, sqlx::Type,
)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "entry_type", rename_all = "lowercase")]
pub enum EntryType {
    /// Money received
    Income,
    /// Money spent
    Expense,
    /// Money set aside out of disposable income
    Saving,
}

impl EntryType {
    pub const ALL: [EntryType; 3] = [EntryType::Income, EntryType::Expense, EntryType::Saving];

    pub fn as_str(&self) -> &'static str {
        match self {
            EntryType::Income => "income",
            EntryType::Expense => "expense",
            EntryType::Saving => "saving",
        }
    }
}
