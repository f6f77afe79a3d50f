use chrono::{NaiveDate, Utc};
use uuid::Uuid;

use crate::category::models::Category;
use crate::models::EntryType;
use crate::transaction::models::Transaction;

pub fn category(owner_id: Uuid, name: &str, kind: EntryType) -> Category {
    let now = Utc::now();
    Category {
        id: Uuid::new_v4(),
        owner_id,
        name: name.to_string(),
        category_type: kind,
        color_hex: "#3b82f6".to_string(),
        created_at: now,
        updated_at: now,
    }
}

pub fn transaction(owner_id: Uuid, category: &Category, amount: &str, date: &str) -> Transaction {
    let now = Utc::now();
    Transaction {
        id: Uuid::new_v4(),
        owner_id,
        category_id: category.id,
        transaction_type: category.category_type,
        amount: amount.parse().expect("Should parse amount"),
        description: format!("{} on {date}", category.name),
        transaction_date: NaiveDate::parse_from_str(date, "%Y-%m-%d").expect("Should parse date"),
        created_at: now,
        updated_at: now,
    }
}
