use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::models::EntryType;

/// Validate hex color format (#RRGGBB)
pub fn validate_color_hex(color: &str) -> Result<(), ValidationError> {
    if color.len() != 7 {
        return Err(ValidationError::new("invalid_length"));
    }
    if !color.starts_with('#') {
        return Err(ValidationError::new("missing_hash"));
    }
    if !color[1..].chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(ValidationError::new("invalid_hex_chars"));
    }
    Ok(())
}

/// Database entity for categories
#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct Category {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub name: String,
    pub category_type: EntryType,
    pub color_hex: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Category information returned in responses
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CategoryResponse {
    /// Unique category identifier
    pub id: Uuid,
    /// Category name
    #[schema(example = "Groceries")]
    pub name: String,
    /// Category type (income, expense, saving)
    #[serde(rename = "type")]
    pub category_type: EntryType,
    /// Display color in hex format
    #[schema(example = "#ef4444")]
    pub color_hex: String,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
    /// Last update timestamp
    pub updated_at: DateTime<Utc>,
}

impl From<Category> for CategoryResponse {
    fn from(cat: Category) -> Self {
        Self {
            id: cat.id,
            name: cat.name,
            category_type: cat.category_type,
            color_hex: cat.color_hex,
            created_at: cat.created_at,
            updated_at: cat.updated_at,
        }
    }
}

fn default_color() -> String {
    "#3b82f6".to_string()
}

/// Request body for creating a category
#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateCategoryDto {
    /// Category name (1-50 characters)
    #[validate(length(min = 1, max = 50, message = "Name must be 1-50 characters"))]
    #[schema(example = "Groceries")]
    pub name: String,

    /// Category type, fixed for the lifetime of the category
    #[serde(rename = "type")]
    pub category_type: EntryType,

    /// Display color in hex format (defaults to #3b82f6)
    #[validate(custom(
        function = "validate_color_hex",
        message = "Color must be in #RRGGBB format"
    ))]
    #[serde(default = "default_color")]
    #[schema(example = "#ef4444")]
    pub color_hex: String,
}

/// Request body for updating a category (PATCH - name and color only)
#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCategoryDto {
    /// Category name
    #[validate(length(min = 1, max = 50, message = "Name must be 1-50 characters"))]
    #[schema(example = "Food & Dining")]
    pub name: Option<String>,

    /// Display color in hex format
    #[schema(example = "#2196F3")]
    pub color_hex: Option<String>,

    /// Rejected when present: a category's type cannot change
    #[serde(rename = "type")]
    pub category_type: Option<EntryType>,
}

impl UpdateCategoryDto {
    /// Validate color and the immutable type
    pub fn validate_fields(&self) -> Result<(), ValidationError> {
        if self.category_type.is_some() {
            return Err(ValidationError::new("category type cannot be changed"));
        }
        if let Some(color) = &self.color_hex {
            validate_color_hex(color)?;
        }
        Ok(())
    }
}

/// Path parameters for category ID
#[derive(Debug, Deserialize, IntoParams)]
pub struct CategoryIdPath {
    /// Category UUID
    pub id: Uuid,
}

/// Categories every new user starts with
pub const DEFAULT_CATEGORIES: [(&str, EntryType, &str); 8] = [
    ("Salary", EntryType::Income, "#10b981"),
    ("Freelance", EntryType::Income, "#34d399"),
    ("Food", EntryType::Expense, "#ef4444"),
    ("Transport", EntryType::Expense, "#f59e0b"),
    ("Housing", EntryType::Expense, "#8b5cf6"),
    ("Entertainment", EntryType::Expense, "#ec4899"),
    ("Emergency fund", EntryType::Saving, "#3b82f6"),
    ("Investments", EntryType::Saving, "#06b6d4"),
];
