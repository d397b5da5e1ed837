//! Category domain model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use tamarind_core::CategoryId;

use super::user::StoredImage;

/// A product category.
///
/// Products reference categories by name (denormalized string); the derived
/// product count comes from a join on that string, not a foreign key.
#[derive(Debug, Clone, Serialize)]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
    pub icon: Option<StoredImage>,
    pub created_at: DateTime<Utc>,
}

/// A category with its derived product count, for listings.
#[derive(Debug, Clone, Serialize)]
pub struct CategoryWithCount {
    #[serde(flatten)]
    pub category: Category,
    pub product_count: i64,
}

/// Input for creating a category.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateCategoryInput {
    pub name: String,
    pub icon: Option<StoredImage>,
}

/// Input for updating a category. `None` fields are left unchanged.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateCategoryInput {
    pub name: Option<String>,
    pub icon: Option<StoredImage>,
}
