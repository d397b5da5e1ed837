//! Product and review domain models.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use tamarind_core::{ProductId, ReviewId, UserId};

use super::user::StoredImage;

/// A catalog product.
///
/// `category` is a denormalized string matched against `categories.name` by
/// convention only; there is no foreign key between the two tables.
#[derive(Debug, Clone, Serialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub description: String,
    pub price: Decimal,
    pub stock: i32,
    pub category: String,
    /// Aggregate of `product_reviews.rating`, recomputed on review writes.
    pub rating: Decimal,
    pub review_count: i32,
    pub images: Vec<StoredImage>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A shopper's review of a product. One per (product, user).
#[derive(Debug, Clone, Serialize)]
pub struct Review {
    pub id: ReviewId,
    pub product_id: ProductId,
    pub user_id: UserId,
    /// Snapshot of the reviewer's name at review time.
    pub user_name: String,
    pub rating: i32,
    pub comment: String,
    pub created_at: DateTime<Utc>,
}

/// Input for creating a product.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateProductInput {
    pub name: String,
    pub description: String,
    pub price: Decimal,
    pub stock: i32,
    pub category: String,
    #[serde(default)]
    pub images: Vec<StoredImage>,
}

/// Input for updating a product. `None` fields are left unchanged;
/// `images: Some(..)` replaces the whole image list.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateProductInput {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<Decimal>,
    pub stock: Option<i32>,
    pub category: Option<String>,
    pub images: Option<Vec<StoredImage>>,
}

/// Catalog listing filter, bound straight from the query string.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProductFilter {
    /// Case-insensitive substring match on the product name.
    pub keyword: Option<String>,
    pub category: Option<String>,
    pub price_min: Option<Decimal>,
    pub price_max: Option<Decimal>,
    /// 1-based page number.
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

impl ProductFilter {
    /// Default page size for catalog listings.
    pub const DEFAULT_PER_PAGE: u32 = 10;
    /// Upper bound on page size to keep OFFSET scans reasonable.
    pub const MAX_PER_PAGE: u32 = 100;

    /// Effective (page, `per_page`) after clamping.
    #[must_use]
    pub fn pagination(&self) -> (u32, u32) {
        let page = self.page.unwrap_or(1).max(1);
        let per_page = self
            .per_page
            .unwrap_or(Self::DEFAULT_PER_PAGE)
            .clamp(1, Self::MAX_PER_PAGE);
        (page, per_page)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pagination_defaults() {
        let filter = ProductFilter::default();
        assert_eq!(filter.pagination(), (1, 10));
    }

    #[test]
    fn test_pagination_clamps() {
        let filter = ProductFilter {
            page: Some(0),
            per_page: Some(10_000),
            ..ProductFilter::default()
        };
        assert_eq!(filter.pagination(), (1, ProductFilter::MAX_PER_PAGE));
    }
}
