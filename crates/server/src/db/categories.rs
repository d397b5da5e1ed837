//! Category repository.
//!
//! Categories are referenced from products by name only (no foreign key),
//! so the derived product count and the delete guard both join on the
//! denormalized `products.category` string.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use tamarind_core::CategoryId;

use super::RepositoryError;
use crate::models::category::{Category, CategoryWithCount, CreateCategoryInput, UpdateCategoryInput};
use crate::models::user::StoredImage;

/// Internal row type for category queries.
#[derive(Debug, sqlx::FromRow)]
struct CategoryRow {
    id: i32,
    name: String,
    icon_url: Option<String>,
    icon_public_id: Option<String>,
    created_at: DateTime<Utc>,
}

impl From<CategoryRow> for Category {
    fn from(row: CategoryRow) -> Self {
        let icon = match (row.icon_url, row.icon_public_id) {
            (Some(url), Some(public_id)) => Some(StoredImage { url, public_id }),
            _ => None,
        };
        Self {
            id: CategoryId::new(row.id),
            name: row.name,
            icon,
            created_at: row.created_at,
        }
    }
}

const CATEGORY_COLUMNS: &str = "id, name, icon_url, icon_public_id, created_at";

/// Repository for category database operations.
pub struct CategoryRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> CategoryRepository<'a> {
    /// Create a new category repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// List all categories with their derived product counts.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_with_counts(&self) -> Result<Vec<CategoryWithCount>, RepositoryError> {
        #[derive(sqlx::FromRow)]
        struct CountRow {
            #[sqlx(flatten)]
            category: CategoryRow,
            product_count: i64,
        }

        let rows = sqlx::query_as::<_, CountRow>(
            "SELECT c.id, c.name, c.icon_url, c.icon_public_id, c.created_at, \
                    COUNT(p.id) AS product_count \
             FROM categories c \
             LEFT JOIN products p ON p.category = c.name \
             GROUP BY c.id \
             ORDER BY c.name",
        )
        .fetch_all(self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|r| CategoryWithCount {
                category: r.category.into(),
                product_count: r.product_count,
            })
            .collect())
    }

    /// Get a category by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_id(&self, id: CategoryId) -> Result<Option<Category>, RepositoryError> {
        let row = sqlx::query_as::<_, CategoryRow>(&format!(
            "SELECT {CATEGORY_COLUMNS} FROM categories WHERE id = $1"
        ))
        .bind(id.as_i32())
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(Into::into))
    }

    /// Create a category.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the name already exists.
    pub async fn create(&self, input: &CreateCategoryInput) -> Result<Category, RepositoryError> {
        let row = sqlx::query_as::<_, CategoryRow>(&format!(
            "INSERT INTO categories (name, icon_url, icon_public_id) VALUES ($1, $2, $3) \
             RETURNING {CATEGORY_COLUMNS}"
        ))
        .bind(&input.name)
        .bind(input.icon.as_ref().map(|i| i.url.as_str()))
        .bind(input.icon.as_ref().map(|i| i.public_id.as_str()))
        .fetch_one(self.pool)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(ref db_err) = e
                && db_err.is_unique_violation()
            {
                return RepositoryError::Conflict("category already exists".to_owned());
            }
            RepositoryError::Database(e)
        })?;

        Ok(row.into())
    }

    /// Update a category, returning the displaced icon (if replaced) so the
    /// caller can clean up the externally stored image.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the category doesn't exist.
    /// Returns `RepositoryError::Conflict` if the new name is taken.
    pub async fn update(
        &self,
        id: CategoryId,
        input: &UpdateCategoryInput,
    ) -> Result<(Category, Option<StoredImage>), RepositoryError> {
        let existing = self.get_by_id(id).await?.ok_or(RepositoryError::NotFound)?;

        let row = sqlx::query_as::<_, CategoryRow>(&format!(
            "UPDATE categories SET \
                 name = COALESCE($1, name), \
                 icon_url = COALESCE($2, icon_url), \
                 icon_public_id = COALESCE($3, icon_public_id) \
             WHERE id = $4 RETURNING {CATEGORY_COLUMNS}"
        ))
        .bind(input.name.as_deref())
        .bind(input.icon.as_ref().map(|i| i.url.as_str()))
        .bind(input.icon.as_ref().map(|i| i.public_id.as_str()))
        .bind(id.as_i32())
        .fetch_optional(self.pool)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(ref db_err) = e
                && db_err.is_unique_violation()
            {
                return RepositoryError::Conflict("category already exists".to_owned());
            }
            RepositoryError::Database(e)
        })?
        .ok_or(RepositoryError::NotFound)?;

        let displaced = if input.icon.is_some() {
            existing.icon
        } else {
            None
        };

        Ok((row.into(), displaced))
    }

    /// Delete a category, refusing while any product still carries its name.
    ///
    /// Returns the category's icon reference (if any) for external cleanup.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the category doesn't exist.
    /// Returns `RepositoryError::Conflict` naming the category if products
    /// still reference it.
    pub async fn delete(&self, id: CategoryId) -> Result<Option<StoredImage>, RepositoryError> {
        let category = self.get_by_id(id).await?.ok_or(RepositoryError::NotFound)?;

        let in_use: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM products WHERE category = $1")
            .bind(&category.name)
            .fetch_one(self.pool)
            .await?;

        if in_use.0 > 0 {
            return Err(RepositoryError::Conflict(format!(
                "category '{}' still has {} associated products",
                category.name, in_use.0
            )));
        }

        let result = sqlx::query("DELETE FROM categories WHERE id = $1")
            .bind(id.as_i32())
            .execute(self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        Ok(category.icon)
    }
}
