//! Product and review repository.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;

use tamarind_core::{ProductId, ReviewId, UserId};

use super::RepositoryError;
use crate::models::product::{CreateProductInput, Product, ProductFilter, Review, UpdateProductInput};
use crate::models::user::StoredImage;

/// Internal row type for product queries.
#[derive(Debug, sqlx::FromRow)]
struct ProductRow {
    id: i32,
    name: String,
    description: String,
    price: Decimal,
    stock: i32,
    category: String,
    rating: Decimal,
    review_count: i32,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl ProductRow {
    fn into_product(self, images: Vec<StoredImage>) -> Product {
        Product {
            id: ProductId::new(self.id),
            name: self.name,
            description: self.description,
            price: self.price,
            stock: self.stock,
            category: self.category,
            rating: self.rating,
            review_count: self.review_count,
            images,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

/// Internal row type for image queries.
#[derive(Debug, sqlx::FromRow)]
struct ImageRow {
    product_id: i32,
    url: String,
    public_id: String,
}

/// Internal row type for review queries.
#[derive(Debug, sqlx::FromRow)]
struct ReviewRow {
    id: i32,
    product_id: i32,
    user_id: i32,
    user_name: String,
    rating: i32,
    comment: String,
    created_at: DateTime<Utc>,
}

impl From<ReviewRow> for Review {
    fn from(row: ReviewRow) -> Self {
        Self {
            id: ReviewId::new(row.id),
            product_id: ProductId::new(row.product_id),
            user_id: UserId::new(row.user_id),
            user_name: row.user_name,
            rating: row.rating,
            comment: row.comment,
            created_at: row.created_at,
        }
    }
}

const PRODUCT_COLUMNS: &str =
    "id, name, description, price, stock, category, rating, review_count, created_at, updated_at";

/// Repository for product database operations.
pub struct ProductRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ProductRepository<'a> {
    /// Create a new product repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// List products matching a filter, with the total match count for
    /// pagination. Plain LIMIT/OFFSET; concurrent writes may shift pages.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn list(
        &self,
        filter: &ProductFilter,
    ) -> Result<(Vec<Product>, i64), RepositoryError> {
        let (page, per_page) = filter.pagination();
        let offset = i64::from(page - 1) * i64::from(per_page);

        let mut query = sqlx::QueryBuilder::new(format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE 1=1"
        ));
        push_filter_clauses(&mut query, filter);
        query.push(" ORDER BY created_at DESC LIMIT ");
        query.push_bind(i64::from(per_page));
        query.push(" OFFSET ");
        query.push_bind(offset);

        let rows: Vec<ProductRow> = query.build_query_as().fetch_all(self.pool).await?;

        let mut count_query = sqlx::QueryBuilder::new("SELECT COUNT(*) FROM products WHERE 1=1");
        push_filter_clauses(&mut count_query, filter);
        let total: i64 = count_query
            .build_query_scalar()
            .fetch_one(self.pool)
            .await?;

        let ids: Vec<i32> = rows.iter().map(|r| r.id).collect();
        let mut images = self.load_images(&ids).await?;

        let products = rows
            .into_iter()
            .map(|r| {
                let imgs = images.remove(&r.id).unwrap_or_default();
                r.into_product(imgs)
            })
            .collect();

        Ok((products, total))
    }

    /// Get a product by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_id(&self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        let row = sqlx::query_as::<_, ProductRow>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE id = $1"
        ))
        .bind(id.as_i32())
        .fetch_optional(self.pool)
        .await?;

        match row {
            Some(r) => {
                let mut images = self.load_images(&[r.id]).await?;
                let imgs = images.remove(&r.id).unwrap_or_default();
                Ok(Some(r.into_product(imgs)))
            }
            None => Ok(None),
        }
    }

    /// Fetch all referenced products in one query (checkout step 2).
    ///
    /// Missing IDs are simply absent from the result; the caller decides how
    /// to report them.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_ids(&self, ids: &[ProductId]) -> Result<Vec<Product>, RepositoryError> {
        let raw_ids: Vec<i32> = ids.iter().map(ProductId::as_i32).collect();

        let rows = sqlx::query_as::<_, ProductRow>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE id = ANY($1)"
        ))
        .bind(&raw_ids)
        .fetch_all(self.pool)
        .await?;

        let found_ids: Vec<i32> = rows.iter().map(|r| r.id).collect();
        let mut images = self.load_images(&found_ids).await?;

        Ok(rows
            .into_iter()
            .map(|r| {
                let imgs = images.remove(&r.id).unwrap_or_default();
                r.into_product(imgs)
            })
            .collect())
    }

    /// Create a product with its image references.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    pub async fn create(&self, input: &CreateProductInput) -> Result<Product, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query_as::<_, ProductRow>(&format!(
            "INSERT INTO products (name, description, price, stock, category) \
             VALUES ($1, $2, $3, $4, $5) RETURNING {PRODUCT_COLUMNS}"
        ))
        .bind(&input.name)
        .bind(&input.description)
        .bind(input.price)
        .bind(input.stock)
        .bind(&input.category)
        .fetch_one(&mut *tx)
        .await?;

        for (position, image) in input.images.iter().enumerate() {
            sqlx::query(
                "INSERT INTO product_images (product_id, url, public_id, position) \
                 VALUES ($1, $2, $3, $4)",
            )
            .bind(row.id)
            .bind(&image.url)
            .bind(&image.public_id)
            .bind(i32::try_from(position).unwrap_or(i32::MAX))
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        Ok(row.into_product(input.images.clone()))
    }

    /// Update a product. `None` fields are left unchanged; a `Some` image
    /// list replaces the stored one and the displaced references are
    /// returned for external cleanup.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the product doesn't exist.
    pub async fn update(
        &self,
        id: ProductId,
        input: &UpdateProductInput,
    ) -> Result<(Product, Vec<StoredImage>), RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query_as::<_, ProductRow>(&format!(
            "UPDATE products SET \
                 name = COALESCE($1, name), \
                 description = COALESCE($2, description), \
                 price = COALESCE($3, price), \
                 stock = COALESCE($4, stock), \
                 category = COALESCE($5, category), \
                 updated_at = now() \
             WHERE id = $6 RETURNING {PRODUCT_COLUMNS}"
        ))
        .bind(input.name.as_deref())
        .bind(input.description.as_deref())
        .bind(input.price)
        .bind(input.stock)
        .bind(input.category.as_deref())
        .bind(id.as_i32())
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(RepositoryError::NotFound)?;

        let mut displaced = Vec::new();
        let images = if let Some(new_images) = &input.images {
            let old: Vec<ImageRow> = sqlx::query_as(
                "DELETE FROM product_images WHERE product_id = $1 \
                 RETURNING product_id, url, public_id",
            )
            .bind(id.as_i32())
            .fetch_all(&mut *tx)
            .await?;
            displaced = old
                .into_iter()
                .map(|r| StoredImage {
                    url: r.url,
                    public_id: r.public_id,
                })
                .collect();

            for (position, image) in new_images.iter().enumerate() {
                sqlx::query(
                    "INSERT INTO product_images (product_id, url, public_id, position) \
                     VALUES ($1, $2, $3, $4)",
                )
                .bind(id.as_i32())
                .bind(&image.url)
                .bind(&image.public_id)
                .bind(i32::try_from(position).unwrap_or(i32::MAX))
                .execute(&mut *tx)
                .await?;
            }
            new_images.clone()
        } else {
            let current: Vec<ImageRow> = sqlx::query_as(
                "SELECT product_id, url, public_id FROM product_images \
                 WHERE product_id = $1 ORDER BY position, id",
            )
            .bind(id.as_i32())
            .fetch_all(&mut *tx)
            .await?;
            current
                .into_iter()
                .map(|r| StoredImage {
                    url: r.url,
                    public_id: r.public_id,
                })
                .collect()
        };

        tx.commit().await?;

        Ok((row.into_product(images), displaced))
    }

    /// Delete a product, returning its image references for external cleanup.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the product doesn't exist.
    pub async fn delete(&self, id: ProductId) -> Result<Vec<StoredImage>, RepositoryError> {
        let images: Vec<ImageRow> = sqlx::query_as(
            "SELECT product_id, url, public_id FROM product_images WHERE product_id = $1",
        )
        .bind(id.as_i32())
        .fetch_all(self.pool)
        .await?;

        let result = sqlx::query("DELETE FROM products WHERE id = $1")
            .bind(id.as_i32())
            .execute(self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        Ok(images
            .into_iter()
            .map(|r| StoredImage {
                url: r.url,
                public_id: r.public_id,
            })
            .collect())
    }

    /// Decrement stock after an order line (checkout step 5).
    ///
    /// Deliberately a bare UPDATE: the earlier stock check and this
    /// decrement are separate statements, so concurrent orders can drive
    /// stock below zero.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the update fails.
    pub async fn decrement_stock(
        &self,
        id: ProductId,
        quantity: i32,
    ) -> Result<(), RepositoryError> {
        sqlx::query("UPDATE products SET stock = stock - $1, updated_at = now() WHERE id = $2")
            .bind(quantity)
            .bind(id.as_i32())
            .execute(self.pool)
            .await?;

        Ok(())
    }

    /// Count all products.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn count(&self) -> Result<i64, RepositoryError> {
        let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM products")
            .fetch_one(self.pool)
            .await?;
        Ok(count.0)
    }

    /// Count products with no stock left.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn count_out_of_stock(&self) -> Result<i64, RepositoryError> {
        let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM products WHERE stock <= 0")
            .fetch_one(self.pool)
            .await?;
        Ok(count.0)
    }

    // =========================================================================
    // Reviews
    // =========================================================================

    /// Create or replace a user's review, then refresh the product's
    /// aggregate rating and review count.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a statement fails.
    pub async fn upsert_review(
        &self,
        product_id: ProductId,
        user_id: UserId,
        user_name: &str,
        rating: i32,
        comment: &str,
    ) -> Result<Review, RepositoryError> {
        let row = sqlx::query_as::<_, ReviewRow>(
            "INSERT INTO product_reviews (product_id, user_id, user_name, rating, comment) \
             VALUES ($1, $2, $3, $4, $5) \
             ON CONFLICT (product_id, user_id) DO UPDATE SET \
                 user_name = EXCLUDED.user_name, \
                 rating = EXCLUDED.rating, \
                 comment = EXCLUDED.comment \
             RETURNING id, product_id, user_id, user_name, rating, comment, created_at",
        )
        .bind(product_id.as_i32())
        .bind(user_id.as_i32())
        .bind(user_name)
        .bind(rating)
        .bind(comment)
        .fetch_one(self.pool)
        .await?;

        self.recompute_rating(product_id).await?;

        Ok(row.into())
    }

    /// List reviews for a product, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_reviews(&self, product_id: ProductId) -> Result<Vec<Review>, RepositoryError> {
        let rows = sqlx::query_as::<_, ReviewRow>(
            "SELECT id, product_id, user_id, user_name, rating, comment, created_at \
             FROM product_reviews WHERE product_id = $1 ORDER BY created_at DESC",
        )
        .bind(product_id.as_i32())
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// Delete a user's review, then refresh the aggregate rating.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if no such review exists.
    pub async fn delete_review(
        &self,
        product_id: ProductId,
        user_id: UserId,
    ) -> Result<(), RepositoryError> {
        let result =
            sqlx::query("DELETE FROM product_reviews WHERE product_id = $1 AND user_id = $2")
                .bind(product_id.as_i32())
                .bind(user_id.as_i32())
                .execute(self.pool)
                .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        self.recompute_rating(product_id).await
    }

    /// Refresh a product's aggregate rating and review count from its
    /// review rows.
    async fn recompute_rating(&self, product_id: ProductId) -> Result<(), RepositoryError> {
        sqlx::query(
            "UPDATE products SET \
                 rating = COALESCE((SELECT AVG(rating) FROM product_reviews \
                                    WHERE product_id = $1), 0), \
                 review_count = (SELECT COUNT(*) FROM product_reviews WHERE product_id = $1), \
                 updated_at = now() \
             WHERE id = $1",
        )
        .bind(product_id.as_i32())
        .execute(self.pool)
        .await?;

        Ok(())
    }

    /// Load image references for a set of product IDs.
    async fn load_images(
        &self,
        product_ids: &[i32],
    ) -> Result<HashMap<i32, Vec<StoredImage>>, RepositoryError> {
        if product_ids.is_empty() {
            return Ok(HashMap::new());
        }

        let rows = sqlx::query_as::<_, ImageRow>(
            "SELECT product_id, url, public_id FROM product_images \
             WHERE product_id = ANY($1) ORDER BY position, id",
        )
        .bind(product_ids)
        .fetch_all(self.pool)
        .await?;

        let mut map: HashMap<i32, Vec<StoredImage>> = HashMap::new();
        for row in rows {
            map.entry(row.product_id).or_default().push(StoredImage {
                url: row.url,
                public_id: row.public_id,
            });
        }
        Ok(map)
    }
}

/// Append WHERE clauses for a catalog filter to a query builder. Shared by
/// the page query and its count query so the two cannot drift.
fn push_filter_clauses(query: &mut sqlx::QueryBuilder<'_, sqlx::Postgres>, filter: &ProductFilter) {
    if let Some(keyword) = &filter.keyword
        && !keyword.is_empty()
    {
        query.push(" AND name ILIKE ");
        query.push_bind(format!("%{keyword}%"));
    }
    if let Some(category) = &filter.category
        && !category.is_empty()
    {
        query.push(" AND category = ");
        query.push_bind(category.clone());
    }
    if let Some(price_min) = filter.price_min {
        query.push(" AND price >= ");
        query.push_bind(price_min);
    }
    if let Some(price_max) = filter.price_max {
        query.push(" AND price <= ");
        query.push_bind(price_max);
    }
}
