//! Order repository.
//!
//! Order placement calls the individual insert/decrement methods here as
//! separate statements with no surrounding transaction; see
//! `services::checkout` for the contract and its consequences.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;

use tamarind_core::{OrderId, OrderItemId, OrderStatus, PaymentId, PaymentMethod, PaymentStatus, ProductId, UserId};

use super::RepositoryError;
use crate::models::order::{Order, OrderDetail, OrderItem, Payment, ShippingFields, ShippingInfo};

/// Internal row type for order queries.
#[derive(Debug, sqlx::FromRow)]
struct OrderRow {
    id: i32,
    user_id: i32,
    items_subtotal: Decimal,
    tax_amount: Decimal,
    shipping_amount: Decimal,
    total_amount: Decimal,
    status: String,
    created_at: DateTime<Utc>,
    delivered_at: Option<DateTime<Utc>>,
}

impl TryFrom<OrderRow> for Order {
    type Error = RepositoryError;

    fn try_from(row: OrderRow) -> Result<Self, Self::Error> {
        let status = row.status.parse::<OrderStatus>().map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid order status in database: {e}"))
        })?;

        Ok(Self {
            id: OrderId::new(row.id),
            user_id: UserId::new(row.user_id),
            items_subtotal: row.items_subtotal,
            tax_amount: row.tax_amount,
            shipping_amount: row.shipping_amount,
            total_amount: row.total_amount,
            status,
            created_at: row.created_at,
            delivered_at: row.delivered_at,
        })
    }
}

/// Internal row type for order item queries.
#[derive(Debug, sqlx::FromRow)]
struct OrderItemRow {
    id: i32,
    order_id: i32,
    product_id: i32,
    name: String,
    image_url: Option<String>,
    quantity: i32,
    unit_price: Decimal,
}

impl From<OrderItemRow> for OrderItem {
    fn from(row: OrderItemRow) -> Self {
        Self {
            id: OrderItemId::new(row.id),
            order_id: OrderId::new(row.order_id),
            product_id: ProductId::new(row.product_id),
            name: row.name,
            image_url: row.image_url,
            quantity: row.quantity,
            unit_price: row.unit_price,
        }
    }
}

/// Internal row type for shipping info queries.
#[derive(Debug, sqlx::FromRow)]
struct ShippingRow {
    order_id: i32,
    name: String,
    address: String,
    city: String,
    state: String,
    country: String,
    pincode: String,
    phone: String,
}

impl From<ShippingRow> for ShippingInfo {
    fn from(row: ShippingRow) -> Self {
        Self {
            order_id: OrderId::new(row.order_id),
            name: row.name,
            address: row.address,
            city: row.city,
            state: row.state,
            country: row.country,
            pincode: row.pincode,
            phone: row.phone,
        }
    }
}

/// Internal row type for payment queries.
#[derive(Debug, sqlx::FromRow)]
struct PaymentRow {
    id: i32,
    order_id: i32,
    method: String,
    status: String,
    intent_id: String,
    created_at: DateTime<Utc>,
}

impl TryFrom<PaymentRow> for Payment {
    type Error = RepositoryError;

    fn try_from(row: PaymentRow) -> Result<Self, Self::Error> {
        let method = row.method.parse::<PaymentMethod>().map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid payment method in database: {e}"))
        })?;
        let status = row.status.parse::<PaymentStatus>().map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid payment status in database: {e}"))
        })?;

        Ok(Self {
            id: PaymentId::new(row.id),
            order_id: OrderId::new(row.order_id),
            method,
            status,
            intent_id: row.intent_id,
            created_at: row.created_at,
        })
    }
}

const ORDER_COLUMNS: &str = "id, user_id, items_subtotal, tax_amount, shipping_amount, \
                             total_amount, status, created_at, delivered_at";

/// Repository for order database operations.
pub struct OrderRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> OrderRepository<'a> {
    /// Create a new order repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Insert the order header row with its computed totals.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    pub async fn insert_order(
        &self,
        user_id: UserId,
        items_subtotal: Decimal,
        tax_amount: Decimal,
        shipping_amount: Decimal,
        total_amount: Decimal,
    ) -> Result<Order, RepositoryError> {
        let row = sqlx::query_as::<_, OrderRow>(&format!(
            "INSERT INTO orders (user_id, items_subtotal, tax_amount, shipping_amount, total_amount) \
             VALUES ($1, $2, $3, $4, $5) RETURNING {ORDER_COLUMNS}"
        ))
        .bind(user_id.as_i32())
        .bind(items_subtotal)
        .bind(tax_amount)
        .bind(shipping_amount)
        .bind(total_amount)
        .fetch_one(self.pool)
        .await?;

        row.try_into()
    }

    /// Insert one line item with its price/name/image snapshot.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    pub async fn insert_order_item(
        &self,
        order_id: OrderId,
        product_id: ProductId,
        name: &str,
        image_url: Option<&str>,
        quantity: i32,
        unit_price: Decimal,
    ) -> Result<(), RepositoryError> {
        sqlx::query(
            "INSERT INTO order_items (order_id, product_id, name, image_url, quantity, unit_price) \
             VALUES ($1, $2, $3, $4, $5, $6)",
        )
        .bind(order_id.as_i32())
        .bind(product_id.as_i32())
        .bind(name)
        .bind(image_url)
        .bind(quantity)
        .bind(unit_price)
        .execute(self.pool)
        .await?;

        Ok(())
    }

    /// Insert the shipping record for an order.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    pub async fn insert_shipping_info(
        &self,
        order_id: OrderId,
        shipping: &ShippingFields,
    ) -> Result<(), RepositoryError> {
        sqlx::query(
            "INSERT INTO shipping_info (order_id, name, address, city, state, country, pincode, phone) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)",
        )
        .bind(order_id.as_i32())
        .bind(&shipping.name)
        .bind(&shipping.address)
        .bind(&shipping.city)
        .bind(&shipping.state)
        .bind(&shipping.country)
        .bind(&shipping.pincode)
        .bind(&shipping.phone)
        .execute(self.pool)
        .await?;

        Ok(())
    }

    /// Insert the payment record for an order.
    ///
    /// The `payments_cod_limit` trigger may reject COD payments for large
    /// totals; that surfaces here as a database error with code `P0001`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails (including
    /// trigger rejection).
    pub async fn insert_payment(
        &self,
        order_id: OrderId,
        method: PaymentMethod,
        status: PaymentStatus,
        intent_id: &str,
    ) -> Result<Payment, RepositoryError> {
        let row = sqlx::query_as::<_, PaymentRow>(
            "INSERT INTO payments (order_id, method, status, intent_id) \
             VALUES ($1, $2, $3, $4) \
             RETURNING id, order_id, method, status, intent_id, created_at",
        )
        .bind(order_id.as_i32())
        .bind(method.to_string())
        .bind(status.to_string())
        .bind(intent_id)
        .fetch_one(self.pool)
        .await?;

        row.try_into()
    }

    /// Get a fully hydrated order.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn get_by_id(&self, id: OrderId) -> Result<Option<OrderDetail>, RepositoryError> {
        let row = sqlx::query_as::<_, OrderRow>(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE id = $1"
        ))
        .bind(id.as_i32())
        .fetch_optional(self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };
        let order: Order = row.try_into()?;

        let items = sqlx::query_as::<_, OrderItemRow>(
            "SELECT id, order_id, product_id, name, image_url, quantity, unit_price \
             FROM order_items WHERE order_id = $1 ORDER BY id",
        )
        .bind(id.as_i32())
        .fetch_all(self.pool)
        .await?;

        let shipping = sqlx::query_as::<_, ShippingRow>(
            "SELECT order_id, name, address, city, state, country, pincode, phone \
             FROM shipping_info WHERE order_id = $1",
        )
        .bind(id.as_i32())
        .fetch_optional(self.pool)
        .await?;

        let payment = sqlx::query_as::<_, PaymentRow>(
            "SELECT id, order_id, method, status, intent_id, created_at \
             FROM payments WHERE order_id = $1",
        )
        .bind(id.as_i32())
        .fetch_optional(self.pool)
        .await?;

        Ok(Some(OrderDetail {
            order,
            items: items.into_iter().map(Into::into).collect(),
            shipping_info: shipping.map(Into::into),
            payment: payment.map(TryInto::try_into).transpose()?,
        }))
    }

    /// List a user's orders, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_for_user(&self, user_id: UserId) -> Result<Vec<Order>, RepositoryError> {
        let rows = sqlx::query_as::<_, OrderRow>(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE user_id = $1 ORDER BY created_at DESC"
        ))
        .bind(user_id.as_i32())
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(TryInto::try_into).collect()
    }

    /// List all orders, newest first, with the overall revenue sum.
    ///
    /// Plain LIMIT/OFFSET pagination; concurrent writes may shift pages.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn list_all(
        &self,
        limit: i64,
        offset: i64,
    ) -> Result<(Vec<Order>, Decimal), RepositoryError> {
        let rows = sqlx::query_as::<_, OrderRow>(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders ORDER BY created_at DESC LIMIT $1 OFFSET $2"
        ))
        .bind(limit)
        .bind(offset)
        .fetch_all(self.pool)
        .await?;

        let revenue = self.total_revenue().await?;

        let orders: Result<Vec<Order>, RepositoryError> =
            rows.into_iter().map(TryInto::try_into).collect();

        Ok((orders?, revenue))
    }

    /// Current status of an order.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_status(&self, id: OrderId) -> Result<Option<OrderStatus>, RepositoryError> {
        let row: Option<(String,)> = sqlx::query_as("SELECT status FROM orders WHERE id = $1")
            .bind(id.as_i32())
            .fetch_optional(self.pool)
            .await?;

        row.map(|(s,)| {
            s.parse::<OrderStatus>().map_err(|e| {
                RepositoryError::DataCorruption(format!("invalid order status in database: {e}"))
            })
        })
        .transpose()
    }

    /// Set an order's status. Sets `delivered_at` when moving to delivered.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the order doesn't exist.
    pub async fn set_status(
        &self,
        id: OrderId,
        status: OrderStatus,
    ) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            "UPDATE orders SET status = $1, \
                 delivered_at = CASE WHEN $1 = 'delivered' THEN now() ELSE delivered_at END \
             WHERE id = $2",
        )
        .bind(status.to_string())
        .bind(id.as_i32())
        .execute(self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        Ok(())
    }

    /// Delete an order; items, shipping and payment rows cascade.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the order doesn't exist.
    pub async fn delete(&self, id: OrderId) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM orders WHERE id = $1")
            .bind(id.as_i32())
            .execute(self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        Ok(())
    }

    /// Count all orders.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn count(&self) -> Result<i64, RepositoryError> {
        let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM orders")
            .fetch_one(self.pool)
            .await?;
        Ok(count.0)
    }

    /// Sum of totals over all non-cancelled orders.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn total_revenue(&self) -> Result<Decimal, RepositoryError> {
        let sum: (Decimal,) = sqlx::query_as(
            "SELECT COALESCE(SUM(total_amount), 0) FROM orders WHERE status <> 'cancelled'",
        )
        .fetch_one(self.pool)
        .await?;
        Ok(sum.0)
    }

    /// Order counts grouped by status.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn count_by_status(&self) -> Result<Vec<(OrderStatus, i64)>, RepositoryError> {
        let rows: Vec<(String, i64)> =
            sqlx::query_as("SELECT status, COUNT(*) FROM orders GROUP BY status")
                .fetch_all(self.pool)
                .await?;

        rows.into_iter()
            .map(|(status, count)| {
                let status = status.parse::<OrderStatus>().map_err(|e| {
                    RepositoryError::DataCorruption(format!(
                        "invalid order status in database: {e}"
                    ))
                })?;
                Ok((status, count))
            })
            .collect()
    }
}
