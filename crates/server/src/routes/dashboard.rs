//! Admin dashboard aggregates.
//!
//! Stateless parameterized aggregate queries shaped into one JSON response.
//! No caching, no snapshot isolation across the individual counts.

use axum::{Json, extract::State};
use serde_json::{Map, Value, json};

use crate::db::{OrderRepository, ProductRepository, UserRepository};
use crate::error::Result;
use crate::middleware::auth::RequireAdmin;
use crate::state::AppState;

/// `GET /admin/stats`
pub async fn stats(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
) -> Result<Json<Value>> {
    let users = UserRepository::new(state.pool());
    let products = ProductRepository::new(state.pool());
    let orders = OrderRepository::new(state.pool());

    let user_count = users.count().await?;
    let product_count = products.count().await?;
    let out_of_stock = products.count_out_of_stock().await?;
    let order_count = orders.count().await?;
    let revenue = orders.total_revenue().await?;

    let mut orders_by_status = Map::new();
    for (status, count) in orders.count_by_status().await? {
        orders_by_status.insert(status.to_string(), json!(count));
    }

    Ok(Json(json!({
        "success": true,
        "users": user_count,
        "products": product_count,
        "out_of_stock_products": out_of_stock,
        "orders": order_count,
        "orders_by_status": orders_by_status,
        "total_revenue": revenue,
    })))
}
