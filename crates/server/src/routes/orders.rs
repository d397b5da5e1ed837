//! Order handlers.

use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde::Deserialize;
use serde_json::{Value, json};

use tamarind_core::{OrderId, OrderStatus};

use crate::db::OrderRepository;
use crate::error::{AppError, Result};
use crate::middleware::auth::{RequireAdmin, RequireAuth};
use crate::models::order::PlaceOrderInput;
use crate::services::checkout::CheckoutService;
use crate::state::AppState;

use super::Pagination;

/// `POST /order/new`
///
/// Places an order for the authenticated buyer. Responds with the computed
/// total and, for online payments, the intent secret for client-side
/// confirmation.
pub async fn new_order(
    RequireAuth(user): RequireAuth,
    State(state): State<AppState>,
    Json(input): Json<PlaceOrderInput>,
) -> Result<Json<Value>> {
    let checkout = CheckoutService::new(state.pool(), state.payments());
    let placed = checkout.place_order(user.id, &input).await?;

    Ok(Json(json!({
        "success": true,
        "order_id": placed.order.id,
        "total_price": placed.order.total_amount,
        "payment_intent": placed.payment_intent,
    })))
}

/// `GET /order/orders/me`
pub async fn my_orders(
    RequireAuth(user): RequireAuth,
    State(state): State<AppState>,
) -> Result<Json<Value>> {
    let orders = OrderRepository::new(state.pool());
    let items = orders.list_for_user(user.id).await?;

    Ok(Json(json!({ "success": true, "orders": items })))
}

/// `GET /order/{id}`
///
/// Owner or admin only.
pub async fn get_one(
    RequireAuth(user): RequireAuth,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<Value>> {
    let orders = OrderRepository::new(state.pool());
    let detail = orders
        .get_by_id(OrderId::new(id))
        .await?
        .ok_or_else(|| AppError::NotFound(format!("order {id} does not exist")))?;

    if detail.order.user_id != user.id && !user.role.is_admin() {
        return Err(AppError::Forbidden(
            "this order belongs to another account".to_owned(),
        ));
    }

    Ok(Json(json!({ "success": true, "order": detail })))
}

/// `GET /order/admin/getall`
pub async fn admin_getall(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
    Query(paging): Query<Pagination>,
) -> Result<Json<Value>> {
    let orders = OrderRepository::new(state.pool());
    let (limit, offset) = paging.limit_offset();

    let (items, revenue) = orders.list_all(limit, offset).await?;
    let total = orders.count().await?;

    Ok(Json(json!({
        "success": true,
        "orders": items,
        "total": total,
        "total_amount": revenue,
    })))
}

#[derive(Debug, Deserialize)]
pub struct UpdateStatusRequest {
    pub status: OrderStatus,
}

/// `PUT /order/admin/update/{order_id}`
///
/// Moves an order along processing -> shipped -> delivered, or cancels it.
/// Totals are never recomputed.
pub async fn admin_update_status(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
    Path(order_id): Path<i32>,
    Json(body): Json<UpdateStatusRequest>,
) -> Result<Json<Value>> {
    let orders = OrderRepository::new(state.pool());
    let id = OrderId::new(order_id);

    let current = orders
        .get_status(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("order {order_id} does not exist")))?;

    if !current.can_transition_to(body.status) {
        return Err(AppError::BadRequest(format!(
            "cannot move order from {current} to {}",
            body.status
        )));
    }

    orders.set_status(id, body.status).await?;

    Ok(Json(json!({ "success": true, "status": body.status })))
}

/// `DELETE /order/admin/delete/{order_id}`
pub async fn admin_delete(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
    Path(order_id): Path<i32>,
) -> Result<Json<Value>> {
    let orders = OrderRepository::new(state.pool());
    orders.delete(OrderId::new(order_id)).await?;

    Ok(Json(json!({ "success": true, "message": "Order deleted" })))
}
