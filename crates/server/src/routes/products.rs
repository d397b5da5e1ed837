//! Catalog and review handlers.

use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde::Deserialize;
use serde_json::{Value, json};

use tamarind_core::{ProductId, UserId};

use crate::db::ProductRepository;
use crate::error::{AppError, Result};
use crate::middleware::auth::{RequireAdmin, RequireAuth};
use crate::models::product::{CreateProductInput, ProductFilter, UpdateProductInput};
use crate::services::media::cleanup_images;
use crate::state::AppState;

/// `GET /product/getall`
pub async fn getall(
    State(state): State<AppState>,
    Query(filter): Query<ProductFilter>,
) -> Result<Json<Value>> {
    let products = ProductRepository::new(state.pool());
    let (items, total) = products.list(&filter).await?;
    let (page, per_page) = filter.pagination();
    let total_pages = u64::try_from(total)
        .unwrap_or_default()
        .div_ceil(u64::from(per_page));

    Ok(Json(json!({
        "success": true,
        "products": items,
        "total": total,
        "page": page,
        "per_page": per_page,
        "total_pages": total_pages,
    })))
}

/// `GET /product/{id}`
pub async fn get_one(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<Value>> {
    let products = ProductRepository::new(state.pool());
    let id = ProductId::new(id);

    let product = products
        .get_by_id(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("product {id} does not exist")))?;
    let reviews = products.list_reviews(id).await?;

    Ok(Json(json!({ "success": true, "product": product, "reviews": reviews })))
}

/// `POST /product/admin/new`
pub async fn create(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
    Json(input): Json<CreateProductInput>,
) -> Result<Json<Value>> {
    if input.name.trim().is_empty() {
        return Err(AppError::BadRequest("product name is required".to_owned()));
    }
    if input.price.is_sign_negative() {
        return Err(AppError::BadRequest("price cannot be negative".to_owned()));
    }

    let products = ProductRepository::new(state.pool());
    let product = products.create(&input).await?;

    Ok(Json(json!({ "success": true, "product": product })))
}

/// `PUT /product/admin/update/{id}`
pub async fn update(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Json(input): Json<UpdateProductInput>,
) -> Result<Json<Value>> {
    if let Some(price) = input.price
        && price.is_sign_negative()
    {
        return Err(AppError::BadRequest("price cannot be negative".to_owned()));
    }

    let products = ProductRepository::new(state.pool());
    let (product, displaced) = products.update(ProductId::new(id), &input).await?;

    // Replaced images are removed from external storage on a best-effort basis.
    cleanup_images(state.media(), &displaced, "product update").await;

    Ok(Json(json!({ "success": true, "product": product })))
}

/// `DELETE /product/admin/delete/{id}`
pub async fn remove(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<Value>> {
    let products = ProductRepository::new(state.pool());
    let images = products.delete(ProductId::new(id)).await?;

    cleanup_images(state.media(), &images, "product delete").await;

    Ok(Json(json!({ "success": true, "message": "Product deleted" })))
}

// =============================================================================
// Reviews
// =============================================================================

#[derive(Debug, Deserialize)]
pub struct ReviewRequest {
    pub rating: i32,
    #[serde(default)]
    pub comment: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct DeleteReviewQuery {
    /// Admins may delete another user's review by passing their id.
    pub user_id: Option<i32>,
}

/// `PUT /product/{id}/review`
pub async fn upsert_review(
    RequireAuth(user): RequireAuth,
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Json(body): Json<ReviewRequest>,
) -> Result<Json<Value>> {
    if !(1..=5).contains(&body.rating) {
        return Err(AppError::BadRequest(
            "rating must be between 1 and 5".to_owned(),
        ));
    }

    let products = ProductRepository::new(state.pool());
    let id = ProductId::new(id);

    if products.get_by_id(id).await?.is_none() {
        return Err(AppError::NotFound(format!("product {id} does not exist")));
    }

    let review = products
        .upsert_review(id, user.id, &user.name, body.rating, &body.comment)
        .await?;

    Ok(Json(json!({ "success": true, "review": review })))
}

/// `GET /product/{id}/reviews`
pub async fn list_reviews(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<Value>> {
    let products = ProductRepository::new(state.pool());
    let reviews = products.list_reviews(ProductId::new(id)).await?;

    Ok(Json(json!({ "success": true, "reviews": reviews })))
}

/// `DELETE /product/{id}/review`
pub async fn delete_review(
    RequireAuth(user): RequireAuth,
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Query(query): Query<DeleteReviewQuery>,
) -> Result<Json<Value>> {
    let target = match query.user_id {
        Some(other) if user.role.is_admin() => UserId::new(other),
        Some(_) => {
            return Err(AppError::Forbidden(
                "only admins can delete another user's review".to_owned(),
            ));
        }
        None => user.id,
    };

    let products = ProductRepository::new(state.pool());
    products.delete_review(ProductId::new(id), target).await?;

    Ok(Json(json!({ "success": true, "message": "Review deleted" })))
}
