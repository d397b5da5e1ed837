//! Category handlers.

use axum::{
    Json,
    extract::{Path, State},
};
use serde_json::{Value, json};

use tamarind_core::CategoryId;

use crate::db::CategoryRepository;
use crate::error::{AppError, Result};
use crate::middleware::auth::RequireAdmin;
use crate::models::category::{CreateCategoryInput, UpdateCategoryInput};
use crate::services::media::cleanup_images;
use crate::state::AppState;

/// `GET /category/getall`
pub async fn getall(State(state): State<AppState>) -> Result<Json<Value>> {
    let categories = CategoryRepository::new(state.pool());
    let items = categories.list_with_counts().await?;

    Ok(Json(json!({ "success": true, "categories": items })))
}

/// `POST /category/admin/new`
pub async fn create(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
    Json(input): Json<CreateCategoryInput>,
) -> Result<Json<Value>> {
    if input.name.trim().is_empty() {
        return Err(AppError::BadRequest("category name is required".to_owned()));
    }

    let categories = CategoryRepository::new(state.pool());
    let category = categories.create(&input).await?;

    Ok(Json(json!({ "success": true, "category": category })))
}

/// `PUT /category/admin/update/{id}`
pub async fn update(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Json(input): Json<UpdateCategoryInput>,
) -> Result<Json<Value>> {
    let categories = CategoryRepository::new(state.pool());
    let (category, displaced) = categories.update(CategoryId::new(id), &input).await?;

    if let Some(icon) = displaced {
        cleanup_images(state.media(), &[icon], "category update").await;
    }

    Ok(Json(json!({ "success": true, "category": category })))
}

/// `DELETE /category/admin/delete/{id}`
///
/// Refused with a 400 naming the category while any product still carries
/// its name.
pub async fn remove(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<Value>> {
    let categories = CategoryRepository::new(state.pool());
    let icon = categories.delete(CategoryId::new(id)).await?;

    if let Some(icon) = icon {
        cleanup_images(state.media(), &[icon], "category delete").await;
    }

    Ok(Json(json!({ "success": true, "message": "Category deleted" })))
}
