//! Admin user-management handlers.

use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde::Deserialize;
use serde_json::{Value, json};

use tamarind_core::{Role, UserId};

use crate::db::UserRepository;
use crate::error::{AppError, Result};
use crate::middleware::auth::RequireAdmin;
use crate::services::media::cleanup_images;
use crate::state::AppState;

use super::Pagination;

/// `GET /user/admin/getall`
pub async fn getall(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
    Query(paging): Query<Pagination>,
) -> Result<Json<Value>> {
    let users = UserRepository::new(state.pool());
    let (limit, offset) = paging.limit_offset();

    let items = users.list(limit, offset).await?;
    let total = users.count().await?;

    Ok(Json(json!({ "success": true, "users": items, "total": total })))
}

/// `GET /user/admin/{id}`
pub async fn get_one(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<Value>> {
    let users = UserRepository::new(state.pool());
    let user = users
        .get_by_id(UserId::new(id))
        .await?
        .ok_or_else(|| AppError::NotFound(format!("user {id} does not exist")))?;

    Ok(Json(json!({ "success": true, "user": user })))
}

#[derive(Debug, Deserialize)]
pub struct UpdateRoleRequest {
    pub role: Role,
}

/// `PUT /user/admin/update/{id}`
pub async fn update_role(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Json(body): Json<UpdateRoleRequest>,
) -> Result<Json<Value>> {
    let target = UserId::new(id);

    if target == admin.id && !body.role.is_admin() {
        return Err(AppError::BadRequest(
            "admins cannot revoke their own role".to_owned(),
        ));
    }

    let users = UserRepository::new(state.pool());
    users.update_role(target, body.role).await?;

    Ok(Json(json!({ "success": true, "message": "Role updated" })))
}

/// `DELETE /user/admin/delete/{id}`
///
/// Deletes the account, then attempts removal of the stored avatar from
/// external image storage; cleanup failures are logged, never fatal.
pub async fn remove(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<Value>> {
    let target = UserId::new(id);

    if target == admin.id {
        return Err(AppError::BadRequest(
            "admins cannot delete their own account".to_owned(),
        ));
    }

    let users = UserRepository::new(state.pool());
    let avatar = users.delete(target).await?;

    if let Some(avatar) = avatar {
        cleanup_images(state.media(), &[avatar], "user delete").await;
    }

    Ok(Json(json!({ "success": true, "message": "User deleted" })))
}
