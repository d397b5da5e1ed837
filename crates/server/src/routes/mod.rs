//! HTTP route handlers.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                     - Liveness check
//! GET  /health/ready               - Readiness check (database probe)
//!
//! # Auth
//! POST /auth/register              - Create account, open session
//! POST /auth/login                 - Login
//! POST /auth/logout                - Logout
//! GET  /auth/me                    - Current account
//! PUT  /auth/me/update             - Update name/email
//! PUT  /auth/password/update       - Change password
//! POST /auth/password/forgot       - Issue reset token
//! PUT  /auth/password/reset/{token} - Redeem reset token
//!
//! # Products
//! GET  /product/getall             - Catalog listing (keyword/category/price filters, paging)
//! GET  /product/{id}               - Product detail with reviews
//! PUT  /product/{id}/review        - Upsert own review (auth)
//! GET  /product/{id}/reviews       - List reviews
//! DELETE /product/{id}/review      - Delete review (own; admin may target a user)
//! POST /product/admin/new          - Create product (admin)
//! PUT  /product/admin/update/{id}  - Update product (admin)
//! DELETE /product/admin/delete/{id} - Delete product (admin)
//!
//! # Categories
//! GET  /category/getall            - Categories with product counts
//! POST /category/admin/new         - Create category (admin)
//! PUT  /category/admin/update/{id} - Update category (admin)
//! DELETE /category/admin/delete/{id} - Delete category (admin; refused while in use)
//!
//! # Orders
//! POST /order/new                  - Place order (auth)
//! GET  /order/orders/me            - Own orders (auth)
//! GET  /order/{id}                 - Order detail (owner or admin)
//! GET  /order/admin/getall         - All orders + revenue (admin)
//! PUT  /order/admin/update/{order_id} - Status transition (admin)
//! DELETE /order/admin/delete/{order_id} - Delete order (admin)
//!
//! # Users (admin)
//! GET  /user/admin/getall          - List users
//! GET  /user/admin/{id}            - Get user
//! PUT  /user/admin/update/{id}     - Change role
//! DELETE /user/admin/delete/{id}   - Delete user (avatar cleanup attempted)
//!
//! # Dashboard (admin)
//! GET  /admin/stats                - Aggregate counts and revenue
//! ```

pub mod auth;
pub mod categories;
pub mod dashboard;
pub mod orders;
pub mod products;
pub mod users;

use axum::{
    Router,
    routing::{delete, get, post, put},
};
use serde::Deserialize;

use crate::state::AppState;

/// Common LIMIT/OFFSET paging parameters for admin listings.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct Pagination {
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

impl Pagination {
    const DEFAULT_PER_PAGE: u32 = 25;
    const MAX_PER_PAGE: u32 = 100;

    /// Effective (limit, offset) after clamping.
    #[must_use]
    pub fn limit_offset(self) -> (i64, i64) {
        let page = self.page.unwrap_or(1).max(1);
        let per_page = self
            .per_page
            .unwrap_or(Self::DEFAULT_PER_PAGE)
            .clamp(1, Self::MAX_PER_PAGE);
        (i64::from(per_page), i64::from(page - 1) * i64::from(per_page))
    }
}

/// Create the auth routes router.
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/register", post(auth::register))
        .route("/login", post(auth::login))
        .route("/logout", post(auth::logout))
        .route("/me", get(auth::me))
        .route("/me/update", put(auth::update_me))
        .route("/password/update", put(auth::update_password))
        .route("/password/forgot", post(auth::forgot_password))
        .route("/password/reset/{token}", put(auth::reset_password))
}

/// Create the product routes router.
pub fn product_routes() -> Router<AppState> {
    Router::new()
        .route("/getall", get(products::getall))
        .route("/admin/new", post(products::create))
        .route("/admin/update/{id}", put(products::update))
        .route("/admin/delete/{id}", delete(products::remove))
        .route("/{id}", get(products::get_one))
        .route(
            "/{id}/review",
            put(products::upsert_review).delete(products::delete_review),
        )
        .route("/{id}/reviews", get(products::list_reviews))
}

/// Create the category routes router.
pub fn category_routes() -> Router<AppState> {
    Router::new()
        .route("/getall", get(categories::getall))
        .route("/admin/new", post(categories::create))
        .route("/admin/update/{id}", put(categories::update))
        .route("/admin/delete/{id}", delete(categories::remove))
}

/// Create the order routes router.
pub fn order_routes() -> Router<AppState> {
    Router::new()
        .route("/new", post(orders::new_order))
        .route("/orders/me", get(orders::my_orders))
        .route("/admin/getall", get(orders::admin_getall))
        .route("/admin/update/{order_id}", put(orders::admin_update_status))
        .route("/admin/delete/{order_id}", delete(orders::admin_delete))
        .route("/{id}", get(orders::get_one))
}

/// Create the admin user-management routes router.
pub fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/admin/getall", get(users::getall))
        .route("/admin/update/{id}", put(users::update_role))
        .route("/admin/delete/{id}", delete(users::remove))
        .route("/admin/{id}", get(users::get_one))
}

/// Create all routes for the server.
pub fn routes() -> Router<AppState> {
    Router::new()
        .nest("/auth", auth_routes())
        .nest("/product", product_routes())
        .nest("/category", category_routes())
        .nest("/order", order_routes())
        .nest("/user", user_routes())
        .route("/admin/stats", get(dashboard::stats))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pagination_defaults() {
        let p = Pagination::default();
        assert_eq!(p.limit_offset(), (25, 0));
    }

    #[test]
    fn test_pagination_offsets_by_page() {
        let p = Pagination {
            page: Some(3),
            per_page: Some(10),
        };
        assert_eq!(p.limit_offset(), (10, 20));
    }

    #[test]
    fn test_pagination_clamps_per_page() {
        let p = Pagination {
            page: Some(0),
            per_page: Some(10_000),
        };
        assert_eq!(p.limit_offset(), (i64::from(Pagination::MAX_PER_PAGE), 0));
    }
}
