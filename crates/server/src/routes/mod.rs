//! HTTP route handlers for the JSON API.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                          - Liveness
//! GET  /health/ready                    - Readiness (database)
//!
//! # Users (register/login are auth rate limited)
//! POST /api/users/register              - Create account and log in
//! POST /api/users/login                 - Log in
//! POST /api/users/logout                - Log out
//! GET  /api/users/me                    - Current profile (auth)
//! PUT  /api/users/profile               - Update profile (auth)
//! PUT  /api/users/password              - Change password (auth)
//! GET  /api/users                       - List users (admin)
//! GET|PUT|DELETE /api/users/{id}        - Manage a user (admin)
//!
//! # Catalog
//! GET  /api/products                    - Paginated, sortable listing
//! GET  /api/products/featured           - Featured products
//! GET  /api/products/search?query=      - Substring search
//! GET  /api/products/category/{id}      - Products in a category
//! GET  /api/products/{id}               - Product detail
//! GET|POST /api/products/{id}/reviews   - Reviews (POST: auth)
//! POST /api/products                    - Create (admin)
//! PUT|DELETE /api/products/{id}         - Update/delete (admin)
//! PUT  /api/products/{id}/stock         - Set stock (admin)
//! PUT  /api/products/{id}/availability  - Toggle availability (admin)
//! GET  /api/categories                  - All categories
//! GET  /api/categories/tree             - Nested tree
//! GET  /api/categories/{id}             - Category detail
//! GET  /api/categories/{id}/subcategories
//! POST /api/categories                  - Create (admin)
//! PUT|DELETE /api/categories/{id}       - Update/delete (admin)
//!
//! # Checkout (auth)
//! GET  /api/cart                        - Current cart
//! POST /api/cart/add                    - Set a line's quantity
//! DELETE /api/cart/items/{productId}    - Remove a line
//! DELETE /api/cart/clear                - Empty the cart
//! POST /api/otp/send                    - Email a code (auth rate limited)
//! POST /api/otp/verify                  - Verify a code (auth rate limited)
//! POST /api/orders                      - Place an order
//! GET  /api/orders/my-orders            - Own orders
//! GET  /api/orders/{id}                 - Order detail (owner or admin)
//!
//! # Back office (admin)
//! GET  /api/orders/all                  - Every order
//! GET  /api/orders/stats                - Totals and daily breakdown
//! PUT  /api/orders/{id}/status          - Advance or cancel
//! PUT  /api/orders/{id}/pay             - Record payment
//! GET|PUT /api/settings                 - Shop settings (GET is public)
//! GET|PUT /api/admin/settings           - Store profile
//! PUT  /api/admin/settings/business-hours
//! PUT  /api/admin/settings/pricing
//! POST /api/bulk/products               - JSON import
//! POST /api/bulk/categories             - JSON import
//! POST /api/contact                     - Contact form (public)
//! GET  /api/contact                     - Messages (admin)
//! PUT  /api/contact/{id}/status         - Triage (admin)
//! ```

pub mod admin_settings;
pub mod bulk;
pub mod cart;
pub mod categories;
pub mod contact;
pub mod orders;
pub mod otp;
pub mod products;
pub mod settings;
pub mod users;

use axum::{
    Router,
    extract::{DefaultBodyLimit, State},
    http::StatusCode,
    routing::{delete, get, post, put},
};
use serde::Serialize;

use crate::db::RepositoryError;
use crate::error::AppError;
use crate::extract::Json;
use crate::middleware::{api_rate_limiter, auth_rate_limiter};
use crate::models::Pagination;
use crate::state::AppState;

/// Largest accepted bulk import upload.
pub const MAX_UPLOAD_BYTES: usize = 5 * 1024 * 1024;

/// Success envelope: `{success: true, data, message?, count?, pagination?}`.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub count: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pagination: Option<Pagination>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T: Serialize> ApiResponse<T> {
    #[must_use]
    pub fn data(data: T) -> Self {
        Self {
            success: true,
            message: None,
            count: None,
            pagination: None,
            data: Some(data),
        }
    }

    #[must_use]
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    #[must_use]
    pub fn with_count(mut self, count: usize) -> Self {
        self.count = Some(count);
        self
    }

    #[must_use]
    pub fn with_pagination(mut self, pagination: Pagination) -> Self {
        self.pagination = Some(pagination);
        self
    }

    /// Wrap for a handler return.
    #[must_use]
    pub fn json(self) -> Json<Self> {
        Json(self)
    }

    /// Wrap as `201 Created`.
    #[must_use]
    pub fn created(self) -> (StatusCode, Json<Self>) {
        (StatusCode::CREATED, Json(self))
    }
}

impl ApiResponse<()> {
    /// A success body that carries only a message.
    #[must_use]
    pub fn message(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: Some(message.into()),
            count: None,
            pagination: None,
            data: None,
        }
    }
}

/// List response with `count` set from the list length.
pub fn counted<T: Serialize>(items: Vec<T>) -> ApiResponse<Vec<T>> {
    let count = items.len();
    ApiResponse::data(items).with_count(count)
}

/// Map `RepositoryError::NotFound` to a 404 with `message`.
pub fn not_found(message: &'static str) -> impl FnOnce(RepositoryError) -> AppError {
    move |e| match e {
        RepositoryError::NotFound => AppError::NotFound(message.to_string()),
        other => AppError::Database(other),
    }
}

/// Routes behind the strict auth limiter.
fn auth_limited_routes() -> Router<AppState> {
    Router::new()
        .route("/api/users/register", post(users::register))
        .route("/api/users/login", post(users::login))
        .route("/api/otp/send", post(otp::send))
        .route("/api/otp/verify", post(otp::verify))
        .layer(auth_rate_limiter())
}

fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(users::list))
        .route("/logout", post(users::logout))
        .route("/me", get(users::me))
        .route("/profile", put(users::update_profile))
        .route("/password", put(users::change_password))
        .route(
            "/{id}",
            get(users::show).put(users::update).delete(users::destroy),
        )
}

fn product_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(products::index).post(products::create))
        .route("/featured", get(products::featured))
        .route("/search", get(products::search))
        .route("/category/{category_id}", get(products::by_category))
        .route(
            "/{id}",
            get(products::show)
                .put(products::update)
                .delete(products::destroy),
        )
        .route(
            "/{id}/reviews",
            get(products::reviews).post(products::add_review),
        )
        .route("/{id}/stock", put(products::set_stock))
        .route("/{id}/availability", put(products::toggle_availability))
}

fn category_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(categories::index).post(categories::create))
        .route("/tree", get(categories::tree))
        .route(
            "/{id}",
            get(categories::show)
                .put(categories::update)
                .delete(categories::destroy),
        )
        .route("/{id}/subcategories", get(categories::subcategories))
}

fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(cart::show))
        .route("/add", post(cart::add))
        .route("/items/{product_id}", delete(cart::remove))
        .route("/clear", delete(cart::clear))
}

fn order_routes() -> Router<AppState> {
    Router::new()
        .route("/", post(orders::create))
        .route("/my-orders", get(orders::mine))
        .route("/all", get(orders::all))
        .route("/stats", get(orders::stats))
        .route("/{id}", get(orders::show))
        .route("/{id}/status", put(orders::update_status))
        .route("/{id}/pay", put(orders::mark_paid))
}

fn admin_settings_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(admin_settings::show).put(admin_settings::update),
        )
        .route(
            "/business-hours",
            put(admin_settings::update_business_hours),
        )
        .route("/pricing", put(admin_settings::update_pricing))
}

fn bulk_routes() -> Router<AppState> {
    Router::new()
        .route("/products", post(bulk::import_products))
        .route("/categories", post(bulk::import_categories))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
}

fn contact_routes() -> Router<AppState> {
    Router::new()
        .route("/", post(contact::submit).get(contact::index))
        .route("/{id}/status", put(contact::update_status))
}

/// Create all API routes.
pub fn routes() -> Router<AppState> {
    let api = Router::new()
        .nest("/api/users", user_routes())
        .nest("/api/products", product_routes())
        .nest("/api/categories", category_routes())
        .nest("/api/cart", cart_routes())
        .nest("/api/orders", order_routes())
        .route("/api/settings", get(settings::show).put(settings::update))
        .nest("/api/admin/settings", admin_settings_routes())
        .nest("/api/bulk", bulk_routes())
        .nest("/api/contact", contact_routes())
        .layer(api_rate_limiter());

    Router::new()
        .route("/health", get(health))
        .route("/health/ready", get(readiness))
        .merge(auth_limited_routes())
        .merge(api)
}

/// Liveness health check endpoint.
///
/// Returns "ok" if the server is running. Does not check dependencies.
async fn health() -> &'static str {
    "ok"
}

/// Readiness health check endpoint.
///
/// Returns 503 Service Unavailable if the database is not reachable.
async fn readiness(State(state): State<AppState>) -> StatusCode {
    match sqlx::query("SELECT 1").fetch_one(state.pool()).await {
        Ok(_) => StatusCode::OK,
        Err(_) => StatusCode::SERVICE_UNAVAILABLE,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_envelope_skips_empty_fields() {
        let body = serde_json::to_value(ApiResponse::data(vec![1, 2]).with_count(2)).unwrap();
        assert_eq!(body, serde_json::json!({"success": true, "count": 2, "data": [1, 2]}));
    }

    #[test]
    fn test_message_only_envelope() {
        let body = serde_json::to_value(ApiResponse::message("Cart cleared")).unwrap();
        assert_eq!(
            body,
            serde_json::json!({"success": true, "message": "Cart cleared"})
        );
    }

    #[test]
    fn test_not_found_mapping() {
        let err = not_found("Product not found")(RepositoryError::NotFound);
        assert_eq!(err.status(), StatusCode::NOT_FOUND);
        assert_eq!(err.client_message(), "Product not found");
    }
}
