//! HTTP surface.

mod extract;
mod handlers;

use std::path::PathBuf;
use std::sync::Arc;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, patch, post, put},
    Json, Router,
};
use tower_http::{cors::CorsLayer, services::ServeDir, trace::TraceLayer};

pub use extract::{USER_EMAIL_HEADER, USER_ID_HEADER, USER_NAME_HEADER};

use crate::services::Services;

const MAX_IMAGE_BYTES: usize = 10 * 1024 * 1024;

#[derive(Clone)]
pub struct AppState {
    pub services: Arc<Services>,
}

impl AppState {
    pub fn new(services: Services) -> Self { Self { services: Arc::new(services) } }
}

/// Builds the router. `media_dir`, when set, is served under `/media`.
pub fn router(state: AppState, media_dir: Option<PathBuf>) -> Router {
    let app = Router::new()
        .route("/health", get(|| async { Json(serde_json::json!({"status": "healthy", "service": "unicart"})) }))
        .route("/api/v1/products", get(handlers::list_products))
        .route("/api/v1/products/:id", get(handlers::get_product))
        .route("/api/v1/cart", get(handlers::get_cart).post(handlers::add_to_cart))
        .route("/api/v1/cart/:line_id", put(handlers::update_cart_line).delete(handlers::remove_cart_line))
        .route("/api/v1/checkout/shipping-methods", get(handlers::shipping_methods))
        .route("/api/v1/checkout/address", post(handlers::submit_address))
        .route("/api/v1/checkout/:order_id/shipping", post(handlers::select_shipping))
        .route("/api/v1/checkout/:order_id/payment", post(handlers::pay))
        .route("/api/v1/orders", get(handlers::list_orders))
        .route("/api/v1/orders/:id", get(handlers::get_order))
        .route("/api/v1/orders/:id/cancel", post(handlers::cancel_order))
        .route("/api/v1/me", get(handlers::me))
        .route("/api/v1/admin/products", post(handlers::create_product).layer(DefaultBodyLimit::max(MAX_IMAGE_BYTES)))
        .route("/api/v1/admin/products/:id", patch(handlers::update_product).delete(handlers::delete_product))
        .route("/api/v1/admin/users/:uid/promote", post(handlers::promote_user))
        .route("/api/v1/admin/orders/:user_id/:order_id/collect", post(handlers::collect_order));

    let app = match media_dir {
        Some(dir) => app.nest_service("/media", ServeDir::new(dir)),
        None => app,
    };

    app.layer(TraceLayer::new_for_http()).layer(CorsLayer::permissive()).with_state(state)
}
