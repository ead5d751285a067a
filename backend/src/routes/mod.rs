//! Route definitions for the Shop Ops Platform

use axum::{
    middleware,
    routing::{get, post},
    Router,
};

use crate::{handlers, middleware::auth_middleware, AppState};

/// Create API routes
pub fn api_routes() -> Router<AppState> {
    Router::new()
        // Health check (public)
        .route("/health", get(handlers::health_check))
        // Protected routes - business profile
        .nest("/business", business_routes())
        // Protected routes - product and stock management
        .nest("/products", product_routes())
        // Protected routes - sales
        .nest("/sales", sale_routes())
}

/// Business profile routes (protected)
fn business_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::get_business))
        .route_layer(middleware::from_fn(auth_middleware))
}

/// Product and stock management routes (protected)
fn product_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(handlers::list_products).post(handlers::create_product),
        )
        .route("/low-stock", get(handlers::get_low_stock))
        .route(
            "/:product_id",
            get(handlers::get_product)
                .put(handlers::update_product)
                .delete(handlers::delete_product),
        )
        .route("/:product_id/stock", post(handlers::adjust_stock))
        .route(
            "/:product_id/stock/history",
            get(handlers::get_stock_history),
        )
        .route_layer(middleware::from_fn(auth_middleware))
}

/// Sale routes (protected)
fn sale_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::list_sales).post(handlers::create_sale))
        .route(
            "/:sale_id",
            get(handlers::get_sale).put(handlers::update_sale),
        )
        .route("/:sale_id/void", post(handlers::void_sale))
        .route_layer(middleware::from_fn(auth_middleware))
}
