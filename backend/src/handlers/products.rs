//! HTTP handlers for product and stock management endpoints

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::error::AppResult;
use crate::middleware::CurrentUser;
use crate::services::inventory::{
    AdjustStockInput, CreateProductInput, InventoryService, ProductListQuery, UpdateProductInput,
    DEFAULT_HISTORY_LIMIT,
};
use crate::AppState;
use shared::{PaginatedResponse, Product, StockMovement};

/// Create a product
pub async fn create_product(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(input): Json<CreateProductInput>,
) -> AppResult<Json<Product>> {
    let service = InventoryService::new(state.db);
    let product = service
        .create_product(current_user.0.business_id, current_user.0.user_id, input)
        .await?;
    Ok(Json(product))
}

/// List products with optional filters
pub async fn list_products(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Query(query): Query<ProductListQuery>,
) -> AppResult<Json<PaginatedResponse<Product>>> {
    let service = InventoryService::new(state.db);
    let products = service
        .list_products(current_user.0.business_id, query)
        .await?;
    Ok(Json(products))
}

/// Get a single product
pub async fn get_product(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(product_id): Path<Uuid>,
) -> AppResult<Json<Product>> {
    let service = InventoryService::new(state.db);
    let product = service
        .get_product(current_user.0.business_id, product_id)
        .await?;
    Ok(Json(product))
}

/// Update product metadata
pub async fn update_product(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(product_id): Path<Uuid>,
    Json(input): Json<UpdateProductInput>,
) -> AppResult<Json<Product>> {
    let service = InventoryService::new(state.db);
    let product = service
        .update_product(current_user.0.business_id, product_id, input)
        .await?;
    Ok(Json(product))
}

/// Discontinue a product
pub async fn delete_product(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(product_id): Path<Uuid>,
) -> AppResult<Json<()>> {
    let service = InventoryService::new(state.db);
    service
        .delete_product(current_user.0.business_id, product_id)
        .await?;
    Ok(Json(()))
}

/// Manually adjust a product's stock
pub async fn adjust_stock(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(product_id): Path<Uuid>,
    Json(input): Json<AdjustStockInput>,
) -> AppResult<Json<StockMovement>> {
    let service = InventoryService::new(state.db);
    // The engine itself is business-agnostic; scope the product here.
    service
        .get_product(current_user.0.business_id, product_id)
        .await?;
    let movement = service
        .adjust_stock(
            product_id,
            input.kind,
            input.quantity,
            &input.reason,
            None,
            current_user.0.user_id,
        )
        .await?;
    Ok(Json(movement))
}

#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    pub limit: Option<i64>,
}

/// Get a product's stock movement history, newest first
pub async fn get_stock_history(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(product_id): Path<Uuid>,
    Query(query): Query<HistoryQuery>,
) -> AppResult<Json<Vec<StockMovement>>> {
    let service = InventoryService::new(state.db);
    service
        .get_product(current_user.0.business_id, product_id)
        .await?;
    let history = service
        .get_stock_history(product_id, query.limit.unwrap_or(DEFAULT_HISTORY_LIMIT))
        .await?;
    Ok(Json(history))
}

/// List active products at or below their minimum stock level
pub async fn get_low_stock(
    State(state): State<AppState>,
    current_user: CurrentUser,
) -> AppResult<Json<Vec<Product>>> {
    let service = InventoryService::new(state.db);
    let products = service.get_low_stock(current_user.0.business_id).await?;
    Ok(Json(products))
}
