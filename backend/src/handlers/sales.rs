//! HTTP handlers for sale endpoints

use axum::{
    extract::{Path, Query, State},
    Json,
};
use uuid::Uuid;

use crate::error::AppResult;
use crate::middleware::CurrentUser;
use crate::services::sales::{CreateSaleInput, SaleListQuery, SalesService, UpdateSaleInput};
use crate::AppState;
use shared::{PaginatedResponse, Sale};

/// Record a sale
pub async fn create_sale(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(input): Json<CreateSaleInput>,
) -> AppResult<Json<Sale>> {
    let service = SalesService::new(state.db);
    let sale = service
        .create_sale(current_user.0.business_id, current_user.0.user_id, input)
        .await?;
    Ok(Json(sale))
}

/// List sales with optional date range and status filters
pub async fn list_sales(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Query(query): Query<SaleListQuery>,
) -> AppResult<Json<PaginatedResponse<Sale>>> {
    let service = SalesService::new(state.db);
    let sales = service.list_sales(current_user.0.business_id, query).await?;
    Ok(Json(sales))
}

/// Get a single sale
pub async fn get_sale(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(sale_id): Path<Uuid>,
) -> AppResult<Json<Sale>> {
    let service = SalesService::new(state.db);
    let sale = service.get_sale(current_user.0.business_id, sale_id).await?;
    Ok(Json(sale))
}

/// Edit a sale's note
pub async fn update_sale(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(sale_id): Path<Uuid>,
    Json(input): Json<UpdateSaleInput>,
) -> AppResult<Json<Sale>> {
    let service = SalesService::new(state.db);
    let sale = service
        .update_sale(current_user.0.business_id, sale_id, input)
        .await?;
    Ok(Json(sale))
}

/// Void a completed sale, returning its stock to inventory
pub async fn void_sale(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(sale_id): Path<Uuid>,
) -> AppResult<Json<Sale>> {
    let service = SalesService::new(state.db);
    let sale = service
        .void_sale(current_user.0.business_id, sale_id, current_user.0.user_id)
        .await?;
    Ok(Json(sale))
}
