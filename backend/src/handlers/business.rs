//! HTTP handlers for the business profile

use axum::{extract::State, Json};

use crate::error::AppResult;
use crate::middleware::CurrentUser;
use crate::services::BusinessService;
use crate::AppState;
use shared::Business;

/// Get the authenticated user's business
pub async fn get_business(
    State(state): State<AppState>,
    current_user: CurrentUser,
) -> AppResult<Json<Business>> {
    let service = BusinessService::new(state.db);
    let business = service
        .ensure_owned(current_user.0.business_id, current_user.0.user_id)
        .await?;
    Ok(Json(business))
}
