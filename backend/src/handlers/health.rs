//! Health check handler

use axum::{extract::State, Json};
use serde_json::{json, Value};

use crate::AppState;

/// Health check endpoint with a database ping
pub async fn health_check(State(state): State<AppState>) -> Json<Value> {
    let db_status = match sqlx::query_scalar::<_, i32>("SELECT 1")
        .fetch_one(&state.db)
        .await
    {
        Ok(_) => "ok",
        Err(_) => "unavailable",
    };

    Json(json!({
        "status": "ok",
        "database": db_status,
    }))
}
