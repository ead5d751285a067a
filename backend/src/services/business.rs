//! Business lookup service
//!
//! The inventory and sales services only need "this business exists and is
//! owned by user X" from the business aggregate; everything else about
//! businesses (registration, profile edits) lives outside this service.

use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use shared::Business;

/// Business existence/ownership checks
#[derive(Clone)]
pub struct BusinessService {
    db: PgPool,
}

#[derive(Debug, FromRow)]
struct BusinessRow {
    id: Uuid,
    name: String,
    owner_id: Uuid,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<BusinessRow> for Business {
    fn from(row: BusinessRow) -> Self {
        Business {
            id: row.id,
            name: row.name,
            owner_id: row.owner_id,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

impl BusinessService {
    /// Create a new BusinessService instance
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Look up a business by id
    pub async fn find_by_id(&self, business_id: Uuid) -> AppResult<Business> {
        let row = sqlx::query_as::<_, BusinessRow>(
            "SELECT id, name, owner_id, created_at, updated_at FROM businesses WHERE id = $1",
        )
        .bind(business_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Business".to_string()))?;

        Ok(row.into())
    }

    /// Look up a business and verify the acting user owns it
    pub async fn ensure_owned(&self, business_id: Uuid, user_id: Uuid) -> AppResult<Business> {
        let business = self.find_by_id(business_id).await?;
        if !business.is_owned_by(user_id) {
            return Err(AppError::Forbidden(
                "Business does not belong to this user".to_string(),
            ));
        }
        Ok(business)
    }
}
