//! Sales service: the sale lifecycle coordinator
//!
//! A sale is the one aggregate here that spans two writes in two
//! aggregates: the sale row itself and, for product-linked sales, a stock
//! movement through the adjustment engine. The sale commit is the source
//! of truth; if the follow-up engine call fails, the request still
//! succeeds, the failure is logged, and the sale is returned (and stored)
//! with `stock_synced = false` so the inventory side can be reconciled
//! later instead of silently drifting.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::services::{BusinessService, InventoryService};
use shared::{
    MovementKind, MovementRef, PaginatedResponse, Pagination, PaginationMeta, Sale, SaleStatus,
};

const SALE_REASON: &str = "Sale transaction";
const VOID_REASON: &str = "Sale voided – stock returned";

/// Sales service coordinating sale records with inventory movements
#[derive(Clone)]
pub struct SalesService {
    db: PgPool,
    business: BusinessService,
    inventory: InventoryService,
}

/// Input for recording a sale
#[derive(Debug, Deserialize)]
pub struct CreateSaleInput {
    /// Optional link to an inventory product; unlinked sales are pure
    /// bookkeeping entries and never touch stock
    pub product_id: Option<Uuid>,
    pub quantity: Decimal,
    pub unit_price: Decimal,
    pub note: Option<String>,
}

/// Input for editing a sale after the fact (note only)
#[derive(Debug, Deserialize)]
pub struct UpdateSaleInput {
    pub note: Option<String>,
}

/// Query parameters for listing sales
#[derive(Debug, Default, Deserialize)]
pub struct SaleListQuery {
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
    pub status: Option<SaleStatus>,
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

impl SaleListQuery {
    fn pagination(&self) -> Pagination {
        let default = Pagination::default();
        Pagination {
            page: self.page.unwrap_or(default.page).max(1),
            per_page: self.per_page.unwrap_or(default.per_page).clamp(1, 200),
        }
    }
}

#[derive(Debug, FromRow)]
struct SaleRow {
    id: Uuid,
    business_id: Uuid,
    product_id: Option<Uuid>,
    quantity: Decimal,
    unit_price: Decimal,
    total: Decimal,
    note: Option<String>,
    status: String,
    stock_synced: bool,
    created_by: Uuid,
    created_at: DateTime<Utc>,
}

impl TryFrom<SaleRow> for Sale {
    type Error = AppError;

    fn try_from(row: SaleRow) -> Result<Self, Self::Error> {
        let status: SaleStatus = row
            .status
            .parse()
            .map_err(|e: shared::UnknownValue| AppError::Internal(e.into()))?;
        Ok(Sale {
            id: row.id,
            business_id: row.business_id,
            product_id: row.product_id,
            quantity: row.quantity,
            unit_price: row.unit_price,
            total: row.total,
            note: row.note,
            status,
            stock_synced: row.stock_synced,
            created_by: row.created_by,
            created_at: row.created_at,
        })
    }
}

const SALE_COLUMNS: &str = "id, business_id, product_id, quantity, unit_price, total, note, \
     status, stock_synced, created_by, created_at";

impl SalesService {
    /// Create a new SalesService instance
    pub fn new(db: PgPool) -> Self {
        let business = BusinessService::new(db.clone());
        let inventory = InventoryService::new(db.clone());
        Self {
            db,
            business,
            inventory,
        }
    }

    /// Record a sale, decrementing stock for product-linked sales
    pub async fn create_sale(
        &self,
        business_id: Uuid,
        user_id: Uuid,
        input: CreateSaleInput,
    ) -> AppResult<Sale> {
        // A token's business_id is not trusted to resolve; an unknown
        // business is a not-found, not an FK violation at insert time.
        self.business.find_by_id(business_id).await?;

        if input.quantity <= Decimal::ZERO {
            return Err(AppError::validation(
                "quantity",
                "Quantity must be greater than zero",
            ));
        }
        if input.unit_price <= Decimal::ZERO {
            return Err(AppError::validation(
                "unit_price",
                "Unit price must be greater than zero",
            ));
        }

        // Pre-check the linked product before committing anything; the
        // engine re-checks under its own transaction, this just turns the
        // common failure into a clean rejection with no sale row written.
        if let Some(product_id) = input.product_id {
            let product = self.inventory.get_product(business_id, product_id).await?;
            if input.quantity > product.stock {
                return Err(AppError::InsufficientStock {
                    available: product.stock,
                    requested: input.quantity,
                });
            }
        }

        let total = Sale::compute_total(input.quantity, input.unit_price);

        let row = sqlx::query_as::<_, SaleRow>(&format!(
            r#"
            INSERT INTO sales (
                business_id, product_id, quantity, unit_price, total, note,
                status, stock_synced, created_by
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, TRUE, $8)
            RETURNING {SALE_COLUMNS}
            "#
        ))
        .bind(business_id)
        .bind(input.product_id)
        .bind(input.quantity)
        .bind(input.unit_price)
        .bind(total)
        .bind(&input.note)
        .bind(SaleStatus::Completed.as_str())
        .bind(user_id)
        .fetch_one(&self.db)
        .await?;

        let mut sale: Sale = row.try_into()?;

        if let Some(product_id) = sale.product_id {
            let result = self
                .inventory
                .adjust_stock(
                    product_id,
                    MovementKind::Sale,
                    sale.quantity,
                    SALE_REASON,
                    Some(MovementRef::sale(sale.id)),
                    user_id,
                )
                .await;

            if let Err(err) = result {
                sale = self.mark_stock_unsynced(sale, &err, "sale").await?;
            }
        }

        Ok(sale)
    }

    /// Get a sale, scoped to the business
    pub async fn get_sale(&self, business_id: Uuid, sale_id: Uuid) -> AppResult<Sale> {
        let row = sqlx::query_as::<_, SaleRow>(&format!(
            "SELECT {SALE_COLUMNS} FROM sales WHERE id = $1 AND business_id = $2"
        ))
        .bind(sale_id)
        .bind(business_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Sale".to_string()))?;

        row.try_into()
    }

    /// List sales for a business, optionally filtered by date range and status
    pub async fn list_sales(
        &self,
        business_id: Uuid,
        query: SaleListQuery,
    ) -> AppResult<PaginatedResponse<Sale>> {
        let pagination = query.pagination();
        let status = query.status.map(|s| s.as_str().to_string());

        let total = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*)
            FROM sales
            WHERE business_id = $1
              AND ($2::timestamptz IS NULL OR created_at >= $2)
              AND ($3::timestamptz IS NULL OR created_at <= $3)
              AND ($4::text IS NULL OR status = $4)
            "#,
        )
        .bind(business_id)
        .bind(query.from)
        .bind(query.to)
        .bind(&status)
        .fetch_one(&self.db)
        .await?;

        let rows = sqlx::query_as::<_, SaleRow>(&format!(
            r#"
            SELECT {SALE_COLUMNS}
            FROM sales
            WHERE business_id = $1
              AND ($2::timestamptz IS NULL OR created_at >= $2)
              AND ($3::timestamptz IS NULL OR created_at <= $3)
              AND ($4::text IS NULL OR status = $4)
            ORDER BY created_at DESC
            LIMIT $5 OFFSET $6
            "#
        ))
        .bind(business_id)
        .bind(query.from)
        .bind(query.to)
        .bind(&status)
        .bind(i64::from(pagination.per_page))
        .bind(pagination.offset())
        .fetch_all(&self.db)
        .await?;

        let sales = rows
            .into_iter()
            .map(Sale::try_from)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(PaginatedResponse {
            pagination: PaginationMeta::new(&pagination, total as u64),
            data: sales,
        })
    }

    /// Edit a sale's note; everything else is immutable after creation
    pub async fn update_sale(
        &self,
        business_id: Uuid,
        sale_id: Uuid,
        input: UpdateSaleInput,
    ) -> AppResult<Sale> {
        let sale = self.get_sale(business_id, sale_id).await?;

        if !sale.status.can_update() {
            return Err(AppError::InvalidStateTransition(
                "Voided sales cannot be edited".to_string(),
            ));
        }

        let row = sqlx::query_as::<_, SaleRow>(&format!(
            r#"
            UPDATE sales SET note = $1
            WHERE id = $2 AND business_id = $3
            RETURNING {SALE_COLUMNS}
            "#
        ))
        .bind(&input.note)
        .bind(sale_id)
        .bind(business_id)
        .fetch_one(&self.db)
        .await?;

        row.try_into()
    }

    /// Void a completed sale, returning its stock to inventory
    ///
    /// The status flip is conditional on the sale still being completed,
    /// so two concurrent voids cannot both issue the compensating return
    /// movement.
    pub async fn void_sale(
        &self,
        business_id: Uuid,
        sale_id: Uuid,
        user_id: Uuid,
    ) -> AppResult<Sale> {
        let sale = self.get_sale(business_id, sale_id).await?;

        if !sale.status.can_void() {
            return Err(AppError::InvalidStateTransition(
                "Sale is already voided".to_string(),
            ));
        }

        let row = sqlx::query_as::<_, SaleRow>(&format!(
            r#"
            UPDATE sales SET status = $1
            WHERE id = $2 AND business_id = $3 AND status = $4
            RETURNING {SALE_COLUMNS}
            "#
        ))
        .bind(SaleStatus::Voided.as_str())
        .bind(sale_id)
        .bind(business_id)
        .bind(SaleStatus::Completed.as_str())
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| {
            // Lost the race against another void
            AppError::InvalidStateTransition("Sale is already voided".to_string())
        })?;

        let mut sale: Sale = row.try_into()?;

        if let Some(product_id) = sale.product_id {
            let result = self
                .inventory
                .adjust_stock(
                    product_id,
                    MovementKind::Return,
                    sale.quantity,
                    VOID_REASON,
                    Some(MovementRef::sale(sale.id)),
                    user_id,
                )
                .await;

            if let Err(err) = result {
                sale = self.mark_stock_unsynced(sale, &err, "void").await?;
            }
        }

        Ok(sale)
    }

    /// Record that a sale's inventory side-effect failed after the sale
    /// itself committed
    async fn mark_stock_unsynced(
        &self,
        sale: Sale,
        cause: &AppError,
        operation: &str,
    ) -> AppResult<Sale> {
        tracing::warn!(
            sale_id = %sale.id,
            product_id = ?sale.product_id,
            operation,
            error = %cause,
            "stock adjustment failed after sale committed; flagging for reconciliation"
        );

        let row = sqlx::query_as::<_, SaleRow>(&format!(
            r#"
            UPDATE sales SET stock_synced = FALSE
            WHERE id = $1
            RETURNING {SALE_COLUMNS}
            "#
        ))
        .bind(sale.id)
        .fetch_one(&self.db)
        .await?;

        row.try_into()
    }
}
