//! Inventory service: product catalog, the stock adjustment engine, and
//! read views over the stock-movement ledger
//!
//! Every change to a product's `stock` field goes through [`adjust_stock`]
//! (or its absolute-set twin [`set_stock_level`]): the engine computes the
//! transition from the current level, rejects anything that would drive
//! stock negative, and commits the updated counter together with exactly
//! one appended ledger entry in a single database transaction. The counter
//! update is a compare-and-swap on the previously observed stock, retried a
//! bounded number of times, so concurrent adjustments to the same product
//! serialize instead of losing updates.
//!
//! [`adjust_stock`]: InventoryService::adjust_stock
//! [`set_stock_level`]: InventoryService::set_stock_level

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;
use sqlx::{FromRow, PgPool, Postgres, Transaction};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::services::BusinessService;
use shared::{
    MovementKind, MovementRef, PaginatedResponse, Pagination, PaginationMeta, Product,
    ProductStatus, StockMovement, StockTransition,
};

/// Attempts at the stock compare-and-swap before giving up with a conflict
const STOCK_CAS_ATTEMPTS: u32 = 3;

/// Default number of ledger entries returned by the history view
pub const DEFAULT_HISTORY_LIMIT: i64 = 50;

/// Inventory service for managing products and stock movements
#[derive(Clone)]
pub struct InventoryService {
    db: PgPool,
    business: BusinessService,
}

/// Input for creating a product
#[derive(Debug, Deserialize)]
pub struct CreateProductInput {
    pub name: String,
    pub description: Option<String>,
    pub sku: Option<String>,
    pub unit: Option<String>,
    pub cost_price: Decimal,
    pub selling_price: Decimal,
    /// Initial stock; a value above zero is recorded as a `purchase`
    /// movement alongside the product itself
    #[serde(default)]
    pub stock: Decimal,
    #[serde(default)]
    pub min_stock: Decimal,
    pub max_stock: Option<Decimal>,
}

/// Input for updating product metadata (never stock)
#[derive(Debug, Deserialize)]
pub struct UpdateProductInput {
    pub name: Option<String>,
    pub description: Option<String>,
    pub sku: Option<String>,
    pub unit: Option<String>,
    pub cost_price: Option<Decimal>,
    pub selling_price: Option<Decimal>,
    pub min_stock: Option<Decimal>,
    pub max_stock: Option<Decimal>,
    pub status: Option<ProductStatus>,
}

/// Input for a manual stock adjustment
#[derive(Debug, Deserialize)]
pub struct AdjustStockInput {
    pub kind: MovementKind,
    /// Positive magnitude; for kind `adjust` this is the absolute target
    /// stock level
    pub quantity: Decimal,
    pub reason: String,
}

/// Query parameters for listing products
#[derive(Debug, Default, Deserialize)]
pub struct ProductListQuery {
    pub status: Option<ProductStatus>,
    pub search: Option<String>,
    #[serde(default)]
    pub low_stock_only: bool,
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

impl ProductListQuery {
    fn pagination(&self) -> Pagination {
        let default = Pagination::default();
        Pagination {
            page: self.page.unwrap_or(default.page).max(1),
            per_page: self.per_page.unwrap_or(default.per_page).clamp(1, 200),
        }
    }
}

#[derive(Debug, FromRow)]
struct ProductRow {
    id: Uuid,
    business_id: Uuid,
    name: String,
    description: Option<String>,
    sku: Option<String>,
    unit: Option<String>,
    cost_price: Decimal,
    selling_price: Decimal,
    stock: Decimal,
    min_stock: Decimal,
    max_stock: Option<Decimal>,
    status: String,
    created_by: Uuid,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<ProductRow> for Product {
    type Error = AppError;

    fn try_from(row: ProductRow) -> Result<Self, Self::Error> {
        let status: ProductStatus = row
            .status
            .parse()
            .map_err(|e: shared::UnknownValue| AppError::Internal(e.into()))?;
        Ok(Product {
            id: row.id,
            business_id: row.business_id,
            name: row.name,
            description: row.description,
            sku: row.sku,
            unit: row.unit,
            cost_price: row.cost_price,
            selling_price: row.selling_price,
            stock: row.stock,
            min_stock: row.min_stock,
            max_stock: row.max_stock,
            status,
            created_by: row.created_by,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(Debug, FromRow)]
struct MovementRow {
    id: Uuid,
    business_id: Uuid,
    product_id: Uuid,
    kind: String,
    quantity: Decimal,
    previous_stock: Decimal,
    new_stock: Decimal,
    reason: String,
    reference_id: Option<Uuid>,
    reference_kind: Option<String>,
    created_by: Uuid,
    created_at: DateTime<Utc>,
}

impl TryFrom<MovementRow> for StockMovement {
    type Error = AppError;

    fn try_from(row: MovementRow) -> Result<Self, Self::Error> {
        let kind: MovementKind = row
            .kind
            .parse()
            .map_err(|e: shared::UnknownValue| AppError::Internal(e.into()))?;
        Ok(StockMovement {
            id: row.id,
            business_id: row.business_id,
            product_id: row.product_id,
            kind,
            quantity: row.quantity,
            previous: row.previous_stock,
            new: row.new_stock,
            reason: row.reason,
            reference_id: row.reference_id,
            reference_kind: row.reference_kind,
            created_by: row.created_by,
            created_at: row.created_at,
        })
    }
}

const PRODUCT_COLUMNS: &str = "id, business_id, name, description, sku, unit, cost_price, \
     selling_price, stock, min_stock, max_stock, status, created_by, created_at, updated_at";

const MOVEMENT_COLUMNS: &str = "id, business_id, product_id, kind, quantity, previous_stock, \
     new_stock, reason, reference_id, reference_kind, created_by, created_at";

impl InventoryService {
    /// Create a new InventoryService instance
    pub fn new(db: PgPool) -> Self {
        let business = BusinessService::new(db.clone());
        Self { db, business }
    }

    /// Create a product for a business
    ///
    /// Initial stock above zero produces the product's first ledger entry
    /// (kind `purchase`, reason "Initial stock") in the same transaction as
    /// the insert.
    pub async fn create_product(
        &self,
        business_id: Uuid,
        user_id: Uuid,
        input: CreateProductInput,
    ) -> AppResult<Product> {
        // A token's business_id is not trusted to resolve; an unknown
        // business is a not-found, not an FK violation at insert time.
        self.business.find_by_id(business_id).await?;

        if input.name.trim().is_empty() {
            return Err(AppError::validation("name", "Product name is required"));
        }
        if input.cost_price <= Decimal::ZERO {
            return Err(AppError::validation(
                "cost_price",
                "Cost price must be positive",
            ));
        }
        if input.selling_price <= Decimal::ZERO {
            return Err(AppError::validation(
                "selling_price",
                "Selling price must be positive",
            ));
        }
        if input.stock < Decimal::ZERO {
            return Err(AppError::validation(
                "stock",
                "Initial stock cannot be negative",
            ));
        }
        if input.min_stock < Decimal::ZERO {
            return Err(AppError::validation(
                "min_stock",
                "Minimum stock cannot be negative",
            ));
        }

        let mut tx = self.db.begin().await?;

        let row = sqlx::query_as::<_, ProductRow>(&format!(
            r#"
            INSERT INTO products (
                business_id, name, description, sku, unit, cost_price,
                selling_price, stock, min_stock, max_stock, status, created_by
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            RETURNING {PRODUCT_COLUMNS}
            "#
        ))
        .bind(business_id)
        .bind(input.name.trim())
        .bind(&input.description)
        .bind(&input.sku)
        .bind(&input.unit)
        .bind(input.cost_price)
        .bind(input.selling_price)
        .bind(input.stock)
        .bind(input.min_stock)
        .bind(input.max_stock)
        .bind(ProductStatus::Active.as_str())
        .bind(user_id)
        .fetch_one(&mut *tx)
        .await?;

        if row.stock > Decimal::ZERO {
            let transition =
                StockTransition::compute(Decimal::ZERO, MovementKind::Purchase, row.stock)?;
            insert_movement(
                &mut tx,
                business_id,
                row.id,
                MovementKind::Purchase,
                transition,
                "Initial stock",
                None,
                user_id,
            )
            .await?;
        }

        tx.commit().await?;

        row.try_into()
    }

    /// Get a product, scoped to the business
    pub async fn get_product(&self, business_id: Uuid, product_id: Uuid) -> AppResult<Product> {
        let row = sqlx::query_as::<_, ProductRow>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE id = $1 AND business_id = $2"
        ))
        .bind(product_id)
        .bind(business_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Product".to_string()))?;

        row.try_into()
    }

    /// List products for a business with optional filters
    pub async fn list_products(
        &self,
        business_id: Uuid,
        query: ProductListQuery,
    ) -> AppResult<PaginatedResponse<Product>> {
        let pagination = query.pagination();
        let status = query.status.map(|s| s.as_str().to_string());
        let search = query
            .search
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty());

        let total = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*)
            FROM products
            WHERE business_id = $1
              AND ($2::text IS NULL OR status = $2)
              AND ($3::text IS NULL OR name ILIKE '%' || $3 || '%' OR sku ILIKE '%' || $3 || '%')
              AND (NOT $4 OR (stock <= min_stock AND status = $5))
            "#,
        )
        .bind(business_id)
        .bind(&status)
        .bind(search)
        .bind(query.low_stock_only)
        .bind(ProductStatus::Active.as_str())
        .fetch_one(&self.db)
        .await?;

        let rows = sqlx::query_as::<_, ProductRow>(&format!(
            r#"
            SELECT {PRODUCT_COLUMNS}
            FROM products
            WHERE business_id = $1
              AND ($2::text IS NULL OR status = $2)
              AND ($3::text IS NULL OR name ILIKE '%' || $3 || '%' OR sku ILIKE '%' || $3 || '%')
              AND (NOT $4 OR (stock <= min_stock AND status = $5))
            ORDER BY name ASC
            LIMIT $6 OFFSET $7
            "#
        ))
        .bind(business_id)
        .bind(&status)
        .bind(search)
        .bind(query.low_stock_only)
        .bind(ProductStatus::Active.as_str())
        .bind(i64::from(pagination.per_page))
        .bind(pagination.offset())
        .fetch_all(&self.db)
        .await?;

        let products = rows
            .into_iter()
            .map(Product::try_from)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(PaginatedResponse {
            pagination: PaginationMeta::new(&pagination, total as u64),
            data: products,
        })
    }

    /// Update product metadata
    ///
    /// The stock field is deliberately not editable here; stock only
    /// changes through the adjustment engine.
    pub async fn update_product(
        &self,
        business_id: Uuid,
        product_id: Uuid,
        input: UpdateProductInput,
    ) -> AppResult<Product> {
        let existing = self.get_product(business_id, product_id).await?;

        // Discontinuing through a metadata edit obeys the same zero-stock
        // rule as delete_product.
        if input.status == Some(ProductStatus::Discontinued)
            && existing.status != ProductStatus::Discontinued
            && !existing.can_discontinue()
        {
            return Err(AppError::conflict(
                "Product",
                "Cannot discontinue a product with remaining stock; adjust stock to zero first",
            ));
        }

        let name = input.name.unwrap_or(existing.name);
        let description = input.description.or(existing.description);
        let sku = input.sku.or(existing.sku);
        let unit = input.unit.or(existing.unit);
        let cost_price = input.cost_price.unwrap_or(existing.cost_price);
        let selling_price = input.selling_price.unwrap_or(existing.selling_price);
        let min_stock = input.min_stock.unwrap_or(existing.min_stock);
        let max_stock = input.max_stock.or(existing.max_stock);
        let status = input.status.unwrap_or(existing.status);

        if name.trim().is_empty() {
            return Err(AppError::validation("name", "Product name is required"));
        }
        if cost_price <= Decimal::ZERO {
            return Err(AppError::validation(
                "cost_price",
                "Cost price must be positive",
            ));
        }
        if selling_price <= Decimal::ZERO {
            return Err(AppError::validation(
                "selling_price",
                "Selling price must be positive",
            ));
        }
        if min_stock < Decimal::ZERO {
            return Err(AppError::validation(
                "min_stock",
                "Minimum stock cannot be negative",
            ));
        }

        let row = sqlx::query_as::<_, ProductRow>(&format!(
            r#"
            UPDATE products
            SET name = $1, description = $2, sku = $3, unit = $4, cost_price = $5,
                selling_price = $6, min_stock = $7, max_stock = $8, status = $9,
                updated_at = NOW()
            WHERE id = $10 AND business_id = $11
            RETURNING {PRODUCT_COLUMNS}
            "#
        ))
        .bind(name.trim())
        .bind(&description)
        .bind(&sku)
        .bind(&unit)
        .bind(cost_price)
        .bind(selling_price)
        .bind(min_stock)
        .bind(max_stock)
        .bind(status.as_str())
        .bind(product_id)
        .bind(business_id)
        .fetch_one(&self.db)
        .await?;

        row.try_into()
    }

    /// Discontinue a product (soft delete)
    ///
    /// Only allowed once the product's stock is zero; discontinuing a
    /// product with remaining stock would orphan ledger value.
    pub async fn delete_product(&self, business_id: Uuid, product_id: Uuid) -> AppResult<()> {
        let product = self.get_product(business_id, product_id).await?;

        if !product.can_discontinue() {
            return Err(AppError::conflict(
                "Product",
                "Cannot discontinue a product with remaining stock; adjust stock to zero first",
            ));
        }

        sqlx::query(
            "UPDATE products SET status = $1, updated_at = NOW() WHERE id = $2 AND business_id = $3",
        )
        .bind(ProductStatus::Discontinued.as_str())
        .bind(product_id)
        .bind(business_id)
        .execute(&self.db)
        .await?;

        Ok(())
    }

    /// Adjust a product's stock and append the matching ledger entry
    ///
    /// `quantity` is a positive magnitude; the direction comes from `kind`
    /// (`adjust` treats it as an absolute target level). `reference`, when
    /// present, is stored on the ledger entry verbatim; this engine does not
    /// validate it against any other aggregate, and it does not check
    /// business ownership either. Both are the caller's responsibility.
    pub async fn adjust_stock(
        &self,
        product_id: Uuid,
        kind: MovementKind,
        quantity: Decimal,
        reason: &str,
        reference: Option<MovementRef>,
        actor_id: Uuid,
    ) -> AppResult<StockMovement> {
        let reason = reason.trim();
        if reason.is_empty() {
            return Err(AppError::validation(
                "reason",
                "Reason is required for stock adjustments",
            ));
        }

        for attempt in 1..=STOCK_CAS_ATTEMPTS {
            let row = sqlx::query_as::<_, ProductRow>(&format!(
                "SELECT {PRODUCT_COLUMNS} FROM products WHERE id = $1"
            ))
            .bind(product_id)
            .fetch_optional(&self.db)
            .await?
            .ok_or_else(|| AppError::NotFound("Product".to_string()))?;

            // Rejected transitions (non-positive quantity, would-be-negative
            // stock) return here before anything is written.
            let transition = StockTransition::compute(row.stock, kind, quantity)?;

            let mut tx = self.db.begin().await?;

            // Compare-and-swap on the stock we just read; a miss means a
            // concurrent adjustment won, so re-read and recompute.
            let updated = sqlx::query(
                "UPDATE products SET stock = $1, updated_at = NOW() WHERE id = $2 AND stock = $3",
            )
            .bind(transition.new)
            .bind(product_id)
            .bind(transition.previous)
            .execute(&mut *tx)
            .await?;

            if updated.rows_affected() == 0 {
                tx.rollback().await?;
                tracing::debug!(
                    product_id = %product_id,
                    attempt,
                    "stock CAS missed, retrying adjustment"
                );
                continue;
            }

            let movement = insert_movement(
                &mut tx,
                row.business_id,
                product_id,
                kind,
                transition,
                reason,
                reference.as_ref(),
                actor_id,
            )
            .await?;

            tx.commit().await?;

            return movement.try_into();
        }

        Err(AppError::conflict(
            "Product",
            "Stock was modified concurrently too many times; please retry",
        ))
    }

    /// Set a product's stock to an absolute level
    ///
    /// Convenience wrapper over the `adjust` movement kind, kept as its own
    /// operation because its quantity semantics (target level, not delta)
    /// differ from every other kind. The ledger entry stores the delta that
    /// was actually applied.
    pub async fn set_stock_level(
        &self,
        product_id: Uuid,
        target: Decimal,
        reason: &str,
        actor_id: Uuid,
    ) -> AppResult<StockMovement> {
        self.adjust_stock(
            product_id,
            MovementKind::Adjust,
            target,
            reason,
            None,
            actor_id,
        )
        .await
    }

    /// Active products at or below their minimum stock threshold
    pub async fn get_low_stock(&self, business_id: Uuid) -> AppResult<Vec<Product>> {
        let rows = sqlx::query_as::<_, ProductRow>(&format!(
            r#"
            SELECT {PRODUCT_COLUMNS}
            FROM products
            WHERE business_id = $1 AND status = $2 AND stock <= min_stock
            ORDER BY name ASC
            "#
        ))
        .bind(business_id)
        .bind(ProductStatus::Active.as_str())
        .fetch_all(&self.db)
        .await?;

        rows.into_iter().map(Product::try_from).collect()
    }

    /// Most recent ledger entries for a product, newest first
    ///
    /// Ownership of the product is the caller's concern (the handlers load
    /// the product scoped to the business before asking for history).
    pub async fn get_stock_history(
        &self,
        product_id: Uuid,
        limit: i64,
    ) -> AppResult<Vec<StockMovement>> {
        let limit = if limit > 0 {
            limit
        } else {
            DEFAULT_HISTORY_LIMIT
        };

        let rows = sqlx::query_as::<_, MovementRow>(&format!(
            r#"
            SELECT {MOVEMENT_COLUMNS}
            FROM stock_movements
            WHERE product_id = $1
            ORDER BY created_at DESC
            LIMIT $2
            "#
        ))
        .bind(product_id)
        .bind(limit)
        .fetch_all(&self.db)
        .await?;

        rows.into_iter().map(StockMovement::try_from).collect()
    }
}

/// Append one ledger entry inside the caller's transaction
#[allow(clippy::too_many_arguments)]
async fn insert_movement(
    tx: &mut Transaction<'_, Postgres>,
    business_id: Uuid,
    product_id: Uuid,
    kind: MovementKind,
    transition: StockTransition,
    reason: &str,
    reference: Option<&MovementRef>,
    actor_id: Uuid,
) -> Result<MovementRow, sqlx::Error> {
    sqlx::query_as::<_, MovementRow>(&format!(
        r#"
        INSERT INTO stock_movements (
            business_id, product_id, kind, quantity, previous_stock, new_stock,
            reason, reference_id, reference_kind, created_by
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
        RETURNING {MOVEMENT_COLUMNS}
        "#
    ))
    .bind(business_id)
    .bind(product_id)
    .bind(kind.as_str())
    .bind(transition.ledger_delta)
    .bind(transition.previous)
    .bind(transition.new)
    .bind(reason)
    .bind(reference.map(|r| r.id))
    .bind(reference.map(|r| r.kind.as_str()))
    .bind(actor_id)
    .fetch_one(&mut **tx)
    .await
}
