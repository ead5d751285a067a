//! Sales models

use chrono::{DateTime, Utc};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use uuid::Uuid;

use super::UnknownValue;

/// Sale lifecycle status
///
/// The only transition is `completed -> voided`; voided is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SaleStatus {
    Completed,
    Voided,
}

impl SaleStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SaleStatus::Completed => "completed",
            SaleStatus::Voided => "voided",
        }
    }

    /// Whether a sale in this status may be voided
    pub fn can_void(&self) -> bool {
        matches!(self, SaleStatus::Completed)
    }

    /// Whether a sale in this status may still have its note edited
    pub fn can_update(&self) -> bool {
        matches!(self, SaleStatus::Completed)
    }
}

impl FromStr for SaleStatus {
    type Err = UnknownValue;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "completed" => Ok(SaleStatus::Completed),
            "voided" => Ok(SaleStatus::Voided),
            other => Err(UnknownValue {
                field: "sale status",
                value: other.to_string(),
            }),
        }
    }
}

/// A recorded sale, optionally linked to an inventory product
///
/// A product-linked sale owns exactly one forward `sale` stock movement
/// and, if voided, exactly one compensating `return` movement, both
/// referencing this sale's id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Sale {
    pub id: Uuid,
    pub business_id: Uuid,
    pub product_id: Option<Uuid>,
    pub quantity: Decimal,
    pub unit_price: Decimal,
    pub total: Decimal,
    pub note: Option<String>,
    pub status: SaleStatus,
    /// False when the stock adjustment for this sale (or its void) failed
    /// after the sale itself committed; the inventory side is then pending
    /// reconciliation.
    pub stock_synced: bool,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
}

impl Sale {
    /// Total amount for a sale: quantity x unit price, rounded to 2 decimal
    /// places, half away from zero.
    pub fn compute_total(quantity: Decimal, unit_price: Decimal) -> Decimal {
        (quantity * unit_price).round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dec(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    #[test]
    fn test_total_is_quantity_times_price() {
        assert_eq!(Sale::compute_total(dec("5"), dec("2.00")), dec("10.00"));
    }

    #[test]
    fn test_total_rounds_half_away_from_zero() {
        // 3 * 0.335 = 1.005 -> 1.01
        assert_eq!(Sale::compute_total(dec("3"), dec("0.335")), dec("1.01"));
    }

    #[test]
    fn test_voided_is_terminal() {
        assert!(SaleStatus::Completed.can_void());
        assert!(!SaleStatus::Voided.can_void());
        assert!(!SaleStatus::Voided.can_update());
    }
}
