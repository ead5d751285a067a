//! Product inventory models

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use uuid::Uuid;

/// Product lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProductStatus {
    Active,
    Inactive,
    Discontinued,
}

impl ProductStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProductStatus::Active => "active",
            ProductStatus::Inactive => "inactive",
            ProductStatus::Discontinued => "discontinued",
        }
    }
}

impl FromStr for ProductStatus {
    type Err = UnknownValue;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(ProductStatus::Active),
            "inactive" => Ok(ProductStatus::Inactive),
            "discontinued" => Ok(ProductStatus::Discontinued),
            other => Err(UnknownValue {
                field: "product status",
                value: other.to_string(),
            }),
        }
    }
}

/// A value read from storage that does not match any known variant
#[derive(Debug, Clone, thiserror::Error)]
#[error("unknown {field}: {value}")]
pub struct UnknownValue {
    pub field: &'static str,
    pub value: String,
}

/// A product tracked in a business's inventory
///
/// `stock` is the live counter; every change to it is recorded in the
/// stock-movement ledger. Stock may be fractional (e.g. goods sold by
/// weight).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Product {
    pub id: Uuid,
    pub business_id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub sku: Option<String>,
    pub unit: Option<String>,
    pub cost_price: Decimal,
    pub selling_price: Decimal,
    pub stock: Decimal,
    pub min_stock: Decimal,
    pub max_stock: Option<Decimal>,
    pub status: ProductStatus,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// Whether the current stock is at or below the configured minimum
    pub fn is_low_stock(&self) -> bool {
        self.stock <= self.min_stock
    }

    /// Whether this product may transition to discontinued. Discontinuing
    /// a product that still holds stock would orphan ledger value.
    pub fn can_discontinue(&self) -> bool {
        self.stock == Decimal::ZERO
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dec(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    fn product_with_stock(stock: Decimal, min_stock: Decimal) -> Product {
        Product {
            id: Uuid::new_v4(),
            business_id: Uuid::new_v4(),
            name: "Rice 5kg".to_string(),
            description: None,
            sku: None,
            unit: None,
            cost_price: dec("100.00"),
            selling_price: dec("135.00"),
            stock,
            min_stock,
            max_stock: None,
            status: ProductStatus::Active,
            created_by: Uuid::new_v4(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_low_stock_at_threshold() {
        let p = product_with_stock(dec("5"), dec("5"));
        assert!(p.is_low_stock());
    }

    #[test]
    fn test_low_stock_above_threshold() {
        let p = product_with_stock(dec("5.1"), dec("5"));
        assert!(!p.is_low_stock());
    }

    #[test]
    fn test_discontinue_requires_zero_stock() {
        assert!(!product_with_stock(dec("0.01"), dec("5")).can_discontinue());
        assert!(product_with_stock(Decimal::ZERO, dec("5")).can_discontinue());
    }

    #[test]
    fn test_status_round_trip() {
        for status in [
            ProductStatus::Active,
            ProductStatus::Inactive,
            ProductStatus::Discontinued,
        ] {
            assert_eq!(status.as_str().parse::<ProductStatus>().unwrap(), status);
        }
        assert!("retired".parse::<ProductStatus>().is_err());
    }
}
