//! Stock-movement ledger models and the stock transition math
//!
//! A product's stock is only ever changed by applying a [`StockTransition`],
//! and every applied transition is recorded as an immutable [`StockMovement`]
//! ledger entry. Corrections are made by inserting compensating movements,
//! never by editing the ledger.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use thiserror::Error;
use uuid::Uuid;

use super::UnknownValue;

/// Reason-category for a stock change
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MovementKind {
    Purchase,
    Sale,
    Adjust,
    Damage,
    Theft,
    Return,
}

impl MovementKind {
    pub const ALL: [MovementKind; 6] = [
        MovementKind::Purchase,
        MovementKind::Sale,
        MovementKind::Adjust,
        MovementKind::Damage,
        MovementKind::Theft,
        MovementKind::Return,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            MovementKind::Purchase => "purchase",
            MovementKind::Sale => "sale",
            MovementKind::Adjust => "adjust",
            MovementKind::Damage => "damage",
            MovementKind::Theft => "theft",
            MovementKind::Return => "return",
        }
    }

    /// How this kind changes the running stock level.
    ///
    /// `adjust` is the odd one out: its quantity is an absolute target
    /// level, not a delta. Everything else is relative.
    pub fn effect(&self) -> StockEffect {
        match self {
            MovementKind::Purchase | MovementKind::Return => StockEffect::Increase,
            MovementKind::Sale | MovementKind::Damage | MovementKind::Theft => {
                StockEffect::Decrease
            }
            MovementKind::Adjust => StockEffect::SetLevel,
        }
    }
}

impl FromStr for MovementKind {
    type Err = UnknownValue;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "purchase" => Ok(MovementKind::Purchase),
            "sale" => Ok(MovementKind::Sale),
            "adjust" => Ok(MovementKind::Adjust),
            "damage" => Ok(MovementKind::Damage),
            "theft" => Ok(MovementKind::Theft),
            "return" => Ok(MovementKind::Return),
            other => Err(UnknownValue {
                field: "movement kind",
                value: other.to_string(),
            }),
        }
    }
}

/// Effect of a movement kind on the stock counter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StockEffect {
    Increase,
    Decrease,
    /// Sets the stock to an absolute level (the `adjust` kind)
    SetLevel,
}

/// Errors from the stock transition math
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StockError {
    #[error("quantity must be greater than zero")]
    NonPositiveQuantity,

    #[error("insufficient stock: available {available}, requested {requested}")]
    InsufficientStock {
        available: Decimal,
        requested: Decimal,
    },
}

/// One committed change to a product's stock level
///
/// Invariant: `new == previous + ledger_delta`, where `ledger_delta` is the
/// signed quantity stored on the ledger entry. For the `adjust` kind the
/// delta is `target - previous`, which may be negative.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StockTransition {
    pub previous: Decimal,
    pub new: Decimal,
    pub ledger_delta: Decimal,
}

impl StockTransition {
    /// Compute the transition a movement would apply to `current` stock.
    ///
    /// `quantity` is always a positive magnitude; the direction comes from
    /// the kind. Any transition that would leave stock negative is rejected
    /// without producing a value, so callers cannot half-apply it.
    pub fn compute(
        current: Decimal,
        kind: MovementKind,
        quantity: Decimal,
    ) -> Result<Self, StockError> {
        if quantity <= Decimal::ZERO {
            return Err(StockError::NonPositiveQuantity);
        }

        let new = match kind.effect() {
            StockEffect::Increase => current + quantity,
            StockEffect::Decrease => {
                if quantity > current {
                    return Err(StockError::InsufficientStock {
                        available: current,
                        requested: quantity,
                    });
                }
                current - quantity
            }
            StockEffect::SetLevel => quantity,
        };

        Ok(Self {
            previous: current,
            new,
            ledger_delta: new - current,
        })
    }

    /// Compute an absolute set-level transition (the `adjust` kind),
    /// spelled out as its own operation so the asymmetry with the relative
    /// kinds stays visible at call sites.
    pub fn set_level(current: Decimal, target: Decimal) -> Result<Self, StockError> {
        Self::compute(current, MovementKind::Adjust, target)
    }
}

/// Reference from a movement back to the transaction that caused it
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MovementRef {
    pub id: Uuid,
    /// Kind of the originating aggregate, e.g. "sale"
    pub kind: String,
}

impl MovementRef {
    pub fn sale(id: Uuid) -> Self {
        Self {
            id,
            kind: "sale".to_string(),
        }
    }
}

/// One immutable ledger entry describing a single stock change and why
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StockMovement {
    pub id: Uuid,
    pub business_id: Uuid,
    pub product_id: Uuid,
    pub kind: MovementKind,
    /// Signed: positive increases stock, negative decreases it. For the
    /// `adjust` kind this stores the delta actually applied, not the target.
    pub quantity: Decimal,
    pub previous: Decimal,
    pub new: Decimal,
    pub reason: String,
    pub reference_id: Option<Uuid>,
    pub reference_kind: Option<String>,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dec(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    #[test]
    fn test_purchase_increases_stock() {
        let t = StockTransition::compute(dec("10"), MovementKind::Purchase, dec("3")).unwrap();
        assert_eq!(t.previous, dec("10"));
        assert_eq!(t.new, dec("13"));
        assert_eq!(t.ledger_delta, dec("3"));
    }

    #[test]
    fn test_sale_decreases_stock() {
        let t = StockTransition::compute(dec("13"), MovementKind::Sale, dec("5")).unwrap();
        assert_eq!(t.new, dec("8"));
        assert_eq!(t.ledger_delta, dec("-5"));
    }

    #[test]
    fn test_sale_of_entire_stock_is_allowed() {
        let t = StockTransition::compute(dec("5"), MovementKind::Damage, dec("5")).unwrap();
        assert_eq!(t.new, Decimal::ZERO);
    }

    #[test]
    fn test_insufficient_stock_rejected() {
        let err = StockTransition::compute(dec("13"), MovementKind::Sale, dec("20")).unwrap_err();
        assert_eq!(
            err,
            StockError::InsufficientStock {
                available: dec("13"),
                requested: dec("20"),
            }
        );
    }

    #[test]
    fn test_adjust_sets_absolute_level() {
        let t = StockTransition::set_level(dec("8"), dec("20")).unwrap();
        assert_eq!(t.new, dec("20"));
        assert_eq!(t.ledger_delta, dec("12"));

        let down = StockTransition::set_level(dec("8"), dec("2")).unwrap();
        assert_eq!(down.new, dec("2"));
        assert_eq!(down.ledger_delta, dec("-6"));
    }

    #[test]
    fn test_zero_quantity_rejected_for_every_kind() {
        for kind in MovementKind::ALL {
            assert_eq!(
                StockTransition::compute(dec("10"), kind, Decimal::ZERO),
                Err(StockError::NonPositiveQuantity)
            );
        }
    }

    #[test]
    fn test_fractional_quantities() {
        let t = StockTransition::compute(dec("2.5"), MovementKind::Sale, dec("0.75")).unwrap();
        assert_eq!(t.new, dec("1.75"));
        assert_eq!(t.ledger_delta, dec("-0.75"));
    }

    #[test]
    fn test_kind_round_trip() {
        for kind in MovementKind::ALL {
            assert_eq!(kind.as_str().parse::<MovementKind>().unwrap(), kind);
        }
        assert!("transfer".parse::<MovementKind>().is_err());
    }
}
