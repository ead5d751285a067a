//! Tests for the stock adjustment engine's transition math
//! Verifies ledger consistency, non-negativity, and the adjust-kind
//! absolute-set semantics.

use proptest::prelude::*;
use rust_decimal::Decimal;
use std::str::FromStr;

use shared::{MovementKind, Product, ProductStatus, StockEffect, StockError, StockTransition};

/// Helper to create Decimal from string
fn dec(s: &str) -> Decimal {
    Decimal::from_str(s).unwrap()
}

fn product_with_stock(stock: Decimal, min_stock: Decimal) -> Product {
    Product {
        id: uuid::Uuid::new_v4(),
        business_id: uuid::Uuid::new_v4(),
        name: "Arabica beans 1kg".to_string(),
        description: None,
        sku: Some("AB-1KG".to_string()),
        unit: Some("bag".to_string()),
        cost_price: dec("120"),
        selling_price: dec("180"),
        stock,
        min_stock,
        max_stock: None,
        status: ProductStatus::Active,
        created_by: uuid::Uuid::new_v4(),
        created_at: chrono::Utc::now(),
        updated_at: chrono::Utc::now(),
    }
}

// ============================================================================
// Unit Tests
// ============================================================================

mod unit_tests {
    use super::*;

    #[test]
    fn test_direction_policy_per_kind() {
        assert_eq!(MovementKind::Purchase.effect(), StockEffect::Increase);
        assert_eq!(MovementKind::Return.effect(), StockEffect::Increase);
        assert_eq!(MovementKind::Sale.effect(), StockEffect::Decrease);
        assert_eq!(MovementKind::Damage.effect(), StockEffect::Decrease);
        assert_eq!(MovementKind::Theft.effect(), StockEffect::Decrease);
        assert_eq!(MovementKind::Adjust.effect(), StockEffect::SetLevel);
    }

    #[test]
    fn test_ledger_invariant_holds_for_relative_kinds() {
        let t = StockTransition::compute(dec("10"), MovementKind::Purchase, dec("4.5")).unwrap();
        assert_eq!(t.previous + t.ledger_delta, t.new);

        let t = StockTransition::compute(dec("10"), MovementKind::Theft, dec("4.5")).unwrap();
        assert_eq!(t.previous + t.ledger_delta, t.new);
        assert_eq!(t.ledger_delta, dec("-4.5"));
    }

    #[test]
    fn test_adjust_stores_delta_not_target() {
        // Setting stock 8 -> 3 must land a -5 delta on the ledger
        let t = StockTransition::set_level(dec("8"), dec("3")).unwrap();
        assert_eq!(t.new, dec("3"));
        assert_eq!(t.ledger_delta, dec("-5"));
        assert_eq!(t.previous + t.ledger_delta, t.new);
    }

    #[test]
    fn test_adjust_to_same_level_is_zero_delta() {
        let t = StockTransition::set_level(dec("8"), dec("8")).unwrap();
        assert_eq!(t.ledger_delta, Decimal::ZERO);
    }

    #[test]
    fn test_negative_quantity_rejected() {
        for kind in MovementKind::ALL {
            assert_eq!(
                StockTransition::compute(dec("10"), kind, dec("-1")),
                Err(StockError::NonPositiveQuantity)
            );
        }
    }

    #[test]
    fn test_decrease_below_zero_rejected_with_amounts() {
        let err =
            StockTransition::compute(dec("2.5"), MovementKind::Damage, dec("2.51")).unwrap_err();
        assert_eq!(
            err,
            StockError::InsufficientStock {
                available: dec("2.5"),
                requested: dec("2.51"),
            }
        );
    }

    #[test]
    fn test_decrease_to_exactly_zero_allowed() {
        let t = StockTransition::compute(dec("2.5"), MovementKind::Sale, dec("2.5")).unwrap();
        assert_eq!(t.new, Decimal::ZERO);
    }

    #[test]
    fn test_low_stock_at_threshold() {
        // stock == min_stock counts as low
        assert!(product_with_stock(dec("5"), dec("5")).is_low_stock());
        assert!(product_with_stock(dec("4.99"), dec("5")).is_low_stock());
        assert!(!product_with_stock(dec("5.01"), dec("5")).is_low_stock());
    }

    #[test]
    fn test_discontinue_gated_on_zero_stock() {
        // The guard applies to both the delete path and a status edit;
        // remaining stock blocks the transition either way.
        assert!(!product_with_stock(dec("3"), dec("5")).can_discontinue());
        assert!(!product_with_stock(dec("0.0001"), Decimal::ZERO).can_discontinue());
        assert!(product_with_stock(Decimal::ZERO, dec("5")).can_discontinue());
    }

    #[test]
    fn test_low_stock_zero_threshold() {
        // min_stock 0 only flags fully depleted products
        assert!(product_with_stock(Decimal::ZERO, Decimal::ZERO).is_low_stock());
        assert!(!product_with_stock(dec("0.01"), Decimal::ZERO).is_low_stock());
    }
}

// ============================================================================
// Property Tests
// ============================================================================

fn stock_strategy() -> impl Strategy<Value = Decimal> {
    (0u64..1_000_000).prop_map(|n| Decimal::new(n as i64, 2))
}

fn quantity_strategy() -> impl Strategy<Value = Decimal> {
    (1u64..1_000_000).prop_map(|n| Decimal::new(n as i64, 2))
}

fn kind_strategy() -> impl Strategy<Value = MovementKind> {
    prop::sample::select(MovementKind::ALL.to_vec())
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Ledger consistency: every accepted transition satisfies
    /// new = previous + delta
    #[test]
    fn prop_ledger_invariant(
        stock in stock_strategy(),
        kind in kind_strategy(),
        quantity in quantity_strategy()
    ) {
        if let Ok(t) = StockTransition::compute(stock, kind, quantity) {
            prop_assert_eq!(t.previous, stock);
            prop_assert_eq!(t.previous + t.ledger_delta, t.new);
        }
    }

    /// Non-negativity: no accepted transition leaves stock below zero
    #[test]
    fn prop_stock_never_negative(
        stock in stock_strategy(),
        kind in kind_strategy(),
        quantity in quantity_strategy()
    ) {
        if let Ok(t) = StockTransition::compute(stock, kind, quantity) {
            prop_assert!(t.new >= Decimal::ZERO);
        }
    }

    /// Rejection is total: an error carries no partial state, and decreases
    /// larger than the available stock always error
    #[test]
    fn prop_overdraw_always_rejected(
        stock in stock_strategy(),
        excess in quantity_strategy()
    ) {
        let requested = stock + excess;
        let result = StockTransition::compute(stock, MovementKind::Sale, requested);
        prop_assert_eq!(
            result,
            Err(StockError::InsufficientStock { available: stock, requested })
        );
    }

    /// Adjust always lands exactly on the target, regardless of direction
    #[test]
    fn prop_adjust_reaches_target(
        stock in stock_strategy(),
        target in quantity_strategy()
    ) {
        let t = StockTransition::set_level(stock, target);
        prop_assert!(t.is_ok());
        let t = t.unwrap();
        prop_assert_eq!(t.new, target);
        prop_assert_eq!(t.ledger_delta, target - stock);
    }

    /// Applying a transition then a compensating return restores the
    /// original level (the sale/void round trip)
    #[test]
    fn prop_sale_then_return_restores_stock(
        stock in stock_strategy(),
        quantity in quantity_strategy()
    ) {
        if let Ok(sale) = StockTransition::compute(stock, MovementKind::Sale, quantity) {
            let back = StockTransition::compute(sale.new, MovementKind::Return, quantity).unwrap();
            prop_assert_eq!(back.new, stock);
            prop_assert_eq!(sale.ledger_delta + back.ledger_delta, Decimal::ZERO);
        }
    }

    /// The low-stock predicate is a pure threshold check: stable under
    /// repeated evaluation and consistent with the comparison it encodes
    #[test]
    fn prop_low_stock_matches_threshold(
        stock in stock_strategy(),
        min_stock in stock_strategy()
    ) {
        let product = product_with_stock(stock, min_stock);
        prop_assert_eq!(product.is_low_stock(), stock <= min_stock);
        prop_assert_eq!(product.is_low_stock(), product.is_low_stock());
    }
}
