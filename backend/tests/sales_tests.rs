//! Tests for the sale lifecycle: totals, the completed -> voided state
//! machine, and the sale/void compensation symmetry.

use proptest::prelude::*;
use rust_decimal::Decimal;
use std::str::FromStr;

use shared::{MovementKind, MovementRef, Sale, SaleStatus, StockTransition};

/// Helper to create Decimal from string
fn dec(s: &str) -> Decimal {
    Decimal::from_str(s).unwrap()
}

// ============================================================================
// Unit Tests
// ============================================================================

mod unit_tests {
    use super::*;

    #[test]
    fn test_total_rounded_to_two_decimals() {
        assert_eq!(Sale::compute_total(dec("3"), dec("19.99")), dec("59.97"));
        assert_eq!(Sale::compute_total(dec("0.5"), dec("7.00")), dec("3.50"));
    }

    #[test]
    fn test_total_midpoint_rounds_away_from_zero() {
        // 1.5 * 0.01 = 0.015 -> 0.02
        assert_eq!(Sale::compute_total(dec("1.5"), dec("0.01")), dec("0.02"));
        // 2.5 * 0.125 = 0.3125 -> 0.31
        assert_eq!(Sale::compute_total(dec("2.5"), dec("0.125")), dec("0.31"));
    }

    #[test]
    fn test_fractional_quantity_total() {
        // 0.335 kg at 80.00/kg = 26.80
        assert_eq!(Sale::compute_total(dec("0.335"), dec("80.00")), dec("26.80"));
    }

    #[test]
    fn test_completed_can_void_and_update() {
        assert!(SaleStatus::Completed.can_void());
        assert!(SaleStatus::Completed.can_update());
    }

    #[test]
    fn test_voided_is_terminal() {
        assert!(!SaleStatus::Voided.can_void());
        assert!(!SaleStatus::Voided.can_update());
    }

    #[test]
    fn test_status_round_trip() {
        assert_eq!(
            "completed".parse::<SaleStatus>().unwrap(),
            SaleStatus::Completed
        );
        assert_eq!("voided".parse::<SaleStatus>().unwrap(), SaleStatus::Voided);
        assert!("refunded".parse::<SaleStatus>().is_err());
    }

    #[test]
    fn test_sale_reference_kind() {
        let sale_id = uuid::Uuid::new_v4();
        let reference = MovementRef::sale(sale_id);
        assert_eq!(reference.id, sale_id);
        assert_eq!(reference.kind, "sale");
    }

    #[test]
    fn test_void_compensation_is_exact() {
        // Selling 3 units from 10, then voiding, must restore 10 and leave
        // two ledger deltas that cancel out.
        let sale = StockTransition::compute(dec("10"), MovementKind::Sale, dec("3")).unwrap();
        assert_eq!(sale.new, dec("7"));

        let void = StockTransition::compute(sale.new, MovementKind::Return, dec("3")).unwrap();
        assert_eq!(void.new, dec("10"));
        assert_eq!(sale.ledger_delta + void.ledger_delta, Decimal::ZERO);
    }
}

// ============================================================================
// Property Tests
// ============================================================================

fn money_strategy() -> impl Strategy<Value = Decimal> {
    (1u64..100_000).prop_map(|n| Decimal::new(n as i64, 2))
}

fn quantity_strategy() -> impl Strategy<Value = Decimal> {
    (1u64..10_000).prop_map(|n| Decimal::new(n as i64, 2))
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// total is quantity * unit_price to the cent, and never negative
    #[test]
    fn prop_total_matches_product(
        quantity in quantity_strategy(),
        unit_price in money_strategy()
    ) {
        let total = Sale::compute_total(quantity, unit_price);
        let exact = quantity * unit_price;
        prop_assert!(total >= Decimal::ZERO);
        prop_assert!(total.scale() <= 2);
        // Rounding moves the value by at most half a cent
        prop_assert!((total - exact).abs() <= dec("0.005"));
    }

    /// total is deterministic: recomputing from the same inputs agrees
    #[test]
    fn prop_total_deterministic(
        quantity in quantity_strategy(),
        unit_price in money_strategy()
    ) {
        prop_assert_eq!(
            Sale::compute_total(quantity, unit_price),
            Sale::compute_total(quantity, unit_price)
        );
    }

    /// A create/void pair never changes net stock, for any starting level
    /// that allows the sale
    #[test]
    fn prop_create_void_net_zero(
        stock in (0u64..1_000_000).prop_map(|n| Decimal::new(n as i64, 2)),
        quantity in quantity_strategy()
    ) {
        if let Ok(sale) = StockTransition::compute(stock, MovementKind::Sale, quantity) {
            let void =
                StockTransition::compute(sale.new, MovementKind::Return, quantity).unwrap();
            prop_assert_eq!(void.new, stock);
        }
    }
}
