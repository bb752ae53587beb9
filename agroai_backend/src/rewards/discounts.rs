use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Discount rate in percent per loyalty tier, Bronze (0) through Diamond (4).
pub const TIER_DISCOUNT_RATES: [u64; 5] = [5, 10, 15, 20, 25];

/// Flat cashback rate in percent, paid in AGRO regardless of tier.
pub const CASHBACK_RATE: u64 = 10;

#[derive(Debug, Error)]
pub enum DiscountError {
    #[error("purchase amount must be positive, got {0}")]
    InvalidAmount(f64),
}

/// Discount and cashback decision for one purchase.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DiscountDecision {
    pub discount_rate: u64,
    pub discount_amount: f64,
    pub final_price: f64,
    pub cashback_amount: f64,
}

/// Map a purchase amount and loyalty tier to a discount decision.
///
/// Out-of-range tiers clamp to Diamond; a non-positive amount is an input
/// error, never coerced.
pub fn calculate_discount(purchase_amount: f64, tier: u64) -> Result<DiscountDecision, DiscountError> {
    if !purchase_amount.is_finite() || purchase_amount <= 0.0 {
        return Err(DiscountError::InvalidAmount(purchase_amount));
    }

    let discount_rate = TIER_DISCOUNT_RATES[tier.min(4) as usize];
    let discount_amount = purchase_amount * discount_rate as f64 / 100.0;
    let cashback_amount = purchase_amount * CASHBACK_RATE as f64 / 100.0;

    Ok(DiscountDecision {
        discount_rate,
        discount_amount,
        final_price: purchase_amount - discount_amount,
        cashback_amount,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn rates_are_strictly_increasing_in_tier() {
        let mut previous = 0;
        for tier in 0..5u64 {
            let decision = calculate_discount(100.0, tier).unwrap();
            assert!(decision.discount_rate > previous);
            assert_eq!(decision.discount_rate, TIER_DISCOUNT_RATES[tier as usize]);
            previous = decision.discount_rate;
        }
    }

    #[test]
    fn out_of_range_tier_clamps_to_diamond() {
        let decision = calculate_discount(50.0, 99).unwrap();
        assert_eq!(decision.discount_rate, 25);
    }

    #[test]
    fn cashback_is_flat_ten_percent() {
        for tier in 0..5u64 {
            let decision = calculate_discount(80.0, tier).unwrap();
            assert!((decision.cashback_amount - 8.0).abs() < 1e-9);
        }
    }

    #[test]
    fn non_positive_amount_is_rejected() {
        assert!(calculate_discount(0.0, 2).is_err());
        assert!(calculate_discount(-10.0, 2).is_err());
        assert!(calculate_discount(f64::NAN, 2).is_err());
    }

    proptest! {
        #[test]
        fn final_price_matches_rate(amount in 0.01f64..1_000_000.0, tier in 0u64..5) {
            let decision = calculate_discount(amount, tier).unwrap();
            let expected = amount * (1.0 - decision.discount_rate as f64 / 100.0);
            prop_assert!((decision.final_price - expected).abs() < 1e-6);
            prop_assert!(decision.final_price < amount);
        }
    }
}
