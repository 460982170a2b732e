//! Money rounding policy.
//!
//! All monetary values in this crate are `rust_decimal::Decimal` at a fixed
//! scale of 2 (the persisted column type is `NUMERIC(_, 2)`). Two distinct
//! rounding rules are used on purpose: pricing rounds half-away-from-zero,
//! tax rounds up. Mixing them silently is an easy bug; this module makes
//! each call site name the policy it wants.

use rust_decimal::{Decimal, RoundingStrategy};

/// Round to 2 decimal places, half-away-from-zero (commercial rounding).
/// Used by the pricing resolver.
pub fn round_price(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Round to 2 decimal places, always up in magnitude. Used by the tax
/// engine: `percentage` and `compound` tax amounts round up, `fixed`
/// amounts are already at scale 2.
pub fn round_up(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::AwayFromZero)
}

/// Clamp a resolved price to non-negative.
pub fn clamp_non_negative(value: Decimal) -> Decimal {
    if value.is_sign_negative() {
        Decimal::ZERO
    } else {
        value
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn round_price_half_away_from_zero() {
        assert_eq!(round_price(dec!(1.005)), dec!(1.01));
        assert_eq!(round_price(dec!(-1.005)), dec!(-1.01));
        assert_eq!(round_price(dec!(1.004)), dec!(1.00));
    }

    #[test]
    fn round_up_always_rounds_away_from_zero() {
        assert_eq!(round_up(dec!(1.001)), dec!(1.01));
        assert_eq!(round_up(dec!(1.000)), dec!(1.00));
    }

    #[test]
    fn clamp_non_negative_floors_at_zero() {
        assert_eq!(clamp_non_negative(dec!(-5.00)), dec!(0.00));
        assert_eq!(clamp_non_negative(dec!(5.00)), dec!(5.00));
    }
}
