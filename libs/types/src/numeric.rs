//! Fixed-precision decimal helpers
//!
//! Every amount in the system is a [`rust_decimal::Decimal`] rounded to a
//! fixed number of decimal places before storage or comparison. Rounding is
//! half-away-from-zero everywhere so that results do not depend on the
//! accumulated scale of intermediate products.

use rust_decimal::{Decimal, RoundingStrategy};

/// Logical simulation time, nanoseconds since run start.
pub type Timestamp = u64;

/// Round to `decimals` places, half-away-from-zero.
pub fn round(value: Decimal, decimals: u32) -> Decimal {
    value.round_dp_with_strategy(decimals, RoundingStrategy::MidpointAwayFromZero)
}

/// `1 + leverage`, the factor between own and leveraged volume.
pub fn dec1p(leverage: Decimal) -> Decimal {
    Decimal::ONE + leverage
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_round_half_away_from_zero() {
        assert_eq!(round(dec!(0.125), 2), dec!(0.13));
        assert_eq!(round(dec!(-0.125), 2), dec!(-0.13));
        assert_eq!(round(dec!(1.004), 2), dec!(1.00));
    }

    #[test]
    fn test_dec1p() {
        assert_eq!(dec1p(dec!(0)), dec!(1));
        assert_eq!(dec1p(dec!(0.5)), dec!(1.5));
    }
}
