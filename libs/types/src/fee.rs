//! Fee calculation types
//!
//! Fees are charged on the quote notional of each trade and deducted from
//! the settling legs. Rates are selected per agent from a tier table keyed
//! by rolling traded volume.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Maker/taker rate pair applied to one trade side
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeeRates {
    pub maker: Decimal,
    pub taker: Decimal,
}

impl FeeRates {
    pub fn zero() -> Self {
        Self { maker: Decimal::ZERO, taker: Decimal::ZERO }
    }
}

/// One row of the volume-tiered fee schedule
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeeTier {
    /// Rolling traded volume (quote) required to qualify for this tier
    pub volume_threshold: Decimal,
    pub maker_rate: Decimal,
    pub taker_rate: Decimal,
}

/// Tiered fee schedule
///
/// Tiers must be sorted by ascending `volume_threshold` with the first at
/// zero; an agent gets the highest tier whose threshold they have reached.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeePolicy {
    tiers: Vec<FeeTier>,
}

impl FeePolicy {
    pub fn new(mut tiers: Vec<FeeTier>) -> Self {
        assert!(!tiers.is_empty(), "fee schedule needs at least one tier");
        tiers.sort_by(|a, b| a.volume_threshold.cmp(&b.volume_threshold));
        assert!(
            tiers[0].volume_threshold.is_zero(),
            "lowest fee tier must start at zero volume"
        );
        Self { tiers }
    }

    /// Single-tier schedule with fixed rates
    pub fn flat(rates: FeeRates) -> Self {
        Self::new(vec![FeeTier {
            volume_threshold: Decimal::ZERO,
            maker_rate: rates.maker,
            taker_rate: rates.taker,
        }])
    }

    /// No fees at all (tests, calibration runs)
    pub fn zero() -> Self {
        Self::flat(FeeRates::zero())
    }

    /// Rates for an agent with the given rolling traded volume
    pub fn rates_for(&self, rolling_volume: Decimal) -> FeeRates {
        let tier = self
            .tiers
            .iter()
            .rev()
            .find(|t| rolling_volume >= t.volume_threshold)
            .unwrap_or(&self.tiers[0]);
        FeeRates { maker: tier.maker_rate, taker: tier.taker_rate }
    }

    pub fn tiers(&self) -> &[FeeTier] {
        &self.tiers
    }
}

/// Standard fee schedule used by the default simulation setup
pub fn default_fee_tiers() -> Vec<FeeTier> {
    vec![
        FeeTier {
            volume_threshold: Decimal::ZERO,
            maker_rate: Decimal::from_str_exact("0.0002").unwrap(), // 0.02% maker
            taker_rate: Decimal::from_str_exact("0.0005").unwrap(), // 0.05% taker
        },
        FeeTier {
            volume_threshold: Decimal::from(1_000_000),
            maker_rate: Decimal::from_str_exact("0.00015").unwrap(),
            taker_rate: Decimal::from_str_exact("0.00045").unwrap(),
        },
        FeeTier {
            volume_threshold: Decimal::from(10_000_000),
            maker_rate: Decimal::from_str_exact("0.0001").unwrap(),
            taker_rate: Decimal::from_str_exact("0.0004").unwrap(),
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_tier_selection_by_volume() {
        let policy = FeePolicy::new(default_fee_tiers());

        assert_eq!(policy.rates_for(dec!(0)).taker, dec!(0.0005));
        assert_eq!(policy.rates_for(dec!(999999)).taker, dec!(0.0005));
        assert_eq!(policy.rates_for(dec!(1000000)).taker, dec!(0.00045));
        assert_eq!(policy.rates_for(dec!(25000000)).maker, dec!(0.0001));
    }

    #[test]
    fn test_flat_policy() {
        let policy = FeePolicy::flat(FeeRates { maker: dec!(0.001), taker: dec!(0.002) });
        assert_eq!(policy.rates_for(dec!(1000000000)).maker, dec!(0.001));
    }

    #[test]
    fn test_zero_policy() {
        let rates = FeePolicy::zero().rates_for(dec!(123));
        assert!(rates.maker.is_zero() && rates.taker.is_zero());
    }

    #[test]
    #[should_panic(expected = "lowest fee tier must start at zero volume")]
    fn test_missing_base_tier_panics() {
        FeePolicy::new(vec![FeeTier {
            volume_threshold: dec!(100),
            maker_rate: dec!(0),
            taker_rate: dec!(0),
        }]);
    }
}
