//! Simulation run configuration
//!
//! Loaded from a JSON file; every field has a default so a partial (or
//! empty) document is a valid run description.

use exchange::ValidatorParams;
use matching_engine::BookParams;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use types::fee::{default_fee_tiers, FeePolicy, FeeTier};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    /// RNG seed. Two runs with the same config produce identical trades
    /// and final ledgers.
    pub seed: u64,
    pub steps: u64,
    pub agents: u64,
    pub books: u64,

    /// Starting balances given to every agent on every book
    pub initial_base: Decimal,
    pub initial_quote: Decimal,
    pub base_symbol: String,
    pub quote_symbol: String,

    /// Anchor price used while a book has no mid price yet
    pub initial_price: Decimal,

    pub price_decimals: u32,
    pub volume_decimals: u32,

    pub validator: ValidatorParams,

    /// Empty means the standard tier schedule
    pub fee_tiers: Vec<FeeTier>,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            steps: 2_000,
            agents: 8,
            books: 2,
            initial_base: dec!(1000),
            initial_quote: dec!(1000000),
            base_symbol: "BTC".into(),
            quote_symbol: "USD".into(),
            initial_price: dec!(100),
            price_decimals: 4,
            volume_decimals: 8,
            validator: ValidatorParams::default(),
            fee_tiers: Vec::new(),
        }
    }
}

impl SimConfig {
    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let file = File::open(path.as_ref())?;
        Ok(serde_json::from_reader(BufReader::new(file))?)
    }

    pub fn book_params(&self) -> BookParams {
        BookParams {
            price_decimals: self.price_decimals,
            volume_decimals: self.volume_decimals,
        }
    }

    pub fn fee_policy(&self) -> FeePolicy {
        if self.fee_tiers.is_empty() {
            FeePolicy::new(default_fee_tiers())
        } else {
            FeePolicy::new(self.fee_tiers.clone())
        }
    }
}
