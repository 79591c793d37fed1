//! Deterministic multi-agent exchange simulation
//!
//! Drives the exchange core with a seeded stream of placements, cancels,
//! and clock advances. Same seed, same config: identical trades, identical
//! final ledgers.
//!
//! # Modules
//! - `config` — JSON run configuration
//! - `driver` — seeded multi-agent driver and run statistics
//! - `replay` — run-twice determinism verification
//! - `export` — JSON run reports

pub mod config;
pub mod driver;
pub mod export;
pub mod replay;

pub use config::SimConfig;
pub use driver::{SimOutcome, SimStats, Simulation};
pub use export::RunReport;
pub use replay::verify_replay;
