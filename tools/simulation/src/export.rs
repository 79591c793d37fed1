//! JSON export of a finished run

use serde::Serialize;
use std::io::Write;

use crate::config::SimConfig;
use crate::driver::SimOutcome;

/// Self-contained run report: the config that produced it plus everything
/// it produced. Feeding the embedded config back in reproduces the run.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport<'a> {
    pub config: &'a SimConfig,
    pub stats: &'a crate::driver::SimStats,
    pub trades: usize,
    pub accounts: &'a accounting::RegistrySnapshot,
}

impl<'a> RunReport<'a> {
    pub fn new(config: &'a SimConfig, outcome: &'a SimOutcome) -> Self {
        Self {
            config,
            stats: &outcome.stats,
            trades: outcome.trades.len(),
            accounts: &outcome.accounts,
        }
    }

    pub fn write_json(&self, out: impl Write) -> serde_json::Result<()> {
        serde_json::to_writer_pretty(out, self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver::Simulation;

    #[test]
    fn test_report_serializes() {
        let config = SimConfig { steps: 50, ..SimConfig::default() };
        let outcome = Simulation::new(config.clone()).unwrap().run();
        let mut buffer = Vec::new();
        RunReport::new(&config, &outcome).write_json(&mut buffer).unwrap();

        let parsed: serde_json::Value = serde_json::from_slice(&buffer).unwrap();
        assert_eq!(parsed["config"]["seed"], 42);
        assert!(parsed["accounts"]["accounts"].is_object());
    }
}
