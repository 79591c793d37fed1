//! End-to-end determinism of full simulation runs

use accounting::AccountRegistry;
use simulation::{verify_replay, SimConfig, Simulation};

#[test]
fn replay_matches_across_books_and_agents() {
    let config = SimConfig { steps: 1_500, agents: 6, books: 3, ..SimConfig::default() };
    let outcome = verify_replay(&config).unwrap();
    assert!(outcome.stats.trades > 0, "run produced no trades");
    assert!(outcome.stats.cancelled > 0, "run produced no cancels");
}

#[test]
fn final_ledger_survives_json_round_trip() {
    let config = SimConfig { steps: 500, ..SimConfig::default() };
    let outcome = Simulation::new(config).unwrap().run();

    let json = serde_json::to_string(&outcome.accounts).unwrap();
    let restored = AccountRegistry::from_snapshot(&serde_json::from_str(&json).unwrap());
    assert_eq!(restored.snapshot(), outcome.accounts);
}

#[test]
fn seed_changes_the_run() {
    let base = SimConfig { steps: 500, ..SimConfig::default() };
    let a = Simulation::new(base.clone()).unwrap().run();
    let b = Simulation::new(SimConfig { seed: 7, ..base }).unwrap().run();
    assert_ne!(a.trades, b.trades);
}
