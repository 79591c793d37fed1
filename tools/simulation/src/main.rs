use simulation::{RunReport, SimConfig, Simulation};
use std::io::stdout;

fn main() -> Result<(), anyhow::Error> {
    tracing_subscriber::fmt::init();

    let config = match std::env::args().nth(1) {
        Some(path) => SimConfig::load(&path)?,
        None => SimConfig::default(),
    };
    tracing::info!(seed = config.seed, steps = config.steps, "starting simulation");

    let outcome = Simulation::new(config.clone())?.run();
    RunReport::new(&config, &outcome).write_json(stdout().lock())?;
    println!();

    Ok(())
}
