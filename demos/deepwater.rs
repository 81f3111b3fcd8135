//! Loop Current plume, zoned vs constant velocity
//!
//! Runs the default YAML description (or the file given as first
//! argument) twice: once with its velocity zones and once with the zones
//! removed, then prints the two concentration profiles side by side.
//!
//! ```bash
//! RUST_LOG=plume_rs=info cargo run --example deepwater
//! RUST_LOG=plume_rs=debug cargo run --example deepwater -- my_run.yaml
//! ```

use std::error::Error;

use plume_rs::config::TransportConfig;
use plume_rs::physics::units;
use plume_rs::solver::{SimulationResult, Simulator};
use tracing_subscriber::EnvFilter;

fn run(cfg: &TransportConfig) -> Result<SimulationResult, Box<dyn Error>> {
    let (scenario, config) = cfg.build()?;
    let result = Simulator::configure(&scenario, config)?.run_to_completion()?;
    Ok(result)
}

fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let zoned_cfg = match std::env::args().nth(1) {
        Some(path) => TransportConfig::load(path)?,
        None => TransportConfig::default(),
    };

    let mut constant_cfg = zoned_cfg.clone();
    constant_cfg.velocity.zones.clear();

    let zoned = run(&zoned_cfg)?;
    let constant = run(&constant_cfg)?;

    let (scenario, _) = zoned_cfg.build()?;
    let grid = &scenario.grid;

    println!("Release: {:.0} m³ over 87 days", units::release_volume(60_000.0, 87.0));
    println!(
        "Steps: {}  final time: {:.3}  stability: {}",
        zoned.steps, zoned.final_time, zoned.verdict
    );
    println!();
    println!("{:>10} {:>16} {:>16}", "x [km]", "zoned", "constant");
    for i in 0..grid.node_count() {
        println!(
            "{:>10.0} {:>16.2} {:>16.2}",
            grid.position(i) / 1000.0,
            zoned.final_field[i],
            constant.final_field[i]
        );
    }

    if zoned.saturated || constant.saturated {
        println!("\nwarning: a run ended saturated at the ceiling");
    }

    Ok(())
}
