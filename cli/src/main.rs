//! Command-line driver for the cellular FCA simulator.
//!
//! Runs the configured call workload against one channel scheme or both
//! and prints the blocked/dropped statistics. With no arguments it runs
//! the reference comparison: plain FCA against FCA with one reserved
//! handover channel, 10,000 stochastic calls each.

use std::env;
use std::error::Error;
use std::fs;
use std::process::ExitCode;

use cellular_simulator_core_rs::{
    CallSource, SchemeConfig, Simulation, SimulationConfig, SimulationReport, StochasticSource,
    TraceSource, TrafficConfig,
};
use env_logger::Builder;
use log::{info, LevelFilter};
use serde::Deserialize;

/// Everything the binary can be told from a JSON config file
#[derive(Debug, Deserialize)]
#[serde(default)]
struct RunConfig {
    /// Engine parameters (stations, channels, warm-up, seed, scheme)
    simulation: SimulationConfig,

    /// Distribution parameters for stochastic traffic
    traffic: TrafficConfig,

    /// Replay this trace file instead of generating traffic
    trace_file: Option<String>,

    /// Run both schemes back to back instead of just the configured one
    compare_schemes: bool,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            simulation: SimulationConfig::default(),
            traffic: TrafficConfig::default(),
            trace_file: None,
            compare_schemes: true,
        }
    }
}

fn usage() {
    println!("Usage: cellular-simulator [CONFIG.json]");
    println!();
    println!("Simulates call traffic along a linear chain of cellular base");
    println!("stations under fixed channel allocation and reports blocked");
    println!("and dropped call rates.");
    println!();
    println!("Without a config file the reference run is used: 20 stations,");
    println!("10 channels each, 10,000 stochastic calls, both schemes.");
}

fn main() -> ExitCode {
    Builder::new().filter_level(LevelFilter::Info).init();

    let args: Vec<String> = env::args().skip(1).collect();
    if args.iter().any(|a| a == "-h" || a == "--help") {
        usage();
        return ExitCode::SUCCESS;
    }
    if args.len() > 1 {
        usage();
        return ExitCode::FAILURE;
    }

    match run(args.first().map(String::as_str)) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(config_path: Option<&str>) -> Result<(), Box<dyn Error>> {
    let run_config = match config_path {
        Some(path) => {
            info!("loading config from {}", path);
            serde_json::from_str(&fs::read_to_string(path)?)?
        }
        None => RunConfig::default(),
    };

    run_config.simulation.validate()?;
    run_config.traffic.validate()?;

    let configs = if run_config.compare_schemes {
        scheme_pair(&run_config.simulation)
    } else {
        vec![run_config.simulation.clone()]
    };

    for (i, config) in configs.iter().enumerate() {
        let report = simulate(config, &run_config)?;
        if i > 0 {
            println!();
        }
        println!("{}", report);
    }

    Ok(())
}

/// The configured scheme plus its counterpart, plain scheme first
fn scheme_pair(base: &SimulationConfig) -> Vec<SimulationConfig> {
    let reserved_scheme = match base.scheme {
        SchemeConfig::ReservedHandover { .. } => base.scheme,
        SchemeConfig::FullAccess => SchemeConfig::ReservedHandover {
            reserved_channels: 1,
        },
    };

    vec![
        SimulationConfig {
            scheme: SchemeConfig::FullAccess,
            ..base.clone()
        },
        SimulationConfig {
            scheme: reserved_scheme,
            ..base.clone()
        },
    ]
}

fn simulate(
    config: &SimulationConfig,
    run_config: &RunConfig,
) -> Result<SimulationReport, Box<dyn Error>> {
    // Each run gets a fresh source so both schemes see the same workload
    let mut source: Box<dyn CallSource> = match &run_config.trace_file {
        Some(path) => Box::new(TraceSource::parse(
            &fs::read_to_string(path)?,
            config.coverage_m,
        )?),
        None => Box::new(StochasticSource::new(
            run_config.traffic.clone(),
            config.num_stations,
            config.coverage_m,
        )),
    };

    let mut simulation = Simulation::new(config.clone(), source.as_mut())?;
    Ok(simulation.run())
}
