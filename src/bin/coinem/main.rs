use clap::Parser;
use env_logger::Env;
use log::{debug, info};
use std::path::Path;
use anyhow::Result;
use coinem_utils::{Coin, EmError, EmSettings, Parameters};
use strum::IntoEnumIterator;

mod cli;
mod io;
mod report;

fn main() {
    let args = cli::Cli::parse();
    // Set up logging level
    env_logger::Builder::from_env(Env::default().default_filter_or(args.verbosity.default_filter()))
        .init();

    coinem(&args).unwrap_or_else(|e| {
        eprintln!("Error: {}", e);
        std::process::exit(exit_code(&e));
    });
}

/// 2 for rejected input, 1 for everything else.
fn exit_code(err: &anyhow::Error) -> i32 {
    match err.downcast_ref::<EmError>() {
        Some(em_err) if em_err.is_validation() => 2,
        _ => 1,
    }
}

fn coinem(args: &cli::Cli) -> Result<()> {
    let observations = match &args.observations {
        Some(path) => {
            info!("Loading observations from: {}", path);
            io::load_observations(Path::new(path), args.total_trials)?
        }
        None => {
            info!("No observations file given, using the built-in coin toss dataset");
            io::builtin_observations(args.total_trials)?
        }
    };
    info!(
        "Loaded {} observations of {} trials",
        observations.len(),
        observations.total_trials()
    );

    let initial = Parameters::new(args.theta_a, args.theta_b)?;
    let settings = EmSettings::new(args.tolerance, args.max_iterations)?;
    let fit = coinem_utils::run_with_settings(initial, &observations, &settings)?;

    for coin in Coin::iter() {
        debug!("theta_{} trajectory: {}", coin, report::format_trajectory(&fit, coin));
    }

    print!("{}", report::format_estimates(&fit));
    println!("Converged after {} iterations", fit.iterations);

    if let Some(path) = &args.history {
        io::write_history(Path::new(path), &fit, &observations)?;
    }
    if let Some(path) = &args.summary {
        io::write_summary(Path::new(path), &fit, &observations)?;
    }
    Ok(())
}
