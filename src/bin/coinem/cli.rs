// src/cli.rs
use clap::Parser;
use coinem_utils::fit::{DEFAULT_MAX_ITERATIONS, DEFAULT_TOLERANCE};

/// Estimate the head probabilities of two coins from toss sequences of unknown origin.
#[derive(Parser, Debug)]
#[command(name = "coinem", version, about = "Two-coin EM estimation")]
pub struct Cli {
    #[arg(
        value_name = "OBSERVATIONS",
        help = "Tab-separated file with a 'heads' column and an optional 'tails' column. Uses the built-in five-set dataset when omitted"
    )]
    pub observations: Option<String>,

    #[arg(long, default_value = "10", help = "Number of tosses in every sequence")]
    pub total_trials: u32,

    #[arg(long, default_value = "0.5", help = "Initial head probability of coin A")]
    pub theta_a: f64,

    #[arg(long, default_value = "0.6", help = "Initial head probability of coin B")]
    pub theta_b: f64,

    #[arg(
        long,
        default_value_t = DEFAULT_TOLERANCE,
        help = "Relative change below which both estimates count as converged"
    )]
    pub tolerance: f64,

    #[arg(
        long,
        default_value_t = DEFAULT_MAX_ITERATIONS,
        help = "Give up after this many EM iterations"
    )]
    pub max_iterations: usize,

    #[arg(long, value_name = "HISTORY", help = "Write the estimate history as TSV")]
    pub history: Option<String>,

    #[arg(long, value_name = "SUMMARY", help = "Write a JSON summary of the fit")]
    pub summary: Option<String>,

    #[arg(
        value_enum,
        long,
        default_value = "normal",
        value_name = "VERBOSITY",
        help = "Verbosity level"
    )]
    pub verbosity: LogLevel,
}

#[derive(Debug, clap::ValueEnum, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Verbose,
    Normal,
    Silent,
}

impl LogLevel {
    pub fn default_filter(&self) -> &'static str {
        match self {
            LogLevel::Verbose => "debug",
            LogLevel::Normal => "info",
            LogLevel::Silent => "off",
        }
    }
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LogLevel::Verbose => write!(f, "verbose"),
            LogLevel::Normal => write!(f, "normal"),
            LogLevel::Silent => write!(f, "silent"),
        }
    }
}
