use std::fs::File;
use std::path::Path;
use anyhow::{bail, Result};
use csv::{ReaderBuilder, WriterBuilder};
use log::{debug, info};
use serde::{Deserialize, Serialize};
use coinem_utils::model::{log_likelihood, Parameters};
use coinem_utils::{EmFit, History, ObservationSet};

#[derive(Debug, Deserialize)]
struct ObservationRow {
    heads: u32,
    #[serde(default)]
    tails: Option<u32>,
}

#[derive(Debug, Serialize)]
struct HistoryRow {
    iteration: usize,
    theta_a: f64,
    theta_b: f64,
    log_likelihood: Option<f64>,
}

#[derive(Debug, Serialize)]
struct Summary<'a> {
    total_trials: u32,
    n_observations: usize,
    iterations: usize,
    params: &'a Parameters,
    log_likelihood: Option<f64>,
    history: &'a History,
}

/// Heads counts of the five toss sets the tool ships with.
pub const BUILTIN_HEADS: [u32; 5] = [5, 9, 8, 4, 7];
pub const BUILTIN_TOTAL_TRIALS: u32 = 10;

pub fn load_observations(path: &Path, total_trials: u32) -> Result<ObservationSet> {
    let file = File::open(path)
        .map_err(|e| anyhow::anyhow!("Could not open observations file: {} ({})", path.display(), e))?;
    let mut reader = ReaderBuilder::new()
        .delimiter(b'\t')
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(file);

    let mut heads = Vec::new();
    for (line, row) in reader.deserialize::<ObservationRow>().enumerate() {
        let row = row.map_err(|e| anyhow::anyhow!("Error reading observation {}: {}", line, e))?;
        if let Some(tails) = row.tails {
            if row.heads.checked_add(tails) != Some(total_trials) {
                bail!(
                    "Observation {} has {} heads and {} tails, expected {} trials",
                    line,
                    row.heads,
                    tails,
                    total_trials
                );
            }
        }
        heads.push(row.heads);
    }
    debug!("Read {} observations from {}", heads.len(), path.display());
    let observations = ObservationSet::from_heads(total_trials, &heads)?;
    Ok(observations)
}

/// The built-in dataset. Fails when `total_trials` asks for anything but its 10 tosses.
pub fn builtin_observations(total_trials: u32) -> Result<ObservationSet> {
    if total_trials != BUILTIN_TOTAL_TRIALS {
        bail!(
            "The built-in dataset has {} tosses per set, got --total-trials {}. Pass an observations file to use other trial counts",
            BUILTIN_TOTAL_TRIALS,
            total_trials
        );
    }
    Ok(ObservationSet::from_heads(BUILTIN_TOTAL_TRIALS, &BUILTIN_HEADS)?)
}

pub fn write_history(path: &Path, fit: &EmFit, observations: &ObservationSet) -> Result<()> {
    let file = File::create(path)
        .map_err(|e| anyhow::anyhow!("Could not create history file: {} ({})", path.display(), e))?;
    let mut writer = WriterBuilder::new()
        .delimiter(b'\t')
        .has_headers(true)
        .from_writer(file);
    for (iteration, params) in fit.history.iter().enumerate() {
        writer.serialize(HistoryRow {
            iteration,
            theta_a: params.theta_a,
            theta_b: params.theta_b,
            log_likelihood: log_likelihood(params, observations).ok(),
        })?;
    }
    writer.flush()?;
    info!("Wrote {} history entries to {}", fit.history.len(), path.display());
    Ok(())
}

pub fn write_summary(path: &Path, fit: &EmFit, observations: &ObservationSet) -> Result<()> {
    let summary = Summary {
        total_trials: observations.total_trials(),
        n_observations: observations.len(),
        iterations: fit.iterations,
        params: &fit.params,
        log_likelihood: log_likelihood(&fit.params, observations).ok(),
        history: &fit.history,
    };
    let file = File::create(path)
        .map_err(|e| anyhow::anyhow!("Could not create summary file: {} ({})", path.display(), e))?;
    serde_json::to_writer_pretty(file, &summary)?;
    info!("Wrote summary to {}", path.display());
    Ok(())
}
