use crate::em::{expectation, has_converged, maximize};
use crate::error::EmError;
use crate::model::{log_likelihood, Coin, Parameters};
use crate::observation::ObservationSet;
use log::{debug, info, log_enabled, warn, Level};
use serde::Serialize;

pub const DEFAULT_TOLERANCE: f64 = 1e-8;
pub const DEFAULT_MAX_ITERATIONS: usize = 1000;

/// Stopping rule for the EM loop.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct EmSettings {
    pub tolerance: f64,
    pub max_iterations: usize,
}

impl Default for EmSettings {
    fn default() -> Self {
        Self {
            tolerance: DEFAULT_TOLERANCE,
            max_iterations: DEFAULT_MAX_ITERATIONS,
        }
    }
}

impl EmSettings {
    pub fn new(tolerance: f64, max_iterations: usize) -> Result<Self, EmError> {
        let settings = Self {
            tolerance,
            max_iterations,
        };
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<(), EmError> {
        if !(self.tolerance.is_finite() && self.tolerance > 0.0) {
            return Err(EmError::InvalidSettings(format!(
                "tolerance must be a positive finite number, got {}",
                self.tolerance
            )));
        }
        if self.max_iterations == 0 {
            return Err(EmError::InvalidSettings(
                "max_iterations must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Parameter estimates in the order they were produced, starting with the
/// initial guess. Only the driver loop appends to it.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(transparent)]
pub struct History {
    entries: Vec<Parameters>,
}

impl History {
    fn start(initial: Parameters) -> Self {
        Self {
            entries: vec![initial],
        }
    }

    fn push(&mut self, params: Parameters) {
        self.entries.push(params);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Parameters> {
        self.entries.iter()
    }

    pub fn as_slice(&self) -> &[Parameters] {
        &self.entries
    }

    pub fn first(&self) -> Option<&Parameters> {
        self.entries.first()
    }

    pub fn last(&self) -> Option<&Parameters> {
        self.entries.last()
    }

    /// Successive estimates of one coin's theta, for plotting.
    pub fn theta_trajectory(&self, coin: Coin) -> Vec<f64> {
        self.entries.iter().map(|p| p.theta(coin)).collect()
    }
}

impl<'a> IntoIterator for &'a History {
    type Item = &'a Parameters;
    type IntoIter = std::slice::Iter<'a, Parameters>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

/// Outcome of a converged EM run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EmFit {
    pub params: Parameters,
    pub history: History,
    pub iterations: usize,
}

/// Run EM from `initial` until the relative change of both thetas drops
/// below `tolerance`, failing with `NonConvergence` after `max_iterations`
/// E/M rounds.
pub fn run(
    initial: Parameters,
    observations: &ObservationSet,
    tolerance: f64,
    max_iterations: usize,
) -> Result<EmFit, EmError> {
    EmSettings::new(tolerance, max_iterations)?;
    initial.validate()?;
    debug!(
        "Starting EM on {} observations of {} trials from {}",
        observations.len(),
        observations.total_trials(),
        initial
    );

    let mut params = initial;
    let mut history = History::start(initial);

    for iteration in 1..=max_iterations {
        let (_, counts) = expectation(&params, observations)?;
        let new_params = maximize(&counts)?;
        history.push(new_params);

        if log_enabled!(Level::Debug) {
            match log_likelihood(&new_params, observations) {
                Ok(ll) => debug!("Iteration {}: {}, log-likelihood: {:.6}", iteration, new_params, ll),
                Err(_) => debug!("Iteration {}: {}", iteration, new_params),
            }
        }

        if has_converged(&params, &new_params, tolerance)? {
            info!("EM converged after {} iterations: {}", iteration, new_params);
            return Ok(EmFit {
                params: new_params,
                history,
                iterations: iteration,
            });
        }
        params = new_params;
    }

    warn!(
        "EM stopped after {} iterations without converging: {}",
        max_iterations, params
    );
    Err(EmError::NonConvergence {
        max_iterations,
        last: params,
    })
}

pub fn run_with_settings(
    initial: Parameters,
    observations: &ObservationSet,
    settings: &EmSettings,
) -> Result<EmFit, EmError> {
    run(initial, observations, settings.tolerance, settings.max_iterations)
}
