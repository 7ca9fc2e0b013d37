use crate::model::{Coin, Parameters};
use thiserror::Error;

/// Errors raised by the EM core.
///
/// Every variant is surfaced at the point of detection. Nothing is retried,
/// the conditions all point at bad input or a broken modelling assumption.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EmError {
    /// A head-bias parameter outside its admissible range.
    #[error("Invalid parameter: theta = {theta} must lie within {range}")]
    InvalidParameter { theta: f64, range: &'static str },

    /// Both coins assign zero probability to an observation.
    #[error(
        "Degenerate likelihood: both coins assign zero probability to observation {index} ({heads} heads, {tails} tails)"
    )]
    DegenerateLikelihood { index: usize, heads: u32, tails: u32 },

    /// A zero denominator in the M-step or the convergence test.
    #[error("Undefined estimate for coin {coin}: {reason}")]
    UndefinedEstimate { coin: Coin, reason: &'static str },

    /// The iteration bound was hit before the estimates settled.
    #[error("EM did not converge within {max_iterations} iterations (last estimate: {last})")]
    NonConvergence {
        max_iterations: usize,
        last: Parameters,
    },

    #[error("Invalid observation {index}: {reason}")]
    InvalidObservation { index: usize, reason: String },

    #[error("Invalid settings: {0}")]
    InvalidSettings(String),
}

impl EmError {
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            EmError::InvalidParameter { .. }
                | EmError::InvalidObservation { .. }
                | EmError::InvalidSettings(_)
        )
    }
}
