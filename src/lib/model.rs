use crate::error::EmError;
use crate::observation::ObservationSet;
use serde::{Deserialize, Serialize};
use statrs::function::factorial::ln_binomial;
use std::fmt;
use strum_macros::{Display, EnumIter};

/// One of the two latent coins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter, Serialize, Deserialize)]
pub enum Coin {
    A,
    B,
}

/// Head-bias estimates for coin A and coin B.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Parameters {
    pub theta_a: f64,
    pub theta_b: f64,
}

impl Parameters {
    /// Create a parameter pair, both thetas strictly inside (0, 1).
    pub fn new(theta_a: f64, theta_b: f64) -> Result<Self, EmError> {
        let params = Self { theta_a, theta_b };
        params.validate()?;
        Ok(params)
    }

    /// Check that both thetas lie strictly inside (0, 1). NaN is rejected.
    pub fn validate(&self) -> Result<(), EmError> {
        for theta in [self.theta_a, self.theta_b] {
            if !(theta > 0.0 && theta < 1.0) {
                return Err(EmError::InvalidParameter {
                    theta,
                    range: "(0, 1)",
                });
            }
        }
        Ok(())
    }

    pub fn theta(&self, coin: Coin) -> f64 {
        match coin {
            Coin::A => self.theta_a,
            Coin::B => self.theta_b,
        }
    }

    /// Same estimates with the coin labels exchanged.
    pub fn swapped(&self) -> Self {
        Self {
            theta_a: self.theta_b,
            theta_b: self.theta_a,
        }
    }
}

impl fmt::Display for Parameters {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "theta_A = {:.6}, theta_B = {:.6}", self.theta_a, self.theta_b)
    }
}

/// Unnormalised probability `theta^heads * (1 - theta)^tails` of one toss
/// sequence under a coin with head-bias `theta`.
pub fn evaluate(theta: f64, heads: u32, tails: u32) -> Result<f64, EmError> {
    if !(0.0..=1.0).contains(&theta) {
        return Err(EmError::InvalidParameter {
            theta,
            range: "[0, 1]",
        });
    }
    Ok(theta.powf(heads as f64) * (1.0 - theta).powf(tails as f64))
}

/// Total log-likelihood of the observations under an equal-weight mixture
/// of the two coins, binomial coefficients included.
pub fn log_likelihood(params: &Parameters, observations: &ObservationSet) -> Result<f64, EmError> {
    let n = observations.total_trials() as u64;
    let mut total = 0.0;
    for (index, obs) in observations.iter().enumerate() {
        let p_a = evaluate(params.theta_a, obs.heads, obs.tails)?;
        let p_b = evaluate(params.theta_b, obs.heads, obs.tails)?;
        let mix = 0.5 * (p_a + p_b);
        if mix == 0.0 {
            return Err(EmError::DegenerateLikelihood {
                index,
                heads: obs.heads,
                tails: obs.tails,
            });
        }
        total += mix.ln() + ln_binomial(n, obs.heads as u64);
    }
    Ok(total)
}
