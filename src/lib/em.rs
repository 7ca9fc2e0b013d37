use crate::error::EmError;
use crate::model::{evaluate, Coin, Parameters};
use crate::observation::ObservationSet;
use log::warn;
use serde::Serialize;

/// Posterior probability that an observation came from each coin.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Responsibility {
    pub prob_a: f64,
    pub prob_b: f64,
}

impl Responsibility {
    pub fn prob(&self, coin: Coin) -> f64 {
        match coin {
            Coin::A => self.prob_a,
            Coin::B => self.prob_b,
        }
    }
}

/// Heads and tails attributed to one coin, summed over all observations.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct CoinCounts {
    pub expected_heads: f64,
    pub expected_tails: f64,
}

impl CoinCounts {
    pub fn expected_trials(&self) -> f64 {
        self.expected_heads + self.expected_tails
    }

    fn add(&mut self, weight: f64, heads: u32, tails: u32) {
        self.expected_heads += weight * heads as f64;
        self.expected_tails += weight * tails as f64;
    }
}

/// Expected counts for both coins. Built fresh by every E-step.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct ExpectedCounts {
    pub coin_a: CoinCounts,
    pub coin_b: CoinCounts,
}

impl ExpectedCounts {
    pub fn coin(&self, coin: Coin) -> &CoinCounts {
        match coin {
            Coin::A => &self.coin_a,
            Coin::B => &self.coin_b,
        }
    }
}

/// E-step: responsibilities for every observation and the expected
/// heads/tails attributable to each coin under `params`.
pub fn expectation(
    params: &Parameters,
    observations: &ObservationSet,
) -> Result<(Vec<Responsibility>, ExpectedCounts), EmError> {
    let mut responsibilities = Vec::with_capacity(observations.len());
    let mut counts = ExpectedCounts::default();

    for (index, obs) in observations.iter().enumerate() {
        let p_a = evaluate(params.theta_a, obs.heads, obs.tails)?;
        let p_b = evaluate(params.theta_b, obs.heads, obs.tails)?;
        let total = p_a + p_b;
        if total == 0.0 {
            return Err(EmError::DegenerateLikelihood {
                index,
                heads: obs.heads,
                tails: obs.tails,
            });
        }
        let r = Responsibility {
            prob_a: p_a / total,
            prob_b: p_b / total,
        };
        counts.coin_a.add(r.prob_a, obs.heads, obs.tails);
        counts.coin_b.add(r.prob_b, obs.heads, obs.tails);
        responsibilities.push(r);
    }

    Ok((responsibilities, counts))
}

/// M-step: head-bias estimates maximising the expected log-likelihood.
pub fn maximize(counts: &ExpectedCounts) -> Result<Parameters, EmError> {
    let theta_a = coin_estimate(Coin::A, &counts.coin_a)?;
    let theta_b = coin_estimate(Coin::B, &counts.coin_b)?;
    Ok(Parameters { theta_a, theta_b })
}

fn coin_estimate(coin: Coin, counts: &CoinCounts) -> Result<f64, EmError> {
    let trials = counts.expected_trials();
    if trials == 0.0 {
        return Err(EmError::UndefinedEstimate {
            coin,
            reason: "zero expected trials",
        });
    }
    let theta = counts.expected_heads / trials;
    if theta == 0.0 || theta == 1.0 {
        warn!("Estimate for coin {} hit the boundary: {}", coin, theta);
    }
    Ok(theta)
}

/// True when both thetas moved by less than `tolerance` relative to `prev`.
pub fn has_converged(prev: &Parameters, curr: &Parameters, tolerance: f64) -> Result<bool, EmError> {
    let delta_a = relative_change(Coin::A, prev.theta_a, curr.theta_a)?;
    let delta_b = relative_change(Coin::B, prev.theta_b, curr.theta_b)?;
    Ok(delta_a < tolerance && delta_b < tolerance)
}

fn relative_change(coin: Coin, prev: f64, curr: f64) -> Result<f64, EmError> {
    if prev == 0.0 {
        return Err(EmError::UndefinedEstimate {
            coin,
            reason: "previous estimate is zero",
        });
    }
    Ok(((curr - prev) / prev).abs())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::observation::Observation;

    fn coin_data() -> ObservationSet {
        ObservationSet::from_heads(10, &[5, 9, 8, 4, 7]).unwrap()
    }

    #[test]
    fn test_expectation_first_iteration() {
        let params = Parameters::new(0.6, 0.5).unwrap();
        let (responsibilities, counts) = expectation(&params, &coin_data()).unwrap();
        assert_eq!(responsibilities.len(), 5);
        // First set, 5 heads: 0.6^5 0.4^5 vs 0.5^10
        let expected = 0.6_f64.powi(5) * 0.4_f64.powi(5);
        let expected = expected / (expected + 0.5_f64.powi(10));
        assert!((responsibilities[0].prob_a - expected).abs() < 1e-12);
        assert!((responsibilities[0].prob_a - 0.4491).abs() < 1e-4);
        assert!((counts.coin_a.expected_heads - 21.2975).abs() < 1e-3);
        assert!((counts.coin_a.expected_tails - 8.5722).abs() < 1e-3);
    }

    #[test]
    fn test_responsibilities_sum_to_one() {
        let data = coin_data();
        for (a, b) in [(0.5, 0.6), (0.1, 0.9), (0.01, 0.02), (0.99, 0.3)] {
            let params = Parameters::new(a, b).unwrap();
            let (responsibilities, _) = expectation(&params, &data).unwrap();
            for r in &responsibilities {
                assert!((r.prob_a + r.prob_b - 1.0).abs() < 1e-12);
                assert_eq!(r.prob(Coin::A), r.prob_a);
            }
        }
    }

    #[test]
    fn test_expected_counts_cover_all_trials() {
        let params = Parameters::new(0.3, 0.7).unwrap();
        let (_, counts) = expectation(&params, &coin_data()).unwrap();
        let total = counts.coin(Coin::A).expected_trials() + counts.coin(Coin::B).expected_trials();
        assert!((total - 50.0).abs() < 1e-9);
    }

    #[test]
    fn test_expectation_degenerate() {
        let data = ObservationSet::new(10, vec![Observation::new(10, 0), Observation::new(5, 5)]).unwrap();
        let params = Parameters {
            theta_a: 0.0,
            theta_b: 1.0,
        };
        let err = expectation(&params, &data).unwrap_err();
        assert_eq!(
            err,
            EmError::DegenerateLikelihood {
                index: 1,
                heads: 5,
                tails: 5
            }
        );
    }

    #[test]
    fn test_expectation_underflow_is_degenerate() {
        let data = ObservationSet::from_heads(2_000_000_000, &[1_000_000_000]).unwrap();
        let params = Parameters::new(0.5, 0.6).unwrap();
        assert!(matches!(
            expectation(&params, &data),
            Err(EmError::DegenerateLikelihood { index: 0, .. })
        ));
    }

    #[test]
    fn test_expectation_invalid_parameter() {
        let params = Parameters {
            theta_a: -0.5,
            theta_b: 0.5,
        };
        assert!(matches!(
            expectation(&params, &coin_data()),
            Err(EmError::InvalidParameter { .. })
        ));
    }

    #[test]
    fn test_maximize() {
        let counts = ExpectedCounts {
            coin_a: CoinCounts {
                expected_heads: 3.0,
                expected_tails: 1.0,
            },
            coin_b: CoinCounts {
                expected_heads: 1.0,
                expected_tails: 4.0,
            },
        };
        let params = maximize(&counts).unwrap();
        assert_eq!(params.theta_a, 0.75);
        assert_eq!(params.theta_b, 0.2);
    }

    #[test]
    fn test_maximize_zero_trials() {
        let counts = ExpectedCounts {
            coin_a: CoinCounts {
                expected_heads: 3.0,
                expected_tails: 1.0,
            },
            coin_b: CoinCounts::default(),
        };
        assert_eq!(
            maximize(&counts).unwrap_err(),
            EmError::UndefinedEstimate {
                coin: Coin::B,
                reason: "zero expected trials"
            }
        );
    }

    #[test]
    fn test_zero_trial_observations_fail_in_maximize() {
        let data = ObservationSet::new(0, vec![Observation::new(0, 0); 3]).unwrap();
        let params = Parameters::new(0.5, 0.6).unwrap();
        let (responsibilities, counts) = expectation(&params, &data).unwrap();
        assert_eq!(responsibilities[0].prob_a, 0.5);
        assert!(matches!(
            maximize(&counts),
            Err(EmError::UndefinedEstimate { coin: Coin::A, .. })
        ));
    }

    #[test]
    fn test_has_converged() {
        let prev = Parameters::new(0.5, 0.6).unwrap();
        let close = Parameters::new(0.5 + 1e-10, 0.6 - 1e-10).unwrap();
        assert!(has_converged(&prev, &close, 1e-8).unwrap());
        let far = Parameters::new(0.52, 0.6).unwrap();
        assert!(!has_converged(&prev, &far, 1e-8).unwrap());
    }

    #[test]
    fn test_has_converged_uses_absolute_change() {
        // A falling estimate must not count as converged.
        let prev = Parameters::new(0.5, 0.6).unwrap();
        let falling = Parameters::new(0.4, 0.5).unwrap();
        assert!(!has_converged(&prev, &falling, 1e-8).unwrap());
    }

    #[test]
    fn test_has_converged_zero_previous() {
        let prev = Parameters {
            theta_a: 0.0,
            theta_b: 0.6,
        };
        let curr = Parameters::new(0.1, 0.6).unwrap();
        assert!(matches!(
            has_converged(&prev, &curr, 1e-8),
            Err(EmError::UndefinedEstimate { coin: Coin::A, .. })
        ));
    }
}
