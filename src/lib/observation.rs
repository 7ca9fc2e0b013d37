use crate::error::EmError;
use serde::{Deserialize, Serialize};

/// Heads and tails counted in one toss sequence of unknown origin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Observation {
    pub heads: u32,
    pub tails: u32,
}

impl Observation {
    pub fn new(heads: u32, tails: u32) -> Self {
        Self { heads, tails }
    }

    /// `None` when the counts overflow a `u32`.
    pub fn trials(&self) -> Option<u32> {
        self.heads.checked_add(self.tails)
    }
}

/// Largest trial count accepted in an observation set.
pub const MAX_TRIALS: u32 = i32::MAX as u32;

/// Immutable collection of observations sharing one trial count.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ObservationSet {
    total_trials: u32,
    observations: Vec<Observation>,
}

impl ObservationSet {
    /// Builds the set, rejecting any observation whose counts do not add up
    /// to `total_trials`.
    pub fn new(total_trials: u32, observations: Vec<Observation>) -> Result<Self, EmError> {
        if total_trials > MAX_TRIALS {
            return Err(EmError::InvalidObservation {
                index: 0,
                reason: format!("{} trials exceeds the limit of {}", total_trials, MAX_TRIALS),
            });
        }
        if observations.is_empty() {
            return Err(EmError::InvalidObservation {
                index: 0,
                reason: "observation set is empty".to_string(),
            });
        }
        for (index, obs) in observations.iter().enumerate() {
            if obs.trials() != Some(total_trials) {
                return Err(EmError::InvalidObservation {
                    index,
                    reason: format!(
                        "{} heads + {} tails does not sum to {} trials",
                        obs.heads, obs.tails, total_trials
                    ),
                });
            }
        }
        Ok(Self {
            total_trials,
            observations,
        })
    }

    /// Builds the set from head counts alone, tails being the remainder.
    pub fn from_heads(total_trials: u32, heads: &[u32]) -> Result<Self, EmError> {
        let mut observations = Vec::with_capacity(heads.len());
        for (index, &h) in heads.iter().enumerate() {
            if h > total_trials {
                return Err(EmError::InvalidObservation {
                    index,
                    reason: format!("{} heads exceeds {} trials", h, total_trials),
                });
            }
            observations.push(Observation::new(h, total_trials - h));
        }
        Self::new(total_trials, observations)
    }

    pub fn total_trials(&self) -> u32 {
        self.total_trials
    }

    pub fn len(&self) -> usize {
        self.observations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observations.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Observation> {
        self.observations.iter()
    }

    pub fn as_slice(&self) -> &[Observation] {
        &self.observations
    }
}

impl<'a> IntoIterator for &'a ObservationSet {
    type Item = &'a Observation;
    type IntoIter = std::slice::Iter<'a, Observation>;

    fn into_iter(self) -> Self::IntoIter {
        self.observations.iter()
    }
}
