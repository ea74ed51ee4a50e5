use std::collections::HashSet;

use fitts_core::Direction;
use serde::{Deserialize, Serialize};

use crate::error::{ExperimentError, Result};

/// What a miss does to the trial in flight
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttemptPolicy {
    /// Misses are recorded and the same target stays up until it is hit
    RetryUntilHit,
    /// The first press ends the trial, hit or miss
    SingleAttempt,
}

impl std::str::FromStr for AttemptPolicy {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.replace('-', "_").as_str() {
            "retry_until_hit" => Ok(AttemptPolicy::RetryUntilHit),
            "single_attempt" => Ok(AttemptPolicy::SingleAttempt),
            other => Err(format!(
                "unknown attempt policy '{other}' (retry-until-hit, single-attempt)"
            )),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExperimentConfig {
    /// Target diameters in pixels
    pub diameters: Vec<u32>,
    /// Horizontal offsets from screen center in pixels
    pub distances: Vec<u32>,
    pub directions: Vec<Direction>,
    /// Trials per session
    pub trials: usize,
    pub attempt_policy: AttemptPolicy,
    /// Side of the central square in pixels
    pub square_size: f64,
    pub consent_hold_ms: u64,
    pub completion_hold_ms: u64,
}

impl Default for ExperimentConfig {
    fn default() -> Self {
        Self {
            diameters: vec![35, 40, 45, 50, 55, 65, 70, 100],
            distances: vec![100, 150, 200, 250, 300, 350, 400],
            directions: vec![Direction::Left, Direction::Right],
            trials: 320,
            attempt_policy: AttemptPolicy::RetryUntilHit,
            square_size: 25.0,
            consent_hold_ms: 2000,
            completion_hold_ms: 3000,
        }
    }
}

impl ExperimentConfig {
    /// Rejects designs that cannot run: empty or duplicated factor levels,
    /// zero trials, or degenerate sizes.
    pub fn validate(&self) -> Result<()> {
        if self.diameters.is_empty() {
            return Err(ExperimentError::EmptyCombinationSet("diameters"));
        }
        if self.distances.is_empty() {
            return Err(ExperimentError::EmptyCombinationSet("distances"));
        }
        if self.directions.is_empty() {
            return Err(ExperimentError::EmptyCombinationSet("directions"));
        }
        if self.diameters.contains(&0) {
            return Err(ExperimentError::InvalidConfig(
                "diameters must be positive".to_string(),
            ));
        }
        if has_duplicates(&self.diameters)
            || has_duplicates(&self.distances)
            || has_duplicates(&self.directions)
        {
            return Err(ExperimentError::InvalidConfig(
                "diameters, distances and directions must not repeat".to_string(),
            ));
        }
        if self.trials == 0 {
            return Err(ExperimentError::InvalidConfig(
                "a session needs at least one trial".to_string(),
            ));
        }
        if self.square_size.is_nan() || self.square_size <= 0.0 {
            return Err(ExperimentError::InvalidConfig(format!(
                "square_size must be positive, got {}",
                self.square_size
            )));
        }
        Ok(())
    }

    pub fn combination_count(&self) -> usize {
        self.diameters.len() * self.distances.len() * self.directions.len()
    }

    /// Distance from screen center to the outer rim of the farthest, widest target
    pub fn target_reach(&self) -> f64 {
        let distance = self.distances.iter().copied().max().unwrap_or(0);
        let diameter = self.diameters.iter().copied().max().unwrap_or(0);
        distance as f64 + diameter as f64 / 2.0
    }

    /// Fails when some target would be drawn past the edge of a surface
    /// `width` pixels wide, where it could never be hit.
    pub fn check_fits(&self, width: f64) -> Result<()> {
        let reach = self.target_reach();
        if reach > width / 2.0 {
            return Err(ExperimentError::InvalidConfig(format!(
                "targets reach {reach} px from center but the surface is only {width} px wide \
                 (needs at least {})",
                reach * 2.0
            )));
        }
        Ok(())
    }
}

fn has_duplicates<T: Eq + std::hash::Hash>(values: &[T]) -> bool {
    let mut seen = HashSet::with_capacity(values.len());
    !values.iter().all(|v| seen.insert(v))
}
