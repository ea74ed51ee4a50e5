use fitts_core::{Direction, TaskCombination};
use rand::Rng;
use rand::seq::SliceRandom;

use crate::error::{ExperimentError, Result};

/// Full diameter × distance × direction cross product, in that nesting order.
pub fn build_combinations(
    diameters: &[u32],
    distances: &[u32],
    directions: &[Direction],
) -> Result<Vec<TaskCombination>> {
    if diameters.is_empty() {
        return Err(ExperimentError::EmptyCombinationSet("diameters"));
    }
    if distances.is_empty() {
        return Err(ExperimentError::EmptyCombinationSet("distances"));
    }
    if directions.is_empty() {
        return Err(ExperimentError::EmptyCombinationSet("directions"));
    }

    let mut combinations =
        Vec::with_capacity(diameters.len() * distances.len() * directions.len());
    for &diameter in diameters {
        for &distance in distances {
            for &direction in directions {
                combinations.push(TaskCombination {
                    diameter,
                    distance,
                    direction,
                });
            }
        }
    }
    Ok(combinations)
}

/// Supplies trials by uniform draw, with replacement, from a pool shuffled once.
pub struct TrialGenerator<R: Rng> {
    combinations: Vec<TaskCombination>,
    rng: R,
}

impl<R: Rng> TrialGenerator<R> {
    pub fn new(mut combinations: Vec<TaskCombination>, mut rng: R) -> Result<Self> {
        if combinations.is_empty() {
            return Err(ExperimentError::EmptyCombinationSet("task combinations"));
        }
        combinations.shuffle(&mut rng);
        Ok(Self { combinations, rng })
    }

    pub fn next_trial(&mut self) -> TaskCombination {
        let index = self.rng.random_range(0..self.combinations.len());
        self.combinations[index]
    }

    pub fn combinations(&self) -> &[TaskCombination] {
        &self.combinations
    }
}
