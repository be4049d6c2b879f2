use oxicasper::genomics::DnaLayout;
use oxiga::PopulationConfig;

use serde::{Deserialize, Serialize};

use std::num::NonZeroUsize;

/// Settings of one feature and hyperparameter search.
/// Fields missing from a configuration file keep
/// their default values.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExperimentConfig {
    /// Seed of every random draw in the run.
    pub seed: u64,
    /// Number of cross-validation folds.
    pub folds: usize,
    /// Number of classes in the dataset.
    pub classes: usize,
    /// Interval spanned by the class codes.
    pub code_low: f32,
    pub code_high: f32,
    pub generations: usize,
    pub population: PopulationConfig,
    pub layout: DnaLayout,
}

impl Default for ExperimentConfig {
    fn default() -> Self {
        ExperimentConfig {
            seed: 0,
            folds: 5,
            classes: 5,
            code_low: 0.0,
            code_high: 1.0,
            generations: 20,
            population: PopulationConfig {
                size: NonZeroUsize::new(10).unwrap(),
                crossover_rate: 0.8,
                mutation_rate: 0.001,
            },
            layout: DnaLayout::standard(),
        }
    }
}
