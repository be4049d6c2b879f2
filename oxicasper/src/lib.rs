//! # OxiCasPer
//! CasPer networks, which install hidden units one at a time
//! while they train, and a bit-string genome for searching
//! their settings with the [`OxiGA` crate](../oxiga/index.html).
//!
//! Provides:
//! - [`CasperNetwork`]: a regression network grown by a convergence-driven
//!   installation policy, with one RPROP group per map and per-group learning rates.
//! - [`Dna`]: an `OxiGA` genome, decoded by a [`DnaLayout`] into a
//!   feature mask and network settings.
//! - [`FitnessEvaluator`]: scores genomes by k-fold cross-validation
//!   of freshly trained networks on an equilateral-coded sample table.
//!
//! [`CasperNetwork`]: crate::networks::CasperNetwork
//! [`Dna`]: crate::genomics::Dna
//! [`DnaLayout`]: crate::genomics::DnaLayout
//! [`FitnessEvaluator`]: crate::evaluation::FitnessEvaluator
//!
//! # Example usage: searching features and settings
//! ```
//! use oxicasper::evaluation::{Equilateral, FitnessEvaluator, Sample, Table};
//! use oxicasper::genomics::{Dna, DnaConfig, DnaLayout, FieldSpec};
//! use oxiga::logging::{EvolutionLogger, ReportingLevel};
//! use oxiga::{Genome, Population, PopulationConfig};
//! use rand::SeedableRng;
//! use rand_chacha::ChaCha8Rng;
//! use std::num::NonZeroUsize;
//!
//! fn main() {
//!     let mut rng = ChaCha8Rng::seed_from_u64(7);
//!     let codebook = Equilateral::new(3, 0.1, 0.9).unwrap();
//!     let samples = (0..12)
//!         .map(|i| Sample {
//!             features: vec![(i % 3) as f32, 1.0 - (i % 3) as f32 / 2.0, (i % 4) as f32],
//!             targets: codebook.encode(i % 3).unwrap().to_vec(),
//!         })
//!         .collect();
//!     let table = Table::from_samples(3, 2, samples).unwrap();
//!
//!     // Small networks keep the example quick.
//!     let layout = DnaLayout {
//!         features: 3,
//!         unit_budget: FieldSpec::new(1, 1.0, 2.0),
//!         patience: FieldSpec::new(1, 1.0, 2.0),
//!         ..DnaLayout::standard()
//!     };
//!     let dna_config = DnaConfig {
//!         length: NonZeroUsize::new(layout.width()).unwrap(),
//!     };
//!     let evaluator = FitnessEvaluator::new(table, layout, &dna_config, 3, codebook).unwrap();
//!
//!     let population_config = PopulationConfig {
//!         size: NonZeroUsize::new(4).unwrap(),
//!         crossover_rate: 0.8,
//!         mutation_rate: 0.01,
//!     };
//!     let mut population = Population::<_, Dna>::new(population_config, dna_config, &mut rng);
//!     let mut logger = EvolutionLogger::new(ReportingLevel::NoGenomes);
//!
//!     let best = population
//!         .run(2, &mut rng, &mut logger, |dna, rng| evaluator.fitness(dna, rng))
//!         .unwrap();
//!     println!(
//!         "{} scored {}: {}",
//!         best,
//!         best.fitness(),
//!         evaluator.layout().decode(best)
//!     );
//! }
//! ```

mod errors;
pub mod evaluation;
pub mod genomics;
pub mod networks;

pub use errors::ConfigError;
