//! A generational genetic algorithm over fixed-length genomes.
//!
//! Each generation the whole population is evaluated, resampled
//! with replacement in proportion to fitness, crossed in pairs,
//! mutated locus by locus, and replaced wholesale by its offspring.
//! The best genome seen across the run is kept apart from the
//! population, so it survives even when selection loses it.
//!
//! Genome structure is left to implementors of the `Genome` trait.
//! A bit-string genome decoding into CasPer network settings is
//! supplied by the `oxicasper` crate.
//!
//! Every stochastic operation takes an explicit random number
//! generator, so seeded runs are reproducible. Fitness evaluation
//! may run in parallel; each evaluation gets its own generator.
//!
//! # Example usage: maximizing the number of set bits
//! ```
//! use oxicasper::genomics::{Dna, DnaConfig};
//! use oxiga::logging::{EvolutionLogger, ReportingLevel};
//! use oxiga::{Genome, Population, PopulationConfig};
//! use rand::SeedableRng;
//! use rand_chacha::ChaCha8Rng;
//! use std::convert::Infallible;
//! use std::num::NonZeroUsize;
//!
//! fn main() {
//!     let mut rng = ChaCha8Rng::seed_from_u64(42);
//!     let population_config = PopulationConfig {
//!         size: NonZeroUsize::new(10).unwrap(),
//!         crossover_rate: 0.8,
//!         mutation_rate: 0.001,
//!     };
//!     let dna_config = DnaConfig {
//!         length: NonZeroUsize::new(42).unwrap(),
//!     };
//!
//!     let mut logger = EvolutionLogger::new(ReportingLevel::PopulationChampion);
//!     let mut population = Population::<_, Dna>::new(population_config, dna_config, &mut rng);
//!     let best = population
//!         .run(20, &mut rng, &mut logger, |g, _| {
//!             Ok::<_, Infallible>(g.bits().iter().filter(|b| **b).count() as f32)
//!         })
//!         .unwrap();
//!     println!("Best genome: {} ({})", best, best.fitness());
//! }
//! ```

mod genome;
mod populations;

pub use genome::*;
pub use populations::*;
