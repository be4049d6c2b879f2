//! A Population is a fixed-size collection of genomes,
//! which can be evolved using a genome evaluation function
//! as the source of selective pressure.
mod config;
mod errors;
pub mod logging;

use crate::Genome;
pub use config::PopulationConfig;
pub use errors::{EvolutionError, SelectionError};
use logging::EvolutionLogger;

use log::{debug, info, warn};
use rand::distributions::{Distribution, WeightedIndex};
use rand::prelude::{Rng, SeedableRng, SliceRandom};
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

/// A population of genomes.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Population<C, G> {
    genomes: Vec<G>,
    best: Option<G>,
    generation: usize,
    population_config: PopulationConfig,
    genetic_config: C,
}

impl<C, G> Population<C, G>
where
    G: Genome<Config = C> + Clone,
{
    /// Creates a new population of randomized genomes
    /// using the passed configurations.
    ///
    /// The type of `genetic_config` depends on the implementation
    /// of [`Genome`], and is effectively opaque to the population.
    ///
    /// [`Genome`]: crate::Genome
    ///
    /// # Examples
    /// ```
    /// use oxicasper::genomics::{Dna, DnaConfig};
    /// use oxiga::{Population, PopulationConfig};
    /// use rand::SeedableRng;
    /// use rand_chacha::ChaCha8Rng;
    ///
    /// let mut rng = ChaCha8Rng::seed_from_u64(0);
    /// let pop_config = PopulationConfig {
    ///     size: std::num::NonZeroUsize::new(10).unwrap(),
    ///     ..PopulationConfig::zero()
    /// };
    ///
    /// let population = Population::<_, Dna>::new(pop_config, DnaConfig::zero(), &mut rng);
    /// assert_eq!(population.genomes().count(), 10);
    /// ```
    pub fn new<R: Rng + ?Sized>(
        population_config: PopulationConfig,
        genetic_config: C,
        rng: &mut R,
    ) -> Population<C, G> {
        Population {
            genomes: (0..population_config.size.get())
                .map(|_| G::new(&genetic_config, rng))
                .collect(),
            best: None,
            generation: 0,
            population_config,
            genetic_config,
        }
    }

    /// Creates a new population using the passed configurations,
    /// and seeds it with the specified genomes. If the number of
    /// seed genomes is not as large as the configured population
    /// size, the remaining space is filled with random genomes.
    ///
    /// Returns `None` if either the configured population size is
    /// lesser than the number of seed genomes, or any of the genomes
    /// are incompatible with the specified genetic config, as established
    /// by [`Genome::conforms_to`].
    ///
    /// [`Genome::conforms_to`]: crate::Genome::conforms_to
    ///
    /// # Examples
    /// ```
    /// use oxicasper::genomics::{Dna, DnaConfig};
    /// use oxiga::{Population, PopulationConfig};
    /// use rand::SeedableRng;
    /// use rand_chacha::ChaCha8Rng;
    /// use std::num::NonZeroUsize;
    ///
    /// let mut rng = ChaCha8Rng::seed_from_u64(0);
    /// let config = DnaConfig { length: NonZeroUsize::new(4).unwrap() };
    /// let pop_config = PopulationConfig {
    ///     size: NonZeroUsize::new(5).unwrap(),
    ///     ..PopulationConfig::zero()
    /// };
    /// let seed = vec![Dna::from_bits(vec![true; 4]), Dna::from_bits(vec![false; 4])];
    ///
    /// let population = Population::new_seeded(seed, pop_config, config, &mut rng).unwrap();
    /// assert_eq!(population.genomes().count(), 5);
    /// ```
    pub fn new_seeded<R: Rng + ?Sized>(
        genomes: Vec<G>,
        population_config: PopulationConfig,
        genetic_config: C,
        rng: &mut R,
    ) -> Option<Population<C, G>> {
        let size = population_config.size.get();
        if size < genomes.len() || !genomes.iter().all(|g| g.conforms_to(&genetic_config)) {
            return None;
        }
        let fill = size - genomes.len();
        let mut seeded = genomes;
        seeded.extend((0..fill).map(|_| G::new(&genetic_config, rng)));

        Some(Population {
            genomes: seeded,
            best: None,
            generation: 0,
            population_config,
            genetic_config,
        })
    }

    /// Evaluates the fitness of each genome in the
    /// population using the passed evaluator.
    ///
    /// The return value of the evaluation function
    /// should be positive, or the next call to
    /// [`evolve`] will fail.
    ///
    /// [`evolve`]: Population::evolve
    ///
    /// # Examples
    /// ```
    /// use oxicasper::genomics::{Dna, DnaConfig};
    /// use oxiga::{Genome, Population, PopulationConfig};
    /// use rand::SeedableRng;
    /// use rand_chacha::ChaCha8Rng;
    ///
    /// let mut rng = ChaCha8Rng::seed_from_u64(0);
    /// let mut population =
    ///     Population::<_, Dna>::new(PopulationConfig::zero(), DnaConfig::zero(), &mut rng);
    ///
    /// population.evaluate_fitness(|g| {
    ///     // Genomes with more set bits are given higher scores.
    ///     g.bits().iter().filter(|b| **b).count() as f32
    /// });
    /// ```
    pub fn evaluate_fitness<E>(&mut self, mut evaluator: E)
    where
        E: FnMut(&G) -> f32,
    {
        for genome in &mut self.genomes {
            let fitness = evaluator(genome);
            genome.set_fitness(fitness);
        }
        self.record_best();
    }

    /// Evaluates the fitness of each genome in parallel,
    /// stopping at the first evaluation error.
    ///
    /// Each evaluation receives its own generator, seeded
    /// from `rng` before the parallel section starts, so the
    /// results do not depend on thread scheduling.
    ///
    /// # Errors
    /// Returns the first error produced by the evaluator,
    /// in which case no fitness values are updated.
    ///
    /// # Examples
    /// ```
    /// use oxicasper::genomics::{Dna, DnaConfig};
    /// use oxiga::{Genome, Population, PopulationConfig};
    /// use rand::{Rng, SeedableRng};
    /// use rand_chacha::ChaCha8Rng;
    ///
    /// let mut rng = ChaCha8Rng::seed_from_u64(0);
    /// let mut population =
    ///     Population::<_, Dna>::new(PopulationConfig::zero(), DnaConfig::zero(), &mut rng);
    ///
    /// let result: Result<(), String> =
    ///     population.try_evaluate_fitness(&mut rng, |_, rng| Ok(rng.gen_range(0.0..1.0)));
    /// assert!(result.is_ok());
    /// ```
    pub fn try_evaluate_fitness<R, E, Err>(&mut self, rng: &mut R, evaluator: E) -> Result<(), Err>
    where
        R: Rng + ?Sized,
        E: Fn(&G, &mut ChaCha8Rng) -> Result<f32, Err> + Sync,
        G: Send + Sync,
        Err: Send,
    {
        let seeds: Vec<u64> = self.genomes.iter().map(|_| rng.gen()).collect();
        let fitnesses = self
            .genomes
            .par_iter()
            .zip(seeds.into_par_iter())
            .map(|(genome, seed)| evaluator(genome, &mut ChaCha8Rng::seed_from_u64(seed)))
            .collect::<Result<Vec<f32>, Err>>()?;
        for (genome, fitness) in self.genomes.iter_mut().zip(fitnesses) {
            genome.set_fitness(fitness);
        }
        self.record_best();
        Ok(())
    }

    /// Updates the best genome seen so far with
    /// the current generation's champion.
    fn record_best(&mut self) {
        let champion = self.champion();
        let improved = match &self.best {
            Some(best) => champion.fitness() > best.fitness(),
            None => !champion.fitness().is_nan(),
        };
        if improved {
            debug!(
                "new best genome in generation {} with fitness {}",
                self.generation,
                champion.fitness()
            );
            self.best = Some(champion.clone());
        }
    }

    /// Evolves the population into its next generation:
    /// fitness-proportionate selection with replacement,
    /// pairwise crossover, and per-locus mutation. The
    /// offspring replace the whole current generation.
    ///
    /// # Errors
    /// Returns an error if any genome has a negative
    /// or NaN fitness. The population is left untouched.
    ///
    /// # Examples
    /// ```
    /// use oxicasper::genomics::{Dna, DnaConfig};
    /// use oxiga::{Genome, Population, PopulationConfig};
    /// use rand::SeedableRng;
    /// use rand_chacha::ChaCha8Rng;
    ///
    /// let mut rng = ChaCha8Rng::seed_from_u64(0);
    /// let mut population = Population::<_, Dna>::new(
    ///     PopulationConfig {
    ///         crossover_rate: 0.8,
    ///         mutation_rate: 0.01,
    ///         ..PopulationConfig::zero()
    ///     },
    ///     DnaConfig::zero(),
    ///     &mut rng,
    /// );
    ///
    /// population.evaluate_fitness(|g| g.bits().iter().filter(|b| **b).count() as f32);
    ///
    /// if let Err(e) = population.evolve(&mut rng) {
    ///     eprintln!("{}", e);
    /// }
    /// assert_eq!(population.generation(), 1);
    /// ```
    pub fn evolve<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Result<(), SelectionError> {
        let mut offspring = self.select(rng)?;
        self.cross_pairs(&mut offspring, rng);
        for genome in &mut offspring {
            genome.mutate(self.population_config.mutation_rate, rng);
            genome.set_fitness(0.0);
        }
        self.genomes = offspring;
        self.generation += 1;
        Ok(())
    }

    /// Resamples the population with replacement,
    /// each genome being chosen with probability
    /// proportional to its fitness.
    ///
    /// A population with no positive fitness at all is
    /// resampled uniformly.
    fn select<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<Vec<G>, SelectionError> {
        if let Some((i, g)) = self
            .genomes
            .iter()
            .enumerate()
            .find(|(_, g)| g.fitness().is_nan() || g.fitness() < 0.0)
        {
            return Err(SelectionError::InvalidFitness(i, g.fitness()));
        }
        let size = self.population_config.size.get();
        let selected = match WeightedIndex::new(self.genomes.iter().map(|g| g.fitness())) {
            Ok(distribution) => (0..size)
                .map(|_| self.genomes[distribution.sample(rng)].clone())
                .collect(),
            Err(_) => {
                warn!(
                    "generation {} has no positive fitness, selecting uniformly",
                    self.generation
                );
                (0..size)
                    .filter_map(|_| self.genomes.choose(rng).cloned())
                    .collect()
            }
        };
        Ok(selected)
    }

    /// Crosses consecutive pairs of the selected pool,
    /// each with [crossover rate] probability. An odd
    /// trailing genome is left as-is.
    ///
    /// [crossover rate]: PopulationConfig::crossover_rate
    fn cross_pairs<R: Rng + ?Sized>(&self, pool: &mut [G], rng: &mut R) {
        for pair in pool.chunks_exact_mut(2) {
            if rng.gen::<f32>() < self.population_config.crossover_rate {
                let (first, second) = pair.split_at_mut(1);
                G::crossover(&mut first[0], &mut second[0], &self.genetic_config, rng);
            }
        }
    }

    /// Runs a complete evolution: for each of `generations`
    /// iterations, evaluates the population, records it
    /// in `logger`, and evolves it. Returns the best genome
    /// seen across the whole run.
    ///
    /// # Errors
    /// Returns an error as soon as an evaluation or a
    /// selection fails.
    ///
    /// # Examples
    /// ```
    /// use oxicasper::genomics::{Dna, DnaConfig};
    /// use oxiga::logging::{EvolutionLogger, ReportingLevel};
    /// use oxiga::{Genome, Population, PopulationConfig};
    /// use rand::SeedableRng;
    /// use rand_chacha::ChaCha8Rng;
    /// use std::convert::Infallible;
    ///
    /// let mut rng = ChaCha8Rng::seed_from_u64(0);
    /// let mut logger = EvolutionLogger::new(ReportingLevel::NoGenomes);
    /// let mut population = Population::<_, Dna>::new(
    ///     PopulationConfig {
    ///         size: std::num::NonZeroUsize::new(8).unwrap(),
    ///         crossover_rate: 0.8,
    ///         mutation_rate: 0.01,
    ///     },
    ///     DnaConfig::zero(),
    ///     &mut rng,
    /// );
    ///
    /// let best = population
    ///     .run(5, &mut rng, &mut logger, |g, _| {
    ///         Ok::<_, Infallible>(g.bits().iter().filter(|b| **b).count() as f32)
    ///     })
    ///     .unwrap();
    /// assert!(best.fitness() <= 1.0);
    /// assert_eq!(logger.iter().count(), 5);
    /// ```
    pub fn run<R, E, Err>(
        &mut self,
        generations: usize,
        rng: &mut R,
        logger: &mut EvolutionLogger<G>,
        evaluator: E,
    ) -> Result<&G, EvolutionError<Err>>
    where
        R: Rng + ?Sized,
        E: Fn(&G, &mut ChaCha8Rng) -> Result<f32, Err> + Sync,
        G: Send + Sync,
        Err: Send,
    {
        for _ in 0..generations {
            self.try_evaluate_fitness(rng, &evaluator)
                .map_err(EvolutionError::Evaluation)?;
            logger.log(self, &|g: &G| [g.fitness()], ["fitness"]);
            info!(
                "generation {}: champion fitness {}, best so far {}",
                self.generation,
                self.champion().fitness(),
                self.best_fitness()
            );
            self.evolve(rng)?;
        }
        Ok(self.best.as_ref().unwrap_or_else(|| self.champion()))
    }

    /// Resets the population to an initial randomized state,
    /// forgetting the best genome seen.
    ///
    /// # Examples
    /// ```
    /// use oxicasper::genomics::{Dna, DnaConfig};
    /// use oxiga::{Population, PopulationConfig};
    /// use rand::SeedableRng;
    /// use rand_chacha::ChaCha8Rng;
    ///
    /// let mut rng = ChaCha8Rng::seed_from_u64(0);
    /// let mut population =
    ///     Population::<_, Dna>::new(PopulationConfig::zero(), DnaConfig::zero(), &mut rng);
    ///
    /// // Evolve the population on some task...
    /// population.reset(&mut rng);
    /// assert_eq!(population.generation(), 0);
    /// ```
    pub fn reset<R: Rng + ?Sized>(&mut self, rng: &mut R)
    where
        C: Clone,
    {
        *self = Population::new(
            self.population_config.clone(),
            self.genetic_config.clone(),
            rng,
        );
    }

    /// Returns the best-performing genome
    /// of the current generation.
    ///
    /// # Examples
    /// ```
    /// use oxicasper::genomics::{Dna, DnaConfig};
    /// use oxiga::{Genome, Population, PopulationConfig};
    /// use rand::SeedableRng;
    /// use rand_chacha::ChaCha8Rng;
    ///
    /// let mut rng = ChaCha8Rng::seed_from_u64(0);
    /// let mut population = Population::<_, Dna>::new(
    ///     PopulationConfig {
    ///         size: std::num::NonZeroUsize::new(20).unwrap(),
    ///         ..PopulationConfig::zero()
    ///     },
    ///     DnaConfig::zero(),
    ///     &mut rng,
    /// );
    ///
    /// let mut fitness = 0.0;
    /// population.evaluate_fitness(move |_| {
    ///     fitness += 10.0;
    ///     fitness
    /// });
    ///
    /// assert_eq!(population.champion().fitness(), 20.0 * 10.0);
    /// ```
    pub fn champion(&self) -> &G {
        let mut champion = &self.genomes[0];
        for genome in &self.genomes[1..] {
            if genome.fitness() > champion.fitness() {
                champion = genome;
            }
        }
        champion
    }

    /// Returns the best genome evaluated so far,
    /// across all generations, if any has been
    /// evaluated yet.
    pub fn best(&self) -> Option<&G> {
        self.best.as_ref()
    }

    /// Returns the fitness of the best genome
    /// evaluated so far, or 0 if none has.
    pub fn best_fitness(&self) -> f32 {
        self.best.as_ref().map_or(0.0, |g| g.fitness())
    }

    /// Returns an iterator over all current genomes.
    pub fn genomes(&self) -> impl Iterator<Item = &G> {
        self.genomes.iter()
    }

    /// Returns the current generation number.
    pub fn generation(&self) -> usize {
        self.generation
    }

    /// Returns the population's configuration.
    pub fn population_config(&self) -> &PopulationConfig {
        &self.population_config
    }

    /// Returns the configuration shared by the genomes.
    pub fn genetic_config(&self) -> &C {
        &self.genetic_config
    }
}
