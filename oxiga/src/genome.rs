use rand::Rng;

/// An interface for genomes that can be evolved by a [`Population`].
///
/// All genomes of one population are expected to share the
/// same length, which the implementor must preserve
/// through crossover and mutation.
///
/// [`Population`]: crate::Population
pub trait Genome {
    type Config;

    /// Returns a randomized genome.
    fn new<R: Rng + ?Sized>(config: &Self::Config, rng: &mut R) -> Self;

    /// Exchanges genetic material between two genomes in place.
    fn crossover<R: Rng + ?Sized>(
        first: &mut Self,
        second: &mut Self,
        config: &Self::Config,
        rng: &mut R,
    );

    /// Independently mutates every locus of the genome
    /// with probability `mutation_rate`.
    fn mutate<R: Rng + ?Sized>(&mut self, mutation_rate: f32, rng: &mut R);

    /// Sets the genome's fitness value.
    ///
    /// Should make sure that the fitness value is ≥0;
    /// otherwise selection will fail.
    fn set_fitness(&mut self, fitness: f32);

    /// Returns the genome's fitness value.
    fn fitness(&self) -> f32;

    /// Returns whether the genome is compatible
    /// with the passed configuration.
    fn conforms_to(&self, config: &Self::Config) -> bool;
}
