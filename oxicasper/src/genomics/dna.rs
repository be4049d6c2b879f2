use crate::genomics::DnaConfig;

use oxiga::Genome;
use rand::Rng;
use serde::{Deserialize, Serialize};

use std::fmt;

/// A fixed-length bit string, decoded by a
/// [`DnaLayout`] into network settings.
///
/// [`DnaLayout`]: crate::genomics::DnaLayout
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Dna {
    bits: Vec<bool>,
    fitness: f32,
}

impl Dna {
    /// Creates a genome holding the passed bits,
    /// with zero fitness.
    ///
    /// # Examples
    /// ```
    /// use oxicasper::genomics::Dna;
    ///
    /// let dna = Dna::from_bits(vec![true, false, true]);
    /// assert_eq!(dna.to_string(), "101");
    /// ```
    pub fn from_bits(bits: Vec<bool>) -> Dna {
        Dna { bits, fitness: 0.0 }
    }

    /// Returns the genome's bits.
    pub fn bits(&self) -> &[bool] {
        &self.bits
    }

    /// Returns the number of bits in the genome.
    pub fn len(&self) -> usize {
        self.bits.len()
    }

    /// Returns whether the genome has no bits.
    pub fn is_empty(&self) -> bool {
        self.bits.is_empty()
    }

    /// Reads `width` bits starting at `offset` as an
    /// unsigned integer, most significant bit first.
    /// Bits past the end of the genome read as 0.
    ///
    /// # Examples
    /// ```
    /// use oxicasper::genomics::Dna;
    ///
    /// let dna = Dna::from_bits(vec![false, true, true, false]);
    /// assert_eq!(dna.read_unsigned(1, 3), 0b110);
    /// ```
    pub fn read_unsigned(&self, offset: usize, width: usize) -> u64 {
        (offset..offset + width).fold(0, |acc, i| {
            (acc << 1) | u64::from(self.bits.get(i).copied().unwrap_or(false))
        })
    }
}

impl Genome for Dna {
    type Config = DnaConfig;

    /// Returns a genome of uniformly random bits.
    fn new<R: Rng + ?Sized>(config: &DnaConfig, rng: &mut R) -> Dna {
        Dna::from_bits((0..config.length.get()).map(|_| rng.gen()).collect())
    }

    /// Swaps the bits in `[a, b)` between both genomes, where
    /// the segment bounds are drawn anew for every call.
    fn crossover<R: Rng + ?Sized>(
        first: &mut Dna,
        second: &mut Dna,
        _config: &DnaConfig,
        rng: &mut R,
    ) {
        let length = first.bits.len().min(second.bits.len());
        let (a, b) = (rng.gen_range(0..=length), rng.gen_range(0..=length));
        let (start, end) = (a.min(b), a.max(b));
        first.bits[start..end].swap_with_slice(&mut second.bits[start..end]);
    }

    fn mutate<R: Rng + ?Sized>(&mut self, mutation_rate: f32, rng: &mut R) {
        for bit in &mut self.bits {
            if rng.gen::<f32>() < mutation_rate {
                *bit = !*bit;
            }
        }
    }

    fn set_fitness(&mut self, fitness: f32) {
        self.fitness = fitness;
    }

    fn fitness(&self) -> f32 {
        self.fitness
    }

    fn conforms_to(&self, config: &DnaConfig) -> bool {
        self.bits.len() == config.length.get()
    }
}

impl fmt::Display for Dna {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for bit in &self.bits {
            write!(f, "{}", if *bit { '1' } else { '0' })?;
        }
        Ok(())
    }
}
