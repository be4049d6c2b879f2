use serde::{Deserialize, Serialize};

use std::num::NonZeroUsize;

/// Configuration data for DNA generation
/// and inter-genome operations.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DnaConfig {
    /// Number of bits in every genome.
    pub length: NonZeroUsize,
}

impl DnaConfig {
    /// Returns a "zero-valued" default configuration,
    /// with single-bit genomes.
    ///
    /// # Note
    /// This value is not suitable for use in most experiments.
    /// It is meant as a way to fill in unused values during
    /// configuration instantiation.
    ///
    /// # Examples
    /// ```
    /// use oxicasper::genomics::DnaConfig;
    ///
    /// let cfg = DnaConfig::zero();
    /// assert_eq!(cfg.length.get(), 1);
    /// ```
    pub const fn zero() -> DnaConfig {
        DnaConfig {
            // SAFETY: 1 is a valid NonZeroUsize.
            length: unsafe { NonZeroUsize::new_unchecked(1) },
        }
    }
}
