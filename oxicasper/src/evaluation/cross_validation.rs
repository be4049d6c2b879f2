use crate::errors::ConfigError;
use crate::evaluation::{Equilateral, Folds, Sample, Table};
use crate::genomics::{Dna, DnaConfig, DnaLayout, Hyperparameters};
use crate::networks::{score, train};

use log::debug;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use std::fmt;

/// Per-fold metrics averaged over every fold
/// of a cross-validation.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct FoldAverages {
    pub train_loss: f32,
    pub test_loss: f32,
    pub train_correctness: f32,
    pub test_correctness: f32,
}

impl fmt::Display for FoldAverages {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "train loss {:.4}, test loss {:.4}, train correctness {:.2}%, test correctness {:.2}%",
            self.train_loss, self.test_loss, self.train_correctness, self.test_correctness
        )
    }
}

fn columns<'a>(samples: impl Iterator<Item = &'a Sample>) -> (Vec<Vec<f32>>, Vec<Vec<f32>>) {
    samples
        .map(|s| (s.features.clone(), s.targets.clone()))
        .unzip()
}

/// Masks `table` with the hyperparameters' feature selection,
/// then trains and tests a fresh network on each of `folds`
/// folds, averaging the results.
///
/// Folds run in parallel, each with its own generator
/// seeded from `rng`.
///
/// # Errors
/// Returns an error if the mask or codebook don't fit the
/// table, or if the table can't be split into `folds` folds.
pub fn cross_validate<R: Rng + ?Sized>(
    table: &Table,
    hyperparameters: &Hyperparameters,
    folds: usize,
    codebook: &Equilateral,
    rng: &mut R,
) -> Result<FoldAverages, ConfigError> {
    if codebook.code_width() != table.target_count() {
        return Err(ConfigError::CodebookWidth {
            codebook: codebook.code_width(),
            targets: table.target_count(),
        });
    }
    let masked = table.select_features(&hyperparameters.features)?;
    let folds = Folds::split(&masked, folds)?;

    let seeds: Vec<u64> = (0..folds.count()).map(|_| rng.gen()).collect();
    let results: Vec<FoldAverages> = seeds
        .into_par_iter()
        .enumerate()
        .map(|(i, seed)| {
            let mut rng = ChaCha8Rng::seed_from_u64(seed);
            let (train_inputs, train_targets) = columns(folds.training(i));
            let (test_inputs, test_targets) = columns(folds.testing(i).iter());
            let (network, trained) = train(
                &train_inputs,
                &train_targets,
                hyperparameters.casper.clone(),
                codebook,
                &mut rng,
            );
            let tested = score(&network, &test_inputs, &test_targets, codebook);
            let result = FoldAverages {
                train_loss: trained.loss,
                test_loss: tested.loss,
                train_correctness: trained.correctness,
                test_correctness: tested.correctness,
            };
            debug!("fold {}: {} units, {}", i, network.hidden_count(), result);
            result
        })
        .collect();

    let n = results.len() as f32;
    let mean = |metric: fn(&FoldAverages) -> f32| results.iter().map(metric).sum::<f32>() / n;
    Ok(FoldAverages {
        train_loss: mean(|r| r.train_loss),
        test_loss: mean(|r| r.test_loss),
        train_correctness: mean(|r| r.train_correctness),
        test_correctness: mean(|r| r.test_correctness),
    })
}

/// Scores genomes by decoding them and cross-validating
/// the resulting settings over a fixed sample table.
///
/// # Examples
/// ```
/// use oxicasper::evaluation::{Equilateral, FitnessEvaluator, Sample, Table};
/// use oxicasper::genomics::{Dna, DnaConfig, DnaLayout};
/// use rand::SeedableRng;
/// use rand_chacha::ChaCha8Rng;
/// use std::num::NonZeroUsize;
///
/// let codebook = Equilateral::new(5, 0.1, 0.9).unwrap();
/// let samples = (0..10)
///     .map(|i| Sample {
///         features: (0..20).map(|f| ((i * f) % 7) as f32 / 7.0).collect(),
///         targets: codebook.encode(i % 5).unwrap().to_vec(),
///     })
///     .collect();
/// let table = Table::from_samples(20, 4, samples).unwrap();
/// let dna_config = DnaConfig { length: NonZeroUsize::new(42).unwrap() };
///
/// let evaluator =
///     FitnessEvaluator::new(table, DnaLayout::standard(), &dna_config, 2, codebook).unwrap();
/// let fitness = evaluator
///     .fitness(&Dna::from_bits(vec![false; 42]), &mut ChaCha8Rng::seed_from_u64(0))
///     .unwrap();
/// assert!((0.0..=100.0).contains(&fitness));
/// ```
#[derive(Clone, Debug)]
pub struct FitnessEvaluator {
    table: Table,
    layout: DnaLayout,
    folds: usize,
    codebook: Equilateral,
}

impl FitnessEvaluator {
    /// Creates an evaluator, checking the whole setup up front.
    ///
    /// # Errors
    /// Returns an error if the layout doesn't fit the DNA
    /// configuration or the table, if the codebook doesn't
    /// fit the table's targets, or if the table can't be
    /// split into `folds` folds.
    pub fn new(
        table: Table,
        layout: DnaLayout,
        dna_config: &DnaConfig,
        folds: usize,
        codebook: Equilateral,
    ) -> Result<FitnessEvaluator, ConfigError> {
        layout.validate(dna_config)?;
        if layout.features != table.feature_count() {
            return Err(ConfigError::MaskWidth {
                mask: layout.features,
                features: table.feature_count(),
            });
        }
        if codebook.code_width() != table.target_count() {
            return Err(ConfigError::CodebookWidth {
                codebook: codebook.code_width(),
                targets: table.target_count(),
            });
        }
        Folds::split(&table, folds)?;
        Ok(FitnessEvaluator {
            table,
            layout,
            folds,
            codebook,
        })
    }

    /// Decodes `dna` and cross-validates its settings.
    pub fn evaluate<R: Rng + ?Sized>(
        &self,
        dna: &Dna,
        rng: &mut R,
    ) -> Result<(Hyperparameters, FoldAverages), ConfigError> {
        let hyperparameters = self.layout.decode(dna);
        let averages = cross_validate(
            &self.table,
            &hyperparameters,
            self.folds,
            &self.codebook,
            rng,
        )?;
        debug!("{} [{}]: {}", dna, hyperparameters, averages);
        Ok((hyperparameters, averages))
    }

    /// Returns the average test correctness of `dna`'s settings.
    pub fn fitness<R: Rng + ?Sized>(&self, dna: &Dna, rng: &mut R) -> Result<f32, ConfigError> {
        self.evaluate(dna, rng)
            .map(|(_, averages)| averages.test_correctness)
    }

    pub fn layout(&self) -> &DnaLayout {
        &self.layout
    }

    pub fn table(&self) -> &Table {
        &self.table
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::networks::CasperConfig;
    use std::num::NonZeroUsize;

    fn codebook() -> Equilateral {
        Equilateral::new(5, 0.1, 0.9).unwrap()
    }

    fn table(rows: usize) -> Table {
        let codebook = codebook();
        let samples = (0..rows)
            .map(|i| Sample {
                features: (0..20).map(|f| ((i + 3 * f) % 11) as f32 / 11.0).collect(),
                targets: codebook.encode(i % 5).unwrap().to_vec(),
            })
            .collect();
        Table::from_samples(20, 4, samples).unwrap()
    }

    fn hyperparameters() -> Hyperparameters {
        Hyperparameters {
            features: vec![true; 20],
            casper: CasperConfig {
                unit_budget: 2,
                patience: 1.0,
                lr_1: 0.1,
                lr_2: 0.01,
                lr_3: 0.001,
            },
        }
    }

    fn dna_config() -> DnaConfig {
        DnaConfig {
            length: NonZeroUsize::new(42).unwrap(),
        }
    }

    #[test]
    fn averages_are_finite_and_bounded() {
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        let averages = cross_validate(&table(20), &hyperparameters(), 5, &codebook(), &mut rng).unwrap();
        for loss in [averages.train_loss, averages.test_loss] {
            assert!(loss.is_finite() && loss >= 0.0);
        }
        for correctness in [averages.train_correctness, averages.test_correctness] {
            assert!((0.0..=100.0).contains(&correctness));
        }
    }

    #[test]
    fn seeded_cross_validation_is_reproducible() {
        let run = || {
            let mut rng = ChaCha8Rng::seed_from_u64(1);
            cross_validate(&table(20), &hyperparameters(), 4, &codebook(), &mut rng).unwrap()
        };
        assert_eq!(run(), run());
    }

    #[test]
    fn empty_feature_mask_still_trains() {
        let mut hyperparameters = hyperparameters();
        hyperparameters.features = vec![false; 20];
        let mut rng = ChaCha8Rng::seed_from_u64(2);
        let averages = cross_validate(&table(10), &hyperparameters, 2, &codebook(), &mut rng).unwrap();
        assert!(averages.test_loss.is_finite());
    }

    #[test]
    fn setup_errors_surface_before_training() {
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        assert_eq!(
            cross_validate(&table(12), &hyperparameters(), 5, &codebook(), &mut rng),
            Err(ConfigError::RowCountNotDivisible { rows: 12, folds: 5 })
        );
        let three_classes = Equilateral::new(3, 0.1, 0.9).unwrap();
        assert_eq!(
            cross_validate(&table(10), &hyperparameters(), 5, &three_classes, &mut rng),
            Err(ConfigError::CodebookWidth {
                codebook: 2,
                targets: 4
            })
        );

        assert_eq!(
            FitnessEvaluator::new(table(12), DnaLayout::standard(), &dna_config(), 5, codebook())
                .unwrap_err(),
            ConfigError::RowCountNotDivisible { rows: 12, folds: 5 }
        );
        let short = DnaConfig {
            length: NonZeroUsize::new(40).unwrap(),
        };
        assert_eq!(
            FitnessEvaluator::new(table(10), DnaLayout::standard(), &short, 5, codebook())
                .unwrap_err(),
            ConfigError::LayoutWidthMismatch { layout: 42, dna: 40 }
        );
    }

    #[test]
    fn fitness_is_test_correctness() {
        let evaluator =
            FitnessEvaluator::new(table(10), DnaLayout::standard(), &dna_config(), 2, codebook())
                .unwrap();
        let mut bits = vec![true; 20];
        bits.extend(vec![false; 22]);
        let dna = Dna::from_bits(bits);

        let (decoded, averages) = evaluator
            .evaluate(&dna, &mut ChaCha8Rng::seed_from_u64(4))
            .unwrap();
        assert_eq!(decoded.selected_features().len(), 20);
        assert_eq!(decoded.casper.unit_budget, 1);
        let fitness = evaluator
            .fitness(&dna, &mut ChaCha8Rng::seed_from_u64(4))
            .unwrap();
        assert_eq!(fitness, averages.test_correctness);
    }
}
