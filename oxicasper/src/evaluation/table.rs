use crate::errors::ConfigError;

use serde::{Deserialize, Serialize};

/// One row of a [`Table`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    pub features: Vec<f32>,
    pub targets: Vec<f32>,
}

/// An ordered table of samples sharing
/// the same feature and target widths.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Table {
    feature_count: usize,
    target_count: usize,
    samples: Vec<Sample>,
}

impl Table {
    /// Creates a table from `samples`, keeping their order.
    ///
    /// # Errors
    /// Returns an error if any sample's widths differ
    /// from `feature_count` and `target_count`.
    ///
    /// # Examples
    /// ```
    /// use oxicasper::evaluation::{Sample, Table};
    ///
    /// let samples = vec![
    ///     Sample { features: vec![0.0, 1.0], targets: vec![1.0] },
    ///     Sample { features: vec![1.0, 1.0], targets: vec![0.0] },
    /// ];
    /// let table = Table::from_samples(2, 1, samples).unwrap();
    /// assert_eq!(table.len(), 2);
    /// ```
    pub fn from_samples(
        feature_count: usize,
        target_count: usize,
        samples: Vec<Sample>,
    ) -> Result<Table, ConfigError> {
        if let Some((index, sample)) = samples.iter().enumerate().find(|(_, s)| {
            s.features.len() != feature_count || s.targets.len() != target_count
        }) {
            return Err(ConfigError::SampleWidth {
                index,
                features: sample.features.len(),
                targets: sample.targets.len(),
            });
        }
        Ok(Table {
            feature_count,
            target_count,
            samples,
        })
    }

    /// Returns a copy of the table holding only the feature
    /// columns set in `mask`, in their original order.
    /// Targets are kept intact.
    ///
    /// # Errors
    /// Returns an error if the mask's width differs
    /// from the table's feature count.
    ///
    /// # Examples
    /// ```
    /// use oxicasper::evaluation::{Sample, Table};
    ///
    /// let sample = Sample { features: vec![1.0, 2.0, 3.0], targets: vec![0.5] };
    /// let table = Table::from_samples(3, 1, vec![sample]).unwrap();
    /// let masked = table.select_features(&[true, false, true]).unwrap();
    /// assert_eq!(masked.samples()[0].features, vec![1.0, 3.0]);
    /// assert_eq!(masked.samples()[0].targets, vec![0.5]);
    /// ```
    pub fn select_features(&self, mask: &[bool]) -> Result<Table, ConfigError> {
        if mask.len() != self.feature_count {
            return Err(ConfigError::MaskWidth {
                mask: mask.len(),
                features: self.feature_count,
            });
        }
        let samples = self
            .samples
            .iter()
            .map(|s| Sample {
                features: s
                    .features
                    .iter()
                    .zip(mask)
                    .filter_map(|(f, keep)| keep.then(|| *f))
                    .collect(),
                targets: s.targets.clone(),
            })
            .collect();
        Ok(Table {
            feature_count: mask.iter().filter(|m| **m).count(),
            target_count: self.target_count,
            samples,
        })
    }

    pub fn samples(&self) -> &[Sample] {
        &self.samples
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn feature_count(&self) -> usize {
        self.feature_count
    }

    pub fn target_count(&self) -> usize {
        self.target_count
    }
}

/// A table split into `k` contiguous, equal-size,
/// disjoint partitions.
#[derive(Clone, Copy, Debug)]
pub struct Folds<'t> {
    table: &'t Table,
    count: usize,
    size: usize,
}

impl<'t> Folds<'t> {
    /// Splits `table` into `count` folds.
    ///
    /// # Errors
    /// Returns an error if `count` is below 2, the table
    /// is empty, or its rows cannot be split evenly.
    ///
    /// # Examples
    /// ```
    /// use oxicasper::evaluation::{Folds, Sample, Table};
    ///
    /// let samples = (0..6)
    ///     .map(|i| Sample { features: vec![i as f32], targets: vec![0.0] })
    ///     .collect();
    /// let table = Table::from_samples(1, 1, samples).unwrap();
    /// let folds = Folds::split(&table, 3).unwrap();
    ///
    /// assert_eq!(folds.testing(1)[0].features, vec![2.0]);
    /// let training: Vec<f32> = folds.training(1).map(|s| s.features[0]).collect();
    /// assert_eq!(training, vec![0.0, 1.0, 4.0, 5.0]);
    /// assert!(Folds::split(&table, 4).is_err());
    /// ```
    pub fn split(table: &'t Table, count: usize) -> Result<Folds<'t>, ConfigError> {
        if count < 2 {
            return Err(ConfigError::TooFewFolds(count));
        }
        if table.is_empty() {
            return Err(ConfigError::EmptyTable);
        }
        if table.len() % count != 0 {
            return Err(ConfigError::RowCountNotDivisible {
                rows: table.len(),
                folds: count,
            });
        }
        Ok(Folds {
            table,
            count,
            size: table.len() / count,
        })
    }

    /// Returns the number of folds.
    pub fn count(&self) -> usize {
        self.count
    }

    /// Returns the held-out partition of fold `i`.
    ///
    /// # Panics
    /// Panics if `i` is not below [`count`](Folds::count).
    pub fn testing(&self, i: usize) -> &'t [Sample] {
        assert!(i < self.count, "fold {} of {}", i, self.count);
        let table: &'t Table = self.table;
        &table.samples[i * self.size..(i + 1) * self.size]
    }

    /// Returns every partition except `i`, in table order.
    ///
    /// # Panics
    /// Panics if `i` is not below [`count`](Folds::count).
    pub fn training(&self, i: usize) -> impl Iterator<Item = &'t Sample> {
        assert!(i < self.count, "fold {} of {}", i, self.count);
        let table: &'t Table = self.table;
        let samples = &table.samples;
        samples[..i * self.size]
            .iter()
            .chain(&samples[(i + 1) * self.size..])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(rows: usize) -> Table {
        let samples = (0..rows)
            .map(|i| Sample {
                features: vec![i as f32, -(i as f32)],
                targets: vec![0.1, 0.9],
            })
            .collect();
        Table::from_samples(2, 2, samples).unwrap()
    }

    #[test]
    fn sample_width_mismatch() {
        let samples = vec![
            Sample {
                features: vec![0.0],
                targets: vec![0.0],
            },
            Sample {
                features: vec![0.0, 1.0],
                targets: vec![0.0],
            },
        ];
        assert_eq!(
            Table::from_samples(1, 1, samples),
            Err(ConfigError::SampleWidth {
                index: 1,
                features: 2,
                targets: 1
            })
        );
    }

    #[test]
    fn mask_width_mismatch() {
        assert_eq!(
            table(4).select_features(&[true]),
            Err(ConfigError::MaskWidth {
                mask: 1,
                features: 2
            })
        );
    }

    #[test]
    fn empty_mask_keeps_rows() {
        let masked = table(4).select_features(&[false, false]).unwrap();
        assert_eq!(masked.len(), 4);
        assert_eq!(masked.feature_count(), 0);
        assert!(masked.samples().iter().all(|s| s.features.is_empty()));
        assert_eq!(masked.target_count(), 2);
    }

    #[test]
    fn folds_partition_every_sample_once() {
        let table = table(20);
        let folds = Folds::split(&table, 5).unwrap();
        assert_eq!(folds.count(), 5);
        let mut seen = vec![0; 20];
        for i in 0..5 {
            let testing = folds.testing(i);
            assert_eq!(testing.len(), 4);
            for s in testing {
                seen[s.features[0] as usize] += 1;
            }
            let training: Vec<usize> = folds.training(i).map(|s| s.features[0] as usize).collect();
            assert_eq!(training.len(), 16);
            assert!(training.windows(2).all(|w| w[0] < w[1]));
            assert!(training.iter().all(|t| t / 4 != i));
        }
        assert!(seen.iter().all(|n| *n == 1));
    }

    #[test]
    fn invalid_splits() {
        assert_eq!(
            Folds::split(&table(10), 1).unwrap_err(),
            ConfigError::TooFewFolds(1)
        );
        assert_eq!(
            Folds::split(&table(0), 2).unwrap_err(),
            ConfigError::EmptyTable
        );
        assert_eq!(
            Folds::split(&table(10), 3).unwrap_err(),
            ConfigError::RowCountNotDivisible { rows: 10, folds: 3 }
        );
    }
}
