use crate::evaluation::Equilateral;

use serde::{Deserialize, Serialize};

use std::fmt;

/// Counts of actual against predicted classes.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfusionMatrix {
    // counts[actual][predicted]
    counts: Vec<Vec<usize>>,
}

impl ConfusionMatrix {
    /// Decodes every target and prediction row
    /// with `codebook` and tallies the pairs.
    ///
    /// # Examples
    /// ```
    /// use oxicasper::evaluation::{ConfusionMatrix, Equilateral};
    ///
    /// let codebook = Equilateral::new(3, 0.0, 1.0).unwrap();
    /// let code = |c| codebook.encode(c).unwrap().to_vec();
    /// let targets = vec![code(0), code(1), code(2), code(2)];
    /// let predictions = vec![code(0), code(2), code(2), code(2)];
    ///
    /// let matrix = ConfusionMatrix::tally(&codebook, &targets, &predictions);
    /// assert_eq!(matrix.correct(), 3);
    /// assert_eq!(matrix.get(1, 2), 1);
    /// assert_eq!(matrix.correctness(), 75.0);
    /// ```
    pub fn tally(
        codebook: &Equilateral,
        targets: &[Vec<f32>],
        predictions: &[Vec<f32>],
    ) -> ConfusionMatrix {
        let classes = codebook.class_count();
        let mut counts = vec![vec![0; classes]; classes];
        for (target, prediction) in targets.iter().zip(predictions) {
            counts[codebook.decode(target)][codebook.decode(prediction)] += 1;
        }
        ConfusionMatrix { counts }
    }

    /// Returns how often `actual` was predicted as `predicted`.
    pub fn get(&self, actual: usize, predicted: usize) -> usize {
        self.counts
            .get(actual)
            .and_then(|row| row.get(predicted))
            .copied()
            .unwrap_or(0)
    }

    /// Returns the number of correctly classified samples.
    pub fn correct(&self) -> usize {
        (0..self.counts.len()).map(|c| self.counts[c][c]).sum()
    }

    /// Returns the number of tallied samples.
    pub fn total(&self) -> usize {
        self.counts.iter().flatten().sum()
    }

    /// Returns the percentage of correctly classified
    /// samples, or 0 if nothing was tallied.
    pub fn correctness(&self) -> f32 {
        match self.total() {
            0 => 0.0,
            total => 100.0 * self.correct() as f32 / total as f32,
        }
    }
}

impl fmt::Display for ConfusionMatrix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let width = self
            .counts
            .iter()
            .flatten()
            .map(|c| c.to_string().len())
            .max()
            .unwrap_or(1);
        for row in &self.counts {
            let cells: Vec<String> = row.iter().map(|c| format!("{:>w$}", c, w = width)).collect();
            writeln!(f, "[{}]", cells.join(" "))?;
        }
        Ok(())
    }
}
