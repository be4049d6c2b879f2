use crate::errors::ConfigError;

use serde::{Deserialize, Serialize};

/// An equilateral class encoding: every class is a vertex of
/// a regular simplex, so all class codes lie at the same
/// distance from each other. `n` classes take `n - 1`
/// coordinates, each in `[low, high]`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Equilateral {
    codes: Vec<Vec<f32>>,
}

impl Equilateral {
    /// Builds the codebook for `class_count` classes, with
    /// coordinates rescaled from `[-1, 1]` onto `[low, high]`.
    ///
    /// # Errors
    /// Returns an error if fewer than 2 classes are requested,
    /// or if the interval is empty or not finite.
    ///
    /// # Examples
    /// ```
    /// use oxicasper::evaluation::Equilateral;
    ///
    /// let codebook = Equilateral::new(5, 0.0, 1.0).unwrap();
    /// assert_eq!(codebook.code_width(), 4);
    /// assert_eq!(codebook.decode(codebook.encode(3).unwrap()), 3);
    /// ```
    pub fn new(class_count: usize, low: f32, high: f32) -> Result<Equilateral, ConfigError> {
        if class_count < 2 {
            return Err(ConfigError::TooFewClasses(class_count));
        }
        if !(low.is_finite() && high.is_finite() && low < high) {
            return Err(ConfigError::InvalidRange("codebook"));
        }

        let width = class_count - 1;
        let mut simplex = vec![vec![0.0f64; width]; class_count];
        simplex[0][0] = -1.0;
        simplex[1][0] = 1.0;
        for k in 2..class_count {
            let r = k as f64;
            let shrink = (r * r - 1.0).sqrt() / r;
            for vertex in &mut simplex[..k] {
                for x in &mut vertex[..k - 1] {
                    *x *= shrink;
                }
                vertex[k - 1] = -1.0 / r;
            }
            simplex[k][k - 1] = 1.0;
        }

        let (low, high) = (low as f64, high as f64);
        let codes = simplex
            .into_iter()
            .map(|vertex| {
                vertex
                    .into_iter()
                    .map(|x| ((x + 1.0) / 2.0 * (high - low) + low) as f32)
                    .collect()
            })
            .collect();
        Ok(Equilateral { codes })
    }

    /// Returns the code of `class`.
    ///
    /// # Errors
    /// Returns an error if the class is outside the codebook.
    pub fn encode(&self, class: usize) -> Result<&[f32], ConfigError> {
        self.codes
            .get(class)
            .map(Vec::as_slice)
            .ok_or(ConfigError::UnknownClass {
                class,
                classes: self.codes.len(),
            })
    }

    /// Returns the class whose code is nearest to `output`,
    /// preferring the lowest class on ties.
    pub fn decode(&self, output: &[f32]) -> usize {
        let mut best = (0, f32::INFINITY);
        for (class, code) in self.codes.iter().enumerate() {
            let distance: f32 = code
                .iter()
                .zip(output)
                .map(|(c, o)| (c - o) * (c - o))
                .sum();
            if distance < best.1 {
                best = (class, distance);
            }
        }
        best.0
    }

    pub fn class_count(&self) -> usize {
        self.codes.len()
    }

    /// Returns the number of coordinates in a code.
    pub fn code_width(&self) -> usize {
        self.codes.len() - 1
    }
}
