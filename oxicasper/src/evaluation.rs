//! Class encoding, scoring and cross-validation
//! of CasPer networks over a sample table.
mod confusion;
mod cross_validation;
mod equilateral;
mod table;

pub use confusion::ConfusionMatrix;
pub use cross_validation::{cross_validate, FitnessEvaluator, FoldAverages};
pub use equilateral::Equilateral;
pub use table::{Folds, Sample, Table};
