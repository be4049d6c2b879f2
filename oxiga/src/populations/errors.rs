use std::error::Error;
use std::fmt;

/// An error type indicating that the population's
/// fitness values cannot be used as selection weights.
#[derive(Debug, Clone, PartialEq)]
pub enum SelectionError {
    /// A genome carried a negative or NaN fitness.
    /// Contains the genome's index and its fitness.
    InvalidFitness(usize, f32),
}

/// An error type for complete evolutionary runs,
/// wrapping either a failure of the user's fitness
/// evaluator or a selection failure.
#[derive(Debug)]
pub enum EvolutionError<E> {
    /// The fitness evaluator failed on some genome.
    Evaluation(E),
    /// Selection could not be carried out.
    Selection(SelectionError),
}

impl fmt::Display for SelectionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidFitness(index, fitness) => write!(
                f,
                "genome {} has fitness {}, which is unusable as a selection weight",
                index, fitness
            ),
        }
    }
}

impl<E: fmt::Display> fmt::Display for EvolutionError<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Evaluation(e) => write!(f, "fitness evaluation failed: {}", e),
            Self::Selection(e) => write!(f, "selection failed: {}", e),
        }
    }
}

impl Error for SelectionError {}

impl<E: Error + 'static> Error for EvolutionError<E> {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Evaluation(e) => Some(e),
            Self::Selection(e) => Some(e),
        }
    }
}

impl<E> From<SelectionError> for EvolutionError<E> {
    fn from(e: SelectionError) -> Self {
        Self::Selection(e)
    }
}
