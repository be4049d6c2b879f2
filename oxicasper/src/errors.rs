use std::error::Error;
use std::fmt;

/// An error type indicating an invalid experiment setup.
/// These are detected once, before any training starts,
/// and are never retried.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// The DNA layout's fields do not add up to the DNA length.
    LayoutWidthMismatch { layout: usize, dna: usize },
    /// A hyperparameter field has no bits.
    EmptyField(&'static str),
    /// A hyperparameter field has more bits than can be decoded.
    FieldTooWide(&'static str, usize),
    /// A hyperparameter field's interval is empty or not finite.
    InvalidRange(&'static str),
    /// Cross-validation needs at least two folds.
    TooFewFolds(usize),
    /// The sample table cannot be split into equal folds.
    RowCountNotDivisible { rows: usize, folds: usize },
    /// The sample table has no rows.
    EmptyTable,
    /// A sample's widths differ from the table's.
    SampleWidth {
        index: usize,
        features: usize,
        targets: usize,
    },
    /// A feature mask's width differs from the table's feature count.
    MaskWidth { mask: usize, features: usize },
    /// The codebook's code width differs from the table's target count.
    CodebookWidth { codebook: usize, targets: usize },
    /// A codebook needs at least two classes.
    TooFewClasses(usize),
    /// A class index lies outside the codebook.
    UnknownClass { class: usize, classes: usize },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::LayoutWidthMismatch { layout, dna } => write!(
                f,
                "DNA layout spans {} bits but the DNA is {} bits long",
                layout, dna
            ),
            Self::EmptyField(name) => write!(f, "DNA field `{}` has zero width", name),
            Self::FieldTooWide(name, width) => write!(
                f,
                "DNA field `{}` is {} bits wide, at most 32 are supported",
                name, width
            ),
            Self::InvalidRange(name) => write!(f, "invalid interval for `{}`", name),
            Self::TooFewFolds(folds) => write!(
                f,
                "cross-validation needs at least 2 folds, {} requested",
                folds
            ),
            Self::RowCountNotDivisible { rows, folds } => write!(
                f,
                "{} rows cannot be split into {} equal folds",
                rows, folds
            ),
            Self::EmptyTable => write!(f, "sample table is empty"),
            Self::SampleWidth {
                index,
                features,
                targets,
            } => write!(
                f,
                "sample {} has {} features and {} targets, which does not match the table",
                index, features, targets
            ),
            Self::MaskWidth { mask, features } => write!(
                f,
                "feature mask has {} entries for {} features",
                mask, features
            ),
            Self::CodebookWidth { codebook, targets } => write!(
                f,
                "codebook codes are {} wide but samples have {} targets",
                codebook, targets
            ),
            Self::TooFewClasses(classes) => write!(
                f,
                "a codebook needs at least 2 classes, {} requested",
                classes
            ),
            Self::UnknownClass { class, classes } => write!(
                f,
                "class {} is outside a codebook of {} classes",
                class, classes
            ),
        }
    }
}

impl Error for ConfigError {}
