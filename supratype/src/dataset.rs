use oxicasper::evaluation::{Equilateral, Sample, Table};
use oxicasper::ConfigError;

use csv::ReaderBuilder;

use std::error::Error;
use std::fmt;
use std::path::Path;

/// An error raised while loading the dataset.
#[derive(Debug)]
pub enum DatasetError {
    /// The file could not be read or is not valid CSV.
    Csv(csv::Error),
    /// A row has the wrong number of columns.
    RowWidth { row: usize, columns: usize },
    /// A cell is not a number, or the class is not a class index.
    Malformed { row: usize, column: usize },
    /// The rows do not fit the experiment's codebook.
    Config(ConfigError),
}

impl fmt::Display for DatasetError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Csv(e) => write!(f, "could not read dataset: {}", e),
            Self::RowWidth { row, columns } => write!(
                f,
                "row {} has {} columns, expected {} features and a class",
                row, columns, FEATURES
            ),
            Self::Malformed { row, column } => {
                write!(f, "row {}, column {} is not a valid value", row, column)
            }
            Self::Config(e) => write!(f, "invalid dataset: {}", e),
        }
    }
}

impl Error for DatasetError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Csv(e) => Some(e),
            Self::Config(e) => Some(e),
            _ => None,
        }
    }
}

impl From<csv::Error> for DatasetError {
    fn from(e: csv::Error) -> Self {
        Self::Csv(e)
    }
}

impl From<ConfigError> for DatasetError {
    fn from(e: ConfigError) -> Self {
        Self::Config(e)
    }
}

/// Number of GIS feature columns per row.
pub const FEATURES: usize = 20;

/// Loads a headerless CSV of pre-processed samples: 20 feature
/// columns followed by a 0-based class index, which is replaced
/// by its code in `codebook`. Row order is kept.
pub fn load<P: AsRef<Path>>(path: P, codebook: &Equilateral) -> Result<Table, DatasetError> {
    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .trim(csv::Trim::All)
        .from_path(path)?;

    let mut samples = vec![];
    for (row, record) in reader.records().enumerate() {
        let record = record?;
        if record.len() != FEATURES + 1 {
            return Err(DatasetError::RowWidth {
                row,
                columns: record.len(),
            });
        }
        let features = record
            .iter()
            .take(FEATURES)
            .enumerate()
            .map(|(column, cell)| {
                cell.parse::<f32>()
                    .ok()
                    .filter(|x| x.is_finite())
                    .ok_or(DatasetError::Malformed { row, column })
            })
            .collect::<Result<Vec<f32>, _>>()?;
        let class = record[FEATURES]
            .parse::<usize>()
            .map_err(|_| DatasetError::Malformed {
                row,
                column: FEATURES,
            })?;
        samples.push(Sample {
            features,
            targets: codebook.encode(class)?.to_vec(),
        });
    }
    Ok(Table::from_samples(FEATURES, codebook.code_width(), samples)?)
}
