use crate::errors::ConfigError;
use crate::genomics::{Dna, DnaConfig};
use crate::networks::CasperConfig;

use serde::{Deserialize, Serialize};

use std::fmt;

/// Widest field that can be decoded.
const MAX_FIELD_WIDTH: usize = 32;

/// A contiguous run of DNA bits, read as an unsigned
/// integer and rescaled linearly onto `[min, max]`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct FieldSpec {
    /// Number of bits in the field.
    pub width: usize,
    /// Value of the all-zeros field.
    pub min: f32,
    /// Value of the all-ones field.
    pub max: f32,
}

impl FieldSpec {
    /// Creates a field of `width` bits spanning `[min, max]`.
    pub const fn new(width: usize, min: f32, max: f32) -> FieldSpec {
        FieldSpec { width, min, max }
    }

    /// Rescales a raw field value onto the field's interval.
    ///
    /// # Examples
    /// ```
    /// use oxicasper::genomics::FieldSpec;
    ///
    /// let field = FieldSpec::new(2, 1.0, 4.0);
    /// assert_eq!(field.scale(0), 1.0);
    /// assert_eq!(field.scale(2), 3.0);
    /// assert_eq!(field.scale(3), 4.0);
    /// ```
    pub fn scale(&self, raw: u64) -> f32 {
        let top = ((1u64 << self.width) - 1) as f64;
        let fraction = raw.min(top as u64) as f64 / top;
        let value = self.min as f64 + (self.max as f64 - self.min as f64) * fraction;
        (value as f32).clamp(self.min, self.max)
    }

    fn validate(&self, name: &'static str) -> Result<(), ConfigError> {
        if self.width == 0 {
            Err(ConfigError::EmptyField(name))
        } else if self.width > MAX_FIELD_WIDTH {
            Err(ConfigError::FieldTooWide(name, self.width))
        } else if !(self.min.is_finite() && self.max.is_finite() && self.min <= self.max) {
            Err(ConfigError::InvalidRange(name))
        } else {
            Ok(())
        }
    }
}

/// The fixed field layout of a [`Dna`]: one bit per
/// input feature, followed by the unit budget, the
/// patience multiplier, and the three learning rates.
///
/// The unit budget and patience are rounded to whole
/// numbers after rescaling.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DnaLayout {
    /// Number of feature-selection bits.
    pub features: usize,
    pub unit_budget: FieldSpec,
    pub patience: FieldSpec,
    pub lr_1: FieldSpec,
    pub lr_2: FieldSpec,
    pub lr_3: FieldSpec,
}

impl DnaLayout {
    /// The 42-bit layout for the 20 GIS features.
    ///
    /// # Examples
    /// ```
    /// use oxicasper::genomics::DnaLayout;
    ///
    /// assert_eq!(DnaLayout::standard().width(), 42);
    /// ```
    pub const fn standard() -> DnaLayout {
        DnaLayout {
            features: 20,
            unit_budget: FieldSpec::new(4, 1.0, 16.0),
            patience: FieldSpec::new(4, 1.0, 16.0),
            lr_1: FieldSpec::new(5, 0.05, 0.5),
            lr_2: FieldSpec::new(5, 0.001, 0.05),
            lr_3: FieldSpec::new(4, 0.0001, 0.005),
        }
    }

    /// Returns the hyperparameter fields, in DNA order.
    fn fields(&self) -> [(&'static str, &FieldSpec); 5] {
        [
            ("unit_budget", &self.unit_budget),
            ("patience", &self.patience),
            ("lr_1", &self.lr_1),
            ("lr_2", &self.lr_2),
            ("lr_3", &self.lr_3),
        ]
    }

    /// Returns the total number of bits spanned by the layout.
    pub fn width(&self) -> usize {
        self.features + self.fields().iter().map(|(_, f)| f.width).sum::<usize>()
    }

    /// Checks that every field is decodable and that
    /// the layout spans exactly the configured DNA length.
    ///
    /// # Errors
    /// Returns the first problem found.
    ///
    /// # Examples
    /// ```
    /// use oxicasper::genomics::{DnaConfig, DnaLayout};
    /// use std::num::NonZeroUsize;
    ///
    /// let layout = DnaLayout::standard();
    /// assert!(layout.validate(&DnaConfig { length: NonZeroUsize::new(42).unwrap() }).is_ok());
    /// assert!(layout.validate(&DnaConfig { length: NonZeroUsize::new(40).unwrap() }).is_err());
    /// ```
    pub fn validate(&self, config: &DnaConfig) -> Result<(), ConfigError> {
        for (name, field) in self.fields() {
            field.validate(name)?;
        }
        if self.width() != config.length.get() {
            return Err(ConfigError::LayoutWidthMismatch {
                layout: self.width(),
                dna: config.length.get(),
            });
        }
        Ok(())
    }

    /// Decodes a genome into a feature mask and network settings.
    ///
    /// Decoding is a pure function of the bits; the layout is
    /// assumed to have been [validated] against the genome's
    /// configuration.
    ///
    /// [validated]: DnaLayout::validate
    ///
    /// # Examples
    /// ```
    /// use oxicasper::genomics::{Dna, DnaLayout};
    ///
    /// let hyperparameters = DnaLayout::standard().decode(&Dna::from_bits(vec![true; 42]));
    /// assert_eq!(hyperparameters.selected_features().len(), 20);
    /// assert_eq!(hyperparameters.casper.unit_budget, 16);
    /// assert_eq!(hyperparameters.casper.lr_1, 0.5);
    /// ```
    pub fn decode(&self, dna: &Dna) -> Hyperparameters {
        let features = (0..self.features)
            .map(|i| dna.bits().get(i).copied().unwrap_or(false))
            .collect();
        let mut offset = self.features;
        let mut read = |field: &FieldSpec| {
            let value = field.scale(dna.read_unsigned(offset, field.width));
            offset += field.width;
            value
        };
        let unit_budget = read(&self.unit_budget).round() as usize;
        let patience = read(&self.patience).round();
        let lr_1 = read(&self.lr_1);
        let lr_2 = read(&self.lr_2);
        let lr_3 = read(&self.lr_3);

        Hyperparameters {
            features,
            casper: CasperConfig {
                unit_budget,
                patience,
                lr_1,
                lr_2,
                lr_3,
            },
        }
    }
}

/// A decoded genome: which input features
/// participate, and how the network is grown.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Hyperparameters {
    pub features: Vec<bool>,
    pub casper: CasperConfig,
}

impl Hyperparameters {
    /// Returns the indices of the selected features.
    pub fn selected_features(&self) -> Vec<usize> {
        self.features
            .iter()
            .enumerate()
            .filter_map(|(i, selected)| selected.then(|| i))
            .collect()
    }
}

impl fmt::Display for Hyperparameters {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "features {:?}, units {}, p {}, lr_1 {}, lr_2 {}, lr_3 {}",
            self.selected_features(),
            self.casper.unit_budget,
            self.casper.patience,
            self.casper.lr_1,
            self.casper.lr_2,
            self.casper.lr_3
        )
    }
}
