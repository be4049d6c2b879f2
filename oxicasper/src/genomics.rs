//! Bit-string genomes and their decoding
//! into CasPer network settings.
mod config;
mod dna;
mod layout;

pub use config::DnaConfig;
pub use dna::Dna;
pub use layout::{DnaLayout, FieldSpec, Hyperparameters};
