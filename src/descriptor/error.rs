//! Error types for fingerprint generation.

use thiserror::Error;

/// Errors raised while configuring a descriptor or generating fingerprints.
#[derive(Debug, Error)]
pub enum Error {
    /// Failed to parse a descriptor configuration TOML.
    #[error("failed to parse descriptor configuration: {0}")]
    ConfigParse(#[from] toml::de::Error),

    /// A hyperparameter is outside its valid range.
    #[error("invalid descriptor hyperparameter: {0}")]
    InvalidHyperparameter(String),

    /// No cutoff radius is configured for a species pair present in a configuration.
    #[error("unsupported species pair '{first}-{second}' in configuration '{id}': no cutoff configured")]
    UnsupportedSpeciesPair {
        /// Configuration identifier.
        id: String,
        /// First species of the pair.
        first: String,
        /// Second species of the pair.
        second: String,
    },

    /// The configuration contains no atoms.
    #[error("configuration '{0}' contains no atoms")]
    EmptyConfiguration(String),

    /// Two atoms share the same position, leaving their bond direction undefined.
    #[error("atoms {i} and {j} of configuration '{id}' are coincident")]
    CoincidentAtoms {
        /// Configuration identifier.
        id: String,
        /// First atom index.
        i: usize,
        /// Second atom index.
        j: usize,
    },
}

impl Error {
    pub fn unsupported_pair(id: &str, first: &str, second: &str) -> Self {
        Self::UnsupportedSpeciesPair {
            id: id.to_string(),
            first: first.to_string(),
            second: second.to_string(),
        }
    }
}
