use super::Format;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("I/O operation failed: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },

    #[error("failed to parse {format} data: {details} (at line ~{line})")]
    Parse {
        format: Format,
        line: usize,
        details: String,
    },

    #[error("malformed record #{index}: {details}")]
    Record { index: usize, details: String },

    #[error(
        "normalization statistics describe {actual} descriptor channels, but the descriptor produces {expected}"
    )]
    ChannelMismatch { expected: usize, actual: usize },

    #[error("invalid model checkpoint: {0}")]
    Checkpoint(#[from] serde_json::Error),

    #[error("checkpoint does not describe a valid model: {0}")]
    InvalidModel(#[from] crate::network::Error),

    #[error("invalid configuration data: {0}")]
    Configuration(#[from] crate::model::configuration::ForceLengthError),
}

impl Error {
    pub fn parse(format: Format, line: usize, details: impl Into<String>) -> Self {
        Self::Parse {
            format,
            line,
            details: details.into(),
        }
    }

    pub fn record(index: usize, details: impl Into<String>) -> Self {
        Self::Record {
            index,
            details: details.into(),
        }
    }
}
