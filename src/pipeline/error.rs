use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("dataset is empty")]
    EmptyDataset,

    #[error("validation set size {validation} is larger than the dataset size {dataset}")]
    ValidationTooLarge { validation: usize, dataset: usize },

    #[error("normalization file '{path}' not found; preprocess the training set first")]
    MissingNormalization { path: PathBuf },

    #[error("file operation on '{path}' failed: {source}")]
    File {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Descriptor(#[from] crate::descriptor::Error),

    #[error(transparent)]
    Stats(#[from] crate::stats::Error),

    #[error(transparent)]
    Io(#[from] crate::io::Error),
}

impl Error {
    pub fn file(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::File {
            path: path.into(),
            source,
        }
    }
}
