use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("descriptor failed: {0}")]
    Descriptor(#[from] crate::descriptor::Error),

    #[error("cannot compute statistics of an empty dataset")]
    EmptyDataset,

    #[error("at least 2 fingerprint rows are required for a standard deviation, got {rows}")]
    TooFewSamples { rows: usize },

    #[error(
        "out of memory holding the fingerprints of {rows} atoms x {channels} channels; use the memory-efficient Welford strategy instead"
    )]
    OutOfMemory { rows: usize, channels: usize },

    #[error("configuration '{id}' produced {actual} channels, expected {expected}")]
    ChannelDrift {
        id: String,
        expected: usize,
        actual: usize,
    },

    #[error("failed to build worker pool: {0}")]
    ThreadPool(String),
}
