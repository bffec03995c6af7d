use crate::network;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("network cannot be exported: {0}")]
    Network(#[from] network::Error),

    #[error("network has no hidden layer; the exported format needs at least one activation")]
    NoHiddenLayer,

    #[error("layer group {group}: activation '{activation}' is not supported by the exported format")]
    UnsupportedActivation { group: usize, activation: String },

    #[error(
        "layer group {group}: activation '{found}' differs from '{first}'; the exported format allows a single activation"
    )]
    MixedActivations {
        group: usize,
        first: String,
        found: String,
    },

    #[error("model expects {model} descriptor channels, but the descriptor produces {descriptor}")]
    DescriptorMismatch { model: usize, descriptor: usize },

    #[error("normalization statistics have {actual} channels, expected {expected}")]
    ChannelMismatch { expected: usize, actual: usize },

    #[error("failed to render descriptor parameters: {0}")]
    Render(#[source] std::io::Error),

    #[error("failed to format parameter file")]
    Format(#[from] std::fmt::Error),

    #[error("failed to write '{path}': {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
