use thiserror::Error;

/// Configuration errors of a sequential model.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    #[error("add_layers called multiple times; it must be called only once")]
    LayersAlreadyAdded,

    #[error("model is already locked")]
    AlreadyLocked,

    #[error("cannot push a layer onto a locked model")]
    PushAfterLock,

    #[error("model is not locked; lock it before use")]
    NotLocked,

    #[error("model has no layers")]
    Empty,

    #[error("model contains no linear layer")]
    NoLinearLayer,

    #[error("layer {index}: the first layer cannot be a {kind} activation")]
    ActivationFirst { index: usize, kind: String },

    #[error("layer {index}: a {kind} activation must follow a linear layer, found {previous}")]
    MisplacedActivation {
        index: usize,
        kind: String,
        previous: String,
    },

    #[error("layer {index}: a dropout layer must be first or follow an activation, found {previous}")]
    MisplacedDropout { index: usize, previous: String },

    #[error("layer {index}: dropout probability {p} is outside [0, 1)")]
    InvalidDropout { index: usize, p: f64 },

    #[error(
        "layer {index}: input width of the first linear layer is {actual}, but the descriptor has {expected} channels"
    )]
    FirstLayerWidth {
        index: usize,
        expected: usize,
        actual: usize,
    },

    #[error("layer {index}: output width of the last linear layer must be 1, found {actual}")]
    OutputWidth { index: usize, actual: usize },

    #[error("layer {index}: {details}")]
    Shape { index: usize, details: String },

    #[error("input has {actual} columns, but the model expects {expected} descriptor channels")]
    InputWidth { expected: usize, actual: usize },

    #[error("layer group {group}: {details}")]
    GroupLayout { group: usize, details: String },
}

impl Error {
    pub fn group(group: usize, details: impl Into<String>) -> Self {
        Self::GroupLayout {
            group,
            details: details.into(),
        }
    }
}
