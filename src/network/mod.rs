//! Sequential dense network predicting per-atom energy contributions.
//!
//! - [`activation`] – Element-wise nonlinearities and their derivatives.
//! - [`layer`] – The tagged layer variants (`Linear`, `Activation`, `Dropout`).
//! - [`model`] – The `Empty -> Building -> Locked` model and its forward passes.
//! - [`group`] – Splitting a layer sequence into exportable groups.
//! - [`error`] – Configuration errors.
//!
//! The network maps a `[atoms, channels]` fingerprint to `[atoms, 1]`; the
//! configuration energy is the sum over atoms. Training is left to the
//! caller, which may update weights in place through
//! [`Model::parameters_mut`].

pub mod activation;
pub mod error;
pub mod group;
pub mod layer;
pub mod model;

pub use activation::Activation;
pub use error::Error;
pub use group::{Groups, HiddenGroup};
pub use layer::{Layer, Linear};
pub use model::{Model, State};
