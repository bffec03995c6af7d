//! Core data structures flowing through the fingerprint and export pipeline.
//!
//! - [`atom`] – Minimal atom representation with species label and Cartesian coordinates.
//! - [`configuration`] – Labelled atomic configurations (energy and forces).
//! - [`fingerprint`] – Generalized coordinates and their derivatives for one configuration.
//! - [`precision`] – Floating-point width used for serialized data and exported parameters.
//!
//! Raw geometry ([`Configuration`]) is kept separate from its machine-learning
//! representation ([`Fingerprint`]) so that descriptors, statistics and the
//! record writer can be composed freely.
//!
//! [`Configuration`]: configuration::Configuration
//! [`Fingerprint`]: fingerprint::Fingerprint

pub mod atom;
pub mod configuration;
pub mod fingerprint;
pub mod precision;
