//! Fingerprint generation.
//!
//! A [`Descriptor`] turns a [`Configuration`] into generalized coordinates
//! (one row of channels per atom) and their derivatives with respect to every
//! atomic coordinate. [`SymmetryFunctions`] is the only implementation: the
//! Behler–Parrinello `G1`–`G5` family with a `cos` or `exp` cutoff and one
//! cutoff radius per species pair.
//!
//! Configurations are treated as isolated clusters; no periodic images are
//! generated.

use crate::model::{
    configuration::Configuration, fingerprint::Fingerprint, precision::Precision,
};
use crate::normalize::Normalization;
use std::io::{self, Write};

mod config;
mod cutoff;
mod error;
mod neighbor;
mod params;
mod symmetry;

pub use config::{
    AngularParams, DescriptorConfig, FunctionSet, G2Params, G3Params, default_function_set,
};
pub use cutoff::CutoffKind;
pub use error::Error;
pub use symmetry::SymmetryFunctions;

/// Maps configurations to fingerprints.
///
/// Implementations are pure: the same configuration always produces the same
/// fingerprint, and `generate` may be called concurrently.
pub trait Descriptor: Send + Sync {
    /// Number of fingerprint channels per atom.
    fn channel_count(&self) -> usize;

    /// Computes `zeta` (`[atoms, channels]`) and `dzeta/dr`
    /// (`[atoms, channels, atoms * 3]`).
    fn generate(&self, conf: &Configuration) -> Result<Fingerprint, Error>;

    /// Writes the driver-side description of this descriptor, including the
    /// normalization section.
    fn write_kim_params(
        &self,
        writer: &mut dyn Write,
        normalization: &Normalization,
        precision: Precision,
    ) -> io::Result<()>;
}

impl Descriptor for SymmetryFunctions {
    fn channel_count(&self) -> usize {
        SymmetryFunctions::channel_count(self)
    }

    fn generate(&self, conf: &Configuration) -> Result<Fingerprint, Error> {
        self.compute(conf)
    }

    fn write_kim_params(
        &self,
        writer: &mut dyn Write,
        normalization: &Normalization,
        precision: Precision,
    ) -> io::Result<()> {
        params::write(self, writer, normalization, precision)
    }
}
