//! Symmetry-function fingerprints, streaming normalization and KIM export for
//! neural-network interatomic potentials.
//!
//! The crate turns labelled atomic configurations into machine-learning-ready
//! fingerprints, normalizes them with statistics gathered over arbitrarily
//! large datasets, hosts a sequential network that predicts energies and
//! forces from those fingerprints, and writes a trained network in the
//! parameter format read by the KIM neural-network model driver.
//!
//! # Features
//!
//! - **Descriptor** — Behler–Parrinello `G1`–`G5` symmetry functions with
//!   analytic derivatives, per-species-pair cutoffs and `cos`/`exp` cutoff
//!   functions, configured from TOML
//! - **Statistics** — Welford streaming or parallel batch mean and standard
//!   deviation per fingerprint channel
//! - **Network** — Linear, activation and dropout layers with a validated
//!   lifecycle, forward passes, energies and forces
//! - **Export** — `descriptor.params`, `NN.params`, `dropout_binary.params` and
//!   `CMakeLists.txt` for a KIM model directory
//! - **I/O** — Extended XYZ input, a binary record dataset, normalization side
//!   files and JSON checkpoints
//!
//! # Quick Start
//!
//! ```
//! use ann_forge::{Atom, Configuration, CutoffKind, Descriptor, DescriptorConfig, SymmetryFunctions};
//! use ann_forge::{Activation, Layer, Model};
//! use rand::SeedableRng;
//! use rand_xoshiro::Xoshiro256PlusPlus;
//!
//! // Default function set (8 radial + 12 angular channels) with one cutoff.
//! let descriptor = SymmetryFunctions::new(DescriptorConfig::with_cutoffs(
//!     CutoffKind::Cos,
//!     [("Si-Si", 3.77)],
//! ))?;
//!
//! let atoms = vec![
//!     Atom::new("Si", [0.0, 0.0, 0.0]),
//!     Atom::new("Si", [2.35, 0.0, 0.0]),
//!     Atom::new("Si", [0.0, 2.35, 0.0]),
//! ];
//! let conf = Configuration::new("trimer", atoms, -12.0, vec![0.0; 9])?;
//!
//! let fp = descriptor.generate(&conf)?;
//! assert_eq!(fp.zeta.dim(), (3, 20));
//! assert_eq!(fp.dzeta_dr.dim(), (3, 20, 9));
//!
//! let mut rng = Xoshiro256PlusPlus::seed_from_u64(35);
//! let mut model = Model::new(descriptor.channel_count());
//! model.add_layers([
//!     Layer::linear(20, 10, &mut rng),
//!     Layer::activation(Activation::Tanh),
//!     Layer::linear(10, 1, &mut rng),
//! ])?;
//!
//! let energy = model.energy(fp.zeta.view())?;
//! let forces = model.forces(fp.zeta.view(), fp.dzeta_dr.view())?;
//! assert!(energy.is_finite());
//! assert_eq!(forces.len(), 9);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! # Module Organization
//!
//! - [`descriptor`] — Fingerprint generation
//! - [`stats`] — Normalization statistics
//! - [`normalize`] — Applying statistics to fingerprints
//! - [`network`] — The sequential model
//! - [`export`] — KIM model directory writer
//! - [`io`] — File formats
//! - [`pipeline`] — Dataset preprocessing into records

mod model;

pub mod descriptor;
pub mod export;
pub mod io;
pub mod network;
pub mod normalize;
pub mod pipeline;
pub mod stats;

pub use model::atom::Atom;
pub use model::configuration::{Configuration, ForceLengthError};
pub use model::fingerprint::Fingerprint;
pub use model::precision::Precision;

pub use descriptor::{
    AngularParams, CutoffKind, Descriptor, DescriptorConfig, FunctionSet, G2Params, G3Params,
    SymmetryFunctions,
};
pub use export::{ExportOptions, export};
pub use network::{Activation, Layer, Linear, Model};
pub use normalize::{NormStats, Normalization, denormalize, normalize};
pub use pipeline::{
    PreprocessConfig, PreprocessSummary, TestSetConfig, preprocess, preprocess_test_set,
};
pub use stats::{StatsStrategy, Welford, batch_mean_and_std, welford_mean_and_std};

pub use descriptor::Error as DescriptorError;
pub use export::Error as ExportError;
pub use io::Error as IoError;
pub use network::Error as NetworkError;
pub use pipeline::Error as PipelineError;
pub use stats::Error as StatsError;
