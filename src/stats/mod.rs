//! Per-channel mean and standard deviation of training fingerprints.
//!
//! Two strategies produce the same statistics (both use the sample `n - 1`
//! denominator):
//!
//! - [`welford_mean_and_std`] folds rows one at a time in configuration and
//!   atom order. Sequential, `O(channels)` memory.
//! - [`batch_mean_and_std`] generates all fingerprints in parallel and reduces
//!   the stacked matrix. Faster, but holds the whole dataset in memory.

use crate::descriptor::Descriptor;
use crate::model::{configuration::Configuration, fingerprint::Fingerprint};
use crate::normalize::NormStats;

mod batch;
mod error;
mod welford;

pub use batch::batch_mean_and_std;
pub use error::Error;
pub use welford::{Welford, welford_mean_and_std};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatsStrategy {
    Welford,
    Batch { workers: Option<usize> },
}

impl Default for StatsStrategy {
    fn default() -> Self {
        StatsStrategy::Batch { workers: None }
    }
}

/// Runs the selected strategy. The batch strategy also hands back the
/// fingerprints it computed.
pub fn mean_and_std<D: Descriptor + ?Sized>(
    configs: &[Configuration],
    descriptor: &D,
    strategy: StatsStrategy,
) -> Result<(NormStats, Option<Vec<Fingerprint>>), Error> {
    match strategy {
        StatsStrategy::Welford => Ok((welford_mean_and_std(configs, descriptor)?, None)),
        StatsStrategy::Batch { workers } => {
            let (stats, fingerprints) = batch_mean_and_std(configs, descriptor, workers)?;
            Ok((stats, Some(fingerprints)))
        }
    }
}
