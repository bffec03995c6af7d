//! Centering and scaling of fingerprints.
//!
//! Statistics are computed once from the training split (see [`crate::stats`])
//! and then applied read-only to every split and to the exported model.
//!
//! A zero entry in `std` is not guarded against: the division propagates as
//! `inf`/`NaN` and callers must screen constant channels beforehand.

use crate::model::fingerprint::Fingerprint;
use ndarray::{Array1, Array2, Array3, Axis};

/// Per-channel mean and standard deviation.
#[derive(Debug, Clone, PartialEq)]
pub struct NormStats {
    pub mean: Array1<f64>,
    pub std: Array1<f64>,
}

impl NormStats {
    /// # Panics
    ///
    /// Panics if `mean` and `std` have different lengths.
    pub fn new(mean: Array1<f64>, std: Array1<f64>) -> Self {
        assert_eq!(mean.len(), std.len(), "mean and std must have equal length");
        Self { mean, std }
    }

    #[inline]
    pub fn channel_count(&self) -> usize {
        self.mean.len()
    }
}

/// Whether fingerprints are normalized, and with which statistics.
///
/// `Disabled` is persisted as an explicit marker so downstream consumers never
/// have to guess whether a missing statistic means "not normalized".
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Normalization {
    #[default]
    Disabled,
    Stats(NormStats),
}

impl Normalization {
    pub fn stats(&self) -> Option<&NormStats> {
        match self {
            Normalization::Disabled => None,
            Normalization::Stats(stats) => Some(stats),
        }
    }

    #[inline]
    pub fn is_enabled(&self) -> bool {
        matches!(self, Normalization::Stats(_))
    }

    /// Applies the statistics in place; a no-op when disabled.
    pub fn apply(&self, fp: Fingerprint) -> Fingerprint {
        match self {
            Normalization::Disabled => fp,
            Normalization::Stats(stats) => {
                let (zeta, dzeta_dr) = normalize(fp.zeta, fp.dzeta_dr, &stats.mean, &stats.std);
                Fingerprint { zeta, dzeta_dr }
            }
        }
    }
}

/// Centers and scales `zeta`, and scales `dzeta_dr` along the channel axis.
///
/// `zeta' = (zeta - mean) / std` row-wise, `dzeta_dr'[i, c, :] = dzeta_dr[i, c, :] / std[c]`.
/// Derivatives are not centered since the mean is a constant.
pub fn normalize(
    mut zeta: Array2<f64>,
    mut dzeta_dr: Array3<f64>,
    mean: &Array1<f64>,
    std: &Array1<f64>,
) -> (Array2<f64>, Array3<f64>) {
    zeta -= mean;
    zeta /= std;
    dzeta_dr /= &std.view().insert_axis(Axis(1));
    (zeta, dzeta_dr)
}

/// Inverse of [`normalize`] for the fingerprint matrix: `zeta * std + mean`.
pub fn denormalize(mut zeta: Array2<f64>, mean: &Array1<f64>, std: &Array1<f64>) -> Array2<f64> {
    zeta *= std;
    zeta += mean;
    zeta
}
