//! Hyperparameters of the symmetry-function descriptor.
//!
//! A configuration names the cutoff function, one cutoff radius per species
//! pair and the symmetry-function families that make up the fingerprint
//! channels. It is usually written in TOML:
//!
//! ```toml
//! cutoff_kind = "cos"
//!
//! [cutoffs]
//! "Si-Si" = 3.77
//!
//! [functions]
//! g1 = true
//! g2 = [{ eta = 0.01, rs = 0.0 }, { eta = 0.1, rs = 0.0 }]
//! g4 = [{ zeta = 1.0, lambda = -1.0, eta = 0.003 }]
//! ```
//!
//! When `[functions]` is omitted the embedded default set is used.

use super::cutoff::CutoffKind;
use super::error::Error;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::OnceLock;

const DEFAULT_FUNCTIONS_TOML: &str = include_str!("../../resources/default.functions.toml");

static DEFAULT_FUNCTIONS: OnceLock<FunctionSet> = OnceLock::new();

/// Complete descriptor configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DescriptorConfig {
    /// Cutoff function applied to every pair distance.
    #[serde(default)]
    pub cutoff_kind: CutoffKind,

    /// Cutoff radius per species pair, keyed `"A-B"`.
    ///
    /// `"A-B"` and `"B-A"` denote the same pair; giving both with different
    /// values is rejected.
    pub cutoffs: BTreeMap<String, f64>,

    /// Symmetry-function families, in channel order.
    #[serde(default = "default_functions")]
    pub functions: FunctionSet,
}

/// Radial `G2` parameters: `exp(-eta (r - rs)^2) fc(r)`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct G2Params {
    pub eta: f64,
    pub rs: f64,
}

/// Radial `G3` parameters: `cos(kappa r) fc(r)`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct G3Params {
    pub kappa: f64,
}

/// Angular `G4`/`G5` parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AngularParams {
    pub zeta: f64,
    pub lambda: f64,
    pub eta: f64,
}

/// The symmetry functions that make up the fingerprint.
///
/// Channels are laid out as `G1` (at most one), then every `G2`, `G3`, `G4`
/// and `G5` entry in declaration order.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct FunctionSet {
    #[serde(default)]
    pub g1: bool,
    #[serde(default)]
    pub g2: Vec<G2Params>,
    #[serde(default)]
    pub g3: Vec<G3Params>,
    #[serde(default)]
    pub g4: Vec<AngularParams>,
    #[serde(default)]
    pub g5: Vec<AngularParams>,
}

impl FunctionSet {
    /// Total number of fingerprint channels.
    pub fn channel_count(&self) -> usize {
        usize::from(self.g1) + self.g2.len() + self.g3.len() + self.g4.len() + self.g5.len()
    }

    fn validate(&self) -> Result<(), Error> {
        if self.channel_count() == 0 {
            return Err(Error::InvalidHyperparameter(
                "at least one symmetry function is required".into(),
            ));
        }
        for (idx, p) in self.g2.iter().enumerate() {
            if !(p.eta >= 0.0) || !p.rs.is_finite() {
                return Err(Error::InvalidHyperparameter(format!(
                    "g2[{idx}]: eta must be non-negative and rs finite"
                )));
            }
        }
        for (idx, p) in self.g3.iter().enumerate() {
            if !p.kappa.is_finite() {
                return Err(Error::InvalidHyperparameter(format!(
                    "g3[{idx}]: kappa must be finite"
                )));
            }
        }
        for (family, params) in [("g4", &self.g4), ("g5", &self.g5)] {
            for (idx, p) in params.iter().enumerate() {
                if !(p.zeta >= 1.0) {
                    return Err(Error::InvalidHyperparameter(format!(
                        "{family}[{idx}]: zeta must be at least 1"
                    )));
                }
                if !(p.lambda.abs() <= 1.0) {
                    return Err(Error::InvalidHyperparameter(format!(
                        "{family}[{idx}]: lambda must lie in [-1, 1]"
                    )));
                }
                if !(p.eta >= 0.0) {
                    return Err(Error::InvalidHyperparameter(format!(
                        "{family}[{idx}]: eta must be non-negative"
                    )));
                }
            }
        }
        Ok(())
    }
}

fn default_functions() -> FunctionSet {
    default_function_set().clone()
}

/// The embedded default function set.
pub fn default_function_set() -> &'static FunctionSet {
    DEFAULT_FUNCTIONS.get_or_init(|| {
        toml::from_str(DEFAULT_FUNCTIONS_TOML)
            .expect("Failed to parse embedded default symmetry functions. This is a library bug.")
    })
}

impl DescriptorConfig {
    /// Creates a configuration with the default function set and the given cutoffs.
    pub fn with_cutoffs<K, I>(cutoff_kind: CutoffKind, cutoffs: I) -> Self
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, f64)>,
    {
        Self {
            cutoff_kind,
            cutoffs: cutoffs.into_iter().map(|(k, v)| (k.into(), v)).collect(),
            functions: default_functions(),
        }
    }

    pub fn from_toml(text: &str) -> Result<Self, Error> {
        let config: DescriptorConfig = toml::from_str(text)?;
        Ok(config)
    }

    /// Resolves the `"A-B"` keyed cutoffs into unordered species pairs.
    pub(super) fn pair_cutoffs(&self) -> Result<BTreeMap<(String, String), f64>, Error> {
        if self.cutoffs.is_empty() {
            return Err(Error::InvalidHyperparameter(
                "at least one species-pair cutoff is required".into(),
            ));
        }

        let mut pairs = BTreeMap::new();
        for (key, &rcut) in &self.cutoffs {
            let (a, b) = key
                .split_once('-')
                .map(|(a, b)| (a.trim(), b.trim()))
                .filter(|(a, b)| !a.is_empty() && !b.is_empty())
                .ok_or_else(|| {
                    Error::InvalidHyperparameter(format!(
                        "cutoff key '{key}' must have the form 'A-B'"
                    ))
                })?;
            if !(rcut > 0.0) || !rcut.is_finite() {
                return Err(Error::InvalidHyperparameter(format!(
                    "cutoff for '{key}' must be positive and finite, got {rcut}"
                )));
            }

            let pair = ordered_pair(a, b);
            if let Some(&existing) = pairs.get(&pair) {
                if existing != rcut {
                    return Err(Error::InvalidHyperparameter(format!(
                        "conflicting cutoffs for pair '{}-{}': {existing} and {rcut}",
                        pair.0, pair.1
                    )));
                }
            }
            pairs.insert(pair, rcut);
        }

        self.functions.validate()?;
        Ok(pairs)
    }
}

pub(super) fn ordered_pair(a: &str, b: &str) -> (String, String) {
    if a <= b {
        (a.to_string(), b.to_string())
    } else {
        (b.to_string(), a.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_set_is_loaded_when_functions_omitted() {
        let config = DescriptorConfig::from_toml(
            r#"
            [cutoffs]
            "Si-Si" = 3.77
            "#,
        )
        .expect("parse");
        assert_eq!(config.cutoff_kind, CutoffKind::Cos);
        assert_eq!(config.functions, *default_function_set());
        assert_eq!(config.functions.channel_count(), 20);
    }

    #[test]
    fn parses_explicit_functions() {
        let config = DescriptorConfig::from_toml(
            r#"
            cutoff_kind = "exp"

            [cutoffs]
            "Si-C" = 4.0

            [functions]
            g1 = true
            g2 = [{ eta = 0.01, rs = 1.0 }]
            g5 = [{ zeta = 2.0, lambda = 1.0, eta = 0.1 }]
            "#,
        )
        .expect("parse");
        assert_eq!(config.cutoff_kind, CutoffKind::Exp);
        assert_eq!(config.functions.channel_count(), 3);
        let pairs = config.pair_cutoffs().expect("pairs");
        assert_eq!(pairs.get(&("C".into(), "Si".into())), Some(&4.0));
    }

    #[test]
    fn rejects_malformed_pair_key() {
        let config = DescriptorConfig::with_cutoffs(CutoffKind::Cos, [("SiSi", 3.0)]);
        let err = config.pair_cutoffs().unwrap_err();
        assert!(matches!(err, Error::InvalidHyperparameter(_)));
    }

    #[test]
    fn rejects_conflicting_symmetric_keys() {
        let config =
            DescriptorConfig::with_cutoffs(CutoffKind::Cos, [("Si-C", 3.0), ("C-Si", 3.5)]);
        assert!(config.pair_cutoffs().is_err());
    }

    #[test]
    fn rejects_out_of_range_lambda() {
        let mut config = DescriptorConfig::with_cutoffs(CutoffKind::Cos, [("Si-Si", 3.0)]);
        config.functions.g4.push(AngularParams {
            zeta: 1.0,
            lambda: 2.0,
            eta: 0.1,
        });
        assert!(config.pair_cutoffs().is_err());
    }

    #[test]
    fn rejects_unparseable_toml() {
        let err = DescriptorConfig::from_toml("cutoffs = 3").unwrap_err();
        assert!(matches!(err, Error::ConfigParse(_)));
    }
}
