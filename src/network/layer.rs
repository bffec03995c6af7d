use super::activation::Activation;
use ndarray::{Array1, Array2};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Fully connected layer `y = x W^T + b`.
///
/// `weight` is stored `[outputs, inputs]`; the exporter transposes it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Linear {
    pub weight: Array2<f64>,
    pub bias: Array1<f64>,
}

impl Linear {
    /// Uniform initialization in `[-1/sqrt(inputs), 1/sqrt(inputs)]`.
    pub fn new<R: Rng>(inputs: usize, outputs: usize, rng: &mut R) -> Self {
        let bound = 1.0 / (inputs.max(1) as f64).sqrt();
        let weight = Array2::from_shape_fn((outputs, inputs), |_| rng.random_range(-bound..=bound));
        let bias = Array1::from_shape_fn(outputs, |_| rng.random_range(-bound..=bound));
        Self { weight, bias }
    }

    #[inline]
    pub fn inputs(&self) -> usize {
        self.weight.ncols()
    }

    #[inline]
    pub fn outputs(&self) -> usize {
        self.weight.nrows()
    }

    #[inline]
    pub fn parameter_count(&self) -> usize {
        self.weight.len() + self.bias.len()
    }
}

/// One element of a sequential model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Layer {
    Linear(Linear),
    Activation(Activation),
    /// Drops each input with probability `p` during stochastic passes.
    Dropout { p: f64 },
}

impl Layer {
    pub fn linear<R: Rng>(inputs: usize, outputs: usize, rng: &mut R) -> Self {
        Layer::Linear(Linear::new(inputs, outputs, rng))
    }

    pub fn activation(kind: Activation) -> Self {
        Layer::Activation(kind)
    }

    pub fn dropout(p: f64) -> Self {
        Layer::Dropout { p }
    }

    pub fn as_linear(&self) -> Option<&Linear> {
        match self {
            Layer::Linear(linear) => Some(linear),
            _ => None,
        }
    }
}

impl fmt::Display for Layer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Layer::Linear(l) => write!(f, "Linear({} -> {})", l.inputs(), l.outputs()),
            Layer::Activation(kind) => write!(f, "Activation({kind})"),
            Layer::Dropout { p } => write!(f, "Dropout({p})"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_xoshiro::Xoshiro256PlusPlus;

    #[test]
    fn initialization_respects_bounds_and_shape() {
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(35);
        let l = Linear::new(16, 4, &mut rng);
        assert_eq!(l.weight.dim(), (4, 16));
        assert_eq!(l.bias.len(), 4);
        assert_eq!(l.parameter_count(), 68);
        assert!(l.weight.iter().chain(l.bias.iter()).all(|v| v.abs() <= 0.25));
    }

    #[test]
    fn same_seed_gives_same_weights() {
        let a = Linear::new(3, 2, &mut Xoshiro256PlusPlus::seed_from_u64(7));
        let b = Linear::new(3, 2, &mut Xoshiro256PlusPlus::seed_from_u64(7));
        assert_eq!(a, b);
    }

    #[test]
    fn serde_uses_tagged_variants() {
        let json = serde_json::to_string(&Layer::dropout(0.25)).unwrap();
        assert_eq!(json, r#"{"dropout":{"p":0.25}}"#);
        let json = serde_json::to_string(&Layer::activation(Activation::Tanh)).unwrap();
        assert_eq!(json, r#"{"activation":"tanh"}"#);
    }

    #[test]
    fn display_names_layers() {
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(1);
        assert_eq!(Layer::linear(10, 5, &mut rng).to_string(), "Linear(10 -> 5)");
        assert_eq!(Layer::dropout(0.2).to_string(), "Dropout(0.2)");
    }
}
