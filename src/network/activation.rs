use serde::{Deserialize, Serialize};
use std::fmt;

/// Element-wise nonlinearity applied after a linear layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Activation {
    Sigmoid,
    Tanh,
    Relu,
    /// Exponential linear unit with `alpha = 1`.
    Elu,
    /// `ln(1 + e^x)`. Usable for training but not understood by the KIM driver.
    Softplus,
}

impl Activation {
    #[inline]
    pub fn apply(self, x: f64) -> f64 {
        match self {
            Activation::Sigmoid => 1.0 / (1.0 + (-x).exp()),
            Activation::Tanh => x.tanh(),
            Activation::Relu => x.max(0.0),
            Activation::Elu => {
                if x > 0.0 {
                    x
                } else {
                    x.exp_m1()
                }
            }
            Activation::Softplus => {
                // ln(1 + e^x) = max(x, 0) + ln(1 + e^-|x|)
                x.max(0.0) + (-x.abs()).exp().ln_1p()
            }
        }
    }

    /// Derivative with respect to the pre-activation input `x`.
    #[inline]
    pub fn derivative(self, x: f64) -> f64 {
        match self {
            Activation::Sigmoid => {
                let s = Activation::Sigmoid.apply(x);
                s * (1.0 - s)
            }
            Activation::Tanh => {
                let t = x.tanh();
                1.0 - t * t
            }
            Activation::Relu => {
                if x > 0.0 {
                    1.0
                } else {
                    0.0
                }
            }
            Activation::Elu => {
                if x > 0.0 {
                    1.0
                } else {
                    x.exp()
                }
            }
            Activation::Softplus => Activation::Sigmoid.apply(x),
        }
    }

    /// Whether the exported parameter format has a name for this activation.
    #[inline]
    pub fn is_exportable(self) -> bool {
        !matches!(self, Activation::Softplus)
    }

    pub fn name(self) -> &'static str {
        match self {
            Activation::Sigmoid => "sigmoid",
            Activation::Tanh => "tanh",
            Activation::Relu => "relu",
            Activation::Elu => "elu",
            Activation::Softplus => "softplus",
        }
    }
}

impl fmt::Display for Activation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    const ALL: [Activation; 5] = [
        Activation::Sigmoid,
        Activation::Tanh,
        Activation::Relu,
        Activation::Elu,
        Activation::Softplus,
    ];

    #[test]
    fn derivatives_match_finite_differences() {
        let h = 1e-6;
        for act in ALL {
            for &x in &[-2.3, -0.4, 0.7, 3.1] {
                let numeric = (act.apply(x + h) - act.apply(x - h)) / (2.0 * h);
                assert_relative_eq!(act.derivative(x), numeric, epsilon = 1e-7);
            }
        }
    }

    #[test]
    fn known_values() {
        assert_relative_eq!(Activation::Sigmoid.apply(0.0), 0.5);
        assert_eq!(Activation::Relu.apply(-1.0), 0.0);
        assert_relative_eq!(Activation::Elu.apply(-1.0), (-1.0f64).exp() - 1.0);
        assert_relative_eq!(Activation::Softplus.apply(0.0), 2.0f64.ln());
        assert!(Activation::Softplus.apply(800.0).is_finite());
    }

    #[test]
    fn only_softplus_is_not_exportable() {
        for act in ALL {
            assert_eq!(act.is_exportable(), act != Activation::Softplus);
        }
    }

    #[test]
    fn names_match_serde_representation() {
        for act in ALL {
            let json = serde_json::to_string(&act).unwrap();
            assert_eq!(json, format!("\"{}\"", act.name()));
        }
    }
}
