use serde::{Deserialize, Serialize};
use std::f64::consts::PI;
use std::fmt;

/// Smooth cutoff function applied to pair distances.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CutoffKind {
    /// `0.5 (cos(pi r / rc) + 1)`
    #[default]
    Cos,
    /// `exp(1 - 1 / (1 - (r / rc)^2))`
    Exp,
}

impl CutoffKind {
    /// Returns `(fc(r), dfc/dr)`; both vanish for `r >= rcut`.
    #[inline]
    pub fn eval(self, r: f64, rcut: f64) -> (f64, f64) {
        if r >= rcut {
            return (0.0, 0.0);
        }
        match self {
            CutoffKind::Cos => {
                let arg = PI * r / rcut;
                (0.5 * (arg.cos() + 1.0), -0.5 * PI / rcut * arg.sin())
            }
            CutoffKind::Exp => {
                let x = r / rcut;
                let g = 1.0 - x * x;
                let fc = (1.0 - 1.0 / g).exp();
                (fc, fc * (-2.0 * x / (rcut * g * g)))
            }
        }
    }
}

impl fmt::Display for CutoffKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CutoffKind::Cos => write!(f, "cos"),
            CutoffKind::Exp => write!(f, "exp"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn unity_at_origin_and_zero_beyond_cutoff() {
        for kind in [CutoffKind::Cos, CutoffKind::Exp] {
            assert_relative_eq!(kind.eval(0.0, 3.0).0, 1.0);
            assert_eq!(kind.eval(3.0, 3.0), (0.0, 0.0));
            assert_eq!(kind.eval(4.5, 3.0), (0.0, 0.0));
        }
    }

    #[test]
    fn derivative_matches_finite_difference() {
        let h = 1e-6;
        for kind in [CutoffKind::Cos, CutoffKind::Exp] {
            for r in [0.3, 1.1, 2.0, 2.7] {
                let numeric = (kind.eval(r + h, 3.0).0 - kind.eval(r - h, 3.0).0) / (2.0 * h);
                assert_relative_eq!(kind.eval(r, 3.0).1, numeric, epsilon = 1e-7);
            }
        }
    }

    #[test]
    fn displays_driver_names() {
        assert_eq!(CutoffKind::Cos.to_string(), "cos");
        assert_eq!(CutoffKind::Exp.to_string(), "exp");
    }
}
