use serde::{Deserialize, Serialize};
use std::fmt;

/// Floating-point width of serialized fingerprints and exported parameters.
///
/// The consuming driver keys its parser on this width, so it is passed
/// explicitly to every reader and writer that depends on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Precision {
    /// 4-byte IEEE-754 floats.
    Single,
    /// 8-byte IEEE-754 floats.
    #[default]
    Double,
}

impl Precision {
    /// Number of bytes per encoded float.
    #[inline]
    pub fn byte_width(self) -> usize {
        match self {
            Precision::Single => 4,
            Precision::Double => 8,
        }
    }

    /// Rounds `value` to the representable value at this precision.
    #[inline]
    pub fn round(self, value: f64) -> f64 {
        match self {
            Precision::Single => value as f32 as f64,
            Precision::Double => value,
        }
    }
}

impl fmt::Display for Precision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Precision::Single => write!(f, "single"),
            Precision::Double => write!(f, "double"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_precision_rounds_through_f32() {
        let v = 0.1_f64;
        assert_eq!(Precision::Double.round(v), v);
        assert_eq!(Precision::Single.round(v), 0.1_f32 as f64);
        assert_ne!(Precision::Single.round(v), v);
    }

    #[test]
    fn byte_widths() {
        assert_eq!(Precision::Single.byte_width(), 4);
        assert_eq!(Precision::Double.byte_width(), 8);
    }
}
