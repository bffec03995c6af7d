use ndarray::{Array2, Array3};

/// Generalized coordinates of one configuration and their spatial derivatives.
///
/// - `zeta` has shape `[atoms, channels]`.
/// - `dzeta_dr` has shape `[atoms, channels, atoms * 3]`; entry `[i, c, 3*j + d]`
///   is the derivative of `zeta[i, c]` with respect to coordinate `d` of atom `j`.
#[derive(Debug, Clone, PartialEq)]
pub struct Fingerprint {
    pub zeta: Array2<f64>,
    pub dzeta_dr: Array3<f64>,
}

impl Fingerprint {
    pub fn zeros(atoms: usize, channels: usize) -> Self {
        Self {
            zeta: Array2::zeros((atoms, channels)),
            dzeta_dr: Array3::zeros((atoms, channels, atoms * 3)),
        }
    }

    #[inline]
    pub fn atom_count(&self) -> usize {
        self.zeta.nrows()
    }

    #[inline]
    pub fn channel_count(&self) -> usize {
        self.zeta.ncols()
    }
}
