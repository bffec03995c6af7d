use super::atom::Atom;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("configuration '{id}' has {atoms} atoms but {forces} force components (expected {expected})", expected = .atoms * 3)]
pub struct ForceLengthError {
    pub id: String,
    pub atoms: usize,
    pub forces: usize,
}

/// A labelled atomic structure.
///
/// The force label holds three Cartesian components per atom, in atom order.
/// Fields are private so the length invariant established by
/// [`Configuration::new`] cannot be broken after loading.
#[derive(Debug, Clone, PartialEq)]
pub struct Configuration {
    id: String,
    atoms: Vec<Atom>,
    energy: f64,
    forces: Vec<f64>,
}

impl Configuration {
    pub fn new(
        id: impl Into<String>,
        atoms: Vec<Atom>,
        energy: f64,
        forces: Vec<f64>,
    ) -> Result<Self, ForceLengthError> {
        let id = id.into();
        if forces.len() != atoms.len() * 3 {
            return Err(ForceLengthError {
                id,
                atoms: atoms.len(),
                forces: forces.len(),
            });
        }
        Ok(Self {
            id,
            atoms,
            energy,
            forces,
        })
    }

    /// Builds a configuration whose force label is all zeros.
    pub fn without_forces(id: impl Into<String>, atoms: Vec<Atom>, energy: f64) -> Self {
        let forces = vec![0.0; atoms.len() * 3];
        Self {
            id: id.into(),
            atoms,
            energy,
            forces,
        }
    }

    #[inline]
    pub fn id(&self) -> &str {
        &self.id
    }

    #[inline]
    pub fn atoms(&self) -> &[Atom] {
        &self.atoms
    }

    #[inline]
    pub fn atom_count(&self) -> usize {
        self.atoms.len()
    }

    #[inline]
    pub fn energy(&self) -> f64 {
        self.energy
    }

    #[inline]
    pub fn forces(&self) -> &[f64] {
        &self.forces
    }

    pub fn positions(&self) -> Vec<[f64; 3]> {
        self.atoms.iter().map(|a| a.position).collect()
    }

    /// Coordinates flattened as `[x0, y0, z0, x1, ...]`.
    pub fn flat_coords(&self) -> Vec<f64> {
        self.atoms.iter().flat_map(|a| a.position).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dimer() -> Vec<Atom> {
        vec![
            Atom::new("Si", [0.0, 0.0, 0.0]),
            Atom::new("Si", [2.3, 0.0, 0.0]),
        ]
    }

    #[test]
    fn rejects_mismatched_force_length() {
        let err = Configuration::new("dimer", dimer(), -8.0, vec![0.0; 5]).unwrap_err();
        assert_eq!(err.atoms, 2);
        assert_eq!(err.forces, 5);
        assert!(err.to_string().contains("expected 6"));
    }

    #[test]
    fn flat_coords_follow_atom_order() {
        let conf = Configuration::new("dimer", dimer(), -8.0, vec![0.0; 6]).unwrap();
        assert_eq!(conf.flat_coords(), vec![0.0, 0.0, 0.0, 2.3, 0.0, 0.0]);
        assert_eq!(conf.atom_count(), 2);
        assert_eq!(conf.id(), "dimer");
    }

    #[test]
    fn without_forces_zero_fills() {
        let conf = Configuration::without_forces("dimer", dimer(), 1.0);
        assert_eq!(conf.forces(), &[0.0; 6]);
    }
}
