use super::config::{AngularParams, DescriptorConfig, ordered_pair};
use super::cutoff::CutoffKind;
use super::error::Error;
use super::neighbor::NeighborGrid;
use crate::model::configuration::Configuration;
use crate::model::fingerprint::Fingerprint;
use ndarray::Array3;
use std::collections::BTreeMap;

/// Behler–Parrinello symmetry functions with analytic coordinate derivatives.
///
/// Construction validates the hyperparameters once; [`generate`] is then a
/// pure function of the configuration.
///
/// [`generate`]: crate::Descriptor::generate
#[derive(Debug, Clone)]
pub struct SymmetryFunctions {
    config: DescriptorConfig,
    pair_cutoffs: BTreeMap<(String, String), f64>,
    max_cutoff: f64,
}

/// A neighbor of the center atom within the pair cutoff.
struct Neighbor {
    index: usize,
    r: f64,
    unit: [f64; 3],
    fc: f64,
    dfc: f64,
}

impl SymmetryFunctions {
    pub fn new(config: DescriptorConfig) -> Result<Self, Error> {
        let pair_cutoffs = config.pair_cutoffs()?;
        let max_cutoff = pair_cutoffs.values().copied().fold(0.0, f64::max);
        Ok(Self {
            config,
            pair_cutoffs,
            max_cutoff,
        })
    }

    pub fn config(&self) -> &DescriptorConfig {
        &self.config
    }

    pub fn cutoff_kind(&self) -> CutoffKind {
        self.config.cutoff_kind
    }

    /// Species pairs and their cutoff radii, in sorted order.
    pub fn pair_cutoffs(&self) -> impl Iterator<Item = (&str, &str, f64)> {
        self.pair_cutoffs
            .iter()
            .map(|((a, b), &rc)| (a.as_str(), b.as_str(), rc))
    }

    /// All species mentioned by the cutoff table, sorted.
    pub fn species(&self) -> Vec<&str> {
        let mut species: Vec<&str> = self
            .pair_cutoffs
            .keys()
            .flat_map(|(a, b)| [a.as_str(), b.as_str()])
            .collect();
        species.sort_unstable();
        species.dedup();
        species
    }

    pub fn max_cutoff(&self) -> f64 {
        self.max_cutoff
    }

    pub(super) fn channel_count(&self) -> usize {
        self.config.functions.channel_count()
    }

    /// Builds the `[species_index][species_index]` cutoff table for one configuration.
    fn cutoff_table(&self, conf: &Configuration) -> Result<(Vec<usize>, Vec<Vec<f64>>), Error> {
        let mut names: Vec<&str> = conf.atoms().iter().map(|a| a.species.as_str()).collect();
        names.sort_unstable();
        names.dedup();

        let mut table = vec![vec![0.0; names.len()]; names.len()];
        for (s, a) in names.iter().enumerate() {
            for (t, b) in names.iter().enumerate().skip(s) {
                let rc = *self
                    .pair_cutoffs
                    .get(&ordered_pair(a, b))
                    .ok_or_else(|| Error::unsupported_pair(conf.id(), a, b))?;
                table[s][t] = rc;
                table[t][s] = rc;
            }
        }

        let species_idx = conf
            .atoms()
            .iter()
            .map(|atom| {
                names
                    .binary_search(&atom.species.as_str())
                    .map_err(|_| Error::unsupported_pair(conf.id(), &atom.species, &atom.species))
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok((species_idx, table))
    }

    pub(super) fn compute(&self, conf: &Configuration) -> Result<Fingerprint, Error> {
        let natoms = conf.atom_count();
        if natoms == 0 {
            return Err(Error::EmptyConfiguration(conf.id().to_string()));
        }

        let (species, rcut) = self.cutoff_table(conf)?;
        let positions = conf.positions();
        let grid = NeighborGrid::from_positions(&positions, self.max_cutoff);
        let kind = self.config.cutoff_kind;
        let functions = &self.config.functions;

        let mut fp = Fingerprint::zeros(natoms, self.channel_count());
        let g3_offset = usize::from(functions.g1) + functions.g2.len();
        let g4_offset = g3_offset + functions.g3.len();
        let g5_offset = g4_offset + functions.g4.len();

        for i in 0..natoms {
            let mut neighbors = Vec::new();
            for j in grid.neighbors(i, &positions, self.max_cutoff) {
                let rc = rcut[species[i]][species[j]];
                let (r, unit) = separation(positions[i], positions[j]);
                if r == 0.0 {
                    return Err(Error::CoincidentAtoms {
                        id: conf.id().to_string(),
                        i: i.min(j),
                        j: i.max(j),
                    });
                }
                if r >= rc {
                    continue;
                }
                let (fc, dfc) = kind.eval(r, rc);
                neighbors.push(Neighbor {
                    index: j,
                    r,
                    unit,
                    fc,
                    dfc,
                });
            }

            for nb in &neighbors {
                let mut channel = 0;
                if functions.g1 {
                    fp.zeta[[i, channel]] += nb.fc;
                    add_pair_derivative(&mut fp.dzeta_dr, i, channel, i, nb.index, nb.unit, nb.dfc);
                    channel += 1;
                }
                for p in &functions.g2 {
                    let dr = nb.r - p.rs;
                    let gauss = (-p.eta * dr * dr).exp();
                    let value = gauss * nb.fc;
                    let deriv = gauss * (nb.dfc - 2.0 * p.eta * dr * nb.fc);
                    fp.zeta[[i, channel]] += value;
                    add_pair_derivative(&mut fp.dzeta_dr, i, channel, i, nb.index, nb.unit, deriv);
                    channel += 1;
                }
                for p in &functions.g3 {
                    let (sin, cos) = (p.kappa * nb.r).sin_cos();
                    let value = cos * nb.fc;
                    let deriv = cos * nb.dfc - p.kappa * sin * nb.fc;
                    fp.zeta[[i, channel]] += value;
                    add_pair_derivative(&mut fp.dzeta_dr, i, channel, i, nb.index, nb.unit, deriv);
                    channel += 1;
                }
            }

            if functions.g4.is_empty() && functions.g5.is_empty() {
                continue;
            }

            for (a, nj) in neighbors.iter().enumerate() {
                for nk in &neighbors[a + 1..] {
                    let (j, k) = (nj.index, nk.index);
                    let (rjk, unit_jk) = separation(positions[j], positions[k]);
                    if rjk == 0.0 {
                        return Err(Error::CoincidentAtoms {
                            id: conf.id().to_string(),
                            i: j.min(k),
                            j: j.max(k),
                        });
                    }
                    let triplet = Triplet::new(nj, nk, rjk);
                    let (fc_jk, dfc_jk) = kind.eval(rjk, rcut[species[j]][species[k]]);

                    for (offset, p) in functions.g4.iter().enumerate() {
                        let grad = triplet.g4(p, fc_jk, dfc_jk);
                        let channel = g4_offset + offset;
                        fp.zeta[[i, channel]] += grad.value;
                        add_pair_derivative(&mut fp.dzeta_dr, i, channel, i, j, nj.unit, grad.d_rij);
                        add_pair_derivative(&mut fp.dzeta_dr, i, channel, i, k, nk.unit, grad.d_rik);
                        add_pair_derivative(&mut fp.dzeta_dr, i, channel, j, k, unit_jk, grad.d_rjk);
                    }
                    for (offset, p) in functions.g5.iter().enumerate() {
                        let grad = triplet.g5(p);
                        let channel = g5_offset + offset;
                        fp.zeta[[i, channel]] += grad.value;
                        add_pair_derivative(&mut fp.dzeta_dr, i, channel, i, j, nj.unit, grad.d_rij);
                        add_pair_derivative(&mut fp.dzeta_dr, i, channel, i, k, nk.unit, grad.d_rik);
                        add_pair_derivative(&mut fp.dzeta_dr, i, channel, j, k, unit_jk, grad.d_rjk);
                    }
                }
            }
        }

        Ok(fp)
    }
}

/// Distance from `from` to `to` and the unit vector pointing along it.
#[inline]
fn separation(from: [f64; 3], to: [f64; 3]) -> (f64, [f64; 3]) {
    let d = [to[0] - from[0], to[1] - from[1], to[2] - from[2]];
    let r = (d[0] * d[0] + d[1] * d[1] + d[2] * d[2]).sqrt();
    if r == 0.0 {
        return (0.0, [0.0; 3]);
    }
    (r, [d[0] / r, d[1] / r, d[2] / r])
}

/// Scatters `d zeta[center, channel] / d r_pq` onto the coordinates of `p` and `q`.
///
/// `unit` points from `p` to `q`, so `dr_pq/dx_q = unit` and `dr_pq/dx_p = -unit`.
#[inline]
fn add_pair_derivative(
    dzeta_dr: &mut Array3<f64>,
    center: usize,
    channel: usize,
    p: usize,
    q: usize,
    unit: [f64; 3],
    d_dr: f64,
) {
    if d_dr == 0.0 {
        return;
    }
    for dim in 0..3 {
        let g = d_dr * unit[dim];
        dzeta_dr[[center, channel, 3 * q + dim]] += g;
        dzeta_dr[[center, channel, 3 * p + dim]] -= g;
    }
}

/// An angular term's value and its partial derivatives w.r.t. the three pair distances.
struct TripletGrad {
    value: f64,
    d_rij: f64,
    d_rik: f64,
    d_rjk: f64,
}

/// Geometry of the triplet (i, j, k) with `i` the center atom.
struct Triplet {
    rij: f64,
    rik: f64,
    rjk: f64,
    fc_ij: f64,
    dfc_ij: f64,
    fc_ik: f64,
    dfc_ik: f64,
    cos: f64,
    dcos_ij: f64,
    dcos_ik: f64,
    dcos_jk: f64,
}

impl Triplet {
    fn new(nj: &Neighbor, nk: &Neighbor, rjk: f64) -> Self {
        let (rij, rik) = (nj.r, nk.r);
        let (rij2, rik2, rjk2) = (rij * rij, rik * rik, rjk * rjk);
        let cos = (rij2 + rik2 - rjk2) / (2.0 * rij * rik);
        Self {
            rij,
            rik,
            rjk,
            fc_ij: nj.fc,
            dfc_ij: nj.dfc,
            fc_ik: nk.fc,
            dfc_ik: nk.dfc,
            cos,
            dcos_ij: (rij2 - rik2 + rjk2) / (2.0 * rij2 * rik),
            dcos_ik: (rik2 - rij2 + rjk2) / (2.0 * rij * rik2),
            dcos_jk: -rjk / (rij * rik),
        }
    }

    /// `(1 + lambda cos)^zeta` and its derivative w.r.t. `cos`.
    fn angular(&self, p: &AngularParams) -> (f64, f64) {
        let base = (1.0 + p.lambda * self.cos).max(0.0);
        if base == 0.0 {
            return (0.0, 0.0);
        }
        let pow = base.powf(p.zeta);
        (pow, p.zeta * p.lambda * pow / base)
    }

    fn g4(&self, p: &AngularParams, fc_jk: f64, dfc_jk: f64) -> TripletGrad {
        let (ang, dang) = self.angular(p);
        let prefactor = 2f64.powf(1.0 - p.zeta);
        let gauss = (-p.eta * (self.rij * self.rij + self.rik * self.rik + self.rjk * self.rjk))
            .exp();
        let fc = self.fc_ij * self.fc_ik * fc_jk;
        let common = prefactor * gauss;

        TripletGrad {
            value: common * ang * fc,
            d_rij: common
                * (dang * self.dcos_ij * fc - 2.0 * p.eta * self.rij * ang * fc
                    + ang * self.dfc_ij * self.fc_ik * fc_jk),
            d_rik: common
                * (dang * self.dcos_ik * fc - 2.0 * p.eta * self.rik * ang * fc
                    + ang * self.fc_ij * self.dfc_ik * fc_jk),
            d_rjk: common
                * (dang * self.dcos_jk * fc - 2.0 * p.eta * self.rjk * ang * fc
                    + ang * self.fc_ij * self.fc_ik * dfc_jk),
        }
    }

    fn g5(&self, p: &AngularParams) -> TripletGrad {
        let (ang, dang) = self.angular(p);
        let prefactor = 2f64.powf(1.0 - p.zeta);
        let gauss = (-p.eta * (self.rij * self.rij + self.rik * self.rik)).exp();
        let fc = self.fc_ij * self.fc_ik;
        let common = prefactor * gauss;

        TripletGrad {
            value: common * ang * fc,
            d_rij: common
                * (dang * self.dcos_ij * fc - 2.0 * p.eta * self.rij * ang * fc
                    + ang * self.dfc_ij * self.fc_ik),
            d_rik: common
                * (dang * self.dcos_ik * fc - 2.0 * p.eta * self.rik * ang * fc
                    + ang * self.fc_ij * self.dfc_ik),
            d_rjk: common * dang * self.dcos_jk * fc,
        }
    }
}
