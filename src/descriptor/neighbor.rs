//! Grid-based neighbor search.
//!
//! Space is divided into uniform cubic cells no smaller than the largest
//! cutoff, so every neighbor of an atom lies in the 27 cells surrounding it.

use std::collections::HashMap;

#[derive(Debug)]
pub struct NeighborGrid {
    inv_cell_size: f64,
    cells: HashMap<(i64, i64, i64), Vec<usize>>,
}

impl NeighborGrid {
    /// Builds a grid over `positions`.
    ///
    /// `cell_size` must be positive; callers pass the largest cutoff radius.
    pub fn from_positions(positions: &[[f64; 3]], cell_size: f64) -> Self {
        debug_assert!(cell_size > 0.0, "cell size must be positive");
        let mut grid = Self {
            inv_cell_size: 1.0 / cell_size,
            cells: HashMap::new(),
        };
        for (idx, pos) in positions.iter().enumerate() {
            let cell = grid.cell_coords(*pos);
            grid.cells.entry(cell).or_default().push(idx);
        }
        grid
    }

    fn cell_coords(&self, pos: [f64; 3]) -> (i64, i64, i64) {
        (
            (pos[0] * self.inv_cell_size).floor() as i64,
            (pos[1] * self.inv_cell_size).floor() as i64,
            (pos[2] * self.inv_cell_size).floor() as i64,
        )
    }

    /// Indices of atoms strictly closer than `cutoff` to atom `center`,
    /// excluding `center` itself, in ascending order.
    ///
    /// `cutoff` must not exceed the cell size the grid was built with.
    pub fn neighbors(&self, center: usize, positions: &[[f64; 3]], cutoff: f64) -> Vec<usize> {
        let query = positions[center];
        let cutoff_sq = cutoff * cutoff;
        let (cx, cy, cz) = self.cell_coords(query);

        let mut results = Vec::new();
        for dx in -1..=1 {
            for dy in -1..=1 {
                for dz in -1..=1 {
                    let Some(indices) = self.cells.get(&(cx + dx, cy + dy, cz + dz)) else {
                        continue;
                    };
                    for &idx in indices {
                        if idx == center {
                            continue;
                        }
                        let pos = positions[idx];
                        let dist_sq = (pos[0] - query[0]).powi(2)
                            + (pos[1] - query[1]).powi(2)
                            + (pos[2] - query[2]).powi(2);
                        if dist_sq < cutoff_sq {
                            results.push(idx);
                        }
                    }
                }
            }
        }

        results.sort_unstable();
        results
    }
}
