use ns_core::Real;
use serde::{Deserialize, Serialize};

use crate::{TableError, TableResult};

/// Rectangular grid of EOS samples keyed by one physics parameter (e.g. the
/// symmetry-energy slope L) and one baryon-density axis.
///
/// Each named layer (typically `ed` and `pr`) stores one row of values per
/// parameter point, all sharing the baryon-density axis. `line` produces the
/// layer linearly interpolated between the two bracketing parameter rows,
/// which is how externally supplied crust files are evaluated at a
/// non-tabulated parameter value.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Grid2d {
    param: Vec<Real>,
    nb: Vec<Real>,
    layers: Vec<(String, Vec<Vec<Real>>)>,
}

impl Grid2d {
    /// `param` must be strictly ascending.
    pub fn new(param: Vec<Real>, nb: Vec<Real>) -> TableResult<Self> {
        if param.len() < 2 || nb.len() < 2 {
            return Err(TableError::Shape {
                what: "grid axes need at least two points",
            });
        }
        if param.windows(2).any(|w| w[1] <= w[0]) {
            return Err(TableError::Shape {
                what: "grid parameter axis must be strictly ascending",
            });
        }
        Ok(Self {
            param,
            nb,
            layers: Vec::new(),
        })
    }

    /// Add a layer: one row of `nb.len()` values per parameter point.
    pub fn add_layer(&mut self, name: &str, rows: Vec<Vec<Real>>) -> TableResult<()> {
        if rows.len() != self.param.len() || rows.iter().any(|r| r.len() != self.nb.len()) {
            return Err(TableError::Shape {
                what: "layer shape does not match grid axes",
            });
        }
        if self.layers.iter().any(|(n, _)| n == name) {
            return Err(TableError::DuplicateColumn {
                name: name.to_string(),
            });
        }
        self.layers.push((name.to_string(), rows));
        Ok(())
    }

    pub fn param_axis(&self) -> &[Real] {
        &self.param
    }

    pub fn nb_axis(&self) -> &[Real] {
        &self.nb
    }

    fn layer(&self, name: &str) -> TableResult<&Vec<Vec<Real>>> {
        self.layers
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, rows)| rows)
            .ok_or_else(|| TableError::MissingColumn {
                name: name.to_string(),
            })
    }

    /// Layer values along the baryon-density axis at parameter `p`, linearly
    /// blended between the bracketing parameter rows. `p` outside the axis is
    /// an error; callers clamp to the documented validity range first.
    pub fn line(&self, name: &str, p: Real) -> TableResult<Vec<Real>> {
        let rows = self.layer(name)?;
        let n = self.param.len();
        if p < self.param[0] || p > self.param[n - 1] {
            return Err(ns_core::NsError::OutOfRange {
                what: "grid parameter outside tabulated axis",
            }
            .into());
        }
        let mut lo = 0usize;
        let mut hi = n - 1;
        while hi - lo > 1 {
            let mid = (hi + lo) >> 1;
            if self.param[mid] > p {
                hi = mid;
            } else {
                lo = mid;
            }
        }
        let w = (p - self.param[lo]) / (self.param[hi] - self.param[lo]);
        Ok(rows[lo]
            .iter()
            .zip(&rows[hi])
            .map(|(a, b)| a + w * (b - a))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid() -> Grid2d {
        let mut g = Grid2d::new(vec![30.0, 60.0, 90.0], vec![0.02, 0.04, 0.08]).unwrap();
        g.add_layer(
            "ed",
            vec![
                vec![1.0, 2.0, 4.0],
                vec![2.0, 4.0, 8.0],
                vec![3.0, 6.0, 12.0],
            ],
        )
        .unwrap();
        g
    }

    #[test]
    fn line_at_grid_point() {
        let g = grid();
        assert_eq!(g.line("ed", 60.0).unwrap(), vec![2.0, 4.0, 8.0]);
    }

    #[test]
    fn line_blends_between_rows() {
        let g = grid();
        let l = g.line("ed", 45.0).unwrap();
        assert_eq!(l, vec![1.5, 3.0, 6.0]);
    }

    #[test]
    fn out_of_axis_rejected() {
        let g = grid();
        assert!(g.line("ed", 120.0).is_err());
        assert!(g.line("pr", 60.0).is_err());
    }

    #[test]
    fn layer_shape_checked() {
        let mut g = Grid2d::new(vec![1.0, 2.0], vec![0.1, 0.2]).unwrap();
        assert!(g
            .add_layer("ed", vec![vec![1.0, 2.0]])
            .is_err());
    }
}
