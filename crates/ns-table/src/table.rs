use std::path::Path;

use ns_core::{interp, Real};
use serde::{Deserialize, Serialize};

use crate::{TableError, TableResult};

/// Ordered named columns of f64 data with per-column unit strings.
///
/// Rows are pushed as slices in column order; columns are addressed by name.
/// Units are free-form strings resolved by `ns_core::units` at the points
/// where physics actually needs a conversion.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Table {
    names: Vec<String>,
    units: Vec<String>,
    cols: Vec<Vec<Real>>,
}

impl Table {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a table with the given column names, all units empty.
    pub fn with_columns<S: AsRef<str>>(names: &[S]) -> TableResult<Self> {
        let mut t = Self::new();
        for n in names {
            t.add_column(n.as_ref(), "")?;
        }
        Ok(t)
    }

    pub fn add_column(&mut self, name: &str, unit: &str) -> TableResult<()> {
        if self.names.iter().any(|n| n == name) {
            return Err(TableError::DuplicateColumn {
                name: name.to_string(),
            });
        }
        let nrows = self.nrows();
        self.names.push(name.to_string());
        self.units.push(unit.to_string());
        self.cols.push(vec![0.0; nrows]);
        Ok(())
    }

    pub fn ncols(&self) -> usize {
        self.names.len()
    }

    pub fn nrows(&self) -> usize {
        self.cols.first().map_or(0, Vec::len)
    }

    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }

    /// Index of a named column, or a schema error.
    pub fn lookup_column(&self, name: &str) -> TableResult<usize> {
        self.names
            .iter()
            .position(|n| n == name)
            .ok_or_else(|| TableError::MissingColumn {
                name: name.to_string(),
            })
    }

    pub fn column(&self, name: &str) -> TableResult<&[Real]> {
        let i = self.lookup_column(name)?;
        Ok(&self.cols[i])
    }

    pub fn column_by_index(&self, i: usize) -> &[Real] {
        &self.cols[i]
    }

    pub fn name(&self, i: usize) -> &str {
        &self.names[i]
    }

    pub fn unit(&self, i: usize) -> &str {
        &self.units[i]
    }

    pub fn get_unit(&self, name: &str) -> TableResult<&str> {
        let i = self.lookup_column(name)?;
        Ok(&self.units[i])
    }

    pub fn set_unit(&mut self, name: &str, unit: &str) -> TableResult<()> {
        let i = self.lookup_column(name)?;
        self.units[i] = unit.to_string();
        Ok(())
    }

    /// Append one row; `row` must have one value per column.
    pub fn push_row(&mut self, row: &[Real]) -> TableResult<()> {
        if row.len() != self.ncols() {
            return Err(TableError::Shape {
                what: "row length does not match column count",
            });
        }
        for (col, v) in self.cols.iter_mut().zip(row) {
            col.push(*v);
        }
        Ok(())
    }

    pub fn get(&self, name: &str, row: usize) -> TableResult<Real> {
        let i = self.lookup_column(name)?;
        if row >= self.cols[i].len() {
            return Err(TableError::Shape {
                what: "row index out of range",
            });
        }
        Ok(self.cols[i][row])
    }

    pub fn set(&mut self, name: &str, row: usize, v: Real) -> TableResult<()> {
        let i = self.lookup_column(name)?;
        if row >= self.cols[i].len() {
            return Err(TableError::Shape {
                what: "row index out of range",
            });
        }
        self.cols[i][row] = v;
        Ok(())
    }

    /// Interpolate column `ycol` against column `xcol` at `x`.
    pub fn interp(&self, xcol: &str, x: Real, ycol: &str) -> TableResult<Real> {
        let xi = self.lookup_column(xcol)?;
        let yi = self.lookup_column(ycol)?;
        if self.nrows() < 2 {
            return Err(TableError::Shape {
                what: "interpolation needs at least two rows",
            });
        }
        Ok(interp::linear(&self.cols[xi], &self.cols[yi], x))
    }

    pub fn save_json(&self, path: &Path) -> TableResult<()> {
        let f = std::fs::File::create(path)?;
        serde_json::to_writer_pretty(std::io::BufWriter::new(f), self)?;
        Ok(())
    }

    pub fn load_json(path: &Path) -> TableResult<Self> {
        let f = std::fs::File::open(path)?;
        Ok(serde_json::from_reader(std::io::BufReader::new(f))?)
    }
}
