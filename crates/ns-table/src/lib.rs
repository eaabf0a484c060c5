//! ns-table: in-memory column tables and 2-D parameter grids.
//!
//! The tabular-storage collaborator for the EOS layer and the solver result
//! surface: ordered named columns with per-column unit strings, plus a
//! rectangular grid type for crust files keyed by a physics parameter.

pub mod error;
pub mod grid;
pub mod table;

pub use error::{TableError, TableResult};
pub use grid::Grid2d;
pub use table::Table;
