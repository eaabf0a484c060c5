//! ns-tov: relativistic stellar-structure solver.
//!
//! Integrates the Tolman-Oppenheimer-Volkoff equations over an EOS supplied
//! through the [`ns_eos::TovEos`] seam, in canonical units (solar masses,
//! km). Three solve modes: fixed gravitational mass, maximum mass, and a
//! mass-radius curve over a central-pressure grid. Optional slow-rotation
//! integration yields the moment of inertia.

pub mod error;
pub mod rkck;
pub mod solver;

pub use error::{TovError, TovResult};
pub use solver::{StarModel, StarSummary, TovConfig, TovSolver};
