//! ns-eos: equation-of-state layer for the TOV solver.
//!
//! The central type is [`InterpEos`], a piecewise-interpolated EOS with a
//! low-density crust region, a high-density core table, and a transition
//! band blending the two. [`BuchdahlEos`] is a closed-form EOS whose exact
//! central-value relations make it useful for validating the integrator.
//! Both implement the [`TovEos`] seam consumed by ns-tov.

pub mod buchdahl;
pub mod crust;
pub mod error;
pub mod interp_eos;
pub mod model;

pub use buchdahl::BuchdahlEos;
pub use error::{EosError, EosResult};
pub use interp_eos::{InterpEos, Phase, TransitionMode};
pub use model::TovEos;
