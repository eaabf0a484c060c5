//! ns-core: stable foundation for nstar.
//!
//! Contains:
//! - units (string-keyed conversion to the canonical Msun/km^3 and 1/fm^3 system)
//! - numeric (Real + tolerances + float helpers)
//! - interp (binary-search linear interpolation primitive)
//! - roots (scalar root finders: Brent primary, bisection secondary)
//! - error (shared error types)

pub mod error;
pub mod interp;
pub mod numeric;
pub mod roots;
pub mod units;

// Re-exports: nice ergonomics for downstream crates
pub use error::{NsError, NsResult};
pub use interp::*;
pub use numeric::*;
pub use roots::{bisect, brent, RootConfig};
pub use units::*;
