use ns_core::{NsError, Real};

use crate::{EosResult, TovEos};

/// Buchdahl's exactly-solvable EOS, ed(P) = 12 sqrt(pstar P) - 5 P.
///
/// For a star built from this EOS the central pressure and central energy
/// density have closed forms in beta = G M / R:
/// `Pc = 36 pstar beta^2` and `ed_c = 72 pstar beta (1 - 5 beta / 2)`,
/// which the integrator tests check to tight tolerance.
#[derive(Clone, Copy, Debug)]
pub struct BuchdahlEos {
    /// Pressure scale in Msun/km^3
    pub pstar: Real,
}

impl Default for BuchdahlEos {
    fn default() -> Self {
        Self { pstar: 3.2e-5 }
    }
}

impl BuchdahlEos {
    /// Largest pressure at which the energy density is non-negative,
    /// (144/25) pstar.
    pub fn max_pressure(&self) -> Real {
        144.0 / 25.0 * self.pstar
    }
}

impl TovEos for BuchdahlEos {
    fn energy_density(&self, pr: Real) -> EosResult<(Real, Real)> {
        let p = pr.max(0.0);
        if p > self.max_pressure() {
            return Err(NsError::OutOfRange {
                what: "pressure beyond Buchdahl EOS validity",
            }
            .into());
        }
        Ok((12.0 * (self.pstar * p).sqrt() - 5.0 * p, 0.0))
    }

    fn baryon_column(&self) -> bool {
        false
    }
}
