use ns_core::Real;

use crate::EosResult;

/// Seam between the EOS layer and the stellar-structure integrator.
///
/// All quantities are in the canonical system: pressure and energy density in
/// Msun/km^3, baryon density in 1/fm^3. Implementations are read-only after
/// loading, so one EOS may drive many integrations in parallel.
pub trait TovEos: Send + Sync {
    /// Energy density and baryon density at the given pressure. When the EOS
    /// carries no baryon column the second value is 0.0.
    fn energy_density(&self, pr: Real) -> EosResult<(Real, Real)>;

    /// Whether baryon densities are meaningful for this EOS.
    fn baryon_column(&self) -> bool;

    /// Auxiliary quantities interpolated at the given pressure, one per
    /// auxiliary column. Empty by default.
    fn aux_values(&self, _pr: Real) -> EosResult<Vec<Real>> {
        Ok(Vec::new())
    }

    /// Names and unit strings of the auxiliary columns, matching the order of
    /// `aux_values`.
    fn aux_names_units(&self) -> Vec<(String, String)> {
        Vec::new()
    }
}
