use ns_core::{interp, units, NsError, Real};
use ns_table::Table;
use tracing::warn;

use crate::{EosError, EosResult, TovEos};

/// How the crust and core tables are joined inside the transition band.
///
/// Smooth mode blends the two interpolants pointwise; sharp mode pins the
/// crust value at the low edge and the core value at the high edge and runs a
/// straight line between them. The two produce genuinely different curves
/// inside the band and both are kept for compatibility with the physical
/// models that assume one or the other.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum TransitionMode {
    #[default]
    Smooth,
    Sharp,
}

/// Density regime of a pressure query, derived per call, never stored.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    Crust,
    Transition,
    Core,
}

#[derive(Clone, Debug)]
struct AuxColumn {
    name: String,
    unit: String,
    values: Vec<Real>,
}

/// Piecewise-interpolated EOS: a low-density crust table, a high-density
/// core table, and a multiplicative transition band around `trans_pres`.
///
/// Internal storage is always canonical (Msun/km^3 for energy density and
/// pressure, 1/fm^3 for baryon density); `read_table` converts from the
/// declared column units at ingestion. Auxiliary core columns are copied
/// verbatim and interpolated in their native units.
#[derive(Clone, Debug)]
pub struct InterpEos {
    pub transition_mode: TransitionMode,

    crust_ed: Vec<Real>,
    crust_pr: Vec<Real>,
    crust_nb: Vec<Real>,

    core_ed: Vec<Real>,
    core_pr: Vec<Real>,
    core_nb: Vec<Real>,
    aux: Vec<AuxColumn>,

    use_crust: bool,
    baryon_column: bool,
    core_read: bool,

    efactor: Real,
    pfactor: Real,
    nfactor: Real,

    crust_high_pres: Real,
    trans_pres: Real,
    trans_width: Real,
}

impl Default for InterpEos {
    fn default() -> Self {
        Self {
            transition_mode: TransitionMode::default(),
            crust_ed: Vec::new(),
            crust_pr: Vec::new(),
            crust_nb: Vec::new(),
            core_ed: Vec::new(),
            core_pr: Vec::new(),
            core_nb: Vec::new(),
            aux: Vec::new(),
            use_crust: false,
            baryon_column: false,
            core_read: false,
            efactor: 1.0,
            pfactor: 1.0,
            nfactor: 1.0,
            crust_high_pres: 0.0,
            trans_pres: 0.0,
            trans_width: 1.0,
        }
    }
}

impl InterpEos {
    pub fn new() -> Self {
        Self::default()
    }

    /// Install a crust table already in canonical units. Used by the loaders
    /// in [`crate::crust`]; `trans_pres` defaults to the crust's top pressure
    /// unless the loader derived one from a transition density.
    pub(crate) fn commit_crust(
        &mut self,
        ed: Vec<Real>,
        pr: Vec<Real>,
        nb: Vec<Real>,
        trans_pres: Option<Real>,
    ) -> EosResult<()> {
        if ed.len() < 2 || ed.len() != pr.len() || ed.len() != nb.len() {
            return Err(EosError::Data {
                what: "crust table needs matching columns with at least two rows",
            });
        }
        self.crust_high_pres = pr[pr.len() - 1];
        self.trans_pres = trans_pres.unwrap_or(self.crust_high_pres);
        self.crust_ed = ed;
        self.crust_pr = pr;
        self.crust_nb = nb;
        self.use_crust = true;
        Ok(())
    }

    fn unit_factor_energy(unit: &str) -> EosResult<Real> {
        if unit.is_empty() || unit == "Msun/km^3" || unit == "solarmass/km^3" {
            return Ok(1.0);
        }
        Ok(units::convert(unit, "Msun/km^3", 1.0)?)
    }

    fn unit_factor_number(unit: &str) -> EosResult<Real> {
        match unit {
            "" | "1/fm^3" => Ok(1.0),
            "1/cm^3" => Ok(1.0e-39),
            "1/m^3" => Ok(1.0e-42),
            other => Ok(units::convert(other, "1/fm^3", 1.0)?),
        }
    }

    /// Bind the high-density (core) table.
    ///
    /// Columns are looked up by name (a missing column is a schema error);
    /// unit factors to the canonical system come from the declared column
    /// units; every other column is kept as an auxiliary column. The table is
    /// copied, not borrowed, so the caller may drop it afterwards.
    pub fn read_table(
        &mut self,
        table: &Table,
        e_col: &str,
        p_col: &str,
        nb_col: Option<&str>,
    ) -> EosResult<()> {
        let ie = table.lookup_column(e_col)?;
        let ip = table.lookup_column(p_col)?;
        let inb = match nb_col {
            Some(name) => Some(table.lookup_column(name)?),
            None => None,
        };
        self.baryon_column = inb.is_some();

        if table.nrows() < 2 {
            return Err(EosError::Data {
                what: "core table needs at least two rows",
            });
        }

        self.efactor = Self::unit_factor_energy(table.unit(ie))?;
        self.pfactor = Self::unit_factor_energy(table.unit(ip))?;
        self.nfactor = match inb {
            Some(i) => Self::unit_factor_number(table.unit(i))?,
            None => 1.0,
        };

        self.core_ed = table
            .column_by_index(ie)
            .iter()
            .map(|v| v * self.efactor)
            .collect();
        self.core_pr = table
            .column_by_index(ip)
            .iter()
            .map(|v| v * self.pfactor)
            .collect();
        self.core_nb = match inb {
            Some(i) => table
                .column_by_index(i)
                .iter()
                .map(|v| v * self.nfactor)
                .collect(),
            None => Vec::new(),
        };

        self.aux.clear();
        for i in 0..table.ncols() {
            if i == ie || i == ip || Some(i) == inb {
                continue;
            }
            self.aux.push(AuxColumn {
                name: table.name(i).to_string(),
                unit: table.unit(i).to_string(),
                values: table.column_by_index(i).to_vec(),
            });
        }

        self.core_read = true;
        Ok(())
    }

    /// Move the transition pressure (given in the core table's pressure
    /// units) and set the band width. A width below one is an input error.
    pub fn set_transition(&mut self, p: Real, width: Real) -> EosResult<()> {
        if width < 1.0 {
            return Err(NsError::InvalidArg {
                what: "transition width must be >= 1",
            }
            .into());
        }
        self.trans_pres = p * self.pfactor;
        self.trans_width = width;
        Ok(())
    }

    /// Transition summary: crust top pressure and transition pressure in the
    /// core table's pressure units, plus the first core pressure sample.
    pub fn transition(&self) -> (Real, Real, Real) {
        let phigh = self.core_pr.first().copied().unwrap_or(0.0);
        (
            self.crust_high_pres / self.pfactor,
            self.trans_pres / self.pfactor,
            phigh,
        )
    }

    pub fn trans_pres(&self) -> Real {
        self.trans_pres
    }

    pub fn trans_width(&self) -> Real {
        self.trans_width
    }

    pub fn has_crust(&self) -> bool {
        self.use_crust
    }

    /// Density regime of a pressure in canonical units.
    pub fn phase(&self, pr: Real) -> Phase {
        if self.use_crust && pr <= self.trans_pres / self.trans_width {
            Phase::Crust
        } else if self.use_crust && pr < self.trans_pres * self.trans_width {
            Phase::Transition
        } else {
            Phase::Core
        }
    }

    fn require_core(&self) -> EosResult<()> {
        if self.core_read {
            Ok(())
        } else {
            Err(EosError::NoCoreTable)
        }
    }

    fn crust_at(&self, pr: Real) -> (Real, Real) {
        let ed = interp::linear(&self.crust_pr, &self.crust_ed, pr);
        let nb = if self.baryon_column {
            interp::linear(&self.crust_pr, &self.crust_nb, pr)
        } else {
            0.0
        };
        (ed, nb)
    }

    fn core_at(&self, pr: Real) -> (Real, Real) {
        let ed = interp::linear(&self.core_pr, &self.core_ed, pr);
        let nb = if self.baryon_column {
            interp::linear(&self.core_pr, &self.core_nb, pr)
        } else {
            0.0
        };
        (ed, nb)
    }

    fn eden(&self, pr: Real) -> EosResult<(Real, Real)> {
        if !pr.is_finite() {
            return Err(NsError::NonFinite {
                what: "pressure query",
                value: pr,
            }
            .into());
        }

        let (ed, nb) = match self.phase(pr) {
            Phase::Crust => self.crust_at(pr),
            Phase::Transition => {
                self.require_core()?;
                let plo = self.trans_pres / self.trans_width;
                let phi = self.trans_pres * self.trans_width;
                match self.transition_mode {
                    TransitionMode::Smooth => {
                        let (edlo, nblo) = self.crust_at(pr);
                        let (edhi, nbhi) = self.core_at(pr);
                        let chi = (pr - plo) / (phi - plo);
                        (
                            (1.0 - chi) * edlo + chi * edhi,
                            (1.0 - chi) * nblo + chi * nbhi,
                        )
                    }
                    TransitionMode::Sharp => {
                        let (edlo, nblo) = self.crust_at(plo);
                        let (edhi, nbhi) = self.core_at(phi);
                        let chi = (pr - plo) / (phi - plo);
                        (
                            edlo + chi * (edhi - edlo),
                            nblo + chi * (nbhi - nblo),
                        )
                    }
                }
            }
            Phase::Core => {
                self.require_core()?;
                self.core_at(pr)
            }
        };

        if !ed.is_finite() || (self.baryon_column && !nb.is_finite()) {
            return Err(NsError::NonFinite {
                what: "interpolated energy or baryon density",
                value: ed,
            }
            .into());
        }
        Ok((ed, nb))
    }

    fn aux(&self, pr: Real) -> Vec<Real> {
        self.aux
            .iter()
            .map(|col| {
                if self.use_crust && pr <= self.crust_high_pres {
                    0.0
                } else {
                    interp::linear(&self.core_pr, &col.values, pr)
                }
            })
            .collect()
    }

    /// Non-fatal consistency diagnostic: scan the core table for decreasing
    /// pressure or energy density. Findings are logged and returned; an empty
    /// vector means the table is monotone.
    pub fn check(&self) -> Vec<String> {
        let mut findings = Vec::new();
        for i in 1..self.core_pr.len() {
            if self.core_pr[i] < self.core_pr[i - 1] {
                findings.push(format!(
                    "pressure decreases from {:e} to {:e} at row {}",
                    self.core_pr[i - 1],
                    self.core_pr[i],
                    i
                ));
            } else if self.core_ed[i] < self.core_ed[i - 1] {
                findings.push(format!(
                    "energy density decreases from {:e} to {:e} at row {}",
                    self.core_ed[i - 1],
                    self.core_ed[i],
                    i
                ));
            }
        }
        for f in &findings {
            warn!("core table consistency: {f}");
        }
        findings
    }
}

impl TovEos for InterpEos {
    fn energy_density(&self, pr: Real) -> EosResult<(Real, Real)> {
        self.eden(pr)
    }

    fn baryon_column(&self) -> bool {
        self.baryon_column
    }

    fn aux_values(&self, pr: Real) -> EosResult<Vec<Real>> {
        Ok(self.aux(pr))
    }

    fn aux_names_units(&self) -> Vec<(String, String)> {
        self.aux
            .iter()
            .map(|c| (c.name.clone(), c.unit.clone()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn core_table() -> Table {
        let mut t = Table::new();
        t.add_column("ed", "Msun/km^3").unwrap();
        t.add_column("pr", "Msun/km^3").unwrap();
        t.add_column("nb", "1/fm^3").unwrap();
        // crude but monotone core
        for i in 0..20 {
            let nb = 0.08 + 0.01 * i as Real;
            let pr = 3.6e-7 * (1.0 + i as Real).powi(2);
            let ed = 7.0e-5 * (1.0 + 0.2 * i as Real);
            t.push_row(&[ed, pr, nb]).unwrap();
        }
        t
    }

    fn loaded() -> InterpEos {
        let mut eos = InterpEos::new();
        eos.default_low_dens_eos().unwrap();
        eos.read_table(&core_table(), "ed", "pr", Some("nb")).unwrap();
        eos
    }

    #[test]
    fn missing_column_is_schema_error() {
        let mut eos = InterpEos::new();
        let err = eos.read_table(&core_table(), "energy", "pr", None);
        assert!(matches!(err, Err(EosError::Table(_))));
    }

    #[test]
    fn width_below_one_rejected() {
        let mut eos = loaded();
        assert!(eos.set_transition(3.6e-7, 0.9).is_err());
        assert!(eos.set_transition(3.6e-7, 1.0).is_ok());
    }

    #[test]
    fn phase_partition() {
        let mut eos = loaded();
        eos.set_transition(4.0e-7, 2.0).unwrap();
        assert_eq!(eos.phase(1.0e-7), Phase::Crust);
        assert_eq!(eos.phase(4.0e-7), Phase::Transition);
        assert_eq!(eos.phase(9.0e-7), Phase::Core);
    }

    #[test]
    fn smooth_mode_continuous_at_band_edges() {
        let mut eos = loaded();
        eos.set_transition(4.0e-7, 1.5).unwrap();
        let plo = eos.trans_pres() / eos.trans_width();
        let phi = eos.trans_pres() * eos.trans_width();
        for edge in [plo, phi] {
            let below = eos.energy_density(edge * (1.0 - 1e-9)).unwrap().0;
            let above = eos.energy_density(edge * (1.0 + 1e-9)).unwrap().0;
            assert!((below - above).abs() / above < 1e-6);
        }
    }

    #[test]
    fn sharp_and_smooth_differ_inside_band() {
        let mut eos = loaded();
        eos.set_transition(4.0e-7, 2.0).unwrap();
        let mid = eos.trans_pres();
        let smooth = eos.energy_density(mid).unwrap().0;
        eos.transition_mode = TransitionMode::Sharp;
        let sharp = eos.energy_density(mid).unwrap().0;
        assert!((smooth - sharp).abs() > 1e-12);
    }

    #[test]
    fn aux_zero_in_crust() {
        let mut t = core_table();
        t.add_column("mun", "MeV").unwrap();
        for i in 0..t.nrows() {
            t.set("mun", i, 950.0 + i as Real).unwrap();
        }
        let mut eos = InterpEos::new();
        eos.default_low_dens_eos().unwrap();
        eos.read_table(&t, "ed", "pr", Some("nb")).unwrap();
        assert_eq!(eos.aux_names_units(), vec![("mun".to_string(), "MeV".to_string())]);
        let low = eos.aux_values(1.0e-8).unwrap();
        assert_eq!(low, vec![0.0]);
        let high = eos.aux_values(1.0e-5).unwrap();
        assert!(high[0] > 900.0);
    }

    #[test]
    fn non_finite_query_rejected() {
        let eos = loaded();
        assert!(eos.energy_density(Real::NAN).is_err());
    }

    #[test]
    fn check_flags_non_monotone_energy() {
        let mut t = core_table();
        t.set("ed", 5, 1.0e-6).unwrap();
        let mut eos = InterpEos::new();
        eos.read_table(&t, "ed", "pr", Some("nb")).unwrap();
        assert!(!eos.check().is_empty());
    }
}
