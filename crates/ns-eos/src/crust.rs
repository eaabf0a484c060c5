//! Low-density (crust) EOS loaders for [`InterpEos`].
//!
//! Two crusts ship as embedded data resources (the NV default and the SHO
//! 2011 table, both already in canonical units); the rest ingest externally
//! supplied grids or tables keyed by nuclear symmetry-energy parameters.
//! Every loader leaves the engine with `use_crust` set and a transition
//! pressure, either the crust's top pressure or one derived from a
//! transition baryon density.

use ns_core::{interp, units, NsError, Real};
use ns_table::{Grid2d, Table};

use crate::{EosError, EosResult, InterpEos};

static NV_CRUST: &str = include_str!("../data/nv.csv");
static SHO11_CRUST: &str = include_str!("../data/sho11.csv");

/// Crust model selector for the NGL 2013 single-parameter loader.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Ngl13Model {
    /// Pure neutron matter
    Pnm,
    /// Gogny-Pearson style fit
    Gp,
}

/// Skyrme family selector for the GCP 2010 loader.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Gcp10Model {
    Bsk19,
    Bsk20,
    Bsk21,
}

/// Symmetry-energy slope axis of the per-L transition-density tables,
/// L = 25, 30, ..., 115 MeV.
const NGL13_L_AXIS: [Real; 19] = [
    25.0, 30.0, 35.0, 40.0, 45.0, 50.0, 55.0, 60.0, 65.0, 70.0, 75.0, 80.0, 85.0, 90.0, 95.0,
    100.0, 105.0, 110.0, 115.0,
];

/// Crust-core transition baryon density (1/fm^3) per L, pure neutron matter.
const NGL13_NT_PNM: [Real; 19] = [
    0.0898408, 0.0862488, 0.0831956, 0.0805016, 0.0781668, 0.0760116, 0.0743952, 0.0727788,
    0.0713420, 0.0700848, 0.0688276, 0.0673908, 0.0666724, 0.0663132, 0.0654152, 0.0641580,
    0.0645172, 0.0641580, 0.0636192,
];

/// Transition baryon density per L for the GP model.
const NGL13_NT_GP: [Real; 19] = [
    0.113189, 0.106646, 0.0982820, 0.0927144, 0.0876856, 0.0831956, 0.0792444, 0.0754728,
    0.0735992, 0.0686480, 0.0654152, 0.0623620, 0.0593088, 0.0564352, 0.0533820, 0.0503288,
    0.0472756, 0.0451204, 0.0427856,
];

fn parse_builtin(text: &'static str) -> EosResult<(Vec<Real>, Vec<Real>, Vec<Real>)> {
    let mut ed = Vec::new();
    let mut pr = Vec::new();
    let mut nb = Vec::new();
    for line in text.lines().skip(1) {
        let mut parts = line.split(',');
        let mut field = || -> EosResult<Real> {
            parts
                .next()
                .and_then(|s| s.trim().parse::<Real>().ok())
                .ok_or(EosError::Data {
                    what: "malformed embedded crust row",
                })
        };
        ed.push(field()?);
        pr.push(field()?);
        nb.push(field()?);
    }
    Ok((ed, pr, nb))
}

impl InterpEos {
    /// Load the default built-in crust (NV table, 73 rows). The transition
    /// pressure is the crust's top pressure, at baryon density 0.08/fm^3.
    pub fn default_low_dens_eos(&mut self) -> EosResult<()> {
        let (ed, pr, nb) = parse_builtin(NV_CRUST)?;
        self.commit_crust(ed, pr, nb, None)
    }

    /// Load the built-in SHO 2011 crust (98 rows).
    pub fn sho11_low_dens_eos(&mut self) -> EosResult<()> {
        let (ed, pr, nb) = parse_builtin(SHO11_CRUST)?;
        self.commit_crust(ed, pr, nb, None)
    }

    /// Load a crust from an NGL 2013 grid file evaluated at symmetry-energy
    /// slope `L` (MeV), silently clamped to the tabulated range [25, 115].
    ///
    /// The transition pressure comes from the model's per-L transition
    /// baryon density, interpolated onto the freshly built crust.
    pub fn ngl13_low_dens_eos(
        &mut self,
        l_slope: Real,
        model: Ngl13Model,
        grid: &Grid2d,
    ) -> EosResult<()> {
        let l_slope = l_slope.clamp(25.0, 115.0);

        let ed = grid.line("ed", l_slope)?;
        let pr = grid.line("pr", l_slope)?;
        let nb = grid.nb_axis().to_vec();

        let ntv = match model {
            Ngl13Model::Pnm => &NGL13_NT_PNM,
            Ngl13Model::Gp => &NGL13_NT_GP,
        };
        let nt = interp::linear(&NGL13_L_AXIS, ntv, l_slope);
        let trans_pres = interp::linear(&nb, &pr, nt);

        self.commit_crust(ed, pr, nb, Some(trans_pres))
    }

    /// Load a crust from a pair of NGL 2013 grids bracketing the symmetry
    /// energy `S` (even-MeV grid lines), blended by the fractional part of
    /// `S` and evaluated at slope `L`, with an explicit transition baryon
    /// density `nt`.
    ///
    /// Validity: S in [28, 38], L in [25, 115], L <= 5 S - 65 (the corner of
    /// the tabulated region), nt in [0.01, 0.15]. A grid value at or below
    /// zero means the requested (S, L) fell outside the file's physical
    /// coverage; the load aborts without touching the current crust.
    pub fn ngl13_low_dens_eos2(
        &mut self,
        s_sym: Real,
        l_slope: Real,
        nt: Real,
        grid_low: &Grid2d,
        grid_high: &Grid2d,
    ) -> EosResult<()> {
        if !(28.0..=38.0).contains(&s_sym) {
            return Err(NsError::OutOfRange { what: "S" }.into());
        }
        if !(25.0..=115.0).contains(&l_slope) {
            return Err(NsError::OutOfRange { what: "L" }.into());
        }
        if l_slope > s_sym * 5.0 - 65.0 {
            return Err(NsError::OutOfRange { what: "(S, L) pair" }.into());
        }
        if !(0.01..=0.15).contains(&nt) {
            return Err(NsError::OutOfRange {
                what: "transition density nt",
            }
            .into());
        }

        let mut s_low = s_sym as i64;
        if s_low % 2 == 1 {
            s_low -= 1;
        }
        let weight_low = (2.0 - (s_sym - s_low as Real)) / 2.0;
        let weight_high = 1.0 - weight_low;

        let ed_low = grid_low.line("ed", l_slope)?;
        let pr_low = grid_low.line("pr", l_slope)?;
        let ed_high = grid_high.line("ed", l_slope)?;
        let pr_high = grid_high.line("pr", l_slope)?;
        let nb = grid_low.nb_axis().to_vec();

        let mut ed = Vec::with_capacity(nb.len());
        let mut pr = Vec::with_capacity(nb.len());
        for i in 0..nb.len() {
            let edval = ed_low[i] * weight_low + ed_high[i] * weight_high;
            let prval = pr_low[i] * weight_low + pr_high[i] * weight_high;
            if edval < 1.0e-100 || prval < 1.0e-100 || nb[i] < 1.0e-100 {
                return Err(EosError::Data {
                    what: "degenerate grid value in blended crust",
                });
            }
            ed.push(edval);
            pr.push(prval);
        }

        let trans_pres = interp::linear(&nb, &pr, nt);
        self.commit_crust(ed, pr, nb, Some(trans_pres))
    }

    /// Load a crust from an S 2012 table with `ed`/`pr` columns in natural
    /// units (1/fm^4) and `nb` in 1/fm^3. The transition pressure is taken
    /// at baryon density 0.08/fm^3.
    pub fn s12_low_dens_eos(&mut self, table: &Table) -> EosResult<()> {
        let factor = units::convert("1/fm^4", "Msun/km^3", 1.0)?;
        let ed: Vec<Real> = table.column("ed")?.iter().map(|v| v * factor).collect();
        let pr: Vec<Real> = table.column("pr")?.iter().map(|v| v * factor).collect();
        let nb = table.column("nb")?.to_vec();

        let trans_pres = interp::linear(&nb, &pr, 0.08);
        self.commit_crust(ed, pr, nb, Some(trans_pres))
    }

    /// Load a GCP 2010 (BSk family) crust from a table with columns `rho`
    /// (mass density, converted from its declared unit), `P` (pressure,
    /// always treated as erg/cm^3 regardless of the declared unit, matching
    /// the known mislabeling in the distributed files), and `nb` (1/fm^3).
    ///
    /// The transition pressure is the published value for each model.
    pub fn gcp10_low_dens_eos(&mut self, model: Gcp10Model, table: &Table) -> EosResult<()> {
        let rho_factor = {
            let unit = table.get_unit("rho")?;
            if unit.is_empty() || unit == "Msun/km^3" {
                1.0
            } else {
                units::convert(unit, "Msun/km^3", 1.0)?
            }
        };
        let p_factor = units::convert("erg/cm^3", "Msun/km^3", 1.0)?;

        let ed: Vec<Real> = table.column("rho")?.iter().map(|v| v * rho_factor).collect();
        let pr: Vec<Real> = table.column("P")?.iter().map(|v| v * p_factor).collect();
        let nb = table.column("nb")?.to_vec();

        let trans_mev_fm3 = match model {
            Gcp10Model::Bsk19 => 0.428,
            Gcp10Model::Bsk20 => 0.268,
            Gcp10Model::Bsk21 => 0.365,
        };
        let trans_pres = units::convert("MeV/fm^3", "Msun/km^3", trans_mev_fm3)?;

        self.commit_crust(ed, pr, nb, Some(trans_pres))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_crust_anchors() {
        let mut eos = InterpEos::new();
        eos.default_low_dens_eos().unwrap();
        // top of the crust: nb = 0.08/fm^3, pr = 3.63172009e-7 Msun/km^3
        assert!((eos.trans_pres() - 3.63172009e-7).abs() < 1e-15);
        let (plow, ptrans, _) = eos.transition();
        assert_eq!(plow, ptrans);
    }

    #[test]
    fn sho11_crust_loads() {
        let mut eos = InterpEos::new();
        eos.sho11_low_dens_eos().unwrap();
        assert!((eos.trans_pres() - 4.982142e-7).abs() < 1e-13);
    }

    fn toy_grid() -> Grid2d {
        let nb: Vec<Real> = (1..=12).map(|i| 0.01 * i as Real).collect();
        let mut g = Grid2d::new(vec![25.0, 115.0], nb.clone()).unwrap();
        let row = |scale: Real| -> Vec<Real> { nb.iter().map(|n| scale * n).collect() };
        g.add_layer("ed", vec![row(1.0e-3), row(1.2e-3)]).unwrap();
        g.add_layer("pr", vec![row(1.0e-5), row(1.3e-5)]).unwrap();
        g
    }

    #[test]
    fn ngl13_clamps_l_and_sets_transition() {
        let mut eos = InterpEos::new();
        eos.ngl13_low_dens_eos(500.0, Ngl13Model::Pnm, &toy_grid())
            .unwrap();
        // clamped to L = 115 so nt = 0.0636192; crust pr is 1.3e-5 * nb there
        let expected = 1.3e-5 * 0.0636192;
        assert!((eos.trans_pres() - expected).abs() / expected < 1e-10);
        assert!(eos.has_crust());
    }

    #[test]
    fn ngl13_2_validates_inputs() {
        let g = toy_grid();
        let mut eos = InterpEos::new();
        assert!(eos.ngl13_low_dens_eos2(27.0, 40.0, 0.08, &g, &g).is_err());
        assert!(eos.ngl13_low_dens_eos2(32.0, 120.0, 0.08, &g, &g).is_err());
        // L > 5S - 65
        assert!(eos.ngl13_low_dens_eos2(30.0, 90.0, 0.08, &g, &g).is_err());
        assert!(eos.ngl13_low_dens_eos2(32.0, 40.0, 0.5, &g, &g).is_err());
        assert!(!eos.has_crust());
        eos.ngl13_low_dens_eos2(33.0, 40.0, 0.08, &g, &g).unwrap();
        assert!(eos.has_crust());
    }

    #[test]
    fn gcp10_transition_pressures() {
        let mut t = Table::new();
        t.add_column("rho", "g/cm^3").unwrap();
        t.add_column("P", "erg/cm^3").unwrap();
        t.add_column("nb", "1/fm^3").unwrap();
        for i in 1..=10 {
            let x = i as Real;
            t.push_row(&[1.0e12 * x, 1.0e30 * x, 0.008 * x]).unwrap();
        }
        let mut eos = InterpEos::new();
        eos.gcp10_low_dens_eos(Gcp10Model::Bsk20, &t).unwrap();
        let expected = units::convert("MeV/fm^3", "Msun/km^3", 0.268).unwrap();
        assert!((eos.trans_pres() - expected).abs() < 1e-18);
    }

    #[test]
    fn s12_converts_natural_units() {
        let mut t = Table::new();
        t.add_column("ed", "1/fm^4").unwrap();
        t.add_column("pr", "1/fm^4").unwrap();
        t.add_column("nb", "1/fm^3").unwrap();
        for i in 1..=10 {
            let x = i as Real;
            t.push_row(&[1.0e-3 * x, 1.0e-5 * x, 0.01 * x]).unwrap();
        }
        let mut eos = InterpEos::new();
        eos.s12_low_dens_eos(&t).unwrap();
        let factor = units::convert("1/fm^4", "Msun/km^3", 1.0).unwrap();
        let expected = 8.0e-5 * factor;
        assert!((eos.trans_pres() - expected).abs() / expected < 1e-10);
    }
}
