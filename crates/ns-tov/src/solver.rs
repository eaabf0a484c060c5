//! TOV integration and the three solve modes.

use ns_core::{interp, roots, NsError, Real, RootConfig};
use ns_core::units::{G_KM_MSUN, MEV_FM3_TO_MSUN_KM3, SCHWARZ_KM};
use ns_eos::TovEos;
use ns_table::Table;
use rayon::prelude::*;
use serde::Serialize;
use tracing::{debug, warn};

use crate::{rkck, TovError, TovResult};

const PI: Real = std::f64::consts::PI;

/// Solver configuration. Radii in km, masses in Msun, pressures in
/// Msun/km^3.
#[derive(Clone, Copy, Debug)]
pub struct TovConfig {
    /// Compute and report the metric potential column
    pub calc_gpot: bool,
    /// Integrate the slow-rotation variables as well
    pub ang_vel: bool,
    /// Radius at which integration starts (series expansion below this)
    pub start_rad: Real,
    /// Initial trial step
    pub init_step: Real,
    /// Divergence guard: a star larger than this is a failure
    pub max_rad: Real,
    /// Surface pressure as a fraction of the central pressure
    pub surf_frac: Real,
    /// Relative tolerance of the step controller
    pub rel_tol: Real,
    /// Absolute tolerance of the step controller
    pub abs_tol: Real,
    /// Step-count guard
    pub max_steps: usize,
    /// Central-pressure bracket for the fixed-mass root find
    pub pc_low: Real,
    pub pc_high: Real,
    /// Central-pressure grid for the mass-radius curve
    pub prbegin: Real,
    pub prend: Real,
    pub nsteps: usize,
    /// Iteration cap for root finding and scan refinement
    pub max_iter: usize,
    /// Baryon rest mass (MeV) in the baryonic-mass integrand
    pub baryon_mass_mev: Real,
}

impl Default for TovConfig {
    fn default() -> Self {
        Self {
            calc_gpot: true,
            ang_vel: false,
            start_rad: 4.0e-4,
            init_step: 1.0e-3,
            max_rad: 60.0,
            surf_frac: 1.0e-10,
            rel_tol: 1.0e-10,
            abs_tol: 1.0e-14,
            max_steps: 100_000,
            pc_low: 5.0e-5,
            pc_high: 3.0e-3,
            prbegin: 2.0e-5,
            prend: 4.0e-3,
            nsteps: 100,
            max_iter: 100,
            baryon_mass_mev: 931.2,
        }
    }
}

/// Scalar results of one integrated star.
#[derive(Clone, Copy, Debug, Serialize)]
pub struct StarSummary {
    /// Gravitational mass, Msun
    pub mass: Real,
    /// Radius, km
    pub radius: Real,
    /// Baryonic mass, Msun
    pub baryonic_mass: Real,
    /// Central pressure, Msun/km^3
    pub central_pressure: Real,
    /// d(omega_bar)/dr at the surface over the angular velocity; zero when
    /// rotation is off
    pub domega_rat: Real,
}

impl StarSummary {
    /// Moment of inertia (Msun km^2) from the surface frame-dragging ratio.
    pub fn moment_of_inertia(&self) -> Real {
        self.domega_rat * self.radius.powi(4) / 3.0 / SCHWARZ_KM
    }
}

/// One solved star: scalars plus the radial profile.
#[derive(Clone, Debug)]
pub struct StarModel {
    pub summary: StarSummary,
    pub profile: Table,
}

/// Mass-radius curve: one summary row per central-pressure grid point, plus
/// the last successfully integrated profile.
#[derive(Clone, Debug)]
pub struct MassRadiusCurve {
    pub curve: Table,
    pub last: Option<StarModel>,
}

struct RawStar {
    radius: Real,
    y: Vec<Real>,
    rows: Vec<(Real, Vec<Real>)>,
}

/// TOV solver over a read-only EOS.
pub struct TovSolver<'a> {
    eos: &'a dyn TovEos,
    pub cfg: TovConfig,
}

impl<'a> TovSolver<'a> {
    pub fn new(eos: &'a dyn TovEos) -> Self {
        Self {
            eos,
            cfg: TovConfig::default(),
        }
    }

    pub fn with_config(eos: &'a dyn TovEos, cfg: TovConfig) -> Self {
        Self { eos, cfg }
    }

    fn mb_conv(&self) -> Real {
        self.cfg.baryon_mass_mev * MEV_FM3_TO_MSUN_KM3
    }

    /// TOV right-hand side. State: [m, P, phi, bm] plus [omega_bar, v] when
    /// rotation is on, with v = r^4 j d(omega_bar)/dr.
    fn rhs(&self, r: Real, y: &[Real], dy: &mut [Real]) -> TovResult<()> {
        let m = y[0];
        let p = y[1].max(0.0);
        let a = 1.0 - SCHWARZ_KM * m / r;
        if a <= 0.0 {
            return Err(TovError::Diverged {
                what: "enclosed mass inside its Schwarzschild radius",
            });
        }
        let (ed, nb) = self.eos.energy_density(p)?;

        let fact = G_KM_MSUN * (m + 4.0 * PI * r.powi(3) * p) / (r * r * a);
        dy[0] = 4.0 * PI * r * r * ed;
        dy[1] = -(ed + p) * fact;
        dy[2] = fact;
        dy[3] = 4.0 * PI * r * r * nb * self.mb_conv() / a.sqrt();

        if y.len() > 4 {
            let gp = y[2];
            let wbar = y[4];
            let vv = y[5];
            let da = -SCHWARZ_KM * (dy[0] * r - m) / (r * r);
            // j = sqrt(A) e^{-phi}; the logarithmic derivative drives v
            let djoj = da / (2.0 * a) - dy[2];
            let j = a.sqrt() * (-gp).exp();
            dy[4] = vv / (r.powi(4) * j);
            dy[5] = -4.0 * r.powi(3) * j * djoj * wbar;
        }
        Ok(())
    }

    /// Integrate one star outward from the center at central pressure `pc`
    /// until the pressure falls to `surf_frac * pc`.
    fn integrate(&self, pc: Real) -> TovResult<RawStar> {
        let cfg = &self.cfg;
        let (ed_c, nb_c) = self.eos.energy_density(pc)?;
        let r0 = cfg.start_rad;

        let mut y = vec![
            4.0 / 3.0 * PI * r0.powi(3) * ed_c,
            pc,
            0.0,
            4.0 / 3.0 * PI * r0.powi(3) * nb_c * self.mb_conv(),
        ];
        if cfg.ang_vel {
            y.push(1.0);
            y.push(0.0);
        }

        let mut r = r0;
        let mut h = cfg.init_step;
        let p_surf = pc * cfg.surf_frac;
        let mut rows = vec![(r, y.clone())];

        for _ in 0..cfg.max_steps {
            if r > cfg.max_rad {
                return Err(TovError::Diverged {
                    what: "radius exceeded the divergence guard",
                });
            }

            // inner control loop: shrink until the embedded error passes
            let mut attempt = 0usize;
            let (ynew, errmax) = loop {
                attempt += 1;
                if attempt > 60 {
                    return Err(TovError::Diverged {
                        what: "step size underflow in the step controller",
                    });
                }
                match rkck::step(r, &y, h, |x, yt, dyt| self.rhs(x, yt, dyt)) {
                    Ok((ynew, yerr)) => {
                        let mut errmax: Real = 0.0;
                        for i in 0..y.len() {
                            let sc = cfg.abs_tol + cfg.rel_tol * y[i].abs().max(ynew[i].abs());
                            errmax = errmax.max((yerr[i] / sc).abs());
                        }
                        if errmax <= 1.0 {
                            break (ynew, errmax);
                        }
                        h = (0.2 * h).max(0.9 * h * errmax.powf(-0.25));
                    }
                    // a stage left the EOS domain; retry shorter
                    Err(_) => h *= 0.2,
                }
            };

            if !ynew[1].is_finite() || ynew[1] <= p_surf {
                // land exactly on the surface by bisecting the step length
                let mut hlo = 0.0;
                let mut hhi = h;
                for _ in 0..80 {
                    let hm = 0.5 * (hlo + hhi);
                    match rkck::step(r, &y, hm, |x, yt, dyt| self.rhs(x, yt, dyt)) {
                        Ok((ym, _)) if ym[1].is_finite() && ym[1] > p_surf => hlo = hm,
                        _ => hhi = hm,
                    }
                }
                let hm = 0.5 * (hlo + hhi);
                let (ym, _) = rkck::step(r, &y, hm, |x, yt, dyt| self.rhs(x, yt, dyt))?;
                r += hm;
                y = ym;
                rows.push((r, y.clone()));
                return Ok(RawStar {
                    radius: r,
                    y,
                    rows,
                });
            }

            r += h;
            y = ynew;
            rows.push((r, y.clone()));
            if errmax < 0.5 {
                h = (5.0 * h).min(0.9 * h * errmax.max(1e-16).powf(-0.2));
            }
        }

        Err(TovError::Diverged {
            what: "step-count guard exceeded",
        })
    }

    /// Integrate one star and post-process it into a profile table and
    /// summary.
    pub fn star(&self, pc: Real) -> TovResult<StarModel> {
        let cfg = &self.cfg;
        let raw = self.integrate(pc)?;
        let mass = raw.y[0];
        let radius = raw.radius;
        let bm = raw.y[3];

        let a_surf = 1.0 - SCHWARZ_KM * mass / radius;
        if a_surf <= 0.0 {
            return Err(TovError::Diverged {
                what: "surface inside the Schwarzschild radius",
            });
        }
        // shift phi to match the exterior Schwarzschild potential at R
        let gp_shift = 0.5 * a_surf.ln() - raw.y[2];

        // rotation: normalize to unit angular velocity using the exterior
        // matching condition Omega = omega_bar(R) + R omega_bar'(R) / 3
        let (domega_rat, omega) = if cfg.ang_vel {
            let j_surf = a_surf.sqrt() * (-raw.y[2]).exp();
            let du = raw.y[5] / (radius.powi(4) * j_surf);
            let omega = raw.y[4] + radius * du / 3.0;
            (du / omega, omega)
        } else {
            (0.0, 1.0)
        };

        let aux_schema = self.eos.aux_names_units();
        let mut profile = Table::new();
        profile.add_column("gm", "Msun")?;
        profile.add_column("r", "km")?;
        if cfg.calc_gpot || cfg.ang_vel {
            profile.add_column("gp", "")?;
        }
        profile.add_column("bm", "Msun")?;
        profile.add_column("pr", "Msun/km^3")?;
        profile.add_column("ed", "Msun/km^3")?;
        profile.add_column("nb", "1/fm^3")?;
        for (name, unit) in &aux_schema {
            profile.add_column(name, unit)?;
        }
        if cfg.ang_vel {
            profile.add_column("omega_rat", "")?;
        }

        let mut row = Vec::with_capacity(profile.ncols());
        for (r, state) in &raw.rows {
            let p = state[1].max(0.0);
            let (ed, nb) = self.eos.energy_density(p)?;
            row.clear();
            row.push(state[0]);
            row.push(*r);
            if cfg.calc_gpot || cfg.ang_vel {
                row.push(state[2] + gp_shift);
            }
            row.push(state[3]);
            row.push(p);
            row.push(ed);
            row.push(nb);
            if !aux_schema.is_empty() {
                row.extend(self.eos.aux_values(p)?);
            }
            if cfg.ang_vel {
                row.push(state[4] / omega);
            }
            profile.push_row(&row)?;
        }

        debug!(pc, mass, radius, bm, "integrated star");
        Ok(StarModel {
            summary: StarSummary {
                mass,
                radius,
                baryonic_mass: bm,
                central_pressure: pc,
                domega_rat,
            },
            profile,
        })
    }

    /// Solve for the central pressure giving gravitational mass
    /// `target_mass`, to relative tolerance `tol`.
    ///
    /// The root find runs in log central pressure over
    /// `[pc_low, pc_high]`, Brent first; if Brent fails to converge the
    /// solver warns and retries with plain bisection before giving up.
    /// A converged root whose mass still misses the target by more than
    /// `tol` relative is reported as [`TovError::Convergence`].
    pub fn fixed(&self, target_mass: Real, tol: Real) -> TovResult<StarModel> {
        let cfg = &self.cfg;
        let lo = cfg.pc_low.ln();
        let hi = cfg.pc_high.ln();
        let root_cfg = RootConfig {
            tol_abs: (tol * 1.0e-2).max(1.0e-13),
            tol_rel: 0.0,
            max_iter: cfg.max_iter,
        };

        let integ_err: std::cell::RefCell<Option<TovError>> = std::cell::RefCell::new(None);
        let mut objective = |lp: Real| -> Result<Real, NsError> {
            match self.integrate(lp.exp()) {
                Ok(raw) => Ok(raw.y[0] - target_mass),
                Err(e) => {
                    *integ_err.borrow_mut() = Some(e);
                    Err(NsError::Convergence {
                        what: "trial integration failed during mass root-find",
                    })
                }
            }
        };

        let found = match roots::brent(&mut objective, lo, hi, root_cfg) {
            Ok(lp) => lp,
            Err(brent_err) => {
                if let Some(e) = integ_err.borrow_mut().take() {
                    return Err(e);
                }
                warn!("Brent failed on the mass objective ({brent_err}), retrying with bisection");
                match roots::bisect(&mut objective, lo, hi, root_cfg) {
                    Ok(lp) => lp,
                    Err(e) => {
                        let stored = integ_err.borrow_mut().take();
                        return Err(stored.unwrap_or(TovError::Core(e)));
                    }
                }
            }
        };

        let star = self.star(found.exp())?;
        if (star.summary.mass - target_mass).abs() > tol * target_mass.abs() {
            return Err(TovError::Convergence {
                mass: star.summary.mass,
                target: target_mass,
            });
        }
        Ok(star)
    }

    /// Find the maximum-mass star: scan the central pressure upward by a
    /// constant factor until the mass turns over (an integration failure
    /// ends the scan early, best-effort), then refine the turnover bracket
    /// by golden-section search.
    pub fn max(&self) -> TovResult<StarModel> {
        let cfg = &self.cfg;
        let mut pc = cfg.pc_low;
        let mut best_pc = 0.0;
        let mut best_mass = 0.0;

        while pc < 10.0 * cfg.pc_high {
            match self.integrate(pc) {
                Ok(raw) => {
                    if raw.y[0] < best_mass {
                        break;
                    }
                    best_mass = raw.y[0];
                    best_pc = pc;
                }
                Err(e) => {
                    if best_pc > 0.0 {
                        debug!("maximum-mass scan stopped early: {e}");
                        break;
                    }
                    return Err(e);
                }
            }
            pc *= 1.3;
        }
        if best_pc == 0.0 {
            return Err(TovError::Diverged {
                what: "maximum-mass scan found no integrable star",
            });
        }

        // A probe that fails to integrate cannot be the maximum; scoring it
        // minus infinity shrinks the bracket away from the failing region.
        let mass_at = |pc: Real| -> Real {
            match self.integrate(pc) {
                Ok(raw) => raw.y[0],
                Err(e) => {
                    debug!(pc, "refinement probe failed: {e}");
                    Real::NEG_INFINITY
                }
            }
        };
        let gr = ((5.0 as Real).sqrt() - 1.0) / 2.0;
        let mut a = best_pc / 1.3;
        let mut b = best_pc * 1.3;
        let mut c = b - gr * (b - a);
        let mut d = a + gr * (b - a);
        let mut fc = mass_at(c);
        let mut fd = mass_at(d);
        for _ in 0..cfg.max_iter {
            if fc > fd {
                b = d;
                d = c;
                fd = fc;
                c = b - gr * (b - a);
                fc = mass_at(c);
            } else {
                a = c;
                c = d;
                fc = fd;
                d = a + gr * (b - a);
                fd = mass_at(d);
            }
            if (b - a).abs() < 1e-6 * b {
                break;
            }
        }
        let pc_star = 0.5 * (a + b);
        self.star(pc_star).or_else(|e| {
            warn!(pc_star, "refined maximum failed to integrate, keeping the scan best: {e}");
            self.star(best_pc)
        })
    }

    /// Where the profile crosses pressure `pm`: (radius, enclosed mass),
    /// both 0.0 when the marker exceeds the central pressure.
    fn profile_crossing(raw: &RawStar, pm: Real) -> (Real, Real) {
        let n = raw.rows.len();
        // pressure decreases outward, so the reversed profile ascends
        let mut prs = Vec::with_capacity(n);
        let mut rs = Vec::with_capacity(n);
        let mut gms = Vec::with_capacity(n);
        for (r, state) in raw.rows.iter().rev() {
            prs.push(state[1]);
            rs.push(*r);
            gms.push(state[0]);
        }
        if pm > prs[n - 1] {
            return (0.0, 0.0);
        }
        (
            interp::linear(&prs, &rs, pm),
            interp::linear(&prs, &gms, pm),
        )
    }

    /// Mass-radius curve over a log-spaced central-pressure grid from
    /// `prbegin` to `prend` with `nsteps` points, integrating each star
    /// independently (in parallel; the EOS is read-only).
    ///
    /// `markers` are profile pressures: for each marker i, columns `r{i}`
    /// and `gm{i}` record where each star's profile crosses it. Grid points
    /// whose integration fails are skipped with a warning.
    pub fn mvsr(&self, markers: &[Real]) -> TovResult<MassRadiusCurve> {
        let cfg = &self.cfg;
        if cfg.nsteps < 2 {
            return Err(NsError::InvalidArg {
                what: "mass-radius curve needs at least two grid points",
            }
            .into());
        }

        let ratio = cfg.prend / cfg.prbegin;
        let pcs: Vec<Real> = (0..cfg.nsteps)
            .map(|i| cfg.prbegin * ratio.powf(i as Real / (cfg.nsteps - 1) as Real))
            .collect();

        let results: Vec<(Real, TovResult<RawStar>)> = pcs
            .par_iter()
            .map(|&pc| (pc, self.integrate(pc)))
            .collect();

        let mut curve = Table::new();
        curve.add_column("gm", "Msun")?;
        curve.add_column("r", "km")?;
        curve.add_column("bm", "Msun")?;
        curve.add_column("pr", "Msun/km^3")?;
        for i in 0..markers.len() {
            curve.add_column(&format!("r{i}"), "km")?;
            curve.add_column(&format!("gm{i}"), "Msun")?;
        }

        let mut last_pc = None;
        for (pc, res) in results {
            match res {
                Ok(raw) => {
                    let mut row = vec![raw.y[0], raw.radius, raw.y[3], pc];
                    for &pm in markers {
                        let (rm, gmm) = Self::profile_crossing(&raw, pm);
                        row.push(rm);
                        row.push(gmm);
                    }
                    curve.push_row(&row)?;
                    last_pc = Some(pc);
                }
                Err(e) => {
                    warn!(pc, "mass-radius grid point failed: {e}");
                }
            }
        }

        let last = match last_pc {
            Some(pc) => Some(self.star(pc)?),
            None => None,
        };
        Ok(MassRadiusCurve { curve, last })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ns_eos::BuchdahlEos;

    #[test]
    fn buchdahl_star_is_sane() {
        let eos = BuchdahlEos::default();
        let mut cfg = TovConfig::default();
        cfg.rel_tol = 1e-8;
        let solver = TovSolver::with_config(&eos, cfg);
        let star = solver.star(3.0e-5).unwrap();
        assert!(star.summary.mass > 0.1 && star.summary.mass < 3.0);
        assert!(star.summary.radius > 5.0 && star.summary.radius < 40.0);
        // pressure decreases monotonically along the profile
        let pr = star.profile.column("pr").unwrap();
        assert!(pr.windows(2).all(|w| w[1] <= w[0]));
        // enclosed mass reaches the total at the surface
        let gm = star.profile.column("gm").unwrap();
        assert!((gm[gm.len() - 1] - star.summary.mass).abs() < 1e-12);
    }

    #[test]
    fn surface_landing_hits_surf_frac() {
        let eos = BuchdahlEos::default();
        let solver = TovSolver::new(&eos);
        let pc = 3.0e-5;
        let star = solver.star(pc).unwrap();
        let pr = star.profile.column("pr").unwrap();
        let p_last = pr[pr.len() - 1];
        assert!(p_last <= pc * solver.cfg.surf_frac * 1.01);
    }

    #[test]
    fn gpot_matches_schwarzschild_at_surface() {
        let eos = BuchdahlEos::default();
        let solver = TovSolver::new(&eos);
        let star = solver.star(3.0e-5).unwrap();
        let gp = star.profile.column("gp").unwrap();
        let expected =
            0.5 * (1.0 - SCHWARZ_KM * star.summary.mass / star.summary.radius).ln();
        assert!((gp[gp.len() - 1] - expected).abs() < 1e-12);
    }

    #[test]
    fn fixed_mass_out_of_tolerance_is_an_error() {
        let eos = BuchdahlEos::default();
        let mut cfg = TovConfig::default();
        cfg.pc_low = 1.0e-7;
        cfg.pc_high = 1.2e-4;
        let solver = TovSolver::with_config(&eos, cfg);
        // an exact-mass demand cannot be met by a finite-precision root find
        assert!(matches!(
            solver.fixed(1.4, 0.0),
            Err(TovError::Convergence { .. })
        ));
        // an achievable tolerance still solves
        let star = solver.fixed(1.4, 1.0e-6).unwrap();
        assert!((star.summary.mass - 1.4).abs() < 1.4e-6);
    }

    #[test]
    fn maximum_mass_stops_at_the_eos_ceiling() {
        let eos = BuchdahlEos::default();
        let solver = TovSolver::new(&eos);
        // the upward scan walks into the EOS validity ceiling before the
        // mass turns over; the solve still returns the best integrable star
        let star = solver.max().unwrap();
        assert!(star.summary.central_pressure <= eos.max_pressure());
        assert!(star.summary.mass.is_finite() && star.summary.mass > 3.7);
        assert!(star.summary.radius > 5.0 && star.summary.radius < 40.0);
    }

    #[test]
    fn divergence_guard_trips() {
        let eos = BuchdahlEos::default();
        let mut cfg = TovConfig::default();
        cfg.max_rad = 5.0;
        let solver = TovSolver::with_config(&eos, cfg);
        assert!(matches!(
            solver.star(3.0e-5),
            Err(TovError::Diverged { .. })
        ));
    }
}
