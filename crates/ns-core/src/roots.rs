//! Scalar root finders over fallible functions.
//!
//! Brent's method is the primary solver; plain bisection is the fallback the
//! solver layer degrades to when Brent reports a failure. Both take closures
//! returning `NsResult<Real>` so an evaluation failure (e.g. an integration
//! that diverges at a trial point) propagates instead of poisoning the
//! bracket.

use crate::{NsError, NsResult, Real};

#[derive(Clone, Copy, Debug)]
pub struct RootConfig {
    pub tol_abs: Real,
    pub tol_rel: Real,
    pub max_iter: usize,
}

impl Default for RootConfig {
    fn default() -> Self {
        Self {
            tol_abs: 1e-12,
            tol_rel: 1e-10,
            max_iter: 100,
        }
    }
}

fn check_bracket(fa: Real, fb: Real) -> NsResult<()> {
    if fa * fb > 0.0 {
        return Err(NsError::InvalidArg {
            what: "root bracket does not straddle zero",
        });
    }
    Ok(())
}

/// Brent's method on `[a, b]`. The bracket must straddle a sign change.
pub fn brent<F>(mut f: F, a: Real, b: Real, cfg: RootConfig) -> NsResult<Real>
where
    F: FnMut(Real) -> NsResult<Real>,
{
    let mut a = a;
    let mut b = b;
    let mut fa = f(a)?;
    let mut fb = f(b)?;
    check_bracket(fa, fb)?;

    let mut c = a;
    let mut fc = fa;
    let mut d = b - a;
    let mut e = d;

    for _ in 0..cfg.max_iter {
        if fb.abs() > fc.abs() {
            a = b;
            b = c;
            c = a;
            fa = fb;
            fb = fc;
            fc = fa;
        }
        let tol1 = 2.0 * Real::EPSILON * b.abs() + 0.5 * (cfg.tol_abs + cfg.tol_rel * b.abs());
        let xm = 0.5 * (c - b);
        if xm.abs() <= tol1 || fb == 0.0 {
            return Ok(b);
        }
        if e.abs() >= tol1 && fa.abs() > fb.abs() {
            // attempt inverse quadratic interpolation / secant
            let s = fb / fa;
            let (mut p, mut q);
            if a == c {
                p = 2.0 * xm * s;
                q = 1.0 - s;
            } else {
                let qq = fa / fc;
                let r = fb / fc;
                p = s * (2.0 * xm * qq * (qq - r) - (b - a) * (r - 1.0));
                q = (qq - 1.0) * (r - 1.0) * (s - 1.0);
            }
            if p > 0.0 {
                q = -q;
            }
            p = p.abs();
            let min1 = 3.0 * xm * q - (tol1 * q).abs();
            let min2 = (e * q).abs();
            if 2.0 * p < min1.min(min2) {
                e = d;
                d = p / q;
            } else {
                d = xm;
                e = d;
            }
        } else {
            d = xm;
            e = d;
        }
        a = b;
        fa = fb;
        if d.abs() > tol1 {
            b += d;
        } else {
            b += tol1.copysign(xm);
        }
        fb = f(b)?;
        if (fb > 0.0) == (fc > 0.0) {
            c = a;
            fc = fa;
            d = b - a;
            e = d;
        }
    }
    Err(NsError::Convergence {
        what: "brent exceeded max_iter",
    })
}

/// Plain bisection on `[a, b]`. Slow but unconditionally stable on a valid
/// bracket.
pub fn bisect<F>(mut f: F, a: Real, b: Real, cfg: RootConfig) -> NsResult<Real>
where
    F: FnMut(Real) -> NsResult<Real>,
{
    let mut lo = a;
    let mut hi = b;
    let flo = f(lo)?;
    let fhi = f(hi)?;
    check_bracket(flo, fhi)?;
    if flo == 0.0 {
        return Ok(lo);
    }
    if fhi == 0.0 {
        return Ok(hi);
    }
    for _ in 0..cfg.max_iter {
        let mid = 0.5 * (lo + hi);
        let fmid = f(mid)?;
        if fmid == 0.0 {
            return Ok(mid);
        }
        if (fmid > 0.0) == (flo > 0.0) {
            lo = mid;
        } else {
            hi = mid;
        }
        if (hi - lo).abs() <= cfg.tol_abs + cfg.tol_rel * mid.abs() {
            return Ok(0.5 * (lo + hi));
        }
    }
    Err(NsError::Convergence {
        what: "bisection exceeded max_iter",
    })
}
