//! Cash-Karp embedded Runge-Kutta 4(5) step.
//!
//! One trial step produces both a fifth-order solution and an embedded error
//! estimate; the caller's controller accepts or rejects the step and adapts
//! the size. The derivative closure is fallible: an EOS evaluation that
//! fails at a trial stage surfaces as an error and the caller rejects the
//! step instead of integrating through garbage.

use ns_core::Real;

const A2: Real = 0.2;
const A3: Real = 0.3;
const A4: Real = 0.6;
const A5: Real = 1.0;
const A6: Real = 0.875;

const B21: Real = 0.2;
const B31: Real = 3.0 / 40.0;
const B32: Real = 9.0 / 40.0;
const B41: Real = 0.3;
const B42: Real = -0.9;
const B43: Real = 1.2;
const B51: Real = -11.0 / 54.0;
const B52: Real = 2.5;
const B53: Real = -70.0 / 27.0;
const B54: Real = 35.0 / 27.0;
const B61: Real = 1631.0 / 55296.0;
const B62: Real = 175.0 / 512.0;
const B63: Real = 575.0 / 13824.0;
const B64: Real = 44275.0 / 110592.0;
const B65: Real = 253.0 / 4096.0;

const C1: Real = 37.0 / 378.0;
const C3: Real = 250.0 / 621.0;
const C4: Real = 125.0 / 594.0;
const C6: Real = 512.0 / 1771.0;

const DC1: Real = C1 - 2825.0 / 27648.0;
const DC3: Real = C3 - 18575.0 / 48384.0;
const DC4: Real = C4 - 13525.0 / 55296.0;
const DC5: Real = -277.0 / 14336.0;
const DC6: Real = C6 - 0.25;

/// One Cash-Karp step of size `h` from `(x, y)`.
///
/// On success returns `(ynew, yerr)`: the fifth-order advance and the
/// embedded fourth/fifth-order error estimate per component.
pub fn step<E, F>(
    x: Real,
    y: &[Real],
    h: Real,
    mut f: F,
) -> Result<(Vec<Real>, Vec<Real>), E>
where
    F: FnMut(Real, &[Real], &mut [Real]) -> Result<(), E>,
{
    let n = y.len();
    let mut k1 = vec![0.0; n];
    let mut k2 = vec![0.0; n];
    let mut k3 = vec![0.0; n];
    let mut k4 = vec![0.0; n];
    let mut k5 = vec![0.0; n];
    let mut k6 = vec![0.0; n];
    let mut yt = vec![0.0; n];

    f(x, y, &mut k1)?;

    for i in 0..n {
        yt[i] = y[i] + h * B21 * k1[i];
    }
    f(x + A2 * h, &yt, &mut k2)?;

    for i in 0..n {
        yt[i] = y[i] + h * (B31 * k1[i] + B32 * k2[i]);
    }
    f(x + A3 * h, &yt, &mut k3)?;

    for i in 0..n {
        yt[i] = y[i] + h * (B41 * k1[i] + B42 * k2[i] + B43 * k3[i]);
    }
    f(x + A4 * h, &yt, &mut k4)?;

    for i in 0..n {
        yt[i] = y[i] + h * (B51 * k1[i] + B52 * k2[i] + B53 * k3[i] + B54 * k4[i]);
    }
    f(x + A5 * h, &yt, &mut k5)?;

    for i in 0..n {
        yt[i] =
            y[i] + h * (B61 * k1[i] + B62 * k2[i] + B63 * k3[i] + B64 * k4[i] + B65 * k5[i]);
    }
    f(x + A6 * h, &yt, &mut k6)?;

    let mut ynew = vec![0.0; n];
    let mut yerr = vec![0.0; n];
    for i in 0..n {
        ynew[i] = y[i] + h * (C1 * k1[i] + C3 * k3[i] + C4 * k4[i] + C6 * k6[i]);
        yerr[i] = h
            * (DC1 * k1[i] + DC3 * k3[i] + DC4 * k4[i] + DC5 * k5[i] + DC6 * k6[i]);
    }
    Ok((ynew, yerr))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fifth_order_on_exponential() {
        // y' = y, one step of h: local error should scale like h^5
        let f = |_x: Real, y: &[Real], dy: &mut [Real]| -> Result<(), ()> {
            dy[0] = y[0];
            Ok(())
        };
        let mut errs = Vec::new();
        for h in [0.1, 0.05] {
            let (ynew, _) = step(0.0, &[1.0], h, f).unwrap();
            errs.push((ynew[0] - h.exp()).abs());
        }
        // halving h should shrink the error by roughly 2^5
        assert!(errs[0] / errs[1] > 20.0, "ratio {}", errs[0] / errs[1]);
    }

    #[test]
    fn error_estimate_tracks_true_error() {
        let f = |x: Real, _y: &[Real], dy: &mut [Real]| -> Result<(), ()> {
            dy[0] = x.cos();
            Ok(())
        };
        let (ynew, yerr) = step(0.0, &[0.0], 0.2, f).unwrap();
        let truth = (0.2f64).sin();
        assert!((ynew[0] - truth).abs() < 1e-9);
        assert!(yerr[0].abs() < 1e-6);
    }

    #[test]
    fn stage_failure_propagates() {
        let f = |x: Real, _y: &[Real], _dy: &mut [Real]| -> Result<(), &'static str> {
            if x > 0.05 {
                Err("stage out of domain")
            } else {
                Ok(())
            }
        };
        assert!(step(0.0, &[1.0], 0.5, f).is_err());
    }
}
