//! Binary-search linear interpolation.
//!
//! The single interpolation primitive used by the EOS layer and the solver
//! post-processing. Tables may be ascending or descending in `xs`; values
//! outside the range extrapolate linearly from the end segment.

use crate::Real;

/// Linearly interpolate `ys` against `xs` at `x`.
///
/// When the bracketing abscissas coincide, the upper sample's ordinate is
/// returned verbatim rather than dividing by zero.
///
/// Requires `xs.len() == ys.len()` and at least two samples; callers validate
/// table shape at ingestion, so this panics (debug assert) rather than
/// returning a Result.
pub fn linear(xs: &[Real], ys: &[Real], x: Real) -> Real {
    debug_assert_eq!(xs.len(), ys.len());
    debug_assert!(xs.len() >= 2);

    let ascending = xs[xs.len() - 1] >= xs[0];
    let mut lo = 0usize;
    let mut hi = xs.len() - 1;
    while hi - lo > 1 {
        let mid = (hi + lo) >> 1;
        if (xs[mid] > x) == ascending {
            hi = mid;
        } else {
            lo = mid;
        }
    }
    if xs[hi] == xs[lo] {
        return ys[hi];
    }
    ys[lo] + (x - xs[lo]) / (xs[hi] - xs[lo]) * (ys[hi] - ys[lo])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exact_at_samples() {
        let xs = [0.0, 1.0, 2.0, 4.0];
        let ys = [1.0, 3.0, 2.0, 8.0];
        for (x, y) in xs.iter().zip(ys.iter()) {
            assert_eq!(linear(&xs, &ys, *x), *y);
        }
    }

    #[test]
    fn midpoints() {
        let xs = [0.0, 2.0];
        let ys = [0.0, 10.0];
        assert_eq!(linear(&xs, &ys, 1.0), 5.0);
        assert_eq!(linear(&xs, &ys, 0.5), 2.5);
    }

    #[test]
    fn extrapolates() {
        let xs = [1.0, 2.0];
        let ys = [1.0, 2.0];
        assert_eq!(linear(&xs, &ys, 3.0), 3.0);
        assert_eq!(linear(&xs, &ys, 0.0), 0.0);
    }

    #[test]
    fn descending_table() {
        let xs = [4.0, 2.0, 1.0];
        let ys = [8.0, 4.0, 2.0];
        assert_eq!(linear(&xs, &ys, 3.0), 6.0);
        assert_eq!(linear(&xs, &ys, 1.5), 3.0);
    }

    #[test]
    fn repeated_abscissa() {
        let xs = [0.0, 1.0, 1.0, 2.0];
        let ys = [0.0, 1.0, 5.0, 6.0];
        // falls back to the upper sample instead of dividing by zero
        let v = linear(&xs, &ys, 1.0);
        assert!(v == 1.0 || v == 5.0);
    }
}
