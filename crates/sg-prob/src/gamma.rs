//! Gamma distribution utilities.

use sg_core::{Error, Result};
use statrs::distribution::{ContinuousCDF, Gamma};

/// Build a statrs Gamma from `shape` and `scale`.
///
/// Parameterization:
/// - `shape > 0`
/// - `scale > 0`
pub(crate) fn shape_scale(shape: f64, scale: f64) -> Result<Gamma> {
    if !shape.is_finite() || shape <= 0.0 {
        return Err(Error::Validation(format!(
            "shape must be finite and > 0, got {}",
            shape
        )));
    }
    if !scale.is_finite() || scale <= 0.0 {
        return Err(Error::Validation(format!(
            "scale must be finite and > 0, got {}",
            scale
        )));
    }
    Gamma::new(shape, 1.0 / scale)
        .map_err(|e| Error::Validation(format!("invalid Gamma(shape={shape}, scale={scale}): {e}")))
}

/// Quantile of `dist` at `p`, by bracketing and bisection on the CDF.
///
/// `p <= 0` maps to `0` and `p >= 1` to `+inf`. Converges to a relative width
/// of `1e-12` (or 200 halvings), which also resolves the tiny lower-tail
/// quantiles of small shapes where `ContinuousCDF::inverse_cdf` diverges.
pub(crate) fn inverse_cdf(dist: &Gamma, p: f64) -> f64 {
    if p <= 0.0 {
        return 0.0;
    }
    if p >= 1.0 {
        return f64::INFINITY;
    }
    let mut lo = 0.0_f64;
    let mut hi = 1.0_f64;
    while dist.cdf(hi) < p {
        lo = hi;
        hi *= 2.0;
    }
    for _ in 0..200 {
        if hi - lo <= 1e-12 * hi {
            break;
        }
        let mid = 0.5 * (lo + hi);
        if dist.cdf(mid) < p {
            lo = mid;
        } else {
            hi = mid;
        }
    }
    0.5 * (lo + hi)
}
