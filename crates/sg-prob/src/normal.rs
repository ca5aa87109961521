//! Normal distribution utilities.

use statrs::function::erf::erfc;

/// CDF of the standard normal `N(0, 1)` at `x`.
///
/// `Φ(x) = 0.5 * erfc(-x / sqrt(2))`, accurate in both tails.
pub fn standard_cdf(x: f64) -> f64 {
    0.5 * erfc(-x / std::f64::consts::SQRT_2)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_standard_at_zero() {
        assert_relative_eq!(standard_cdf(0.0), 0.5, epsilon = 1e-15);
    }

    #[test]
    fn test_symmetry() {
        let lo = standard_cdf(-1.3);
        let hi = standard_cdf(1.3);
        assert_relative_eq!(lo + hi, 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_matches_statrs() {
        use statrs::distribution::{ContinuousCDF, Normal};
        let n = Normal::new(1.5, 2.0).unwrap();
        for &x in &[-4.0, -0.3, 1.5, 2.7, 9.0] {
            assert_relative_eq!(standard_cdf((x - 1.5) / 2.0), n.cdf(x), epsilon = 1e-12);
        }
    }
}
