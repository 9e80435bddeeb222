//! Standard normal distribution functions.
//!
//! Generic over `T: Float` so the helpers stay usable from both `f64`
//! call sites and any future dual-number experiments.

use num_traits::Float;

/// 1 / sqrt(2 * pi)
const FRAC_1_SQRT_2PI: f64 = 0.398_942_280_401_432_7;

/// Complementary error function via the Abramowitz & Stegun 7.1.26
/// rational approximation (maximum absolute error 1.5e-7).
#[inline]
fn erfc_approx<T: Float>(x: T) -> T {
    let one = T::one();
    let two = T::from(2.0).unwrap();

    let abs_x = x.abs();

    let a1 = T::from(0.254829592).unwrap();
    let a2 = T::from(-0.284496736).unwrap();
    let a3 = T::from(1.421413741).unwrap();
    let a4 = T::from(-1.453152027).unwrap();
    let a5 = T::from(1.061405429).unwrap();
    let p = T::from(0.3275911).unwrap();

    let t = one / (one + p * abs_x);
    let poly = t * (a1 + t * (a2 + t * (a3 + t * (a4 + t * a5))));
    let erfc_abs = poly * (-abs_x * abs_x).exp();

    // erfc(-x) = 2 - erfc(x)
    if x < T::zero() {
        two - erfc_abs
    } else {
        erfc_abs
    }
}

/// Standard normal cumulative distribution function.
///
/// Φ(x) = erfc(-x / √2) / 2, accurate to about 1e-7 for all finite x.
/// The symmetry Φ(x) + Φ(-x) = 1 holds exactly, which keeps put-call
/// parity exact under this approximation.
///
/// # Examples
/// ```
/// use amopt_core::math::distributions::norm_cdf;
///
/// assert!((norm_cdf(0.0_f64) - 0.5).abs() < 1e-7);
/// assert!(norm_cdf(-4.0_f64) < 1e-4);
/// ```
#[inline]
pub fn norm_cdf<T: Float>(x: T) -> T {
    let sqrt_2 = T::from(std::f64::consts::SQRT_2).unwrap();
    let half = T::from(0.5).unwrap();
    half * erfc_approx(-x / sqrt_2)
}

/// Standard normal probability density function.
///
/// φ(x) = exp(-x² / 2) / √(2π).
///
/// # Examples
/// ```
/// use amopt_core::math::distributions::norm_pdf;
///
/// assert!((norm_pdf(0.0_f64) - 0.3989422804).abs() < 1e-9);
/// ```
#[inline]
pub fn norm_pdf<T: Float>(x: T) -> T {
    let c = T::from(FRAC_1_SQRT_2PI).unwrap();
    let half = T::from(0.5).unwrap();
    c * (-half * x * x).exp()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn cdf_reference_values() {
        // Abramowitz & Stegun table values.
        assert_relative_eq!(norm_cdf(0.0_f64), 0.5, epsilon = 1e-7);
        assert_relative_eq!(norm_cdf(1.0_f64), 0.8413447461, epsilon = 1e-6);
        assert_relative_eq!(norm_cdf(-1.0_f64), 0.1586552539, epsilon = 1e-6);
        assert_relative_eq!(norm_cdf(1.96_f64), 0.9750021049, epsilon = 1e-6);
        assert_relative_eq!(norm_cdf(-2.5_f64), 0.0062096653, epsilon = 1e-6);
    }

    #[test]
    fn cdf_symmetry_is_exact() {
        for x in [-3.7_f64, -1.2, -0.3, 0.0, 0.7, 2.9] {
            let sum = norm_cdf(x) + norm_cdf(-x);
            assert!((sum - 1.0).abs() < 1e-15, "x={}, sum={}", x, sum);
        }
    }

    #[test]
    fn cdf_is_monotone() {
        let mut prev = norm_cdf(-6.0_f64);
        let mut x = -6.0_f64;
        while x < 6.0 {
            x += 0.25;
            let cur = norm_cdf(x);
            assert!(cur >= prev);
            prev = cur;
        }
    }

    #[test]
    fn cdf_tails() {
        assert!(norm_cdf(8.0_f64) > 1.0 - 1e-9);
        assert!(norm_cdf(-8.0_f64) < 1e-9);
    }

    #[test]
    fn pdf_reference_values() {
        assert_relative_eq!(norm_pdf(0.0_f64), 0.3989422804014327, epsilon = 1e-12);
        assert_relative_eq!(norm_pdf(1.0_f64), 0.24197072451914337, epsilon = 1e-12);
        assert_relative_eq!(norm_pdf(-1.0_f64), norm_pdf(1.0_f64), epsilon = 1e-15);
    }

    #[test]
    fn works_with_f32() {
        let p: f32 = norm_cdf(0.0_f32);
        assert!((p - 0.5).abs() < 1e-5);
    }
}
