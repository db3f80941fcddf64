//! Primitive circuit elements and the series/parallel combinators.
//!
//! All functions are pure. Any value that would be infinite or undefined is
//! replaced by [`SENTINEL_IMPEDANCE`], a large but finite impedance, so that
//! pathological parameter guesses during optimization never produce NaN.

use num_complex::Complex64;
use std::f64::consts::FRAC_PI_2;

/// Finite stand-in for an open circuit or an undefined parallel combination, in ohms.
pub const SENTINEL_IMPEDANCE: f64 = 1e15;

/// Resistor: `Z = R`.
pub fn resistor(r: f64) -> Complex64 {
    finite_or_sentinel(Complex64::new(r, 0.0))
}

/// Capacitor: `Z = 1/(jωC)`.
///
/// At `ω = 0` the capacitor is an open circuit and the sentinel `-j·1e15` is returned.
pub fn capacitor(c: f64, omega: f64) -> Complex64 {
    let reactance = 1.0 / (omega * c);
    if !reactance.is_finite() || reactance.abs() > SENTINEL_IMPEDANCE {
        return Complex64::new(0.0, -SENTINEL_IMPEDANCE);
    }
    Complex64::new(0.0, -reactance)
}

/// Constant phase element: `Z = 1/(Q·(jω)^α)`.
///
/// Evaluated in polar form, `|Z| = 1/(Q·ω^α)` with phase `-απ/2`, so `α = 1`
/// reproduces the capacitor exactly.
pub fn cpe(q: f64, alpha: f64, omega: f64) -> Complex64 {
    let modulus = 1.0 / (q * omega.powf(alpha));
    if !modulus.is_finite() || modulus.abs() > SENTINEL_IMPEDANCE {
        return Complex64::from_polar(SENTINEL_IMPEDANCE, -alpha * FRAC_PI_2);
    }
    finite_or_sentinel(Complex64::from_polar(modulus, -alpha * FRAC_PI_2))
}

/// Semi-infinite Warburg diffusion element: `Z = σ·(1 − j)/√ω`.
pub fn warburg(sigma: f64, omega: f64) -> Complex64 {
    let magnitude = sigma / omega.sqrt();
    if !magnitude.is_finite() || magnitude.abs() > SENTINEL_IMPEDANCE {
        return Complex64::new(SENTINEL_IMPEDANCE, -SENTINEL_IMPEDANCE);
    }
    Complex64::new(magnitude, -magnitude)
}

/// Series combination: `Z = Z1 + Z2`.
pub fn series(z1: Complex64, z2: Complex64) -> Complex64 {
    finite_or_sentinel(z1 + z2)
}

/// Parallel combination: `Z = Z1·Z2/(Z1 + Z2)`.
///
/// When `Z1 + Z2` vanishes numerically the real sentinel impedance is returned
/// instead of dividing by (nearly) zero.
pub fn parallel(z1: Complex64, z2: Complex64) -> Complex64 {
    let sum = z1 + z2;
    let scale = z1.norm() + z2.norm();
    if sum.norm() == 0.0 || sum.norm() <= f64::EPSILON * scale {
        return Complex64::new(SENTINEL_IMPEDANCE, 0.0);
    }
    finite_or_sentinel(z1 * z2 / sum)
}

fn finite_or_sentinel(z: Complex64) -> Complex64 {
    if z.re.is_finite() && z.im.is_finite() {
        z
    } else {
        let im = if z.im < 0.0 { -SENTINEL_IMPEDANCE } else { 0.0 };
        Complex64::new(SENTINEL_IMPEDANCE, im)
    }
}
