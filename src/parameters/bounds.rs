//! Parameter bounds implementation
//!
//! This module provides the physical-domain bounds of circuit parameters and the
//! Minuit-style transformations that let the optimizer work on unconstrained
//! internal values while every external value stays inside its domain.
//!
//! Resistances, capacitances, CPE magnitudes and Warburg coefficients have an
//! open lower bound at zero and no upper bound, and their values span many
//! decades. They are mapped logarithmically (`x = min + exp(u)`), which keeps the
//! optimizer steps on a relative scale. Finite intervals such as the CPE exponent
//! use the sine mapping.

use std::fmt;
use thiserror::Error;

/// Largest magnitude of an internal log-mapped value; keeps `exp(u)` finite and non-zero.
const MAX_LOG_INTERNAL: f64 = 700.0;

/// Distance from an excluded minimum, relative to the interval width, of the
/// lowest value a finite interval accepts after clamping.
const INTERIOR_FRACTION: f64 = 1e-6;

/// Absolute floor of that distance on a half-line starting at zero.
const INTERIOR_FLOOR: f64 = 1e-12;

/// Errors that can occur when mapping a value into internal coordinates
#[derive(Error, Debug, Clone, PartialEq)]
pub enum BoundsError {
    #[error("Parameter value {value} is outside its domain {bounds}")]
    OutsideDomain { value: f64, bounds: Bounds },

    #[error("Parameter value {0} is not finite")]
    NotFinite(f64),
}

/// The valid domain of a circuit parameter.
///
/// `min` is always finite. `max` is either finite (an interval, sine mapped) or
/// `+∞` (a half-line, log mapped). The minimum is excluded when `exclusive_min`
/// is set; the maximum is always included.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    /// Lower edge of the domain
    pub min: f64,

    /// Upper edge of the domain, `+∞` for a half-line
    pub max: f64,

    /// Whether `min` itself is excluded from the domain
    pub exclusive_min: bool,
}

impl Bounds {
    /// The open positive half-line `(0, ∞)` used for resistances, capacitances,
    /// CPE magnitudes and Warburg coefficients.
    pub const fn positive() -> Self {
        Self {
            min: 0.0,
            max: f64::INFINITY,
            exclusive_min: true,
        }
    }

    /// The half-open unit interval `(0, 1]` used for CPE exponents.
    pub const fn unit_exponent() -> Self {
        Self {
            min: 0.0,
            max: 1.0,
            exclusive_min: true,
        }
    }

    /// Check if a value is within the bounds
    pub fn is_within_bounds(&self, value: f64) -> bool {
        let above_min = if self.exclusive_min {
            value > self.min
        } else {
            value >= self.min
        };
        above_min && value <= self.max
    }

    /// Returns true for a finite interval, false for a half-line.
    pub fn is_interval(&self) -> bool {
        self.max.is_finite()
    }

    /// Clamp a value to the nearest value inside the domain.
    ///
    /// An excluded minimum is replaced by a point just above it: a millionth of
    /// the interval width for intervals, otherwise a relative offset of `1e-6`
    /// with an absolute floor of `1e-12`. NaN maps to that same point.
    pub fn clamp(&self, value: f64) -> f64 {
        if value.is_nan() {
            return self.lowest_valid();
        }
        let clamped = value.max(self.min).min(self.max);
        if self.exclusive_min && clamped <= self.min {
            self.lowest_valid()
        } else {
            clamped
        }
    }

    fn lowest_valid(&self) -> f64 {
        if !self.exclusive_min {
            return self.min;
        }
        let offset = if self.is_interval() {
            (self.max - self.min) * INTERIOR_FRACTION
        } else {
            (self.min.abs() * INTERIOR_FRACTION).max(INTERIOR_FLOOR)
        };
        (self.min + offset).min(self.max)
    }
}

impl fmt::Display for Bounds {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let open = if self.exclusive_min { '(' } else { '[' };
        if self.is_interval() {
            write!(f, "{}{}, {}]", open, self.min, self.max)
        } else {
            write!(f, "{}{}, inf)", open, self.min)
        }
    }
}

/// Maps between a parameter's domain and the unconstrained internal line the
/// optimizer iterates on.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundsTransform {
    bounds: Bounds,
}

impl BoundsTransform {
    /// Create a new bounds transform
    pub fn new(bounds: Bounds) -> Self {
        Self { bounds }
    }

    /// The bounds this transform maps onto.
    pub fn bounds(&self) -> &Bounds {
        &self.bounds
    }

    /// Internal to external value. Every internal value, including the points
    /// where the sine touches an excluded minimum, lands inside the domain.
    pub fn to_external(&self, internal_value: f64) -> f64 {
        let Bounds { min, max, .. } = self.bounds;
        let external = if self.bounds.is_interval() {
            min + (internal_value.sin() + 1.0) * (max - min) / 2.0
        } else {
            min + internal_value.clamp(-MAX_LOG_INTERNAL, MAX_LOG_INTERNAL).exp()
        };
        self.bounds.clamp(external)
    }

    /// External to internal value.
    ///
    /// Returns an error if the external value is not finite or lies outside
    /// the domain. A half-line value sitting exactly on an included minimum has
    /// no internal representation and is rejected too; clamp it first.
    pub fn to_internal(&self, external_value: f64) -> Result<f64, BoundsError> {
        if !external_value.is_finite() {
            return Err(BoundsError::NotFinite(external_value));
        }

        let outside = BoundsError::OutsideDomain {
            value: external_value,
            bounds: self.bounds,
        };
        if !self.bounds.is_within_bounds(external_value) {
            return Err(outside);
        }

        let Bounds { min, max, .. } = self.bounds;
        if self.bounds.is_interval() {
            let width = max - min;
            if width == 0.0 {
                return Ok(0.0);
            }
            let scaled = 2.0 * (external_value - min) / width - 1.0;
            Ok(scaled.clamp(-1.0, 1.0).asin())
        } else {
            let offset = external_value - min;
            if offset <= 0.0 {
                return Err(outside);
            }
            Ok(offset.ln())
        }
    }
}
