//! # Parameter Schemas
//!
//! Every circuit model owns a fixed, ordered list of named parameters. Each
//! [`ParameterSpec`] records the parameter's name, physical unit, valid domain
//! and a fallback starting value used when the data offer no usable cues.
//!
//! Caller-supplied values that leave the domain are not rejected. They are
//! clamped to the nearest valid value and an [`Adjustment`] is recorded so the
//! host can tell the user what was changed.

pub mod bounds;

pub use bounds::{Bounds, BoundsError, BoundsTransform};

use serde::{Deserialize, Serialize};
use std::fmt;

/// Schema entry for one model parameter.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParameterSpec {
    /// Parameter name, e.g. `Rct`
    pub name: &'static str,

    /// Physical unit, e.g. `Ohm`
    pub unit: &'static str,

    /// Valid domain
    pub bounds: Bounds,

    /// Starting value used when heuristics cannot be applied
    pub default: f64,
}

impl ParameterSpec {
    /// A resistance in ohms, domain `(0, ∞)`.
    pub const fn resistance(name: &'static str, default: f64) -> Self {
        Self::positive(name, "Ohm", default)
    }

    /// A capacitance in farads, domain `(0, ∞)`.
    pub const fn capacitance(name: &'static str, default: f64) -> Self {
        Self::positive(name, "F", default)
    }

    /// A CPE magnitude Q in `F·s^(α-1)`, domain `(0, ∞)`.
    pub const fn cpe_magnitude(name: &'static str, default: f64) -> Self {
        Self::positive(name, "F*s^(a-1)", default)
    }

    /// A CPE exponent, domain `(0, 1]`.
    pub const fn cpe_exponent(name: &'static str, default: f64) -> Self {
        Self {
            name,
            unit: "",
            bounds: Bounds::unit_exponent(),
            default,
        }
    }

    /// A Warburg coefficient σ in `Ohm·s^-1/2`, domain `(0, ∞)`.
    pub const fn warburg(name: &'static str, default: f64) -> Self {
        Self::positive(name, "Ohm*s^-1/2", default)
    }

    const fn positive(name: &'static str, unit: &'static str, default: f64) -> Self {
        Self {
            name,
            unit,
            bounds: Bounds::positive(),
            default,
        }
    }

    /// The optimizer transform for this parameter's domain.
    pub fn transform(&self) -> BoundsTransform {
        BoundsTransform::new(self.bounds)
    }
}

/// A record of a caller-supplied value that was moved into its valid domain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Adjustment {
    /// Name of the adjusted parameter
    pub parameter: String,

    /// Value supplied by the caller
    pub requested: f64,

    /// Value actually used
    pub applied: f64,
}

impl fmt::Display for Adjustment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} = {} is outside its valid domain, clamped to {}",
            self.parameter, self.requested, self.applied
        )
    }
}

/// Clamp `values` into the domains of `specs`, returning the usable values and
/// an adjustment for every value that had to move.
pub fn clamp_to_domain(specs: &[ParameterSpec], values: &[f64]) -> (Vec<f64>, Vec<Adjustment>) {
    let mut adjustments = Vec::new();
    let clamped = specs
        .iter()
        .zip(values.iter())
        .map(|(spec, &value)| {
            if spec.bounds.is_within_bounds(value) {
                return value;
            }
            let applied = spec.bounds.clamp(value);
            adjustments.push(Adjustment {
                parameter: spec.name.to_string(),
                requested: value,
                applied,
            });
            applied
        })
        .collect();

    (clamped, adjustments)
}
