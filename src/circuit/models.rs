//! The fixed library of equivalent-circuit models.
//!
//! Each [`CircuitModel`] variant carries an ordered parameter schema and a
//! static composition tree of [`Node`]s. Impedance is computed by walking the
//! tree with the shared element functions and combinators from
//! [`elements`](super::elements), so no model duplicates impedance math.

use super::elements::{capacitor, cpe, parallel, resistor, series, warburg};
use Node::{Capacitor, Cpe, Parallel, Resistor, Series, Warburg};
use crate::error::{EisError, Result};
use crate::parameters::{Bounds, ParameterSpec};
use num_complex::Complex64;
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;
use std::fmt;
use std::str::FromStr;

/// A node of a circuit composition tree. Element nodes hold indices into the
/// model's parameter vector.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Node {
    /// Resistor with parameter index
    Resistor(usize),
    /// Capacitor with parameter index
    Capacitor(usize),
    /// Constant phase element with (Q, α) parameter indices
    Cpe(usize, usize),
    /// Warburg element with parameter index
    Warburg(usize),
    /// Sub-circuits connected in series
    Series(&'static [Node]),
    /// Sub-circuits connected in parallel
    Parallel(&'static [Node]),
}

impl Node {
    /// Evaluate the impedance of this sub-circuit at angular frequency `omega`.
    ///
    /// `params` must hold every index the tree refers to; the public entry
    /// points check the length against the model schema first.
    pub(crate) fn impedance(&self, params: &[f64], omega: f64) -> Complex64 {
        match *self {
            Node::Resistor(i) => resistor(params[i]),
            Node::Capacitor(i) => capacitor(params[i], omega),
            Node::Cpe(q, a) => cpe(params[q], params[a], omega),
            Node::Warburg(i) => warburg(params[i], omega),
            Node::Series(children) => children
                .iter()
                .map(|child| child.impedance(params, omega))
                .reduce(series)
                .unwrap_or_default(),
            Node::Parallel(children) => children
                .iter()
                .map(|child| child.impedance(params, omega))
                .reduce(parallel)
                .unwrap_or_default(),
        }
    }
}

const R: [ParameterSpec; 1] = [ParameterSpec::resistance("R", 100.0)];

const RC: [ParameterSpec; 2] = [
    ParameterSpec::resistance("R", 100.0),
    ParameterSpec::capacitance("C", 1e-5),
];

const RANDLES: [ParameterSpec; 3] = [
    ParameterSpec::resistance("Rs", 10.0),
    ParameterSpec::resistance("Rct", 100.0),
    ParameterSpec::capacitance("Cdl", 1e-5),
];

const RANDLES_WARBURG: [ParameterSpec; 4] = [
    ParameterSpec::resistance("Rs", 10.0),
    ParameterSpec::resistance("Rct", 100.0),
    ParameterSpec::capacitance("Cdl", 1e-5),
    ParameterSpec::warburg("sigma", 10.0),
];

const RANDLES_2RC: [ParameterSpec; 5] = [
    ParameterSpec::resistance("Rs", 10.0),
    ParameterSpec::resistance("R1", 50.0),
    ParameterSpec::capacitance("C1", 1e-6),
    ParameterSpec::resistance("R2", 100.0),
    ParameterSpec::capacitance("C2", 1e-4),
];

const RANDLES_3RC: [ParameterSpec; 7] = [
    ParameterSpec::resistance("Rs", 10.0),
    ParameterSpec::resistance("R1", 30.0),
    ParameterSpec::capacitance("C1", 1e-7),
    ParameterSpec::resistance("R2", 60.0),
    ParameterSpec::capacitance("C2", 1e-5),
    ParameterSpec::resistance("R3", 100.0),
    ParameterSpec::capacitance("C3", 1e-3),
];

const RANDLES_CPE: [ParameterSpec; 4] = [
    ParameterSpec::resistance("Rs", 10.0),
    ParameterSpec::resistance("Rct", 100.0),
    ParameterSpec::cpe_magnitude("Q", 1e-5),
    ParameterSpec::cpe_exponent("alpha", 0.9),
];

const RANDLES_2CPE: [ParameterSpec; 7] = [
    ParameterSpec::resistance("Rs", 10.0),
    ParameterSpec::resistance("R1", 50.0),
    ParameterSpec::cpe_magnitude("Q1", 1e-6),
    ParameterSpec::cpe_exponent("alpha1", 0.9),
    ParameterSpec::resistance("R2", 100.0),
    ParameterSpec::cpe_magnitude("Q2", 1e-4),
    ParameterSpec::cpe_exponent("alpha2", 0.9),
];

const RANDLES_CPE_PARALLEL: [ParameterSpec; 5] = [
    ParameterSpec::resistance("Rs", 10.0),
    ParameterSpec::resistance("Rct", 100.0),
    ParameterSpec::cpe_magnitude("Q", 1e-5),
    ParameterSpec::cpe_exponent("alpha", 0.9),
    ParameterSpec::warburg("sigma", 10.0),
];

// Composition trees. Element indices refer to the parameter schemas above.
const R_TREE: Node = Resistor(0);
const RC_SERIES_TREE: Node = Series(&[Resistor(0), Capacitor(1)]);
const RC_PARALLEL_TREE: Node = Parallel(&[Resistor(0), Capacitor(1)]);
const RANDLES_TREE: Node = Series(&[Resistor(0), Parallel(&[Resistor(1), Capacitor(2)])]);
const RANDLES_WARBURG_TREE: Node = Series(&[
    Resistor(0),
    Parallel(&[Capacitor(2), Series(&[Resistor(1), Warburg(3)])]),
]);
const RANDLES_2RC_TREE: Node = Series(&[
    Resistor(0),
    Parallel(&[Resistor(1), Capacitor(2)]),
    Parallel(&[Resistor(3), Capacitor(4)]),
]);
const RANDLES_3RC_TREE: Node = Series(&[
    Resistor(0),
    Parallel(&[Resistor(1), Capacitor(2)]),
    Parallel(&[Resistor(3), Capacitor(4)]),
    Parallel(&[Resistor(5), Capacitor(6)]),
]);
const RANDLES_CPE_TREE: Node = Series(&[Resistor(0), Parallel(&[Resistor(1), Cpe(2, 3)])]);
const RANDLES_2CPE_TREE: Node = Series(&[
    Resistor(0),
    Parallel(&[Resistor(1), Cpe(2, 3)]),
    Parallel(&[Resistor(4), Cpe(5, 6)]),
]);
const RANDLES_CPE_PARALLEL_TREE: Node = Series(&[
    Resistor(0),
    Parallel(&[Cpe(2, 3), Series(&[Resistor(1), Warburg(4)])]),
]);

/// One equivalent-circuit topology from the fixed model library.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum CircuitModel {
    /// `R`
    #[serde(rename = "R")]
    R,
    /// `R-C`
    #[serde(rename = "R_C_series")]
    RCSeries,
    /// `R||C`
    #[serde(rename = "R_C_parallel")]
    RCParallel,
    /// `Rs-(Rct||Cdl)`
    #[serde(rename = "Randles")]
    Randles,
    /// `Rs-(Cdl||(Rct-W))`
    #[serde(rename = "Randles_Warburg")]
    RandlesWarburg,
    /// `Rs-(R1||C1)-(R2||C2)`
    #[serde(rename = "Randles_2RC")]
    Randles2RC,
    /// `Rs-(R1||C1)-(R2||C2)-(R3||C3)`
    #[serde(rename = "Randles_3RC")]
    Randles3RC,
    /// `Rs-(Rct||Q)`
    #[serde(rename = "Randles_CPE")]
    RandlesCpe,
    /// `Rs-(R1||Q1)-(R2||Q2)`
    #[serde(rename = "Randles_2CPE")]
    Randles2Cpe,
    /// `Rs-(Q||(Rct-W))`
    #[serde(rename = "Randles_CPE_parallel")]
    RandlesCpeParallel,
}

impl CircuitModel {
    /// Every model in the library, simplest first.
    pub const ALL: [CircuitModel; 10] = [
        CircuitModel::R,
        CircuitModel::RCSeries,
        CircuitModel::RCParallel,
        CircuitModel::Randles,
        CircuitModel::RandlesWarburg,
        CircuitModel::Randles2RC,
        CircuitModel::Randles3RC,
        CircuitModel::RandlesCpe,
        CircuitModel::Randles2Cpe,
        CircuitModel::RandlesCpeParallel,
    ];

    /// The model identifier, e.g. `Randles_CPE`.
    pub fn name(&self) -> &'static str {
        match self {
            CircuitModel::R => "R",
            CircuitModel::RCSeries => "R_C_series",
            CircuitModel::RCParallel => "R_C_parallel",
            CircuitModel::Randles => "Randles",
            CircuitModel::RandlesWarburg => "Randles_Warburg",
            CircuitModel::Randles2RC => "Randles_2RC",
            CircuitModel::Randles3RC => "Randles_3RC",
            CircuitModel::RandlesCpe => "Randles_CPE",
            CircuitModel::Randles2Cpe => "Randles_2CPE",
            CircuitModel::RandlesCpeParallel => "Randles_CPE_parallel",
        }
    }

    /// Circuit-string notation of the topology (`-` series, `||` parallel).
    pub fn description(&self) -> &'static str {
        match self {
            CircuitModel::R => "R",
            CircuitModel::RCSeries => "R-C",
            CircuitModel::RCParallel => "R||C",
            CircuitModel::Randles => "Rs-(Rct||Cdl)",
            CircuitModel::RandlesWarburg => "Rs-(Cdl||(Rct-W))",
            CircuitModel::Randles2RC => "Rs-(R1||C1)-(R2||C2)",
            CircuitModel::Randles3RC => "Rs-(R1||C1)-(R2||C2)-(R3||C3)",
            CircuitModel::RandlesCpe => "Rs-(Rct||Q)",
            CircuitModel::Randles2Cpe => "Rs-(R1||Q1)-(R2||Q2)",
            CircuitModel::RandlesCpeParallel => "Rs-(Q||(Rct-W))",
        }
    }

    /// Ordered parameter schema.
    pub fn parameter_specs(&self) -> &'static [ParameterSpec] {
        match self {
            CircuitModel::R => &R,
            CircuitModel::RCSeries | CircuitModel::RCParallel => &RC,
            CircuitModel::Randles => &RANDLES,
            CircuitModel::RandlesWarburg => &RANDLES_WARBURG,
            CircuitModel::Randles2RC => &RANDLES_2RC,
            CircuitModel::Randles3RC => &RANDLES_3RC,
            CircuitModel::RandlesCpe => &RANDLES_CPE,
            CircuitModel::Randles2Cpe => &RANDLES_2CPE,
            CircuitModel::RandlesCpeParallel => &RANDLES_CPE_PARALLEL,
        }
    }

    /// Static composition tree of the topology.
    pub fn circuit(&self) -> &'static Node {
        match self {
            CircuitModel::R => &R_TREE,
            CircuitModel::RCSeries => &RC_SERIES_TREE,
            CircuitModel::RCParallel => &RC_PARALLEL_TREE,
            CircuitModel::Randles => &RANDLES_TREE,
            CircuitModel::RandlesWarburg => &RANDLES_WARBURG_TREE,
            CircuitModel::Randles2RC => &RANDLES_2RC_TREE,
            CircuitModel::Randles3RC => &RANDLES_3RC_TREE,
            CircuitModel::RandlesCpe => &RANDLES_CPE_TREE,
            CircuitModel::Randles2Cpe => &RANDLES_2CPE_TREE,
            CircuitModel::RandlesCpeParallel => &RANDLES_CPE_PARALLEL_TREE,
        }
    }

    /// Parameter names in schema order.
    pub fn parameter_names(&self) -> Vec<&'static str> {
        self.parameter_specs().iter().map(|s| s.name).collect()
    }

    /// Number of free parameters.
    pub fn parameter_count(&self) -> usize {
        self.parameter_specs().len()
    }

    /// Fallback parameter values.
    pub fn default_parameters(&self) -> Vec<f64> {
        self.parameter_specs().iter().map(|s| s.default).collect()
    }

    /// Valid domain of every parameter, in schema order.
    pub fn default_bounds(&self) -> Vec<Bounds> {
        self.parameter_specs().iter().map(|s| s.bounds).collect()
    }

    /// Position of a parameter by name.
    pub fn parameter_index(&self, name: &str) -> Option<usize> {
        self.parameter_specs().iter().position(|s| s.name == name)
    }

    /// Impedance at angular frequency `omega` (rad/s).
    pub fn impedance(&self, params: &[f64], omega: f64) -> Result<Complex64> {
        self.check_parameters(params)?;
        Ok(self.circuit().impedance(params, omega))
    }

    pub(crate) fn check_parameters(&self, params: &[f64]) -> Result<()> {
        if params.len() != self.parameter_count() {
            return Err(EisError::DimensionMismatch(format!(
                "{} expects {} parameters, got {}",
                self.name(),
                self.parameter_count(),
                params.len()
            )));
        }
        Ok(())
    }
}

impl fmt::Display for CircuitModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for CircuitModel {
    type Err = EisError;

    fn from_str(s: &str) -> Result<Self> {
        CircuitModel::ALL
            .iter()
            .find(|m| m.name().eq_ignore_ascii_case(s.trim()))
            .copied()
            .ok_or_else(|| EisError::UnknownModel(s.to_string()))
    }
}

/// Impedance of `model` at angular frequency `omega` (rad/s).
pub fn impedance(model: CircuitModel, params: &[f64], omega: f64) -> Result<Complex64> {
    model.impedance(params, omega)
}

/// Model impedance evaluated at each frequency in hertz, in the given order.
///
/// Used for Nyquist and Bode overlays of a fitted curve.
pub fn predicted_curve(
    model: CircuitModel,
    params: &[f64],
    frequencies_hz: &[f64],
) -> Result<Vec<Complex64>> {
    model.check_parameters(params)?;
    let circuit = model.circuit();
    Ok(frequencies_hz
        .iter()
        .map(|f| circuit.impedance(params, 2.0 * PI * f))
        .collect())
}
