//! Impedance model library.
//!
//! This module maps `(model, parameters, ω)` to a complex impedance for each of
//! the fixed equivalent-circuit topologies. Everything here is a pure function
//! and safe to call concurrently from any number of fits.

pub mod elements;
pub mod models;

pub use elements::{capacitor, cpe, parallel, resistor, series, warburg, SENTINEL_IMPEDANCE};
pub use models::{impedance, predicted_curve, CircuitModel, Node};
