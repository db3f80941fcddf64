//! Levenberg-Marquardt algorithm implementation.
//!
//! This module provides a bounded Levenberg-Marquardt solver for nonlinear
//! least-squares problems. Parameters live in internal coordinates during the
//! iteration, which guarantees that every residual evaluation sees values
//! inside their physical domains.

pub mod algorithm;
pub mod bounded;
pub mod config;
pub mod convergence;
pub mod step;
pub mod trust_region;

// Re-export key types
pub use algorithm::{LevenbergMarquardt, LmResult, Minimizer};
pub use bounded::BoundedProblem;
pub use config::LmConfig;
pub use convergence::{ConvergenceCriteria, ConvergenceStatus};
pub use step::{LmStep, StepResult};
pub use trust_region::TrustRegion;
