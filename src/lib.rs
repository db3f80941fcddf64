//! # eisfit-rs
//!
//! `eisfit-rs` fits equivalent-circuit models to electrochemical impedance
//! spectra and ranks candidate circuits automatically.
//!
//! The library provides:
//! - A fixed library of circuit models (`R`, `Randles`, `Randles_CPE`, ...)
//!   built from shared element functions and series/parallel combinators
//! - A bounded Levenberg-Marquardt optimizer behind a narrow [`Minimizer`] trait
//! - Goodness-of-fit statistics (chi-squared, R², residuals) and parameter
//!   standard errors from the covariance at the solution
//! - Auto-fit over many models with a deterministic ranking policy
//! - A [`Session`] context object and JSON/CSV export for host applications
//!
//! ## Basic Usage
//!
//! ```no_run
//! use eisfit_rs::{autofit, CircuitModel, FitOptions, Observation, Spectrum};
//!
//! let spectrum = Spectrum::new(vec![
//!     Observation::new(1000.0, 50.0, 0.0),
//!     Observation::new(100.0, 55.0, -20.0),
//!     Observation::new(10.0, 60.0, -40.0),
//!     Observation::new(1.0, 65.0, -15.0),
//! ])?;
//!
//! let ranked = autofit(&spectrum, &CircuitModel::ALL, None, &FitOptions::default())?;
//! if let Some(best) = ranked[0].fit() {
//!     println!("{}", best);
//! }
//! # Ok::<(), eisfit_rs::EisError>(())
//! ```

pub mod circuit;
pub mod error;
pub mod export;
pub mod fit;
pub mod lm;
pub mod parameters;
pub mod problem;
pub mod selector;
pub mod session;
pub mod spectrum;
pub mod uncertainty;
pub mod utils;

// Re-exports for convenience
pub use circuit::{impedance, predicted_curve, CircuitModel};
pub use error::{EisError, Result};
pub use fit::{
    evaluate, fit_one, fit_with, FitOptions, FitResult, FittedParameter, Residual, Weighting,
};
pub use lm::{LevenbergMarquardt, LmConfig, Minimizer};
pub use parameters::{Adjustment, Bounds, ParameterSpec};
pub use problem::Problem;
pub use selector::{autofit, FitFailure, ModelOutcome};
pub use session::Session;
pub use spectrum::{DataWarning, FrequencyFilter, InputFormat, Observation, PhaseUnit, Spectrum};

/// Version of the library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
