//! Damping control for the Levenberg-Marquardt algorithm.
//!
//! This module adapts the damping parameter λ based on the agreement between
//! predicted and actual reduction in cost.

use super::config::LmConfig;

/// Damping controller for the Levenberg-Marquardt algorithm.
#[derive(Debug, Clone)]
pub struct TrustRegion {
    /// Current value of the damping parameter
    pub lambda: f64,

    /// Minimum allowed value for the damping parameter
    pub lambda_min: f64,

    /// Value above which the search gives up
    pub lambda_max: f64,

    /// Factor to increase lambda by when a step is rejected
    pub lambda_increase_factor: f64,

    /// Factor to decrease lambda by after a very good step
    pub lambda_decrease_factor: f64,

    /// Minimum gain ratio required to accept a step
    pub min_gain_ratio: f64,

    /// Gain ratio above which lambda is decreased
    pub good_gain_ratio: f64,

    /// Gain ratio below which an accepted step still increases lambda
    pub poor_gain_ratio: f64,

    /// Factor applied to lambda after an accepted but poor step
    pub poor_gain_factor: f64,
}

impl Default for TrustRegion {
    fn default() -> Self {
        Self {
            lambda: 1e-3,
            lambda_min: 1e-12,
            lambda_max: 1e12,
            lambda_increase_factor: 10.0,
            lambda_decrease_factor: 0.1,
            min_gain_ratio: 1e-4,
            good_gain_ratio: 0.75,
            poor_gain_ratio: 0.25,
            poor_gain_factor: 2.0,
        }
    }
}

impl TrustRegion {
    /// Creates a new TrustRegion with default parameters.
    pub fn new() -> Self {
        Default::default()
    }

    /// Creates a TrustRegion from the damping settings of a configuration.
    pub fn from_config(config: &LmConfig) -> Self {
        Self {
            lambda: config.initial_lambda,
            lambda_min: config.min_lambda,
            lambda_max: config.max_lambda,
            lambda_increase_factor: config.lambda_up_factor,
            lambda_decrease_factor: config.lambda_down_factor,
            ..Default::default()
        }
    }

    /// Returns true if the gain ratio is high enough to accept the step.
    pub fn accepts(&self, gain_ratio: f64) -> bool {
        gain_ratio > self.min_gain_ratio
    }

    /// Updates the damping parameter based on the gain ratio.
    ///
    /// Returns whether the step is accepted.
    pub fn update_lambda(&mut self, gain_ratio: f64) -> bool {
        if self.accepts(gain_ratio) {
            if gain_ratio > self.good_gain_ratio {
                self.lambda = (self.lambda * self.lambda_decrease_factor).max(self.lambda_min);
            } else if gain_ratio < self.poor_gain_ratio {
                self.lambda *= self.poor_gain_factor;
            }
            true
        } else {
            self.reject();
            false
        }
    }

    /// Increases lambda after a rejected or unsolvable step.
    pub fn reject(&mut self) {
        self.lambda *= self.lambda_increase_factor;
    }

    /// Returns true once lambda has grown past its ceiling.
    pub fn is_exhausted(&self) -> bool {
        self.lambda > self.lambda_max
    }

    /// Calculates the gain ratio between actual and predicted reduction.
    ///
    /// A non-positive predicted reduction yields `-1`, which always rejects.
    ///
    /// # Arguments
    ///
    /// * `current_cost` - The current cost function value
    /// * `new_cost` - The new cost function value after the step
    /// * `predicted_reduction` - The predicted reduction in cost
    pub fn gain_ratio(current_cost: f64, new_cost: f64, predicted_reduction: f64) -> f64 {
        if predicted_reduction > 0.0 {
            (current_cost - new_cost) / predicted_reduction
        } else {
            -1.0
        }
    }
}
