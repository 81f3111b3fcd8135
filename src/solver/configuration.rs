//! Run parameters and simulation results
//!
//! # Design
//!
//! [`SimulationConfiguration`] is the HOW of a run: time step, horizon,
//! scheme and the knobs around them. It is independent of the grid and
//! velocity (the [`Scenario`](crate::solver::Scenario)), so the same
//! scenario can be stepped with different schemes or time steps.
//!
//! [`SimulationResult`] is what comes back from
//! [`Simulator::run_to_completion`](crate::solver::Simulator::run_to_completion).

use std::collections::HashMap;

use nalgebra::DVector;

use crate::error::{ConfigResult, ConfigurationError};
use crate::solver::{Scheme, StabilityVerdict};

/// Consecutive clamped steps before a saturation warning is logged
pub const DEFAULT_SATURATION_WARNING_STEPS: usize = 10;

// =================================================================================================
// Simulation configuration
// =================================================================================================

/// Numerical parameters of a run
///
/// # Example
///
/// ```rust
/// use plume_rs::solver::{Scheme, SimulationConfiguration};
///
/// let config = SimulationConfiguration::new(0.25 / 1.8, 8.0)
///     .with_start_time(1.0)
///     .with_scheme(Scheme::Upwind)
///     .with_ceiling(25_228_800.0);
///
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct SimulationConfiguration {
    /// Time step
    pub dt: f64,

    /// Horizon: stepping stops once the clock reaches it
    pub total_time: f64,

    /// Clock value before the first step
    pub start_time: f64,

    /// Diffusion coefficient, 0 disables diffusion
    pub diffusivity: f64,

    /// Stencil used to build the operator
    pub scheme: Scheme,

    /// Upper bound enforced on every node after each step
    ///
    /// A tunable safety valve, not a physical law. `None` disables it.
    pub ceiling: Option<f64>,

    /// Store a snapshot of the field every `k` steps
    pub record_every: Option<usize>,

    /// Consecutive clamped steps before a warning is logged
    pub saturation_warning_steps: usize,
}

impl SimulationConfiguration {
    /// Upwind run from `t = 0` to `total_time` with no ceiling
    pub fn new(dt: f64, total_time: f64) -> Self {
        Self {
            dt,
            total_time,
            start_time: 0.0,
            diffusivity: 0.0,
            scheme: Scheme::Upwind,
            ceiling: None,
            record_every: None,
            saturation_warning_steps: DEFAULT_SATURATION_WARNING_STEPS,
        }
    }

    pub fn with_start_time(mut self, start_time: f64) -> Self {
        self.start_time = start_time;
        self
    }

    pub fn with_diffusivity(mut self, diffusivity: f64) -> Self {
        self.diffusivity = diffusivity;
        self
    }

    pub fn with_scheme(mut self, scheme: Scheme) -> Self {
        self.scheme = scheme;
        self
    }

    pub fn with_ceiling(mut self, ceiling: f64) -> Self {
        self.ceiling = Some(ceiling);
        self
    }

    pub fn with_record_every(mut self, steps: usize) -> Self {
        self.record_every = Some(steps);
        self
    }

    pub fn with_saturation_warning_steps(mut self, steps: usize) -> Self {
        self.saturation_warning_steps = steps;
        self
    }

    /// Number of steps the clock condition will take
    ///
    /// The last step may overshoot `total_time` by less than one `dt`.
    pub fn expected_steps(&self) -> usize {
        let mut steps = ((self.total_time - self.start_time) / self.dt).ceil().max(0.0) as usize;
        // Rounding in the division can land one step short or long
        while self.time_after(steps) < self.total_time {
            steps += 1;
        }
        while steps > 0 && self.time_after(steps - 1) >= self.total_time {
            steps -= 1;
        }
        steps
    }

    /// Clock value after `steps` steps
    #[inline]
    pub fn time_after(&self, steps: usize) -> f64 {
        self.start_time + steps as f64 * self.dt
    }

    /// Check that parameters are meaningful
    pub fn validate(&self) -> ConfigResult<()> {
        for (name, value) in [
            ("dt", self.dt),
            ("total_time", self.total_time),
            ("start_time", self.start_time),
            ("diffusivity", self.diffusivity),
        ] {
            if !value.is_finite() {
                return Err(ConfigurationError::NonFinite { name, value });
            }
        }

        if self.dt <= 0.0 {
            return Err(ConfigurationError::NonPositiveTimeStep(self.dt));
        }

        if self.total_time <= 0.0 || self.total_time <= self.start_time {
            return Err(ConfigurationError::InvalidHorizon {
                start_time: self.start_time,
                total_time: self.total_time,
            });
        }

        if self.diffusivity < 0.0 {
            return Err(ConfigurationError::NegativeDiffusivity(self.diffusivity));
        }

        if let Some(ceiling) = self.ceiling
            && (ceiling.is_nan() || ceiling <= 0.0)
        {
            return Err(ConfigurationError::InvalidCeiling(ceiling));
        }

        if self.record_every == Some(0) {
            return Err(ConfigurationError::ZeroRecordInterval);
        }

        Ok(())
    }
}

// =================================================================================================
// Simulation result
// =================================================================================================

/// Outcome of a completed run
#[derive(Debug, Clone)]
pub struct SimulationResult {
    /// Field after the last step
    pub final_field: DVector<f64>,

    /// Clock after the last step (may overshoot the horizon by < dt)
    pub final_time: f64,

    /// Steps taken
    pub steps: usize,

    /// Times at which snapshots were recorded
    pub time_points: Vec<f64>,

    /// Recorded fields, parallel to `time_points`
    pub snapshots: Vec<DVector<f64>>,

    /// `(time, reference value)` pairs sampled once per step
    pub reference_samples: Vec<(f64, f64)>,

    /// Total node updates altered by the ceiling
    pub clamp_events: usize,

    /// Longest run of consecutive steps in which the ceiling fired
    pub longest_clamped_run: usize,

    /// Every node of the final field sits at the ceiling
    pub saturated: bool,

    /// Stability verdict computed at configuration time
    pub verdict: StabilityVerdict,

    /// Free-form run description (scheme, dt, ...)
    pub metadata: HashMap<String, String>,
}

impl SimulationResult {
    /// Number of recorded snapshots
    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    pub fn get_metadata(&self, key: &str) -> Option<&str> {
        self.metadata.get(key).map(String::as_str)
    }

    /// Total contaminant on the grid, `Σ C_i · dx`
    pub fn total_mass(&self, dx: f64) -> f64 {
        self.final_field.sum() * dx
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = SimulationConfiguration::new(1.0, 3.0);
        assert_eq!(config.start_time, 0.0);
        assert_eq!(config.diffusivity, 0.0);
        assert_eq!(config.scheme, Scheme::Upwind);
        assert_eq!(config.ceiling, None);
        assert_eq!(config.saturation_warning_steps, DEFAULT_SATURATION_WARNING_STEPS);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_expected_steps_overshoots_by_less_than_dt() {
        assert_eq!(SimulationConfiguration::new(1.0, 3.0).expected_steps(), 3);
        assert_eq!(SimulationConfiguration::new(1.0, 3.5).expected_steps(), 4);

        let config = SimulationConfiguration::new(0.25 / 1.8, 8.0).with_start_time(1.0);
        let steps = config.expected_steps();
        assert!(config.time_after(steps) >= 8.0);
        assert!(config.time_after(steps - 1) < 8.0);
    }

    #[test]
    fn test_validation_failures() {
        assert_eq!(
            SimulationConfiguration::new(0.0, 1.0).validate(),
            Err(ConfigurationError::NonPositiveTimeStep(0.0))
        );
        assert!(matches!(
            SimulationConfiguration::new(1.0, -1.0).validate(),
            Err(ConfigurationError::InvalidHorizon { .. })
        ));
        assert!(matches!(
            SimulationConfiguration::new(1.0, 5.0).with_start_time(5.0).validate(),
            Err(ConfigurationError::InvalidHorizon { .. })
        ));
        assert_eq!(
            SimulationConfiguration::new(1.0, 5.0).with_ceiling(0.0).validate(),
            Err(ConfigurationError::InvalidCeiling(0.0))
        );
        assert_eq!(
            SimulationConfiguration::new(1.0, 5.0).with_diffusivity(-1.0).validate(),
            Err(ConfigurationError::NegativeDiffusivity(-1.0))
        );
        assert_eq!(
            SimulationConfiguration::new(1.0, 5.0).with_record_every(0).validate(),
            Err(ConfigurationError::ZeroRecordInterval)
        );
        assert!(matches!(
            SimulationConfiguration::new(f64::NAN, 5.0).validate(),
            Err(ConfigurationError::NonFinite { name: "dt", .. })
        ));
    }
}
