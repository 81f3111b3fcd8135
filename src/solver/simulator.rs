//! Explicit time-marching engine
//!
//! # Step
//!
//! One step takes the field from `t` to `t + dt`:
//!
//! ```text
//! 1. C* = A · C                 transport + boundary rows
//! 2. C*[k] += rate_k · dt       point sources
//! 3. check C* is finite         else DivergenceError, C untouched
//! 4. C*[i] = min(C*[i], ceil)   clamp
//! 5. C = C*,  t = t₀ + (n+1)·dt
//! ```
//!
//! Stepping continues while `t < total_time`, so the final clock may
//! overshoot the horizon by less than one `dt`. The clock is recomputed
//! from the step count rather than accumulated.
//!
//! # States
//!
//! ```text
//! configure() ──► Configured ──step()──► ... ──► Terminated
//! ```
//!
//! `configure` refuses unstable runs. `configure_unchecked` skips that gate
//! and exists for diagnosing divergence.
//!
//! # Example
//!
//! ```rust
//! use plume_rs::physics::{Grid, SourceSpec, VelocityField};
//! use plume_rs::solver::{Scenario, SimulationConfiguration, Simulator};
//!
//! let grid = Grid::build(0.0, 5.0, 1.0).unwrap();
//! let scenario = Scenario::new(grid, VelocityField::uniform(0.3), SourceSpec::point(0, 10.0));
//! let config = SimulationConfiguration::new(1.0, 3.0);
//!
//! let result = Simulator::configure(&scenario, config)
//!     .and_then(|sim| sim.run_to_completion())
//!     .unwrap();
//!
//! assert_eq!(result.steps, 3);
//! assert_eq!(result.final_field[0], 30.0);
//! ```

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use nalgebra::DVector;
use tracing::{debug, info, warn};

use crate::error::{ConfigurationError, DivergenceError, StabilityError, TransportError};
use crate::solver::{
    self, OperatorBuilder, Scenario, SimulationConfiguration, SimulationResult, StabilityChecker,
    StabilityVerdict, TransportOperator,
};

/// Lifecycle of a [`Simulator`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SimulatorState {
    /// Operator built, clock below the horizon
    Configured,
    /// Clock reached the horizon
    Terminated,
}

/// Time-marching engine for one run
///
/// Owns the concentration field and the clock; borrows the scenario.
pub struct Simulator<'a> {
    scenario: &'a Scenario,
    config: SimulationConfiguration,
    operator: TransportOperator,
    verdict: StabilityVerdict,

    field: DVector<f64>,
    time: f64,
    steps: usize,
    state: SimulatorState,

    clamp_events: usize,
    clamped_run: usize,
    longest_clamped_run: usize,
    saturation_warned: bool,

    time_points: Vec<f64>,
    snapshots: Vec<DVector<f64>>,
    reference_samples: Vec<(f64, f64)>,

    cancel: Option<Arc<AtomicBool>>,
}

impl<'a> Simulator<'a> {
    /// Validate, check stability and build the operator
    ///
    /// # Errors
    ///
    /// - [`TransportError::Configuration`] for invalid inputs
    /// - [`TransportError::Stability`] if the verdict is unstable
    pub fn configure(
        scenario: &'a Scenario,
        config: SimulationConfiguration,
    ) -> Result<Self, TransportError> {
        let simulator = Self::assemble(scenario, config)?;
        if !simulator.verdict.stable {
            return Err(StabilityError {
                verdict: simulator.verdict,
            }
            .into());
        }
        Ok(simulator)
    }

    /// Like [`configure`](Self::configure) but runs even when unstable
    ///
    /// Configuration errors are still reported. Meant for reproducing
    /// divergence, not for production runs.
    pub fn configure_unchecked(
        scenario: &'a Scenario,
        config: SimulationConfiguration,
    ) -> Result<Self, TransportError> {
        let simulator = Self::assemble(scenario, config)?;
        if !simulator.verdict.stable {
            warn!(verdict = %simulator.verdict, "running an unstable configuration");
        }
        Ok(simulator)
    }

    fn assemble(
        scenario: &'a Scenario,
        config: SimulationConfiguration,
    ) -> Result<Self, TransportError> {
        config.validate()?;
        scenario.validate()?;

        let operator = OperatorBuilder::new(config.scheme).build(
            &scenario.grid,
            &scenario.velocity,
            config.diffusivity,
            config.dt,
        )?;

        let verdict = StabilityChecker::check(
            config.dt,
            &scenario.grid,
            &scenario.velocity,
            config.diffusivity,
        );

        let field = scenario.initial_field()?;
        if let Some(ceiling) = config.ceiling
            && let Some((node, value)) = field
                .iter()
                .enumerate()
                .find(|(_, v)| **v > ceiling)
                .map(|(node, v)| (node, *v))
        {
            return Err(ConfigurationError::InitialAboveCeiling { node, value, ceiling }.into());
        }
        let time = config.start_time;

        let mut time_points = Vec::new();
        let mut snapshots = Vec::new();
        if let Some(every) = config.record_every {
            let capacity = config.expected_steps() / every + 2;
            time_points.reserve(capacity);
            snapshots.reserve(capacity);
        }
        time_points.push(time);
        snapshots.push(field.clone());

        Ok(Self {
            scenario,
            config,
            operator,
            verdict,
            field,
            time,
            steps: 0,
            state: SimulatorState::Configured,
            clamp_events: 0,
            clamped_run: 0,
            longest_clamped_run: 0,
            saturation_warned: false,
            time_points,
            snapshots,
            reference_samples: Vec::new(),
            cancel: None,
        })
    }

    /// Check `token` once per step and stop with
    /// [`TransportError::Cancelled`] when it is set
    pub fn with_cancellation(mut self, token: Arc<AtomicBool>) -> Self {
        self.cancel = Some(token);
        self
    }

    // ========================================= Accessors =========================================

    /// Verdict computed at configuration time
    pub fn stability_report(&self) -> &StabilityVerdict {
        &self.verdict
    }

    pub fn operator(&self) -> &TransportOperator {
        &self.operator
    }

    pub fn field(&self) -> &DVector<f64> {
        &self.field
    }

    pub fn time(&self) -> f64 {
        self.time
    }

    pub fn steps(&self) -> usize {
        self.steps
    }

    pub fn state(&self) -> SimulatorState {
        self.state
    }

    pub fn config(&self) -> &SimulationConfiguration {
        &self.config
    }

    // ========================================= Stepping ==========================================

    /// Advance the field by one time step
    ///
    /// A no-op once the simulator is terminated.
    ///
    /// # Errors
    ///
    /// - [`TransportError::Divergence`] if the new field holds a non-finite
    ///   value or one above the ceiling; the field and clock are left at
    ///   their last valid values
    /// - [`TransportError::Cancelled`] if the cancellation token is set
    pub fn step(&mut self) -> Result<SimulatorState, TransportError> {
        if self.state == SimulatorState::Terminated {
            return Ok(self.state);
        }

        let step = self.steps + 1;

        if let Some(token) = &self.cancel
            && token.load(Ordering::Relaxed)
        {
            return Err(TransportError::Cancelled { step });
        }

        let dt = self.config.dt;

        // ====== Transport ======

        let mut next = self.operator.apply(&self.field);

        // ====== Forcing ======

        for (node, rate) in self.scenario.source.iter() {
            next[node] += rate * dt;
        }

        // ====== Integrity ======

        // Checked before the clamp so that an overflow is never capped away
        self.check_integrity(&next, None, step)?;

        // ====== Ceiling ======

        let clamped = match self.config.ceiling {
            Some(ceiling) => clamp(&mut next, ceiling),
            None => 0,
        };

        self.check_integrity(&next, self.config.ceiling, step)?;

        // ====== Commit ======

        self.field = next;
        self.steps = step;
        self.time = self.config.time_after(step);

        self.track_clamping(clamped);

        if let Some(reference) = self.scenario.reference_at(self.time) {
            self.reference_samples.push((self.time, reference));
        }

        if let Some(every) = self.config.record_every
            && step % every == 0
        {
            self.record();
        }

        debug!(step, time = self.time, clamped, "step complete");

        if self.time >= self.config.total_time {
            self.state = SimulatorState::Terminated;
        }

        Ok(self.state)
    }

    /// Step until the clock reaches the horizon
    ///
    /// # Errors
    ///
    /// Stops at the first [`TransportError`] raised by [`step`](Self::step).
    pub fn run_to_completion(mut self) -> Result<SimulationResult, TransportError> {
        info!(
            scheme = %self.config.scheme,
            nodes = self.field.len(),
            dt = self.config.dt,
            start = self.time,
            horizon = self.config.total_time,
            "starting transport run"
        );

        while self.state == SimulatorState::Configured {
            self.step()?;
        }

        info!(
            steps = self.steps,
            time = self.time,
            clamp_events = self.clamp_events,
            "transport run complete"
        );

        Ok(self.into_result())
    }

    fn check_integrity(
        &self,
        next: &DVector<f64>,
        ceiling: Option<f64>,
        step: usize,
    ) -> Result<(), DivergenceError> {
        match solver::find_invalid(next, ceiling) {
            Some((node, value)) => Err(DivergenceError {
                step,
                node,
                value,
                last_valid_time: self.time,
                last_valid_field: self.field.clone(),
            }),
            None => Ok(()),
        }
    }

    fn track_clamping(&mut self, clamped: usize) {
        self.clamp_events += clamped;

        if clamped == 0 {
            self.clamped_run = 0;
            return;
        }

        self.clamped_run += 1;
        self.longest_clamped_run = self.longest_clamped_run.max(self.clamped_run);

        if !self.saturation_warned && self.clamped_run >= self.config.saturation_warning_steps {
            self.saturation_warned = true;
            warn!(
                step = self.steps,
                consecutive_steps = self.clamped_run,
                nodes = clamped,
                "concentration pinned at ceiling; check dt, dx or the ceiling value"
            );
        }
    }

    fn record(&mut self) {
        self.time_points.push(self.time);
        self.snapshots.push(self.field.clone());
    }

    fn into_result(mut self) -> SimulationResult {
        // The initial snapshot is always there; add the final one unless the
        // recording interval already landed on it.
        if self.steps > 0 && self.time_points.last() != Some(&self.time) {
            self.record();
        }

        let saturated = self
            .config
            .ceiling
            .is_some_and(|ceiling| self.field.iter().all(|v| *v >= ceiling));

        let mut metadata = HashMap::new();
        metadata.insert("scheme".to_string(), self.config.scheme.to_string());
        metadata.insert("dt".to_string(), self.config.dt.to_string());
        metadata.insert("total time".to_string(), self.config.total_time.to_string());
        metadata.insert("nodes".to_string(), self.field.len().to_string());
        metadata.insert("dx".to_string(), self.scenario.grid.spacing().to_string());

        SimulationResult {
            final_field: self.field,
            final_time: self.time,
            steps: self.steps,
            time_points: self.time_points,
            snapshots: self.snapshots,
            reference_samples: self.reference_samples,
            clamp_events: self.clamp_events,
            longest_clamped_run: self.longest_clamped_run,
            saturated,
            verdict: self.verdict,
            metadata,
        }
    }
}

impl std::fmt::Debug for Simulator<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Simulator")
            .field("scheme", &self.config.scheme)
            .field("nodes", &self.field.len())
            .field("time", &self.time)
            .field("steps", &self.steps)
            .field("state", &self.state)
            .finish()
    }
}

/// Cap every value above `ceiling`, returning how many were capped
fn clamp(field: &mut DVector<f64>, ceiling: f64) -> usize {
    let mut count = 0;
    for value in field.iter_mut() {
        if *value > ceiling {
            *value = ceiling;
            count += 1;
        }
    }
    count
}

// =================================================================================================
// Tests
// =================================================================================================
