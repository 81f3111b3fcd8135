//! Numerical transport solver
//!
//! # Core Concepts
//!
//! The solver separates a run into three layers:
//!
//! 1. **Scenario** ([`Scenario`]) - WHAT to transport
//!    - Grid, velocity field, sources, initial field
//!
//! 2. **Configuration** ([`SimulationConfiguration`]) - HOW to step it
//!    - Time step, horizon, scheme, diffusivity, ceiling
//!
//! 3. **Simulator** ([`Simulator`]) - the time-marching engine
//!    - Gates on stability, builds the operator, steps to the horizon
//!
//! # Workflow
//!
//! ```text
//! ┌──────────────┐   ┌────────────────────────┐
//! │   Scenario   │   │ SimulationConfiguration│
//! └──────┬───────┘   └───────────┬────────────┘
//!        └──────────┬────────────┘
//!          ┌────────▼─────────┐
//!          │ StabilityChecker │ ← refuses unstable runs
//!          └────────┬─────────┘
//!          ┌────────▼─────────┐
//!          │ OperatorBuilder  │ ← upwind | central | quick
//!          └────────┬─────────┘
//!          ┌────────▼─────────┐
//!          │    Simulator     │ ← A·C + source·dt, clamp, t += dt
//!          └────────┬─────────┘
//!          ┌────────▼─────────┐
//!          │ SimulationResult │
//!          └──────────────────┘
//! ```
//!
//! # Error Handling
//!
//! ```rust
//! use plume_rs::error::TransportError;
//! use plume_rs::physics::{Grid, SourceSpec, VelocityField};
//! use plume_rs::solver::{Scenario, SimulationConfiguration, Simulator};
//!
//! let grid = Grid::build(0.0, 1.0, 0.1).unwrap();
//! let scenario = Scenario::new(grid, VelocityField::uniform(1.0), SourceSpec::point(0, 1.0));
//!
//! match Simulator::configure(&scenario, SimulationConfiguration::new(1.0, 10.0)) {
//!     Err(TransportError::Stability(err)) => println!("rejected: {}", err.verdict),
//!     other => panic!("courant 10 must be rejected, got {:?}", other),
//! }
//! ```

// =================================================================================================
// Module Declarations
// =================================================================================================

mod configuration;
mod operator;
mod scenario;
mod simulator;
mod stability;

// =================================================================================================
// Parallel Execution Threshold
// =================================================================================================
//
// The row-wise operator product is the only data-parallel part of a step.
// Whether it is worth handing to Rayon depends on the grid size, so the
// cut-over is a runtime knob (handy in benchmarks) kept in an AtomicUsize.
// Relaxed ordering is enough: it is a performance hint, not a
// synchronisation point.
// =================================================================================================

use std::sync::atomic::{AtomicUsize, Ordering};

/// Default node count above which the operator product runs in parallel
///
/// Below a few thousand nodes the banded product is a handful of
/// multiply-adds per row and Rayon dispatch costs more than it saves.
const DEFAULT_PARALLEL_THRESHOLD: usize = 4096;

static PARALLEL_THRESHOLD: AtomicUsize = AtomicUsize::new(DEFAULT_PARALLEL_THRESHOLD);

/// Return the current parallel-execution threshold
///
/// Only consulted when the crate is built with the `parallel` feature.
///
/// # Example
///
/// ```rust
/// use plume_rs::solver::parallel_threshold;
///
/// assert!(parallel_threshold() > 0);
/// ```
pub fn parallel_threshold() -> usize {
    PARALLEL_THRESHOLD.load(Ordering::Relaxed)
}

/// Set the parallel-execution threshold to a new value
///
/// # Panics
///
/// Panics when `threshold == 0`.
pub fn set_parallel_threshold(threshold: usize) {
    assert!(threshold > 0, "parallel threshold must be positive");
    PARALLEL_THRESHOLD.store(threshold, Ordering::Relaxed);
}

/// RAII guard that sets the threshold and restores the previous value on drop
#[cfg(test)]
pub(crate) struct ParallelThresholdGuard {
    restore: usize,
}

#[cfg(test)]
impl ParallelThresholdGuard {
    pub(crate) fn replace(threshold: usize) -> Self {
        let restore = parallel_threshold();
        set_parallel_threshold(threshold);
        Self { restore }
    }
}

#[cfg(test)]
impl Drop for ParallelThresholdGuard {
    fn drop(&mut self) {
        PARALLEL_THRESHOLD.store(self.restore, Ordering::Relaxed);
    }
}

// =================================================================================================
// Public Re-exports
// =================================================================================================

pub use configuration::{DEFAULT_SATURATION_WARNING_STEPS, SimulationConfiguration, SimulationResult};
pub use operator::{OperatorBuilder, Scheme, TransportOperator};
pub use scenario::{ReferenceFn, Scenario};
pub use simulator::{Simulator, SimulatorState};
pub use stability::{StabilityChecker, StabilityVerdict, ViolationKind};

// =================================================================================================
// Helper Functions
// =================================================================================================

use nalgebra::DVector;

/// First node holding a value the field must never contain
///
/// NaN arises from `inf - inf` once an unstable scheme has overflowed;
/// infinities from the overflow itself. A finite value above `ceiling`
/// means the clamp was bypassed.
pub(crate) fn find_invalid(field: &DVector<f64>, ceiling: Option<f64>) -> Option<(usize, f64)> {
    field
        .iter()
        .enumerate()
        .find(|(_, v)| !v.is_finite() || ceiling.is_some_and(|c| **v > c))
        .map(|(node, v)| (node, *v))
}

// =================================================================================================
// Tests
// =================================================================================================
