//! Simulation scenario definition
//!
//! A scenario combines the grid, the velocity field, the sources and the
//! initial field: everything that describes WHAT is transported, not how
//! it is stepped.

use std::sync::Arc;

use nalgebra::DVector;

use crate::error::ConfigResult;
use crate::physics::{Grid, InitialCondition, SourceSpec, VelocityField};

/// Observed `time -> value` lookup used only for comparison
pub type ReferenceFn = Arc<dyn Fn(f64) -> f64 + Send + Sync>;

/// Simulation scenario
///
/// The same scenario can be stepped with different schemes or time steps.
///
/// # Example
///
/// ```rust
/// use plume_rs::physics::{Grid, SourceSpec, VelocityField};
/// use plume_rs::solver::Scenario;
///
/// let grid = Grid::build(0.0, 5.0, 1.0).unwrap();
/// let scenario = Scenario::new(grid, VelocityField::uniform(0.3), SourceSpec::point(0, 10.0))
///     .with_reference(|t| 2.0 * t);
///
/// assert!(scenario.validate().is_ok());
/// assert_eq!(scenario.reference_at(1.5), Some(3.0));
/// ```
#[derive(Clone)]
pub struct Scenario {
    pub grid: Grid,
    pub velocity: VelocityField,
    pub source: SourceSpec,
    pub initial: InitialCondition,
    reference: Option<ReferenceFn>,
}

impl Scenario {
    /// Create a scenario starting from a clean domain
    pub fn new(grid: Grid, velocity: VelocityField, source: SourceSpec) -> Self {
        Self {
            grid,
            velocity,
            source,
            initial: InitialCondition::Zero,
            reference: None,
        }
    }

    pub fn with_initial(mut self, initial: InitialCondition) -> Self {
        self.initial = initial;
        self
    }

    /// Attach a reference series sampled alongside the run
    ///
    /// The simulator records it but never reads it back.
    pub fn with_reference<F>(mut self, reference: F) -> Self
    where
        F: Fn(f64) -> f64 + Send + Sync + 'static,
    {
        self.reference = Some(Arc::new(reference));
        self
    }

    /// Reference value at time `t`, if a reference is attached
    pub fn reference_at(&self, t: f64) -> Option<f64> {
        self.reference.as_ref().map(|f| f(t))
    }

    pub fn has_reference(&self) -> bool {
        self.reference.is_some()
    }

    pub fn node_count(&self) -> usize {
        self.grid.node_count()
    }

    /// Materialize the initial field on the grid
    pub fn initial_field(&self) -> ConfigResult<DVector<f64>> {
        self.initial.build(&self.grid)
    }

    /// Check velocity, sources and initial field against the grid
    pub fn validate(&self) -> ConfigResult<()> {
        self.velocity.validate()?;
        self.source.validate(&self.grid)?;
        self.initial_field()?;
        Ok(())
    }
}

impl std::fmt::Debug for Scenario {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scenario")
            .field("nodes", &self.grid.node_count())
            .field("spacing", &self.grid.spacing())
            .field("velocity", &self.velocity)
            .field("source", &self.source)
            .field("initial", &self.initial)
            .field("reference", &self.reference.as_ref().map(|_| "<user-defined>"))
            .finish()
    }
}
