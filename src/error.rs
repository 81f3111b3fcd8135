//! Error types for transport simulations
//!
//! Three families of failure, in the order they can occur:
//!
//! - [`ConfigurationError`]: the inputs do not describe a valid run
//!   (bad spacing, too few nodes for the stencil, malformed zones, ...).
//! - [`StabilityError`]: the inputs are valid but the explicit scheme would
//!   not be stable for them. Detected before the first step.
//! - [`DivergenceError`]: a non-finite value appeared while stepping.
//!
//! Configuration and stability errors are returned synchronously by
//! [`Simulator::configure`](crate::solver::Simulator::configure); divergence
//! aborts the run in progress and hands back the last valid field.

use nalgebra::DVector;
use thiserror::Error;

use crate::solver::{Scheme, StabilityVerdict};

/// Result alias for operations that can only fail on configuration
pub type ConfigResult<T> = Result<T, ConfigurationError>;

/// Invalid run description
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigurationError {
    #[error("grid spacing must be positive, got {0}")]
    NonPositiveSpacing(f64),

    #[error("grid extent {extent} must lie beyond origin {origin}")]
    InvalidExtent { origin: f64, extent: f64 },

    #[error("time step must be positive, got {0}")]
    NonPositiveTimeStep(f64),

    #[error("total time {total_time} must be positive and beyond start time {start_time}")]
    InvalidHorizon { start_time: f64, total_time: f64 },

    #[error("parameter `{name}` must be finite, got {value}")]
    NonFinite { name: &'static str, value: f64 },

    #[error("{scheme} stencil needs at least {required} nodes, grid has {actual}")]
    InsufficientNodes {
        scheme: Scheme,
        required: usize,
        actual: usize,
    },

    #[error("velocity zone #{index} [{start}, {end}] is empty or inverted")]
    InvalidZone { index: usize, start: f64, end: f64 },

    #[error("source node {node} is outside the grid ({node_count} nodes)")]
    SourceOutOfRange { node: usize, node_count: usize },

    #[error("source rate at node {node} must be non-negative, got {rate}")]
    NegativeRate { node: usize, rate: f64 },

    #[error("{scheme} stencil is upwind-biased and needs non-negative velocity, node {node} has {velocity}")]
    NegativeVelocity {
        scheme: Scheme,
        node: usize,
        velocity: f64,
    },

    #[error("{scheme} stencil requires a uniform velocity field")]
    NonUniformVelocity { scheme: Scheme },

    #[error("upwind stencil is advection-only, diffusivity must be 0 (got {0})")]
    DiffusivityWithUpwind(f64),

    #[error("diffusivity must be non-negative, got {0}")]
    NegativeDiffusivity(f64),

    #[error("concentration ceiling must be positive, got {0}")]
    InvalidCeiling(f64),

    #[error("initial profile has {actual} values, grid has {expected} nodes")]
    ProfileLength { expected: usize, actual: usize },

    #[error("initial concentration at node {node} must be finite and non-negative, got {value}")]
    InvalidInitialValue { node: usize, value: f64 },

    #[error("initial concentration {value} at node {node} is above the ceiling {ceiling}")]
    InitialAboveCeiling { node: usize, value: f64, ceiling: f64 },

    #[error("recording interval must be at least 1 step")]
    ZeroRecordInterval,

    #[error("failed to read configuration: {0}")]
    Io(String),

    #[error("failed to parse configuration: {0}")]
    Parse(String),
}

/// The explicit scheme would not be stable for the requested run
#[derive(Debug, Clone, PartialEq, Error)]
#[error("unstable configuration: {verdict}")]
pub struct StabilityError {
    pub verdict: StabilityVerdict,
}

/// A non-finite value appeared in the field while stepping
#[derive(Debug, Clone, PartialEq, Error)]
#[error("divergence at step {step}: node {node} holds {value}")]
pub struct DivergenceError {
    /// One-based index of the step that produced the bad value
    pub step: usize,
    /// First offending node
    pub node: usize,
    /// The offending value
    pub value: f64,
    /// Simulated time reached before the failing step
    pub last_valid_time: f64,
    /// Field as it was before the failing step
    pub last_valid_field: DVector<f64>,
}

/// Any failure while configuring or running a simulation
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TransportError {
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),

    #[error(transparent)]
    Stability(#[from] StabilityError),

    #[error(transparent)]
    Divergence(#[from] DivergenceError),

    #[error("run cancelled before step {step}")]
    Cancelled { step: usize },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_name_the_offender() {
        let err = ConfigurationError::InsufficientNodes {
            scheme: Scheme::Quick,
            required: 3,
            actual: 2,
        };
        assert_eq!(err.to_string(), "quick stencil needs at least 3 nodes, grid has 2");

        let err = DivergenceError {
            step: 12,
            node: 4,
            value: f64::NAN,
            last_valid_time: 11.0,
            last_valid_field: DVector::zeros(5),
        };
        assert_eq!(err.to_string(), "divergence at step 12: node 4 holds NaN");
    }

    #[test]
    fn test_conversion_into_transport_error() {
        let err: TransportError = ConfigurationError::NonPositiveTimeStep(0.0).into();
        assert!(matches!(err, TransportError::Configuration(_)));
    }
}
