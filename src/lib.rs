//! plume-rs: One-dimensional contaminant transport
//!
//! Explicit finite-difference simulation of a contaminant carried along a
//! 1D domain by a (possibly spatially varying) velocity field, with an
//! optional diffusion term, constant point sources and a concentration
//! ceiling.
//!
//! # Architecture
//!
//! plume-rs separates the run into two halves:
//!
//! 1. **What is transported** ([`physics`])
//!    - Grid, velocity field, sources, initial field, unit conversions
//!
//! 2. **How it is stepped** ([`solver`])
//!    - Stability gate, operator assembly (upwind, central, QUICK),
//!      time marching, clamping and divergence detection
//!
//! Runs can also be described declaratively in YAML ([`config`]).
//!
//! # Quick Start
//!
//! ```rust
//! use plume_rs::prelude::*;
//!
//! # fn main() -> Result<(), TransportError> {
//! // 1. Describe the domain
//! let grid = Grid::build(0.0, 5.0, 1.0)?;
//! let scenario = Scenario::new(grid, VelocityField::uniform(0.3), SourceSpec::point(0, 10.0));
//!
//! // 2. Choose the numerics
//! let config = SimulationConfiguration::new(1.0, 3.0).with_scheme(Scheme::Upwind);
//!
//! // 3. Run (refused if the scheme would be unstable)
//! let result = Simulator::configure(&scenario, config)?.run_to_completion()?;
//!
//! assert_eq!(result.steps, 3);
//! assert_eq!(result.final_field[0], 30.0);
//! # Ok(())
//! # }
//! ```
//!
//! # Modules
//!
//! - [`physics`]: Domain description
//! - [`solver`]: Numerical engine
//! - [`config`]: YAML run description
//! - [`error`]: Error types

pub mod config;
pub mod error;
pub mod physics;
pub mod solver;

pub mod prelude {
    //! Convenient imports for common usage
    //!
    //! ```rust
    //! use plume_rs::prelude::*;
    //! ```
    pub use crate::config::TransportConfig;
    pub use crate::error::{ConfigurationError, DivergenceError, StabilityError, TransportError};
    pub use crate::physics::{Grid, InitialCondition, SourceSpec, VelocityField, VelocityZone};
    pub use crate::solver::{
        Scenario, Scheme, SimulationConfiguration, SimulationResult, Simulator, SimulatorState,
        StabilityChecker, StabilityVerdict,
    };
}
