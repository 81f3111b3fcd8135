//! Physical description of a transport run
//!
//! This module holds everything that says WHAT is being transported and
//! where, independently of how it is stepped:
//!
//! - [`Grid`]: uniform 1D node layout
//! - [`VelocityField`]: advection velocity, uniform or zoned
//! - [`SourceSpec`]: point injection rates
//! - [`InitialCondition`]: concentration at the start time
//! - [`units`]: conversions between per-second and per-year quantities
//!
//! The numerical side (stability checks, operator assembly, time marching)
//! lives in [`crate::solver`].
//!
//! # Example
//!
//! ```rust
//! use plume_rs::physics::{Grid, SourceSpec, VelocityField, VelocityZone};
//!
//! let grid = Grid::build(0.0, 100.0, 1.0).unwrap();
//! let velocity = VelocityField::zoned(
//!     0.5,
//!     vec![VelocityZone::new(40.0, 60.0, 0.9)],
//! ).unwrap();
//! let source = SourceSpec::point(0, 10.0);
//!
//! assert_eq!(velocity.at(&grid, 50), 0.9);
//! assert!(source.validate(&grid).is_ok());
//! ```

pub mod grid;
pub mod initial;
pub mod source;
pub mod units;
pub mod velocity;

pub use grid::Grid;
pub use initial::InitialCondition;
pub use source::SourceSpec;
pub use velocity::{VelocityField, VelocityZone};
