//! Advection velocity over the grid
//!
//! A velocity field is either uniform or *zoned*: a default value plus an
//! ordered list of closed intervals `[start, end]`, each carrying its own
//! constant velocity. Zones are applied in order, so when intervals overlap
//! the zone listed last wins.
//!
//! ```text
//! default ─────────────┬───────┬──────────┬──────────────
//!                      │ zone0 │          │    zone1
//! ─────────────────────┴───────┴──────────┴──────────────► x
//! ```

use nalgebra::DVector;

use crate::error::{ConfigResult, ConfigurationError};
use crate::physics::Grid;

/// Constant velocity over a closed position interval
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VelocityZone {
    pub start: f64,
    pub end: f64,
    pub value: f64,
}

impl VelocityZone {
    pub fn new(start: f64, end: f64, value: f64) -> Self {
        Self { start, end, value }
    }

    /// Whether position `x` lies inside the zone (both ends included)
    #[inline]
    pub fn contains(&self, x: f64) -> bool {
        x >= self.start && x <= self.end
    }
}

/// Spatially varying advection velocity
///
/// # Example
///
/// ```rust
/// use plume_rs::physics::{Grid, VelocityField, VelocityZone};
///
/// let grid = Grid::build(0.0, 10.0, 1.0).unwrap();
/// let field = VelocityField::zoned(
///     0.5,
///     vec![VelocityZone::new(2.0, 6.0, 1.0), VelocityZone::new(5.0, 7.0, 2.0)],
/// ).unwrap();
///
/// assert_eq!(field.at(&grid, 0), 0.5);
/// assert_eq!(field.at(&grid, 3), 1.0);
/// assert_eq!(field.at(&grid, 5), 2.0); // later zone wins
/// ```
#[derive(Debug, Clone, PartialEq)]
pub enum VelocityField {
    /// Same velocity at every node
    Uniform(f64),

    /// Default velocity overridden on each zone, last zone wins
    Zoned {
        default: f64,
        zones: Vec<VelocityZone>,
    },
}

impl VelocityField {
    /// Uniform velocity everywhere
    pub fn uniform(value: f64) -> Self {
        Self::Uniform(value)
    }

    /// Default velocity with ordered zone overrides
    ///
    /// # Errors
    ///
    /// - [`ConfigurationError::NonFinite`] for a non-finite default or zone value
    /// - [`ConfigurationError::InvalidZone`] for a zone with `start >= end`
    pub fn zoned(default: f64, zones: Vec<VelocityZone>) -> ConfigResult<Self> {
        if !default.is_finite() {
            return Err(ConfigurationError::NonFinite {
                name: "default velocity",
                value: default,
            });
        }

        for (index, zone) in zones.iter().enumerate() {
            if !zone.value.is_finite() {
                return Err(ConfigurationError::NonFinite {
                    name: "zone velocity",
                    value: zone.value,
                });
            }
            if zone.start.is_nan() || zone.end.is_nan() || zone.start >= zone.end {
                return Err(ConfigurationError::InvalidZone {
                    index,
                    start: zone.start,
                    end: zone.end,
                });
            }
        }

        Ok(Self::Zoned { default, zones })
    }

    /// Velocity at position `x`
    pub fn at_position(&self, x: f64) -> f64 {
        match self {
            Self::Uniform(value) => *value,
            Self::Zoned { default, zones } => zones
                .iter()
                .rev()
                .find(|zone| zone.contains(x))
                .map_or(*default, |zone| zone.value),
        }
    }

    /// Velocity at node `index` of `grid`
    pub fn at(&self, grid: &Grid, index: usize) -> f64 {
        self.at_position(grid.position(index))
    }

    /// Velocity sampled at every node of `grid`
    pub fn sample(&self, grid: &Grid) -> DVector<f64> {
        grid.positions().map(|x| self.at_position(x))
    }

    /// Largest absolute velocity on `grid`
    pub fn max_magnitude(&self, grid: &Grid) -> f64 {
        self.sample(grid).amax()
    }

    /// The single velocity shared by every node of `grid`, if there is one
    ///
    /// A zoned field whose zones miss every node (or repeat the default)
    /// still counts as uniform.
    pub fn uniform_value(&self, grid: &Grid) -> Option<f64> {
        match self {
            Self::Uniform(value) => Some(*value),
            Self::Zoned { .. } => {
                let sampled = self.sample(grid);
                let first = sampled[0];
                sampled.iter().all(|v| *v == first).then_some(first)
            }
        }
    }

    /// Validate the field values themselves
    pub fn validate(&self) -> ConfigResult<()> {
        match self {
            Self::Uniform(value) if !value.is_finite() => Err(ConfigurationError::NonFinite {
                name: "velocity",
                value: *value,
            }),
            Self::Uniform(_) => Ok(()),
            Self::Zoned { default, zones } => Self::zoned(*default, zones.clone()).map(|_| ()),
        }
    }
}
