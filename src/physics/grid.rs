//! Uniform 1D spatial grid
//!
//! The domain `[origin, extent)` is split into nodes spaced `dx` apart,
//! starting at `origin`:
//!
//! ```text
//! x_i = origin + i·dx        i = 0, 1, ..., n-1
//! n   = ⌈(extent - origin) / dx⌉
//! ```
//!
//! The last node therefore lies strictly before `extent`, exactly as a
//! half-open range would produce.

use nalgebra::DVector;

use crate::error::{ConfigResult, ConfigurationError};

/// Discretized spatial domain
///
/// Immutable once built. Node positions are strictly increasing with
/// constant spacing.
///
/// # Example
///
/// ```rust
/// use plume_rs::physics::Grid;
///
/// let grid = Grid::build(0.0, 100.0, 0.5).unwrap();
/// assert_eq!(grid.node_count(), 200);
/// assert_eq!(grid.position(3), 1.5);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Grid {
    origin: f64,
    spacing: f64,
    positions: DVector<f64>,
}

impl Grid {
    /// Build a uniform grid covering `[origin, extent)` with step `spacing`
    ///
    /// # Errors
    ///
    /// - [`ConfigurationError::NonFinite`] if any argument is NaN or infinite
    /// - [`ConfigurationError::NonPositiveSpacing`] if `spacing <= 0`
    /// - [`ConfigurationError::InvalidExtent`] if `extent <= origin`
    pub fn build(origin: f64, extent: f64, spacing: f64) -> ConfigResult<Self> {
        for (name, value) in [("origin", origin), ("extent", extent), ("spacing", spacing)] {
            if !value.is_finite() {
                return Err(ConfigurationError::NonFinite { name, value });
            }
        }

        if spacing <= 0.0 {
            return Err(ConfigurationError::NonPositiveSpacing(spacing));
        }

        if extent <= origin {
            return Err(ConfigurationError::InvalidExtent { origin, extent });
        }

        let node_count = ((extent - origin) / spacing).ceil() as usize;

        // Computed from the index rather than accumulated so that spacing
        // stays exact to rounding at every node.
        let positions = DVector::from_fn(node_count, |i, _| origin + i as f64 * spacing);

        Ok(Self {
            origin,
            spacing,
            positions,
        })
    }

    /// Number of nodes
    pub fn node_count(&self) -> usize {
        self.positions.len()
    }

    /// Spacing between consecutive nodes (Δx)
    pub fn spacing(&self) -> f64 {
        self.spacing
    }

    /// Position of the first node
    pub fn origin(&self) -> f64 {
        self.origin
    }

    /// Position of node `index`
    ///
    /// # Panics
    ///
    /// Panics if `index >= node_count()`.
    pub fn position(&self, index: usize) -> f64 {
        self.positions[index]
    }

    /// All node positions
    pub fn positions(&self) -> &DVector<f64> {
        &self.positions
    }

    /// Index of the node closest to position `x`, clamped to the grid
    pub fn nearest_node(&self, x: f64) -> usize {
        let raw = ((x - self.origin) / self.spacing).round();
        if raw <= 0.0 || raw.is_nan() {
            0
        } else {
            (raw as usize).min(self.node_count() - 1)
        }
    }
}
