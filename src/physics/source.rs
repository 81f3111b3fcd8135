//! Point sources of contaminant
//!
//! A source injects a constant amount per unit time at a node. The forcing
//! added to the field on each step is `rate · dt`.

use std::collections::BTreeMap;

use crate::error::{ConfigResult, ConfigurationError};
use crate::physics::Grid;

/// Sparse map from node index to injection rate
///
/// Typically a single entry at the emission point. Adding a second rate at
/// the same node replaces the first.
///
/// # Example
///
/// ```rust
/// use plume_rs::physics::SourceSpec;
///
/// let source = SourceSpec::point(1, 60_000.0);
/// assert_eq!(source.rate(1), 60_000.0);
/// assert_eq!(source.rate(0), 0.0);
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SourceSpec {
    rates: BTreeMap<usize, f64>,
}

impl SourceSpec {
    /// No injection anywhere
    pub fn none() -> Self {
        Self::default()
    }

    /// Single source at `node`
    pub fn point(node: usize, rate: f64) -> Self {
        Self::none().with_point(node, rate)
    }

    /// Single source at the node nearest to position `x`
    pub fn at_position(grid: &Grid, x: f64, rate: f64) -> Self {
        Self::point(grid.nearest_node(x), rate)
    }

    /// Add (or replace) a source at `node`
    pub fn with_point(mut self, node: usize, rate: f64) -> Self {
        self.rates.insert(node, rate);
        self
    }

    /// Injection rate at `node` (zero where there is no source)
    pub fn rate(&self, node: usize) -> f64 {
        self.rates.get(&node).copied().unwrap_or(0.0)
    }

    /// Iterate over `(node, rate)` pairs in node order
    pub fn iter(&self) -> impl Iterator<Item = (usize, f64)> + '_ {
        self.rates.iter().map(|(node, rate)| (*node, *rate))
    }

    pub fn is_empty(&self) -> bool {
        self.rates.is_empty()
    }

    /// Total injection rate over all nodes
    pub fn total_rate(&self) -> f64 {
        self.rates.values().sum()
    }

    /// Check every source lies on `grid` with a finite, non-negative rate
    pub fn validate(&self, grid: &Grid) -> ConfigResult<()> {
        let node_count = grid.node_count();
        for (node, rate) in self.iter() {
            if node >= node_count {
                return Err(ConfigurationError::SourceOutOfRange { node, node_count });
            }
            if !rate.is_finite() {
                return Err(ConfigurationError::NonFinite {
                    name: "source rate",
                    value: rate,
                });
            }
            if rate < 0.0 {
                return Err(ConfigurationError::NegativeRate { node, rate });
            }
        }
        Ok(())
    }
}
