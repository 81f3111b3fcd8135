//! Discrete transport operators
//!
//! # Explicit update
//!
//! Every scheme is written as a single matrix `A` so that one step is
//!
//! ```text
//! C^{n+1} = A · C^n
//! ```
//!
//! Interior rows encode the finite-difference stencil; boundary rows are
//! identity rows that hold the boundary node at its current value.
//!
//! # Schemes
//!
//! With `c = dt·u/dx` and `s = dt·D/dx²`:
//!
//! ## Upwind (donor cell), advection only, `u` may vary per node
//!
//! ```text
//! row i ∈ [1, n):     A[i][i-1] = c_i       A[i][i] = 1 - c_i
//! row 0:              A[0][0]   = 1
//! ```
//!
//! ## Central, advection + diffusion, uniform `u`
//!
//! ```text
//! row i ∈ [1, n-1):   A[i][i-1] = s + c/2   A[i][i] = 1 - 2s   A[i][i+1] = s - c/2
//! rows 0, n-1:        identity
//! ```
//!
//! ## QUICK, advection + diffusion, uniform `u`
//!
//! ```text
//! row i ∈ [2, n-1):   A[i][i-2] = -c/8
//!                     A[i][i-1] = s + 7c/8
//!                     A[i][i]   = 1 - 2s - 3c/8
//!                     A[i][i+1] = s - 3c/8
//! rows 0, 1, n-1:     identity
//! ```
//!
//! The `-c/8` weight makes QUICK non-monotone: next to a steep front it
//! undershoots and can produce negative concentrations even when the run
//! is stable. They are left as computed; the ceiling only bounds values
//! from above.
//!
//! Upwind and QUICK take their upstream neighbours from lower indices, so
//! they only make sense for flow toward increasing `x`.
//!
//! # Storage
//!
//! Operators are stored by diagonals (two to four per row), never as a
//! full `n × n` matrix.

use std::fmt;

use nalgebra::{DMatrix, DVector};
use serde::Deserialize;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

use crate::error::{ConfigResult, ConfigurationError};
use crate::physics::{Grid, VelocityField};
use crate::solver::StabilityChecker;

// =================================================================================================
// Scheme selector
// =================================================================================================

/// Finite-difference scheme used to build the operator
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scheme {
    /// First-order donor cell, advection only
    #[default]
    Upwind,
    /// Central differences, advection + diffusion
    Central,
    /// Three-point upstream-biased (QUICK), advection + diffusion
    Quick,
}

impl Scheme {
    /// Smallest grid the stencil can be assembled on
    pub fn min_nodes(&self) -> usize {
        match self {
            Scheme::Upwind => 2,
            Scheme::Central | Scheme::Quick => 3,
        }
    }

    /// Number of sub/super diagonals touched by interior rows
    pub fn bandwidth(&self) -> (usize, usize) {
        match self {
            Scheme::Upwind => (1, 0),
            Scheme::Central => (1, 1),
            Scheme::Quick => (2, 1),
        }
    }

    /// Whether the stencil reads upstream values from lower indices only
    pub fn is_upwind_biased(&self) -> bool {
        matches!(self, Scheme::Upwind | Scheme::Quick)
    }
}

impl fmt::Display for Scheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scheme::Upwind => write!(f, "upwind"),
            Scheme::Central => write!(f, "central"),
            Scheme::Quick => write!(f, "quick"),
        }
    }
}

// =================================================================================================
// Transport operator
// =================================================================================================

/// Update operator for one explicit time step, stored by diagonals
///
/// Only the band the stencil touches is kept: `bands[(i, k)]` holds
/// `A[i][i + k - lower]`, so storage and the product are `O(n)` in the
/// number of nodes.
///
/// Built once per run and never modified while stepping.
#[derive(Debug, Clone, PartialEq)]
pub struct TransportOperator {
    scheme: Scheme,
    lower: usize,
    upper: usize,
    bands: DMatrix<f64>,
}

impl TransportOperator {
    fn zeros(scheme: Scheme, n: usize) -> Self {
        let (lower, upper) = scheme.bandwidth();
        Self {
            scheme,
            lower,
            upper,
            bands: DMatrix::zeros(n, lower + upper + 1),
        }
    }

    /// Set `A[i][j]`; `j` must lie inside the band of row `i`
    fn set(&mut self, i: usize, j: usize, value: f64) {
        debug_assert!(j + self.lower >= i && j <= i + self.upper);
        self.bands[(i, j + self.lower - i)] = value;
    }

    pub fn scheme(&self) -> Scheme {
        self.scheme
    }

    pub fn node_count(&self) -> usize {
        self.bands.nrows()
    }

    /// Entry `A[i][j]`, zero outside the band
    pub fn entry(&self, i: usize, j: usize) -> f64 {
        if j + self.lower < i || j > i + self.upper {
            0.0
        } else {
            self.bands[(i, j + self.lower - i)]
        }
    }

    /// Copy of row `i`
    pub fn row(&self, i: usize) -> Vec<f64> {
        (0..self.node_count()).map(|j| self.entry(i, j)).collect()
    }

    /// Full `n × n` matrix, for inspection on small grids
    pub fn to_dense(&self) -> DMatrix<f64> {
        let n = self.node_count();
        DMatrix::from_fn(n, n, |i, j| self.entry(i, j))
    }

    /// Compute `A · field`
    ///
    /// The result is written to a fresh vector; every row reads only the
    /// pre-step `field`.
    ///
    /// With the `parallel` feature, rows are distributed over Rayon once the
    /// grid exceeds [`parallel_threshold()`](crate::solver::parallel_threshold).
    pub fn apply(&self, field: &DVector<f64>) -> DVector<f64> {
        debug_assert_eq!(field.len(), self.node_count());

        #[cfg(feature = "parallel")]
        {
            if self.node_count() > crate::solver::parallel_threshold() {
                return self.apply_parallel(field);
            }
        }

        DVector::from_fn(self.node_count(), |i, _| self.row_product(i, field))
    }

    #[cfg(feature = "parallel")]
    fn apply_parallel(&self, field: &DVector<f64>) -> DVector<f64> {
        let values: Vec<f64> = (0..self.node_count())
            .into_par_iter()
            .map(|i| self.row_product(i, field))
            .collect();

        DVector::from_vec(values)
    }

    #[inline]
    fn row_product(&self, i: usize, field: &DVector<f64>) -> f64 {
        let first = i.saturating_sub(self.lower);
        let last = (i + self.upper).min(self.node_count() - 1);
        (first..=last)
            .map(|j| self.bands[(i, j + self.lower - i)] * field[j])
            .sum()
    }
}

// =================================================================================================
// Operator builder
// =================================================================================================

/// Assembles a [`TransportOperator`] for one of the [`Scheme`]s
///
/// # Example
///
/// ```rust
/// use plume_rs::physics::{Grid, VelocityField};
/// use plume_rs::solver::{OperatorBuilder, Scheme};
///
/// let grid = Grid::build(0.0, 3.0, 1.0).unwrap();
/// let operator = OperatorBuilder::new(Scheme::Upwind)
///     .build(&grid, &VelocityField::uniform(0.25), 0.0, 1.0)
///     .unwrap();
///
/// assert_eq!(operator.row(0), vec![1.0, 0.0, 0.0]);
/// assert_eq!(operator.row(2), vec![0.0, 0.25, 0.75]);
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct OperatorBuilder {
    scheme: Scheme,
}

impl OperatorBuilder {
    pub fn new(scheme: Scheme) -> Self {
        Self { scheme }
    }

    pub fn scheme(&self) -> Scheme {
        self.scheme
    }

    /// Build the operator for time step `dt`
    ///
    /// # Errors
    ///
    /// - [`ConfigurationError::InsufficientNodes`] if the grid is smaller than
    ///   [`Scheme::min_nodes`]
    /// - [`ConfigurationError::DiffusivityWithUpwind`] if `diffusivity > 0` for upwind
    /// - [`ConfigurationError::NonUniformVelocity`] for central/QUICK on a varying field
    /// - [`ConfigurationError::NegativeVelocity`] for upwind/QUICK with flow toward `-x`
    pub fn build(
        &self,
        grid: &Grid,
        velocity: &VelocityField,
        diffusivity: f64,
        dt: f64,
    ) -> ConfigResult<TransportOperator> {
        let n = grid.node_count();
        let required = self.scheme.min_nodes();
        if n < required {
            return Err(ConfigurationError::InsufficientNodes {
                scheme: self.scheme,
                required,
                actual: n,
            });
        }

        if diffusivity < 0.0 {
            return Err(ConfigurationError::NegativeDiffusivity(diffusivity));
        }

        let velocities = velocity.sample(grid);
        if self.scheme.is_upwind_biased()
            && let Some((node, v)) = velocities.iter().enumerate().find(|(_, v)| **v < 0.0)
        {
            return Err(ConfigurationError::NegativeVelocity {
                scheme: self.scheme,
                node,
                velocity: *v,
            });
        }

        let dx = grid.spacing();
        let mut operator = TransportOperator::zeros(self.scheme, n);
        match self.scheme {
            Scheme::Upwind => {
                if diffusivity > 0.0 {
                    return Err(ConfigurationError::DiffusivityWithUpwind(diffusivity));
                }
                let courants = velocities.map(|u| StabilityChecker::courant(dt, dx, u));
                upwind(&mut operator, &courants);
            }
            Scheme::Central | Scheme::Quick => {
                let u = velocity
                    .uniform_value(grid)
                    .ok_or(ConfigurationError::NonUniformVelocity { scheme: self.scheme })?;
                let c = StabilityChecker::courant(dt, dx, u);
                let s = StabilityChecker::diffusion_number(dt, dx, diffusivity);
                if self.scheme == Scheme::Central {
                    central(&mut operator, c, s);
                } else {
                    quick(&mut operator, c, s);
                }
            }
        }

        Ok(operator)
    }
}

fn upwind(a: &mut TransportOperator, courants: &DVector<f64>) {
    let n = courants.len();
    a.set(0, 0, 1.0);
    for i in 1..n {
        a.set(i, i, 1.0 - courants[i]);
        a.set(i, i - 1, courants[i]);
    }
}

fn central(a: &mut TransportOperator, c: f64, s: f64) {
    let n = a.node_count();
    for i in 1..n - 1 {
        a.set(i, i + 1, s - c / 2.0);
        a.set(i, i, 1.0 - 2.0 * s);
        a.set(i, i - 1, s + c / 2.0);
    }
    a.set(0, 0, 1.0);
    a.set(n - 1, n - 1, 1.0);
}

fn quick(a: &mut TransportOperator, c: f64, s: f64) {
    let n = a.node_count();
    for i in 2..n - 1 {
        a.set(i, i + 1, s - 3.0 / 8.0 * c);
        a.set(i, i, 1.0 - 2.0 * s - 3.0 / 8.0 * c);
        a.set(i, i - 1, s + 7.0 / 8.0 * c);
        a.set(i, i - 2, -1.0 / 8.0 * c);
    }
    a.set(0, 0, 1.0);
    a.set(1, 1, 1.0);
    a.set(n - 1, n - 1, 1.0);
}

// =================================================================================================
// Tests
// =================================================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::physics::VelocityZone;
    use approx::assert_relative_eq;

    fn assert_row(operator: &TransportOperator, i: usize, expected: &[f64]) {
        let row = operator.row(i);
        assert_eq!(row.len(), expected.len());
        for (got, want) in row.iter().zip(expected) {
            assert_relative_eq!(*got, *want, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_upwind_three_nodes() {
        let grid = Grid::build(0.0, 3.0, 1.0).unwrap();
        let operator = OperatorBuilder::new(Scheme::Upwind)
            .build(&grid, &VelocityField::uniform(0.2), 0.0, 1.0)
            .unwrap();

        assert_row(&operator, 0, &[1.0, 0.0, 0.0]);
        assert_row(&operator, 1, &[0.2, 0.8, 0.0]);
        assert_row(&operator, 2, &[0.0, 0.2, 0.8]);
    }

    #[test]
    fn test_upwind_follows_zones() {
        let grid = Grid::build(0.0, 4.0, 1.0).unwrap();
        let velocity =
            VelocityField::zoned(0.5, vec![VelocityZone::new(2.0, 3.0, 1.0)]).unwrap();
        let operator = OperatorBuilder::new(Scheme::Upwind)
            .build(&grid, &velocity, 0.0, 0.5)
            .unwrap();

        assert_row(&operator, 1, &[0.25, 0.75, 0.0, 0.0]);
        assert_row(&operator, 2, &[0.0, 0.5, 0.5, 0.0]);
        assert_row(&operator, 3, &[0.0, 0.0, 0.5, 0.5]);
    }

    #[test]
    fn test_central_rows() {
        let grid = Grid::build(0.0, 4.0, 1.0).unwrap();
        // c = 0.2, s = 0.1
        let operator = OperatorBuilder::new(Scheme::Central)
            .build(&grid, &VelocityField::uniform(0.2), 0.1, 1.0)
            .unwrap();

        assert_row(&operator, 0, &[1.0, 0.0, 0.0, 0.0]);
        assert_row(&operator, 1, &[0.2, 0.8, 0.0, 0.0]);
        assert_row(&operator, 2, &[0.0, 0.2, 0.8, 0.0]);
        assert_row(&operator, 3, &[0.0, 0.0, 0.0, 1.0]);
    }

    #[test]
    fn test_quick_rows() {
        let grid = Grid::build(0.0, 5.0, 1.0).unwrap();
        // c = 0.4, s = 0.2
        let operator = OperatorBuilder::new(Scheme::Quick)
            .build(&grid, &VelocityField::uniform(0.4), 0.2, 1.0)
            .unwrap();

        assert_row(&operator, 0, &[1.0, 0.0, 0.0, 0.0, 0.0]);
        assert_row(&operator, 1, &[0.0, 1.0, 0.0, 0.0, 0.0]);
        assert_row(&operator, 2, &[-0.05, 0.55, 0.45, 0.05, 0.0]);
        assert_row(&operator, 3, &[0.0, -0.05, 0.55, 0.45, 0.05]);
        assert_row(&operator, 4, &[0.0, 0.0, 0.0, 0.0, 1.0]);
    }

    #[test]
    fn test_interior_rows_conserve_mass_locally() {
        // Each interior stencil sums to one: a uniform field is a fixed point
        let grid = Grid::build(0.0, 8.0, 1.0).unwrap();
        for scheme in [Scheme::Upwind, Scheme::Central, Scheme::Quick] {
            let diffusivity = if scheme == Scheme::Upwind { 0.0 } else { 0.1 };
            let operator = OperatorBuilder::new(scheme)
                .build(&grid, &VelocityField::uniform(0.3), diffusivity, 1.0)
                .unwrap();
            let field = DVector::from_element(8, 3.0);
            let next = operator.apply(&field);
            for value in next.iter() {
                assert_relative_eq!(*value, 3.0, epsilon = 1e-12);
            }
        }
    }

    #[test]
    fn test_banded_product_matches_dense_matrix() {
        let grid = Grid::build(0.0, 12.0, 1.0).unwrap();
        let field = DVector::from_fn(12, |i, _| (i as f64 * 0.71).cos().abs());
        for scheme in [Scheme::Upwind, Scheme::Central, Scheme::Quick] {
            let diffusivity = if scheme == Scheme::Upwind { 0.0 } else { 0.2 };
            let operator = OperatorBuilder::new(scheme)
                .build(&grid, &VelocityField::uniform(0.3), diffusivity, 1.0)
                .unwrap();

            let dense = operator.to_dense() * &field;
            let banded = operator.apply(&field);
            for (a, b) in dense.iter().zip(banded.iter()) {
                assert_relative_eq!(*a, *b, epsilon = 1e-12);
            }
        }
    }

    #[test]
    fn test_large_grid_stays_banded() {
        // A dense operator on this grid would need 320 GB
        let n = 200_000;
        let grid = Grid::build(0.0, n as f64, 1.0).unwrap();
        let operator = OperatorBuilder::new(Scheme::Quick)
            .build(&grid, &VelocityField::uniform(0.3), 0.2, 1.0)
            .unwrap();

        let next = operator.apply(&DVector::from_element(n, 2.0));
        assert_eq!(next.len(), n);
        assert_relative_eq!(next[n / 2], 2.0, epsilon = 1e-12);
        assert_eq!(operator.entry(n / 2, 0), 0.0);
    }

    #[test]
    fn test_quick_undershoots_below_zero() {
        // Stable (c = 0.3, s = 0.3) but the -c/8 weight pulls node 6 negative
        let grid = Grid::build(0.0, 10.0, 1.0).unwrap();
        let operator = OperatorBuilder::new(Scheme::Quick)
            .build(&grid, &VelocityField::uniform(0.3), 0.3, 1.0)
            .unwrap();
        let mut bump = DVector::zeros(10);
        bump[4] = 100.0;

        let next = operator.apply(&bump);
        assert_relative_eq!(next[6], -3.75, epsilon = 1e-12);
        assert!(next[3] > 0.0);
    }

    #[test]
    fn test_insufficient_nodes() {
        let one = Grid::build(0.0, 1.0, 1.0).unwrap();
        let two = Grid::build(0.0, 2.0, 1.0).unwrap();
        let v = VelocityField::uniform(0.1);

        assert!(matches!(
            OperatorBuilder::new(Scheme::Upwind).build(&one, &v, 0.0, 1.0),
            Err(ConfigurationError::InsufficientNodes { required: 2, actual: 1, .. })
        ));
        assert!(OperatorBuilder::new(Scheme::Upwind).build(&two, &v, 0.0, 1.0).is_ok());
        assert!(matches!(
            OperatorBuilder::new(Scheme::Quick).build(&two, &v, 0.1, 1.0),
            Err(ConfigurationError::InsufficientNodes { required: 3, actual: 2, .. })
        ));
    }

    #[test]
    fn test_scheme_preconditions() {
        let grid = Grid::build(0.0, 6.0, 1.0).unwrap();
        let zoned = VelocityField::zoned(0.1, vec![VelocityZone::new(2.0, 3.0, 0.2)]).unwrap();

        assert_eq!(
            OperatorBuilder::new(Scheme::Central).build(&grid, &zoned, 0.1, 1.0),
            Err(ConfigurationError::NonUniformVelocity { scheme: Scheme::Central })
        );
        assert_eq!(
            OperatorBuilder::new(Scheme::Upwind).build(&grid, &VelocityField::uniform(0.1), 0.5, 1.0),
            Err(ConfigurationError::DiffusivityWithUpwind(0.5))
        );
        assert!(matches!(
            OperatorBuilder::new(Scheme::Quick).build(&grid, &VelocityField::uniform(-0.1), 0.1, 1.0),
            Err(ConfigurationError::NegativeVelocity { node: 0, .. })
        ));
        // Central differences are symmetric in direction
        assert!(
            OperatorBuilder::new(Scheme::Central)
                .build(&grid, &VelocityField::uniform(-0.1), 0.1, 1.0)
                .is_ok()
        );
    }

    #[test]
    fn test_scheme_deserializes_lowercase() {
        let scheme: Scheme = serde_yaml::from_str("quick").unwrap();
        assert_eq!(scheme, Scheme::Quick);
        assert_eq!(Scheme::Central.to_string(), "central");
    }

    #[cfg(feature = "parallel")]
    #[test]
    fn test_parallel_product_matches_dense_matrix() {
        let _guard = crate::solver::ParallelThresholdGuard::replace(4);

        let grid = Grid::build(0.0, 64.0, 1.0).unwrap();
        let operator = OperatorBuilder::new(Scheme::Quick)
            .build(&grid, &VelocityField::uniform(0.3), 0.2, 1.0)
            .unwrap();
        let field = DVector::from_fn(64, |i, _| (i as f64 * 0.37).sin().abs());

        let dense = operator.to_dense() * &field;
        let banded = operator.apply(&field);
        for (a, b) in dense.iter().zip(banded.iter()) {
            assert_relative_eq!(*a, *b, epsilon = 1e-12);
        }
    }
}
