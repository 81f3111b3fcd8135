//! Stability gate for the explicit schemes
//!
//! # Dimensionless numbers
//!
//! ```text
//! courant_i = dt · u_i / dx          (per node)
//! s         = dt · D / dx²           (diffusion number)
//! ```
//!
//! # Criteria
//!
//! - **Advection (CFL)**: `max |courant_i| <= 1`. The donor-cell scheme is
//!   monotone only in this range.
//! - **Dispersion** (only when `D > 0`): `courant² <= 2·s`, the von Neumann
//!   necessary condition for the central/QUICK stencils.
//! - **Damping** (only when `D > 0`): `s + courant/4 <= 0.5`.
//!
//! For the two diffusion criteria `courant` is taken at the largest
//! velocity magnitude on the grid.
//!
//! These are necessary-but-not-sufficient heuristics. Any violation makes
//! the verdict unstable and the simulator refuses to run.

use std::collections::BTreeSet;
use std::fmt;

use crate::physics::{Grid, VelocityField};

/// Which stability criterion failed
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ViolationKind {
    /// `max |courant| > 1`
    Advection,
    /// `courant² > 2·s` ("Unstable #1")
    Dispersion,
    /// `s + courant/4 > 0.5` ("Unstable #2")
    Damping,
}

impl fmt::Display for ViolationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Advection => write!(f, "courant number exceeds 1"),
            Self::Dispersion => write!(f, "courant² exceeds 2·s"),
            Self::Damping => write!(f, "s + courant/4 exceeds 0.5"),
        }
    }
}

/// Outcome of a stability check
#[derive(Debug, Clone, PartialEq)]
pub struct StabilityVerdict {
    pub stable: bool,
    pub reasons: BTreeSet<ViolationKind>,
    /// Largest |courant| over all nodes
    pub max_courant: f64,
    /// Diffusion number `s` (0 when diffusion is off)
    pub diffusion_number: f64,
}

impl fmt::Display for StabilityVerdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let status = if self.stable { "stable" } else { "unstable" };
        write!(
            f,
            "{} (courant = {:.4}, s = {:.4}",
            status, self.max_courant, self.diffusion_number
        )?;
        for reason in &self.reasons {
            write!(f, "; {}", reason)?;
        }
        write!(f, ")")
    }
}

/// Computes Courant / diffusion numbers and the stability verdict
#[derive(Debug, Clone, Copy, Default)]
pub struct StabilityChecker;

impl StabilityChecker {
    /// Courant number for a single velocity
    #[inline]
    pub fn courant(dt: f64, dx: f64, velocity: f64) -> f64 {
        dt * velocity / dx
    }

    /// Diffusion number `s = dt·D/dx²`
    #[inline]
    pub fn diffusion_number(dt: f64, dx: f64, diffusivity: f64) -> f64 {
        dt * diffusivity / (dx * dx)
    }

    /// Check both criteria for a run on `grid`
    ///
    /// # Example
    ///
    /// ```rust
    /// use plume_rs::physics::{Grid, VelocityField};
    /// use plume_rs::solver::{StabilityChecker, ViolationKind};
    ///
    /// let grid = Grid::build(0.0, 1.0, 0.1).unwrap();
    /// let verdict = StabilityChecker::check(1.0, &grid, &VelocityField::uniform(1.0), 0.0);
    ///
    /// assert!(!verdict.stable);
    /// assert!(verdict.reasons.contains(&ViolationKind::Advection));
    /// ```
    pub fn check(
        dt: f64,
        grid: &Grid,
        velocity: &VelocityField,
        diffusivity: f64,
    ) -> StabilityVerdict {
        let dx = grid.spacing();
        let max_courant = Self::courant(dt, dx, velocity.max_magnitude(grid));
        Self::check_numbers(max_courant, Self::diffusion_number(dt, dx, diffusivity), diffusivity > 0.0)
    }

    /// Apply the criteria to precomputed numbers
    ///
    /// `max_courant` is the largest |courant| on the grid and is also used
    /// as the representative value for the diffusion criteria.
    pub fn check_numbers(max_courant: f64, s: f64, diffusive: bool) -> StabilityVerdict {
        let mut reasons = BTreeSet::new();

        // Written so that a NaN number counts as a violation
        if !(max_courant <= 1.0) {
            reasons.insert(ViolationKind::Advection);
        }

        if diffusive {
            if !(max_courant * max_courant <= 2.0 * s) {
                reasons.insert(ViolationKind::Dispersion);
            }
            if !(s + max_courant / 4.0 <= 0.5) {
                reasons.insert(ViolationKind::Damping);
            }
        }

        StabilityVerdict {
            stable: reasons.is_empty(),
            reasons,
            max_courant,
            diffusion_number: if diffusive { s } else { 0.0 },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::physics::VelocityZone;

    #[test]
    fn test_advection_only_stable() {
        let grid = Grid::build(0.0, 10.0, 1.0).unwrap();
        let verdict = StabilityChecker::check(1.0, &grid, &VelocityField::uniform(0.5), 0.0);
        assert!(verdict.stable);
        assert!(verdict.reasons.is_empty());
        assert_eq!(verdict.max_courant, 0.5);
        assert_eq!(verdict.diffusion_number, 0.0);
    }

    #[test]
    fn test_advection_only_unstable() {
        let grid = Grid::build(0.0, 1.0, 0.1).unwrap();
        let verdict = StabilityChecker::check(1.0, &grid, &VelocityField::uniform(1.0), 0.0);
        assert!(!verdict.stable);
        assert_eq!(verdict.reasons, BTreeSet::from([ViolationKind::Advection]));
        assert!((verdict.max_courant - 10.0).abs() < 1e-9);
    }

    #[test]
    fn test_courant_of_one_is_stable() {
        let verdict = StabilityChecker::check_numbers(1.0, 0.0, false);
        assert!(verdict.stable);
    }

    #[test]
    fn test_zoned_field_uses_fastest_zone() {
        let grid = Grid::build(0.0, 10.0, 1.0).unwrap();
        let velocity =
            VelocityField::zoned(0.5, vec![VelocityZone::new(4.0, 6.0, 1.5)]).unwrap();
        let verdict = StabilityChecker::check(1.0, &grid, &velocity, 0.0);
        assert!(!verdict.stable);
        assert_eq!(verdict.max_courant, 1.5);
    }

    #[test]
    fn test_dispersion_criterion() {
        // courant = 0.5, s = 0.1 → courant² = 0.25 > 0.2
        let verdict = StabilityChecker::check_numbers(0.5, 0.1, true);
        assert!(!verdict.stable);
        assert!(verdict.reasons.contains(&ViolationKind::Dispersion));
        assert!(!verdict.reasons.contains(&ViolationKind::Damping));
    }

    #[test]
    fn test_damping_criterion() {
        // courant = 0.4, s = 0.45 → 0.45 + 0.1 = 0.55 > 0.5
        let verdict = StabilityChecker::check_numbers(0.4, 0.45, true);
        assert!(!verdict.stable);
        assert_eq!(verdict.reasons, BTreeSet::from([ViolationKind::Damping]));
    }

    #[test]
    fn test_diffusive_window_is_stable() {
        // courant = 0.2, s = 0.3 → 0.04 <= 0.6 and 0.35 <= 0.5
        let grid = Grid::build(0.0, 10.0, 1.0).unwrap();
        let verdict = StabilityChecker::check(1.0, &grid, &VelocityField::uniform(0.2), 0.3);
        assert!(verdict.stable, "{}", verdict);
        assert!((verdict.diffusion_number - 0.3).abs() < 1e-12);
    }

    #[test]
    fn test_nan_is_unstable() {
        let verdict = StabilityChecker::check_numbers(f64::NAN, 0.0, false);
        assert!(!verdict.stable);
    }

    #[test]
    fn test_display_lists_reasons() {
        let verdict = StabilityChecker::check_numbers(2.0, 0.0, false);
        assert_eq!(
            verdict.to_string(),
            "unstable (courant = 2.0000, s = 0.0000; courant number exceeds 1)"
        );
    }
}
