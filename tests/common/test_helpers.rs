//! Helper functions for integration tests

use nalgebra::DVector;
use plume_rs::physics::{Grid, InitialCondition, SourceSpec, VelocityField};
use plume_rs::solver::Scenario;

/// Assert that two fields are close (within tolerance) node by node
pub fn assert_fields_close(actual: &DVector<f64>, expected: &DVector<f64>, tolerance: f64, message: &str) {
    assert_eq!(actual.len(), expected.len(), "{}: Dimension mismatch", message);

    for (i, (&a, &e)) in actual.iter().zip(expected.iter()).enumerate() {
        let diff = (a - e).abs();
        assert!(
            diff < tolerance,
            "{}: node {} differs by {} (tolerance {})",
            message, i, diff, tolerance
        );
    }
}

/// Compute relative error: |actual - expected| / |expected|
pub fn relative_error(actual: f64, expected: f64) -> f64 {
    if expected.abs() < 1e-10 {
        (actual - expected).abs()
    } else {
        (actual - expected).abs() / expected.abs()
    }
}

/// `nodes` nodes spaced 1 apart, uniform velocity, no initial load
pub fn uniform_scenario(nodes: usize, velocity: f64, source: SourceSpec) -> Scenario {
    let grid = Grid::build(0.0, nodes as f64, 1.0).expect("valid grid");
    Scenario::new(grid, VelocityField::uniform(velocity), source)
}

/// Initial field with `height` at `center` and zero elsewhere
pub fn bump(nodes: usize, center: usize, height: f64) -> InitialCondition {
    let mut profile = DVector::zeros(nodes);
    profile[center] = height;
    InitialCondition::Profile(profile)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_relative_error() {
        assert!((relative_error(1.0, 1.0) - 0.0).abs() < 1e-10);
        assert!((relative_error(1.1, 1.0) - 0.1).abs() < 1e-10);
        assert!((relative_error(0.9, 1.0) - 0.1).abs() < 1e-10);
    }

    #[test]
    fn test_uniform_scenario_shape() {
        let scenario = uniform_scenario(5, 0.3, SourceSpec::none());
        assert_eq!(scenario.node_count(), 5);
    }
}
