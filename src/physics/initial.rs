//! Initial concentration profiles
//!
//! Defines C(x, t = t₀), the field the simulator starts from.

use nalgebra::DVector;

use crate::error::{ConfigResult, ConfigurationError};
use crate::physics::Grid;

/// Initial concentration over the grid
///
/// # Example
///
/// ```rust
/// use plume_rs::physics::{Grid, InitialCondition};
///
/// let grid = Grid::build(0.0, 5.0, 1.0).unwrap();
/// let field = InitialCondition::Step { up_to: 1.0, value: 60_000.0 }
///     .build(&grid)
///     .unwrap();
///
/// assert_eq!(field.as_slice(), &[60_000.0, 60_000.0, 0.0, 0.0, 0.0]);
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub enum InitialCondition {
    /// Clean domain
    #[default]
    Zero,

    /// Same concentration at every node
    Uniform(f64),

    /// `value` at every node with position `<= up_to`, zero beyond
    Step { up_to: f64, value: f64 },

    /// Explicit per-node values
    Profile(DVector<f64>),
}

impl InitialCondition {
    /// Materialize the profile on `grid`
    ///
    /// # Errors
    ///
    /// - [`ConfigurationError::ProfileLength`] if a `Profile` does not match the grid
    /// - [`ConfigurationError::InvalidInitialValue`] for negative or non-finite values
    pub fn build(&self, grid: &Grid) -> ConfigResult<DVector<f64>> {
        let n = grid.node_count();

        let field = match self {
            Self::Zero => DVector::zeros(n),
            Self::Uniform(value) => DVector::from_element(n, *value),
            Self::Step { up_to, value } => {
                grid.positions().map(|x| if x <= *up_to { *value } else { 0.0 })
            }
            Self::Profile(values) => {
                if values.len() != n {
                    return Err(ConfigurationError::ProfileLength {
                        expected: n,
                        actual: values.len(),
                    });
                }
                values.clone()
            }
        };

        if let Some((node, value)) = field
            .iter()
            .enumerate()
            .find(|(_, v)| !v.is_finite() || **v < 0.0)
        {
            return Err(ConfigurationError::InvalidInitialValue { node, value: *value });
        }

        Ok(field)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_and_uniform() {
        let grid = Grid::build(0.0, 4.0, 1.0).unwrap();
        assert_eq!(InitialCondition::Zero.build(&grid).unwrap(), DVector::zeros(4));
        assert_eq!(
            InitialCondition::Uniform(2.0).build(&grid).unwrap(),
            DVector::from_element(4, 2.0)
        );
    }

    #[test]
    fn test_profile_length_checked() {
        let grid = Grid::build(0.0, 4.0, 1.0).unwrap();
        let profile = InitialCondition::Profile(DVector::from_vec(vec![1.0, 2.0]));
        assert_eq!(
            profile.build(&grid),
            Err(ConfigurationError::ProfileLength { expected: 4, actual: 2 })
        );
    }

    #[test]
    fn test_negative_value_rejected() {
        let grid = Grid::build(0.0, 3.0, 1.0).unwrap();
        let profile = InitialCondition::Profile(DVector::from_vec(vec![1.0, -2.0, 0.0]));
        assert_eq!(
            profile.build(&grid),
            Err(ConfigurationError::InvalidInitialValue { node: 1, value: -2.0 })
        );
    }
}
