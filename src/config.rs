//! Declarative run description
//!
//! A whole run can be described in YAML and turned into a
//! [`Scenario`] + [`SimulationConfiguration`] pair. Every field has a
//! default, so a partial file only overrides what it names. The defaults
//! reproduce the spatially varying Loop Current run: velocities given in
//! m/s and converted to m/year, stepped over years.
//!
//! ```yaml
//! grid:
//!   origin: 1.0
//!   extent: 402336000.0
//!   spacing: 12614400.0
//! velocity:
//!   default: 0.8          # m/s
//!   per_second: true
//!   zones:
//!     - { start: 1.0e8, end: 1.5e8, value: 1.6 }
//! source:
//!   node: 1
//!   rate: 60000.0
//! run:
//!   dt: 0.1388888
//!   start_time: 1.0
//!   total_time: 8.0
//!   scheme: upwind
//! ```

use std::path::Path;

use serde::Deserialize;

use crate::error::{ConfigResult, ConfigurationError};
use crate::physics::{units, Grid, InitialCondition, SourceSpec, VelocityField, VelocityZone};
use crate::solver::{Scenario, Scheme, SimulationConfiguration, DEFAULT_SATURATION_WARNING_STEPS};

/// Full run description
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct TransportConfig {
    pub grid: GridConfig,
    pub velocity: VelocityConfig,
    pub source: SourceConfig,
    pub initial: InitialConfig,
    pub run: RunConfig,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct GridConfig {
    pub origin: f64,
    pub extent: f64,
    pub spacing: f64,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ZoneConfig {
    pub start: f64,
    pub end: f64,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct VelocityConfig {
    pub default: f64,
    pub zones: Vec<ZoneConfig>,
    /// Values are in length/second and are converted to length/year
    pub per_second: bool,
}

/// Source placement: by node index, or by position when `position` is set
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    pub node: usize,
    pub position: Option<f64>,
    pub rate: f64,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct InitialConfig {
    /// Nodes at or before this position start at `value`
    pub up_to: f64,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    pub dt: f64,
    pub start_time: f64,
    pub total_time: f64,
    pub diffusivity: f64,
    /// Diffusivity is in length²/second and is converted to length²/year
    pub diffusivity_per_second: bool,
    pub scheme: Scheme,
    pub ceiling: Option<f64>,
    pub record_every: Option<usize>,
    pub saturation_warning_steps: usize,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            grid: GridConfig::default(),
            velocity: VelocityConfig::default(),
            source: SourceConfig::default(),
            initial: InitialConfig::default(),
            run: RunConfig::default(),
        }
    }
}

/// Grid of the default run, in metres
///
/// The first node sits at x = 1 so that the default initial step
/// (`up_to: 1.0`) loads node 0. A grid whose first node lies beyond 1 m
/// (for instance one laid out in kilometres and scaled to metres, starting
/// at 1000) would start from an empty domain with the same initial config.
impl Default for GridConfig {
    fn default() -> Self {
        Self {
            origin: 1.0,
            extent: 402_336_000.0,
            spacing: 12_614_400.0,
        }
    }
}

impl Default for VelocityConfig {
    fn default() -> Self {
        Self {
            default: 0.8,
            zones: vec![
                ZoneConfig { start: 1.0e8, end: 1.5e8, value: 1.6 },
                ZoneConfig { start: 2.0e8, end: 2.5e8, value: 1.8 },
                ZoneConfig { start: 3.0e8, end: 3.5e8, value: 1.0 },
            ],
            per_second: true,
        }
    }
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            node: 1,
            position: None,
            rate: 60_000.0,
        }
    }
}

impl Default for InitialConfig {
    fn default() -> Self {
        Self {
            up_to: 1.0,
            value: 60_000.0,
        }
    }
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            dt: 0.25 / 1.8,
            start_time: 1.0,
            total_time: 8.0,
            diffusivity: 0.0,
            diffusivity_per_second: true,
            scheme: Scheme::Upwind,
            ceiling: Some(units::per_second_to_per_year(0.8)),
            record_every: None,
            saturation_warning_steps: DEFAULT_SATURATION_WARNING_STEPS,
        }
    }
}

impl TransportConfig {
    /// Parse a YAML document
    pub fn from_yaml_str(yaml: &str) -> ConfigResult<Self> {
        serde_yaml::from_str(yaml).map_err(|e| ConfigurationError::Parse(e.to_string()))
    }

    /// Read and parse a YAML file
    pub fn load(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ConfigurationError::Io(format!("{}: {}", path.display(), e)))?;
        Self::from_yaml_str(&contents)
    }

    /// Build the velocity field, converting units if requested
    pub fn velocity_field(&self) -> ConfigResult<VelocityField> {
        let convert = |v: f64| {
            if self.velocity.per_second {
                units::per_second_to_per_year(v)
            } else {
                v
            }
        };

        if self.velocity.zones.is_empty() {
            let field = VelocityField::uniform(convert(self.velocity.default));
            field.validate()?;
            return Ok(field);
        }

        let zones = self
            .velocity
            .zones
            .iter()
            .map(|z| VelocityZone::new(z.start, z.end, convert(z.value)))
            .collect();
        VelocityField::zoned(convert(self.velocity.default), zones)
    }

    /// Turn the description into a runnable pair
    ///
    /// Only structural checks happen here; stability is decided by
    /// [`Simulator::configure`](crate::solver::Simulator::configure).
    pub fn build(&self) -> ConfigResult<(Scenario, SimulationConfiguration)> {
        let grid = Grid::build(self.grid.origin, self.grid.extent, self.grid.spacing)?;
        let velocity = self.velocity_field()?;

        let source = match self.source.position {
            Some(x) => SourceSpec::at_position(&grid, x, self.source.rate),
            None => SourceSpec::point(self.source.node, self.source.rate),
        };

        let initial = if self.initial.value == 0.0 {
            InitialCondition::Zero
        } else {
            InitialCondition::Step {
                up_to: self.initial.up_to,
                value: self.initial.value,
            }
        };

        let scenario = Scenario::new(grid, velocity, source).with_initial(initial);
        scenario.validate()?;

        let run = &self.run;
        let diffusivity = if run.diffusivity_per_second {
            units::per_second_to_per_year(run.diffusivity)
        } else {
            run.diffusivity
        };

        let mut config = SimulationConfiguration::new(run.dt, run.total_time)
            .with_start_time(run.start_time)
            .with_diffusivity(diffusivity)
            .with_scheme(run.scheme)
            .with_saturation_warning_steps(run.saturation_warning_steps);
        config.ceiling = run.ceiling;
        config.record_every = run.record_every;
        config.validate()?;

        Ok((scenario, config))
    }
}
