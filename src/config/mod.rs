//! Configuration system with YAML schema and validation.
//!
//! Implements Poka-Yoke (mistake-proofing) through:
//! - Type-safe configuration structs
//! - Schema validation via `validator`
//! - Runtime semantic validation (finite, strictly positive physics values)

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;
use validator::Validate;

use crate::error::{SimError, SimResult};
use crate::orbit::body::DEFAULT_MIN_SEPARATION;
use crate::orbit::jidoka::JidokaConfig;
use crate::orbit::kepler::{KeplerSolver, DEFAULT_KEPLER_MAX_ITERATIONS, DEFAULT_KEPLER_TOLERANCE};
use crate::orbit::trajectory::DEFAULT_TRAJECTORY_CAPACITY;
use crate::orbit::units::{SOLAR_MASS, SOLAR_RADIUS};

/// Top-level simulation configuration.
///
/// Loaded from YAML files with full schema validation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct SimConfig {
    /// Schema version for forward compatibility.
    #[validate(length(min = 1))]
    #[serde(default = "default_schema_version")]
    pub schema_version: String,

    /// Integration settings.
    #[validate(nested)]
    #[serde(default)]
    pub simulation: SimulationConfig,

    /// Reference mass every orbit is measured against.
    #[validate(nested)]
    #[serde(default)]
    pub central_body: CentralBodyConfig,

    /// Bodies registered at construction and on every reset.
    #[validate(nested)]
    #[serde(default)]
    pub bodies: Vec<BodySeed>,

    /// Kepler solver settings.
    #[validate(nested)]
    #[serde(default)]
    pub kepler: KeplerConfig,

    /// Jidoka (stop-on-error) configuration.
    #[serde(default)]
    pub jidoka: JidokaConfig,
}

fn default_schema_version() -> String {
    "1.0".to_string()
}

impl SimConfig {
    /// Load configuration from a YAML file.
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - File cannot be read
    /// - YAML parsing fails
    /// - Validation fails
    pub fn load<P: AsRef<Path>>(path: P) -> SimResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Parse configuration from YAML string.
    ///
    /// # Errors
    ///
    /// Returns error if parsing or validation fails.
    pub fn from_yaml(yaml: &str) -> SimResult<Self> {
        let config: Self = serde_yaml::from_str(yaml)?;
        config.check()?;
        Ok(config)
    }

    /// Run schema and semantic validation.
    ///
    /// # Errors
    ///
    /// Returns the first violated constraint.
    pub fn check(&self) -> SimResult<()> {
        // Poka-Yoke: validate all constraints
        self.validate()?;
        self.validate_semantic()
    }

    /// Create a builder for configuration.
    #[must_use]
    pub fn builder() -> SimConfigBuilder {
        SimConfigBuilder::default()
    }

    /// Validate semantic constraints beyond schema.
    fn validate_semantic(&self) -> SimResult<()> {
        let sim = &self.simulation;
        require_positive("simulation.time_step", sim.time_step)?;
        require_positive("simulation.speed_multiplier", sim.speed_multiplier)?;
        require_positive("simulation.effective_time_step", self.effective_time_step())?;
        require_positive("simulation.min_separation", sim.min_separation)?;
        require_positive("central_body.mass", self.central_body.mass)?;
        require_non_negative("central_body.radius", self.central_body.radius)?;
        require_positive("kepler.tolerance", self.kepler.tolerance)?;

        if self.jidoka.check_energy {
            require_positive("jidoka.energy_tolerance", self.jidoka.energy_tolerance)?;
        }

        // Names are compared the way the registry stores them: trimmed.
        let central = self.central_body.name.trim();
        if central.is_empty() {
            return Err(SimError::config("central_body.name must not be blank"));
        }
        let mut seen = HashSet::new();
        seen.insert(central);
        for seed in &self.bodies {
            let name = seed.name.trim();
            if name.is_empty() {
                return Err(SimError::config("bodies.name must not be blank"));
            }
            if !seen.insert(name) {
                return Err(SimError::config(format!("duplicate body name '{name}'")));
            }
            require_positive(&format!("bodies.{}.mass", seed.name), seed.mass)?;
            require_non_negative(&format!("bodies.{}.distance", seed.name), seed.distance)?;
            require_finite(&format!("bodies.{}.speed", seed.name), seed.speed)?;
            require_finite(&format!("bodies.{}.angle", seed.name), seed.angle)?;
            require_non_negative(&format!("bodies.{}.radius", seed.name), seed.radius)?;
        }

        Ok(())
    }

    /// Effective time step: `time_step × speed_multiplier` (s).
    #[must_use]
    pub fn effective_time_step(&self) -> f64 {
        self.simulation.time_step * self.simulation.speed_multiplier
    }
}

fn require_finite(field: &str, value: f64) -> SimResult<()> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(SimError::config(format!("{field} must be finite, got {value}")))
    }
}

fn require_positive(field: &str, value: f64) -> SimResult<()> {
    require_finite(field, value)?;
    if value > 0.0 {
        Ok(())
    } else {
        Err(SimError::config(format!("{field} must be positive, got {value}")))
    }
}

fn require_non_negative(field: &str, value: f64) -> SimResult<()> {
    require_finite(field, value)?;
    if value >= 0.0 {
        Ok(())
    } else {
        Err(SimError::config(format!("{field} must not be negative, got {value}")))
    }
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            schema_version: default_schema_version(),
            simulation: SimulationConfig::default(),
            central_body: CentralBodyConfig::default(),
            bodies: Vec::new(),
            kepler: KeplerConfig::default(),
            jidoka: JidokaConfig::default(),
        }
    }
}

/// Configuration builder for programmatic construction.
#[derive(Debug, Default)]
pub struct SimConfigBuilder {
    time_step: Option<f64>,
    speed_multiplier: Option<f64>,
    trajectory_capacity: Option<usize>,
    min_separation: Option<f64>,
    central_body: Option<CentralBodyConfig>,
    bodies: Vec<BodySeed>,
    jidoka: Option<JidokaConfig>,
}

impl SimConfigBuilder {
    /// Set the base time step in seconds.
    #[must_use]
    pub const fn time_step(mut self, dt: f64) -> Self {
        self.time_step = Some(dt);
        self
    }

    /// Set the time step multiplier.
    #[must_use]
    pub const fn speed_multiplier(mut self, multiplier: f64) -> Self {
        self.speed_multiplier = Some(multiplier);
        self
    }

    /// Set the per-body trajectory sample limit.
    #[must_use]
    pub const fn trajectory_capacity(mut self, capacity: usize) -> Self {
        self.trajectory_capacity = Some(capacity);
        self
    }

    /// Set the force evaluation distance floor in meters.
    #[must_use]
    pub const fn min_separation(mut self, meters: f64) -> Self {
        self.min_separation = Some(meters);
        self
    }

    /// Replace the central body.
    #[must_use]
    #[allow(clippy::missing_const_for_fn)] // String fields
    pub fn central_body(mut self, central: CentralBodyConfig) -> Self {
        self.central_body = Some(central);
        self
    }

    /// Add a default seed body.
    #[must_use]
    pub fn body(mut self, seed: BodySeed) -> Self {
        self.bodies.push(seed);
        self
    }

    /// Set Jidoka configuration.
    #[must_use]
    #[allow(clippy::missing_const_for_fn)] // JidokaConfig doesn't impl Copy
    pub fn jidoka(mut self, config: JidokaConfig) -> Self {
        self.jidoka = Some(config);
        self
    }

    /// Build the configuration.
    #[must_use]
    pub fn build(self) -> SimConfig {
        let mut config = SimConfig::default();

        if let Some(dt) = self.time_step {
            config.simulation.time_step = dt;
        }
        if let Some(multiplier) = self.speed_multiplier {
            config.simulation.speed_multiplier = multiplier;
        }
        if let Some(capacity) = self.trajectory_capacity {
            config.simulation.trajectory_capacity = capacity;
        }
        if let Some(floor) = self.min_separation {
            config.simulation.min_separation = floor;
        }
        if let Some(central) = self.central_body {
            config.central_body = central;
        }
        config.bodies = self.bodies;
        if let Some(jidoka) = self.jidoka {
            config.jidoka = jidoka;
        }

        config
    }
}

/// Integration settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct SimulationConfig {
    /// Base time step in seconds.
    #[serde(default = "default_time_step")]
    pub time_step: f64,
    /// Multiplier applied to the base time step.
    #[serde(default = "default_speed_multiplier")]
    pub speed_multiplier: f64,
    /// Samples kept per body.
    #[validate(range(min = 1))]
    #[serde(default = "default_trajectory_capacity")]
    pub trajectory_capacity: usize,
    /// Pair distance floor in meters.
    #[serde(default = "default_min_separation")]
    pub min_separation: f64,
}

const fn default_time_step() -> f64 {
    3600.0
}

const fn default_speed_multiplier() -> f64 {
    1.0
}

const fn default_trajectory_capacity() -> usize {
    DEFAULT_TRAJECTORY_CAPACITY
}

const fn default_min_separation() -> f64 {
    DEFAULT_MIN_SEPARATION
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            time_step: default_time_step(),
            speed_multiplier: default_speed_multiplier(),
            trajectory_capacity: default_trajectory_capacity(),
            min_separation: default_min_separation(),
        }
    }
}

/// Reference mass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct CentralBodyConfig {
    /// Body name.
    #[validate(length(min = 1))]
    #[serde(default = "default_central_name")]
    pub name: String,
    /// Mass in kg.
    #[serde(default = "default_central_mass")]
    pub mass: f64,
    /// Display radius in meters.
    #[serde(default = "default_central_radius")]
    pub radius: f64,
    /// Display color.
    #[serde(default = "default_central_color")]
    pub color: String,
}

fn default_central_name() -> String {
    "Sun".to_string()
}

const fn default_central_mass() -> f64 {
    SOLAR_MASS
}

const fn default_central_radius() -> f64 {
    SOLAR_RADIUS
}

fn default_central_color() -> String {
    "#FFD700".to_string()
}

impl Default for CentralBodyConfig {
    fn default() -> Self {
        Self {
            name: default_central_name(),
            mass: default_central_mass(),
            radius: default_central_radius(),
            color: default_central_color(),
        }
    }
}

/// A body placed on a circle-parameterized start in the XY plane.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct BodySeed {
    /// Unique name.
    #[validate(length(min = 1))]
    pub name: String,
    /// Mass in kg.
    pub mass: f64,
    /// Distance from the central body in meters.
    pub distance: f64,
    /// Tangential speed relative to the central body (m/s).
    pub speed: f64,
    /// Polar angle in degrees.
    #[serde(default)]
    pub angle: f64,
    /// Display radius in meters.
    #[serde(default)]
    pub radius: f64,
    /// Display color.
    #[serde(default = "default_body_color")]
    pub color: String,
}

fn default_body_color() -> String {
    "#ffffff".to_string()
}

/// Kepler solver settings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Validate)]
pub struct KeplerConfig {
    /// Newton step convergence threshold.
    #[serde(default = "default_kepler_tolerance")]
    pub tolerance: f64,
    /// Iteration cap.
    #[validate(range(min = 1))]
    #[serde(default = "default_kepler_max_iterations")]
    pub max_iterations: usize,
}

const fn default_kepler_tolerance() -> f64 {
    DEFAULT_KEPLER_TOLERANCE
}

const fn default_kepler_max_iterations() -> usize {
    DEFAULT_KEPLER_MAX_ITERATIONS
}

impl KeplerConfig {
    /// Solver built from these settings.
    #[must_use]
    pub const fn solver(&self) -> KeplerSolver {
        KeplerSolver::new(self.tolerance, self.max_iterations)
    }
}

impl Default for KeplerConfig {
    fn default() -> Self {
        Self {
            tolerance: default_kepler_tolerance(),
            max_iterations: default_kepler_max_iterations(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn earth_seed() -> BodySeed {
        BodySeed {
            name: "Earth".to_string(),
            mass: 5.9722e24,
            distance: 1.495_978_707e11,
            speed: 29_780.0,
            angle: 0.0,
            radius: 6.371e6,
            color: "#2E86DE".to_string(),
        }
    }

    #[test]
    fn test_config_defaults() {
        let config = SimConfig::default();

        assert_eq!(config.schema_version, "1.0");
        assert!((config.simulation.time_step - 3600.0).abs() < f64::EPSILON);
        assert!((config.simulation.speed_multiplier - 1.0).abs() < f64::EPSILON);
        assert_eq!(config.simulation.trajectory_capacity, 1000);
        assert!((config.simulation.min_separation - 1.0).abs() < f64::EPSILON);
        assert_eq!(config.central_body.name, "Sun");
        assert_eq!(config.central_body.color, "#FFD700");
        assert!(config.bodies.is_empty());
        assert!(config.check().is_ok());
    }

    #[test]
    fn test_config_builder() {
        let config = SimConfig::builder()
            .time_step(60.0)
            .speed_multiplier(10.0)
            .trajectory_capacity(16)
            .min_separation(1e3)
            .body(earth_seed())
            .build();

        assert!((config.effective_time_step() - 600.0).abs() < f64::EPSILON);
        assert_eq!(config.simulation.trajectory_capacity, 16);
        assert!((config.simulation.min_separation - 1e3).abs() < f64::EPSILON);
        assert_eq!(config.bodies.len(), 1);
        assert!(config.check().is_ok());
    }

    #[test]
    fn test_config_yaml_parse() {
        let yaml = r##"
schema_version: "1.0"
simulation:
  time_step: 600.0
  speed_multiplier: 2.0
central_body:
  name: Sol
  mass: 1.98892e30
bodies:
  - { name: Earth, mass: 5.9722e24, distance: 1.495978707e11, speed: 29780.0, color: "#2E86DE" }
kepler:
  tolerance: 1.0e-10
  max_iterations: 100
jidoka:
  check_energy: false
"##;
        let config = SimConfig::from_yaml(yaml).expect("valid config");

        assert!((config.simulation.time_step - 600.0).abs() < f64::EPSILON);
        assert_eq!(config.simulation.trajectory_capacity, 1000);
        assert_eq!(config.central_body.name, "Sol");
        assert!((config.central_body.radius - SOLAR_RADIUS).abs() < f64::EPSILON);
        assert_eq!(config.bodies[0].name, "Earth");
        assert!((config.bodies[0].angle).abs() < f64::EPSILON);
        assert_eq!(config.kepler.solver().max_iterations, 100);
        assert!(!config.jidoka.check_energy);
        assert!(config.jidoka.check_finite);
    }

    #[test]
    fn test_config_empty_yaml_uses_defaults() {
        let config = SimConfig::from_yaml("{}").expect("defaults");
        assert_eq!(config, SimConfig::default());
    }

    #[test]
    fn test_config_rejects_unknown_fields() {
        let result = SimConfig::from_yaml("integrator: rk4\n");
        assert!(matches!(result, Err(SimError::YamlParse(_))));
    }

    #[test]
    fn test_config_validation_fails_negative_timestep() {
        let yaml = r"
simulation:
  time_step: -1.0
";
        let err = SimConfig::from_yaml(yaml).unwrap_err();
        assert!(err.to_string().contains("time_step"));
    }

    #[test]
    fn test_config_validation_fails_zero_multiplier() {
        let config = SimConfig::builder().speed_multiplier(0.0).build();
        assert!(config.check().is_err());
    }

    #[test]
    fn test_config_validation_fails_zero_capacity() {
        let yaml = r"
simulation:
  trajectory_capacity: 0
";
        let result = SimConfig::from_yaml(yaml);
        assert!(matches!(result, Err(SimError::Validation(_))));
    }

    #[test]
    fn test_config_validation_fails_empty_central_name() {
        let yaml = r#"
central_body:
  name: ""
"#;
        assert!(matches!(
            SimConfig::from_yaml(yaml),
            Err(SimError::Validation(_))
        ));
    }

    #[test]
    fn test_config_validation_fails_bad_seed() {
        let mut seed = earth_seed();
        seed.mass = 0.0;
        let config = SimConfig::builder().body(seed).build();
        let err = config.check().unwrap_err();
        assert!(err.to_string().contains("bodies.Earth.mass"));

        let mut seed = earth_seed();
        seed.distance = f64::NAN;
        let config = SimConfig::builder().body(seed).build();
        assert!(config.check().is_err());
    }

    #[test]
    fn test_config_validation_fails_duplicate_names() {
        let config = SimConfig::builder().body(earth_seed()).body(earth_seed()).build();
        let err = config.check().unwrap_err();
        assert!(err.to_string().contains("duplicate body name"));

        let mut shadow = earth_seed();
        shadow.name = "Sun".to_string();
        let config = SimConfig::builder().body(shadow).build();
        assert!(config.check().is_err());
    }

    #[test]
    fn test_config_duplicate_detection_ignores_padding() {
        let yaml = r#"
bodies:
  - name: Earth
    mass: 5.972e24
    distance: 1.496e11
    speed: 29780.0
  - name: " Earth"
    mass: 5.972e24
    distance: 1.496e11
    speed: 29780.0
    angle: 180.0
"#;
        let err = SimConfig::from_yaml(yaml).unwrap_err();
        assert!(err.to_string().contains("duplicate body name 'Earth'"));

        let mut shadow = earth_seed();
        shadow.name = "Sun  ".to_string();
        let config = SimConfig::builder().body(shadow).build();
        assert!(config.check().is_err());
    }

    #[test]
    fn test_config_validation_fails_blank_names() {
        let mut blank = earth_seed();
        blank.name = "   ".to_string();
        let config = SimConfig::builder().body(blank).build();
        let err = config.check().unwrap_err();
        assert!(err.to_string().contains("must not be blank"));

        let yaml = r#"
central_body:
  name: "  "
"#;
        assert!(matches!(
            SimConfig::from_yaml(yaml),
            Err(SimError::Config { .. })
        ));
    }

    #[test]
    fn test_config_validation_fails_overflowing_effective_step() {
        let config = SimConfig::builder()
            .time_step(1e200)
            .speed_multiplier(1e200)
            .build();
        let err = config.check().unwrap_err();
        assert!(err.to_string().contains("simulation.effective_time_step"));
    }

    #[test]
    fn test_config_load_missing_file() {
        let result = SimConfig::load("/nonexistent/orbsim.yaml");
        assert!(matches!(result, Err(SimError::Io(_))));
    }

    #[test]
    fn test_config_yaml_roundtrip() {
        let config = SimConfig::builder().body(earth_seed()).build();
        let yaml = serde_yaml::to_string(&config).expect("serialize");
        let parsed = SimConfig::from_yaml(&yaml).expect("parse");
        assert_eq!(parsed, config);
    }
}
