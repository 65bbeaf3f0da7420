//! Simulation orchestration.
//!
//! [`SimulationState`] owns the body registry, trajectory history and run
//! state behind plain `&mut self` methods. [`Simulator`] wraps it in a
//! single mutex so one instance can be shared through an `Arc`; every
//! operation holds the lock for its whole duration.
//!
//! The first registered body is the central mass. It is integrated like
//! any other body, but orbital elements and trajectories are measured
//! relative to it.

use indexmap::IndexMap;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};
use uom::si::angle::{degree, radian};
use uom::si::f64::{Angle, Length, Mass, Velocity};
use uom::si::length::meter;
use uom::si::mass::kilogram;
use uom::si::velocity::meter_per_second;

use crate::config::{BodySeed, SimConfig};
use crate::error::{SimError, SimResult};
use crate::orbit::body::{kinetic_energy, potential_energy, Body};
use crate::orbit::jidoka::{JidokaGuard, JidokaResponse, JidokaStatus};
use crate::orbit::kepler::{KeplerSolver, OrbitalElements};
use crate::orbit::physics::VerletIntegrator;
use crate::orbit::trajectory::{Trajectory, TrajectorySample};
use crate::orbit::units::{Vector3, G};

/// Version tag carried by every [`Snapshot`].
pub const SNAPSHOT_SCHEMA_VERSION: &str = "1.0";

/// Request to register a body on a circular-parameterized start.
///
/// The body is placed `distance` from the central body at polar angle
/// `angle` in the XY plane, moving tangentially (counter-clockwise) at
/// `speed` relative to the central body.
#[derive(Debug, Clone, PartialEq)]
pub struct BodyRequest {
    pub name: String,
    pub mass: Mass,
    pub distance: Length,
    pub speed: Velocity,
    pub angle: Angle,
    pub radius: Length,
    pub color: String,
}

impl BodyRequest {
    /// Build a request from raw SI values; `angle_degrees` is in degrees.
    #[must_use]
    pub fn si(
        name: impl Into<String>,
        mass_kg: f64,
        distance_m: f64,
        speed_mps: f64,
        angle_degrees: f64,
    ) -> Self {
        Self {
            name: name.into(),
            mass: Mass::new::<kilogram>(mass_kg),
            distance: Length::new::<meter>(distance_m),
            speed: Velocity::new::<meter_per_second>(speed_mps),
            angle: Angle::new::<degree>(angle_degrees),
            radius: Length::new::<meter>(0.0),
            color: "#ffffff".to_string(),
        }
    }

    /// Set display radius in meters.
    #[must_use]
    pub fn with_radius(mut self, meters: f64) -> Self {
        self.radius = Length::new::<meter>(meters);
        self
    }

    /// Set display color.
    #[must_use]
    pub fn with_color(mut self, color: impl Into<String>) -> Self {
        self.color = color.into();
        self
    }
}

impl From<&BodySeed> for BodyRequest {
    fn from(seed: &BodySeed) -> Self {
        Self::si(&seed.name, seed.mass, seed.distance, seed.speed, seed.angle)
            .with_radius(seed.radius)
            .with_color(&seed.color)
    }
}

/// Run state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunState {
    /// Steps are ignored.
    Stopped,
    /// Steps advance the system.
    Running,
}

/// Boundary view of one body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BodyView {
    pub name: String,
    pub mass: f64,
    pub position: Vector3,
    pub velocity: Vector3,
    pub acceleration: Vector3,
    pub radius: f64,
    pub color: String,
}

impl From<&Body> for BodyView {
    fn from(body: &Body) -> Self {
        Self {
            name: body.name.clone(),
            mass: body.mass,
            position: body.position,
            velocity: body.velocity,
            acceleration: body.acceleration,
            radius: body.radius,
            color: body.color.clone(),
        }
    }
}

/// Point-in-time copy of the whole system.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub schema_version: String,
    /// Elapsed simulated time (s).
    pub time: f64,
    pub running: bool,
    /// Bodies in registration order, central body first.
    pub bodies: Vec<BodyView>,
}

/// Energy of one orbiting body relative to the central mass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BodyEnergy {
    pub name: String,
    pub kinetic: f64,
    pub potential_to_central: f64,
    pub total: f64,
}

/// System energy accounting (J).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnergyReport {
    pub kinetic: f64,
    /// Sum over unique pairs.
    pub potential: f64,
    pub total: f64,
    /// Non-central bodies only.
    pub bodies: Vec<BodyEnergy>,
}

/// Single-threaded simulation state.
#[derive(Debug, Clone)]
pub struct SimulationState {
    config: SimConfig,
    bodies: Vec<Body>,
    trajectories: IndexMap<String, Trajectory>,
    time: f64,
    step_count: u64,
    running: bool,
    integrator: VerletIntegrator,
    solver: KeplerSolver,
    guard: JidokaGuard,
}

impl SimulationState {
    /// Create a stopped simulation seeded from `config`.
    ///
    /// # Errors
    ///
    /// Returns error if the configuration fails validation.
    pub fn new(config: SimConfig) -> SimResult<Self> {
        config.check()?;

        let mut state = Self {
            integrator: VerletIntegrator::new(config.simulation.min_separation),
            solver: config.kepler.solver(),
            guard: JidokaGuard::new(config.jidoka.clone()),
            config,
            bodies: Vec::new(),
            trajectories: IndexMap::new(),
            time: 0.0,
            step_count: 0,
            running: false,
        };
        state.seed()?;
        Ok(state)
    }

    fn seed(&mut self) -> SimResult<()> {
        let central = &self.config.central_body;
        let sun = Body::new(central.name.trim(), central.mass, Vector3::zero(), Vector3::zero())
            .with_radius(central.radius)
            .with_color(&central.color);
        self.bodies.push(sun);

        let seeds: Vec<BodyRequest> = self.config.bodies.iter().map(BodyRequest::from).collect();
        for request in seeds {
            self.add_body(request)?;
        }

        self.guard
            .initialize(&self.bodies, self.integrator.min_separation());
        Ok(())
    }

    /// Configuration this state was built from.
    #[must_use]
    pub const fn config(&self) -> &SimConfig {
        &self.config
    }

    /// Elapsed simulated time (s).
    #[must_use]
    pub const fn time(&self) -> f64 {
        self.time
    }

    /// Steps taken since construction or the last reset.
    #[must_use]
    pub const fn step_count(&self) -> u64 {
        self.step_count
    }

    /// Current run state.
    #[must_use]
    pub const fn run_state(&self) -> RunState {
        if self.running {
            RunState::Running
        } else {
            RunState::Stopped
        }
    }

    /// Registered bodies, central body first.
    #[must_use]
    pub fn bodies(&self) -> &[Body] {
        &self.bodies
    }

    /// Latest Jidoka status.
    #[must_use]
    pub fn jidoka_status(&self) -> &JidokaStatus {
        self.guard.status()
    }

    fn index_of(&self, name: &str) -> SimResult<usize> {
        self.bodies
            .iter()
            .position(|body| body.name == name)
            .ok_or_else(|| SimError::not_found(name))
    }

    fn central(&self) -> SimResult<&Body> {
        self.bodies
            .first()
            .ok_or_else(|| SimError::not_found(&self.config.central_body.name))
    }

    /// Register a new body relative to the central body.
    ///
    /// # Errors
    ///
    /// - [`SimError::Config`] for an empty name or a negative, non-finite
    ///   distance, speed or angle.
    /// - [`SimError::DuplicateName`] if the name is taken.
    /// - [`SimError::InvalidMass`] if mass is not finite and positive.
    pub fn add_body(&mut self, request: BodyRequest) -> SimResult<BodyView> {
        let name = request.name.trim();
        if name.is_empty() {
            return Err(SimError::config("body name must not be empty"));
        }
        if self.bodies.iter().any(|body| body.name == name) {
            return Err(SimError::DuplicateName {
                name: name.to_string(),
            });
        }

        let mass = request.mass.get::<kilogram>();
        if !(mass.is_finite() && mass > 0.0) {
            return Err(SimError::InvalidMass {
                name: name.to_string(),
                mass,
            });
        }

        let distance = request.distance.get::<meter>();
        if !(distance.is_finite() && distance >= 0.0) {
            return Err(SimError::config(format!(
                "distance for '{name}' must be finite and non-negative, got {distance}"
            )));
        }
        let speed = request.speed.get::<meter_per_second>();
        let theta = request.angle.get::<radian>();
        if !(speed.is_finite() && theta.is_finite()) {
            return Err(SimError::config(format!(
                "speed and angle for '{name}' must be finite"
            )));
        }
        let radius = request.radius.get::<meter>();
        if !(radius.is_finite() && radius >= 0.0) {
            return Err(SimError::config(format!(
                "radius for '{name}' must be finite and non-negative, got {radius}"
            )));
        }

        let (sin, cos) = theta.sin_cos();
        let (origin, drift) = self
            .bodies
            .first()
            .map_or((Vector3::zero(), Vector3::zero()), |c| (c.position, c.velocity));
        let position = origin + Vector3::new(cos, sin, 0.0) * distance;
        let velocity = drift + Vector3::new(-sin, cos, 0.0) * speed;

        let body = Body::new(name, mass, position, velocity)
            .with_radius(radius)
            .with_color(request.color);
        let view = BodyView::from(&body);

        debug!(body = name, mass, distance, speed, "Registered body");

        self.trajectories.insert(
            body.name.clone(),
            Trajectory::with_capacity(self.config.simulation.trajectory_capacity),
        );
        self.bodies.push(body);
        self.guard
            .initialize(&self.bodies, self.integrator.min_separation());

        Ok(view)
    }

    /// Enter `Running`. Idempotent.
    pub fn start(&mut self) -> RunState {
        if !self.running {
            self.running = true;
            info!(time = self.time, "Simulation started");
        }
        RunState::Running
    }

    /// Enter `Stopped`. Idempotent.
    pub fn stop(&mut self) -> RunState {
        if self.running {
            self.running = false;
            info!(time = self.time, steps = self.step_count, "Simulation stopped");
        }
        RunState::Stopped
    }

    /// Discard added bodies and history; restore the configured start.
    ///
    /// # Errors
    ///
    /// Returns error if the configured seed bodies cannot be registered.
    pub fn reset(&mut self) -> SimResult<RunState> {
        self.running = false;
        self.time = 0.0;
        self.step_count = 0;
        self.bodies.clear();
        self.trajectories.clear();
        self.guard = JidokaGuard::new(self.config.jidoka.clone());
        self.seed()?;
        info!("Simulation reset");
        Ok(RunState::Stopped)
    }

    /// Advance one effective time step if running.
    ///
    /// Returns whether the state advanced.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::NonFiniteValue`] on a Jidoka halt; the simulator
    /// is stopped and the bodies keep their last finite state.
    pub fn step(&mut self) -> SimResult<bool> {
        if !self.running {
            return Ok(false);
        }

        let dt = self.config.effective_time_step();
        if let Err(err) = self.integrator.advance(&mut self.bodies, dt) {
            if err.is_jidoka_violation() {
                self.running = false;
                error!(time = self.time, %err, "Jidoka halt");
            }
            return Err(err);
        }

        self.time += dt;
        self.step_count += 1;

        for body in self.bodies.iter().skip(1) {
            if let Some(trajectory) = self.trajectories.get_mut(&body.name) {
                trajectory.record(self.time, body.position);
            }
        }

        match self.guard.check(&self.bodies, self.integrator.min_separation()) {
            JidokaResponse::Continue => {}
            JidokaResponse::Warning { message, .. } => {
                warn!(time = self.time, "{message}");
            }
            JidokaResponse::Pause {
                violation,
                suggestion,
            } => {
                self.running = false;
                warn!(time = self.time, %violation, %suggestion, "Simulation paused");
            }
            JidokaResponse::Halt { violation } => {
                self.running = false;
                error!(time = self.time, %violation, "Jidoka halt");
                return Err(SimError::NonFiniteValue {
                    location: violation.to_string(),
                });
            }
        }

        Ok(true)
    }

    /// Call [`step`](Self::step) up to `n` times, stopping early once the
    /// simulator stops. Returns the number of steps taken.
    ///
    /// # Errors
    ///
    /// Propagates the first step error.
    pub fn run_steps(&mut self, n: usize) -> SimResult<usize> {
        let mut taken = 0;
        for _ in 0..n {
            if !self.step()? {
                break;
            }
            taken += 1;
        }
        Ok(taken)
    }

    /// Versioned copy of the current state.
    #[must_use]
    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            schema_version: SNAPSHOT_SCHEMA_VERSION.to_string(),
            time: self.time,
            running: self.running,
            bodies: self.bodies.iter().map(BodyView::from).collect(),
        }
    }

    /// View of a single body.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::NotFound`] for an unknown name.
    pub fn body(&self, name: &str) -> SimResult<BodyView> {
        let index = self.index_of(name)?;
        Ok(BodyView::from(&self.bodies[index]))
    }

    /// Classical elements of `name` relative to the central body.
    ///
    /// # Errors
    ///
    /// - [`SimError::NotFound`] for an unknown name.
    /// - [`SimError::ReferenceBody`] for the central body itself.
    /// - [`SimError::UnboundOrbit`] for an escape trajectory.
    pub fn orbital_elements(&self, name: &str) -> SimResult<OrbitalElements> {
        let index = self.index_of(name)?;
        if index == 0 {
            return Err(SimError::ReferenceBody {
                name: name.to_string(),
            });
        }
        let central = self.central()?;
        let body = &self.bodies[index];
        OrbitalElements::from_state_vectors(
            body.position - central.position,
            body.velocity - central.velocity,
            G * central.mass,
        )
    }

    /// Kinetic, pairwise potential and total energy, plus a breakdown per
    /// orbiting body.
    #[must_use]
    pub fn energy_analysis(&self) -> EnergyReport {
        let floor = self.integrator.min_separation();
        let kinetic = kinetic_energy(&self.bodies);
        let potential = potential_energy(&self.bodies, floor);

        let bodies = match self.bodies.split_first() {
            Some((central, rest)) => rest
                .iter()
                .map(|body| {
                    let kinetic = body.kinetic_energy();
                    let potential_to_central = body.potential_energy(central, floor);
                    BodyEnergy {
                        name: body.name.clone(),
                        kinetic,
                        potential_to_central,
                        total: kinetic + potential_to_central,
                    }
                })
                .collect(),
            None => Vec::new(),
        };

        EnergyReport {
            kinetic,
            potential,
            total: kinetic + potential,
            bodies,
        }
    }

    /// Recorded samples for `name`, oldest first. Empty for the central body.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::NotFound`] for an unknown name.
    pub fn trajectory(&self, name: &str) -> SimResult<Vec<TrajectorySample>> {
        self.index_of(name)?;
        Ok(self
            .trajectories
            .get(name)
            .map(Trajectory::to_vec)
            .unwrap_or_default())
    }

    /// Absolute position of `name` after `dt` seconds of unperturbed
    /// two-body motion about the central body's current state.
    ///
    /// # Errors
    ///
    /// As [`orbital_elements`](Self::orbital_elements), plus
    /// [`SimError::ConvergenceFailure`] from the Kepler solver.
    pub fn predict_position(&self, name: &str, dt: f64) -> SimResult<Vector3> {
        let elements = self.orbital_elements(name)?;
        let relative = elements.predict_position(dt, &self.solver)?;
        Ok(self.central()?.position + relative)
    }
}

/// Thread-safe simulator handle.
///
/// ```
/// use orbsim::prelude::*;
///
/// let sim = Simulator::new(SimConfig::default())?;
/// sim.add_body(BodyRequest::si("Earth", EARTH_MASS, AU, 29_780.0, 0.0))?;
/// sim.start();
/// sim.run_steps(24)?;
/// assert_eq!(sim.trajectory("Earth")?.len(), 24);
/// # Ok::<(), orbsim::error::SimError>(())
/// ```
#[derive(Debug)]
pub struct Simulator {
    state: Mutex<SimulationState>,
}

impl Simulator {
    /// Create a stopped simulator seeded from `config`.
    ///
    /// # Errors
    ///
    /// Returns error if the configuration fails validation.
    pub fn new(config: SimConfig) -> SimResult<Self> {
        Ok(Self::from_state(SimulationState::new(config)?))
    }

    /// Wrap an existing state.
    #[must_use]
    pub fn from_state(state: SimulationState) -> Self {
        Self {
            state: Mutex::new(state),
        }
    }

    /// Unwrap into the inner state.
    #[must_use]
    pub fn into_state(self) -> SimulationState {
        self.state.into_inner()
    }

    /// See [`SimulationState::add_body`].
    ///
    /// # Errors
    ///
    /// See [`SimulationState::add_body`].
    pub fn add_body(&self, request: BodyRequest) -> SimResult<BodyView> {
        self.state.lock().add_body(request)
    }

    /// Enter `Running`.
    pub fn start(&self) -> RunState {
        self.state.lock().start()
    }

    /// Enter `Stopped`.
    pub fn stop(&self) -> RunState {
        self.state.lock().stop()
    }

    /// See [`SimulationState::reset`].
    ///
    /// # Errors
    ///
    /// See [`SimulationState::reset`].
    pub fn reset(&self) -> SimResult<RunState> {
        self.state.lock().reset()
    }

    /// See [`SimulationState::step`].
    ///
    /// # Errors
    ///
    /// See [`SimulationState::step`].
    pub fn step(&self) -> SimResult<bool> {
        self.state.lock().step()
    }

    /// Run up to `n` steps under one lock.
    ///
    /// # Errors
    ///
    /// See [`SimulationState::run_steps`].
    pub fn run_steps(&self, n: usize) -> SimResult<usize> {
        self.state.lock().run_steps(n)
    }

    /// Current run state.
    #[must_use]
    pub fn run_state(&self) -> RunState {
        self.state.lock().run_state()
    }

    /// Elapsed simulated time (s).
    #[must_use]
    pub fn time(&self) -> f64 {
        self.state.lock().time()
    }

    /// Steps taken since construction or the last reset.
    #[must_use]
    pub fn step_count(&self) -> u64 {
        self.state.lock().step_count()
    }

    /// Latest Jidoka status.
    #[must_use]
    pub fn jidoka_status(&self) -> JidokaStatus {
        self.state.lock().jidoka_status().clone()
    }

    /// Versioned copy of the current state.
    #[must_use]
    pub fn snapshot(&self) -> Snapshot {
        self.state.lock().snapshot()
    }

    /// See [`SimulationState::body`].
    ///
    /// # Errors
    ///
    /// See [`SimulationState::body`].
    pub fn body(&self, name: &str) -> SimResult<BodyView> {
        self.state.lock().body(name)
    }

    /// See [`SimulationState::orbital_elements`].
    ///
    /// # Errors
    ///
    /// See [`SimulationState::orbital_elements`].
    pub fn orbital_elements(&self, name: &str) -> SimResult<OrbitalElements> {
        self.state.lock().orbital_elements(name)
    }

    /// System energy accounting.
    #[must_use]
    pub fn energy_analysis(&self) -> EnergyReport {
        self.state.lock().energy_analysis()
    }

    /// See [`SimulationState::trajectory`].
    ///
    /// # Errors
    ///
    /// See [`SimulationState::trajectory`].
    pub fn trajectory(&self, name: &str) -> SimResult<Vec<TrajectorySample>> {
        self.state.lock().trajectory(name)
    }

    /// See [`SimulationState::predict_position`].
    ///
    /// # Errors
    ///
    /// See [`SimulationState::predict_position`].
    pub fn predict_position(&self, name: &str, dt: f64) -> SimResult<Vector3> {
        self.state.lock().predict_position(name, dt)
    }
}
