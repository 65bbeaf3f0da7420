//! Orbital physics engine.
//!
//! Implements the numerical core with:
//! - 3D vector algebra and physical constants
//! - Pairwise Newtonian gravity with a close-approach floor
//! - Velocity-Verlet integration (2nd order, symplectic)
//! - Classical orbital elements and a Newton-Raphson Kepler solver
//! - Bounded trajectory history
//! - Jidoka guards with graceful degradation
//!
//! # Toyota Way Principles
//!
//! - **Jidoka (自働化)**: Stop on non-finite state, warn on energy drift
//! - **Poka-Yoke (ポカヨケ)**: Degenerate geometry has defined values, not panics
//! - **Mieruka (見える化)**: Guard status exposed for display
//!
//! # Example
//!
//! ```rust
//! use orbsim::orbit::prelude::*;
//!
//! let v = circular_velocity(G * SOLAR_MASS, AU);
//! let mut bodies = vec![
//!     Body::new("Sun", SOLAR_MASS, Vector3::zero(), Vector3::zero()),
//!     Body::new("Earth", EARTH_MASS, Vector3::new(AU, 0.0, 0.0), Vector3::new(0.0, v, 0.0)),
//! ];
//!
//! let mut jidoka = JidokaGuard::new(JidokaConfig::default());
//! jidoka.initialize(&bodies, DEFAULT_MIN_SEPARATION);
//!
//! let verlet = VerletIntegrator::default();
//!
//! // Simulate one day
//! for _ in 0..24 {
//!     verlet.advance(&mut bodies, 3600.0).expect("step failed");
//!     if !jidoka.check(&bodies, DEFAULT_MIN_SEPARATION).can_continue() {
//!         break;
//!     }
//! }
//!
//! let elements = OrbitalElements::from_state_vectors(
//!     bodies[1].position - bodies[0].position,
//!     bodies[1].velocity - bodies[0].velocity,
//!     G * SOLAR_MASS,
//! ).expect("bound orbit");
//! assert!(elements.eccentricity < 1e-3);
//! ```

pub mod units;
pub mod body;
pub mod physics;
pub mod kepler;
pub mod trajectory;
pub mod jidoka;

/// Prelude for convenient imports.
pub mod prelude {
    pub use super::units::{
        Vector3,
        G, AU, SOLAR_MASS, SOLAR_RADIUS, EARTH_MASS, SECONDS_PER_DAY,
    };
    pub use super::body::{
        Body, DEFAULT_MIN_SEPARATION,
        compute_accelerations, kinetic_energy, potential_energy, total_energy,
        angular_momentum_magnitude,
    };
    pub use super::physics::VerletIntegrator;
    pub use super::kepler::{
        KeplerSolver, OrbitalElements,
        solve_kepler, circular_velocity, escape_velocity,
    };
    pub use super::trajectory::{Trajectory, TrajectorySample, DEFAULT_TRAJECTORY_CAPACITY};
    pub use super::jidoka::{
        JidokaResponse, JidokaViolation,
        JidokaConfig, JidokaGuard, JidokaStatus,
    };
}
