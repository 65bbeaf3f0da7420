//! Celestial bodies and Newtonian gravity.
//!
//! Forces and potentials use a minimum-separation floor: distances below
//! the floor are clamped to it, so coincident bodies produce large but
//! finite accelerations instead of a division blow-up.

use serde::{Deserialize, Serialize};

use crate::orbit::units::{Vector3, G};

/// Default minimum separation for force/potential evaluation (m).
pub const DEFAULT_MIN_SEPARATION: f64 = 1.0;

/// Physical state of one celestial object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Body {
    /// Unique identity key.
    pub name: String,
    /// Mass (kg), strictly positive.
    pub mass: f64,
    /// Position (m).
    pub position: Vector3,
    /// Velocity (m/s).
    pub velocity: Vector3,
    /// Last computed acceleration (m/s²).
    pub acceleration: Vector3,
    /// Display radius (m), not gravitationally significant.
    pub radius: f64,
    /// Display color, opaque to the engine.
    pub color: String,
}

impl Body {
    /// Create a body with zero acceleration.
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        mass: f64,
        position: Vector3,
        velocity: Vector3,
    ) -> Self {
        Self {
            name: name.into(),
            mass,
            position,
            velocity,
            acceleration: Vector3::zero(),
            radius: 0.0,
            color: "#ffffff".to_string(),
        }
    }

    /// Set display radius.
    #[must_use]
    pub fn with_radius(mut self, radius: f64) -> Self {
        self.radius = radius;
        self
    }

    /// Set display color.
    #[must_use]
    pub fn with_color(mut self, color: impl Into<String>) -> Self {
        self.color = color.into();
        self
    }

    /// Gravitational force on `self` exerted by `other` (N).
    ///
    /// Points from `self` toward `other`. Coincident bodies yield the zero
    /// vector since there is no defined direction.
    #[must_use]
    pub fn gravitational_force(&self, other: &Self, min_separation: f64) -> Vector3 {
        pull(self.position, other.position, other.mass, min_separation) * self.mass
    }

    /// Kinetic energy `½·m·|v|²` (J).
    #[must_use]
    pub fn kinetic_energy(&self) -> f64 {
        0.5 * self.mass * self.velocity.magnitude_squared()
    }

    /// Pair potential energy `−G·m₁·m₂/r` (J).
    #[must_use]
    pub fn potential_energy(&self, other: &Self, min_separation: f64) -> f64 {
        let r = self.position.distance(&other.position).max(min_separation);
        -G * self.mass * other.mass / r
    }

    /// Linear momentum `m·v`.
    #[must_use]
    pub fn momentum(&self) -> Vector3 {
        self.velocity * self.mass
    }

    /// Check that position and velocity are finite.
    #[must_use]
    pub fn is_finite(&self) -> bool {
        self.position.is_finite() && self.velocity.is_finite()
    }
}

/// Acceleration at `at` due to a point mass `mass` located at `source`.
///
/// Equivalent to `F/m` with the target mass already cancelled.
fn pull(at: Vector3, source: Vector3, mass: f64, min_separation: f64) -> Vector3 {
    let offset = source - at;
    let Ok(direction) = offset.normalize() else {
        return Vector3::zero();
    };
    let r = offset.magnitude().max(min_separation);
    direction * (G * mass / (r * r))
}

/// Net gravitational acceleration for every body, from `positions`.
///
/// `positions[i]` stands in for `bodies[i].position`; this lets the
/// integrator evaluate a position snapshot without mutating bodies. Sums
/// run in slice order so results are reproducible bit for bit.
#[must_use]
pub fn accelerations_at(bodies: &[Body], positions: &[Vector3], min_separation: f64) -> Vec<Vector3> {
    let n = bodies.len().min(positions.len());
    let mut accelerations = vec![Vector3::zero(); n];

    for i in 0..n {
        let mut acc = Vector3::zero();
        for j in 0..n {
            if i == j {
                continue;
            }
            acc += pull(positions[i], positions[j], bodies[j].mass, min_separation);
        }
        accelerations[i] = acc;
    }

    accelerations
}

/// Net gravitational acceleration for every body at its current position.
#[must_use]
pub fn compute_accelerations(bodies: &[Body], min_separation: f64) -> Vec<Vector3> {
    let positions: Vec<Vector3> = bodies.iter().map(|b| b.position).collect();
    accelerations_at(bodies, &positions, min_separation)
}

/// Total kinetic energy (J).
#[must_use]
pub fn kinetic_energy(bodies: &[Body]) -> f64 {
    bodies.iter().map(Body::kinetic_energy).sum()
}

/// Total potential energy over unique pairs (J).
#[must_use]
pub fn potential_energy(bodies: &[Body], min_separation: f64) -> f64 {
    let mut pe = 0.0;
    let n = bodies.len();

    for i in 0..n {
        for j in (i + 1)..n {
            pe += bodies[i].potential_energy(&bodies[j], min_separation);
        }
    }

    pe
}

/// Total mechanical energy (J).
#[must_use]
pub fn total_energy(bodies: &[Body], min_separation: f64) -> f64 {
    kinetic_energy(bodies) + potential_energy(bodies, min_separation)
}

/// Total angular momentum magnitude about the origin.
#[must_use]
pub fn angular_momentum_magnitude(bodies: &[Body]) -> f64 {
    bodies
        .iter()
        .fold(Vector3::zero(), |acc, b| acc + b.position.cross(&b.momentum()))
        .magnitude()
}
