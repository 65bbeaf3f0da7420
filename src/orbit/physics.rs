//! Velocity-Verlet integration of the N-body system.
//!
//! Second order, symplectic and time-reversible: energy error oscillates
//! with bounded amplitude instead of drifting secularly, which is what
//! makes long unattended runs usable.
//!
//! # References
//!
//! [8] Hairer, Lubich, Wanner, "Geometric Numerical Integration," 2006.
//! [30] Hockney & Eastwood, "Computer Simulation Using Particles," 1988.

use crate::error::{SimError, SimResult};
use crate::orbit::body::{accelerations_at, compute_accelerations, Body, DEFAULT_MIN_SEPARATION};
use crate::orbit::units::Vector3;

/// Velocity-Verlet integrator with a close-approach floor.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VerletIntegrator {
    min_separation: f64,
}

impl Default for VerletIntegrator {
    fn default() -> Self {
        Self::new(DEFAULT_MIN_SEPARATION)
    }
}

impl VerletIntegrator {
    /// Create an integrator clamping pair distances at `min_separation` meters.
    #[must_use]
    pub const fn new(min_separation: f64) -> Self {
        Self { min_separation }
    }

    /// Distance floor used for force evaluation (m).
    #[must_use]
    pub const fn min_separation(&self) -> f64 {
        self.min_separation
    }

    /// Integrator order.
    #[must_use]
    pub const fn order(&self) -> u32 {
        2
    }

    /// Check if integrator is symplectic.
    #[must_use]
    pub const fn is_symplectic(&self) -> bool {
        true
    }

    /// Advance every body by `dt` seconds.
    ///
    /// Both acceleration passes see a complete position set: the first the
    /// positions at the start of the step, the second the fully drifted
    /// positions. No body ever observes another body mid-update.
    ///
    /// # Errors
    ///
    /// - [`SimError::Config`] if `dt` is not finite and positive.
    /// - [`SimError::NonFiniteValue`] if the step produced NaN or Inf. Bodies
    ///   are left untouched in that case.
    pub fn advance(&self, bodies: &mut [Body], dt: f64) -> SimResult<()> {
        if !(dt.is_finite() && dt > 0.0) {
            return Err(SimError::config(format!("time step must be positive, got {dt}")));
        }
        if bodies.is_empty() {
            return Ok(());
        }

        let accel = compute_accelerations(bodies, self.min_separation);

        let half_dt_sq = 0.5 * dt * dt;
        let drifted: Vec<Vector3> = bodies
            .iter()
            .zip(&accel)
            .map(|(body, a)| body.position + body.velocity * dt + *a * half_dt_sq)
            .collect();

        let accel_next = accelerations_at(bodies, &drifted, self.min_separation);

        let kicked: Vec<Vector3> = bodies
            .iter()
            .zip(accel.iter().zip(&accel_next))
            .map(|(body, (a, a_next))| body.velocity + (*a + *a_next) * (0.5 * dt))
            .collect();

        for (body, (pos, vel)) in bodies.iter().zip(drifted.iter().zip(&kicked)) {
            if !pos.is_finite() {
                return Err(SimError::NonFiniteValue {
                    location: format!("{} position", body.name),
                });
            }
            if !vel.is_finite() {
                return Err(SimError::NonFiniteValue {
                    location: format!("{} velocity", body.name),
                });
            }
        }

        for (i, body) in bodies.iter_mut().enumerate() {
            body.position = drifted[i];
            body.velocity = kicked[i];
            body.acceleration = accel_next[i];
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::orbit::body::{angular_momentum_magnitude, total_energy};
    use crate::orbit::units::{AU, EARTH_MASS, G, SECONDS_PER_DAY, SOLAR_MASS};

    fn create_sun() -> Body {
        Body::new("Sun", SOLAR_MASS, Vector3::zero(), Vector3::zero())
    }

    fn create_earth() -> Body {
        let v_circular = (G * SOLAR_MASS / AU).sqrt();
        Body::new(
            "Earth",
            EARTH_MASS,
            Vector3::new(AU, 0.0, 0.0),
            Vector3::new(0.0, v_circular, 0.0),
        )
    }

    #[test]
    fn test_verlet_properties() {
        let verlet = VerletIntegrator::default();
        assert_eq!(verlet.order(), 2);
        assert!(verlet.is_symplectic());
        assert!((verlet.min_separation() - DEFAULT_MIN_SEPARATION).abs() < f64::EPSILON);
    }

    #[test]
    fn test_rejects_bad_dt() {
        let verlet = VerletIntegrator::default();
        let mut bodies = vec![create_sun(), create_earth()];
        for dt in [0.0, -1.0, f64::NAN, f64::INFINITY] {
            let err = verlet.advance(&mut bodies, dt).unwrap_err();
            assert!(matches!(err, SimError::Config { .. }), "dt={dt}");
        }
    }

    #[test]
    fn test_empty_system_is_noop() {
        let verlet = VerletIntegrator::default();
        let mut bodies: Vec<Body> = Vec::new();
        verlet.advance(&mut bodies, 1.0).expect("empty step");
    }

    #[test]
    fn test_free_particle_moves_linearly() {
        let verlet = VerletIntegrator::default();
        let mut bodies = vec![Body::new(
            "drifter",
            1.0,
            Vector3::zero(),
            Vector3::new(2.0, 0.0, -1.0),
        )];
        verlet.advance(&mut bodies, 10.0).expect("step");
        assert_eq!(bodies[0].position, Vector3::new(20.0, 0.0, -10.0));
        assert_eq!(bodies[0].acceleration, Vector3::zero());
    }

    #[test]
    fn test_stored_acceleration_is_post_step() {
        let verlet = VerletIntegrator::default();
        let mut bodies = vec![create_sun(), create_earth()];
        verlet.advance(&mut bodies, 3600.0).expect("step");

        let recomputed = compute_accelerations(&bodies, DEFAULT_MIN_SEPARATION);
        assert_eq!(bodies[1].acceleration, recomputed[1]);
    }

    #[test]
    fn test_order_independent_results() {
        let verlet = VerletIntegrator::default();
        let mut forward = vec![create_sun(), create_earth()];
        let mut reversed = vec![create_earth(), create_sun()];

        for _ in 0..50 {
            verlet.advance(&mut forward, 3600.0).expect("step");
            verlet.advance(&mut reversed, 3600.0).expect("step");
        }

        // Pairwise sums are symmetric for two bodies, so ordering cannot matter.
        assert_eq!(forward[1].position, reversed[0].position);
        assert_eq!(forward[0].velocity, reversed[1].velocity);
    }

    #[test]
    fn test_energy_conservation_two_body() {
        let verlet = VerletIntegrator::default();
        let mut bodies = vec![create_sun(), create_earth()];
        let initial = total_energy(&bodies, DEFAULT_MIN_SEPARATION);

        for _ in 0..5000 {
            verlet.advance(&mut bodies, 3600.0).expect("step");
        }

        let final_energy = total_energy(&bodies, DEFAULT_MIN_SEPARATION);
        let relative_error = (final_energy - initial).abs() / initial.abs();
        assert!(relative_error < 1e-6, "Energy drift too large: {relative_error}");
    }

    #[test]
    fn test_angular_momentum_conservation() {
        let verlet = VerletIntegrator::default();
        let mut bodies = vec![create_sun(), create_earth()];
        let initial = angular_momentum_magnitude(&bodies);

        for _ in 0..100 {
            verlet.advance(&mut bodies, SECONDS_PER_DAY).expect("step");
        }

        let relative_error = (angular_momentum_magnitude(&bodies) - initial).abs() / initial;
        assert!(relative_error < 1e-10, "Angular momentum drift: {relative_error}");
    }

    #[test]
    fn test_orbit_returns_after_one_year() {
        let verlet = VerletIntegrator::default();
        let mut bodies = vec![create_sun(), create_earth()];

        let steps = (365.25 * 24.0) as usize;
        for _ in 0..steps {
            verlet.advance(&mut bodies, 3600.0).expect("step");
        }

        let rel = bodies[1].position - bodies[0].position;
        let radius_error = (rel.magnitude() - AU).abs() / AU;
        assert!(radius_error < 0.01, "Orbit radius error: {radius_error}");
    }

    #[test]
    fn test_time_reversibility() {
        let verlet = VerletIntegrator::default();
        let mut bodies = vec![create_sun(), create_earth()];
        let start = bodies[1].position;

        for _ in 0..100 {
            verlet.advance(&mut bodies, 3600.0).expect("step");
        }
        for body in &mut bodies {
            body.velocity = -body.velocity;
        }
        for _ in 0..100 {
            verlet.advance(&mut bodies, 3600.0).expect("step");
        }

        let error = bodies[1].position.distance(&start) / AU;
        assert!(error < 1e-9, "Round trip error: {error}");
    }

    #[test]
    fn test_non_finite_detected() {
        let verlet = VerletIntegrator::default();
        let mut bodies = vec![
            create_sun(),
            Body::new("bad", 1.0, Vector3::new(AU, 0.0, 0.0), Vector3::new(f64::NAN, 0.0, 0.0)),
        ];
        let before = bodies.clone();

        let err = verlet.advance(&mut bodies, 3600.0).unwrap_err();
        assert!(err.is_jidoka_violation());
        assert_eq!(bodies[0], before[0]);
    }
}
