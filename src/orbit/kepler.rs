//! Classical orbital elements and Kepler's equation.
//!
//! Elements are extracted from a relative state vector (body minus central
//! mass) and a gravitational parameter `μ = G·M`. Angles are radians.
//!
//! # Degenerate geometry
//!
//! Two cases have no well-defined angle and are reported as 0 rather than
//! as errors:
//!
//! - equatorial orbits (`sin i < ε`): longitude of ascending node and
//!   argument of periapsis are 0;
//! - circular orbits (`e < ε`): argument of periapsis and true anomaly are 0,
//!   and the perifocal x-axis is taken along the current radius vector.
//!
//! Unbound (parabolic/hyperbolic) trajectories are a different matter:
//! period, periapsis and apoapsis of an ellipse do not exist there, so
//! extraction fails with [`SimError::UnboundOrbit`].
//!
//! # References
//!
//! [6] Bate, Mueller, White, "Fundamentals of Astrodynamics," 1971.
//! [7] Vallado, "Fundamentals of Astrodynamics and Applications," 4th ed., 2013.

use serde::{Deserialize, Serialize};
use std::f64::consts::{PI, TAU};

use crate::error::{SimError, SimResult};
use crate::orbit::units::Vector3;

/// Threshold below which eccentricity and node inclination are degenerate.
pub const ANGLE_EPSILON: f64 = 1e-10;

/// Default convergence tolerance on the Newton step (radians).
pub const DEFAULT_KEPLER_TOLERANCE: f64 = 1e-8;

/// Default Newton–Raphson iteration cap.
pub const DEFAULT_KEPLER_MAX_ITERATIONS: usize = 50;

/// Newton–Raphson solver for Kepler's equation `M = E − e·sin E`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct KeplerSolver {
    /// Stop once `|E_{n+1} − E_n|` falls below this.
    pub tolerance: f64,
    /// Give up after this many iterations.
    pub max_iterations: usize,
}

impl Default for KeplerSolver {
    fn default() -> Self {
        Self {
            tolerance: DEFAULT_KEPLER_TOLERANCE,
            max_iterations: DEFAULT_KEPLER_MAX_ITERATIONS,
        }
    }
}

impl KeplerSolver {
    /// Create a solver.
    #[must_use]
    pub const fn new(tolerance: f64, max_iterations: usize) -> Self {
        Self {
            tolerance,
            max_iterations,
        }
    }

    /// Solve for the eccentric anomaly `E` given mean anomaly `M`.
    ///
    /// Seeds `E₀ = M` and takes Newton-Raphson steps. The root always lies
    /// in `[M − 1, M + 1]`; a step that would leave the sign-change bracket
    /// is replaced by bisection, so `e` near 1 cannot make the iteration
    /// cycle. The returned angle is not wrapped.
    ///
    /// # Errors
    ///
    /// - [`SimError::Config`] if `e ∉ [0, 1)` or `M` is not finite.
    /// - [`SimError::ConvergenceFailure`] if the cap is reached first.
    pub fn solve(&self, mean_anomaly: f64, eccentricity: f64) -> SimResult<f64> {
        if !(0.0..1.0).contains(&eccentricity) {
            return Err(SimError::config(format!(
                "Kepler solver requires 0 <= e < 1, got {eccentricity}"
            )));
        }
        if !mean_anomaly.is_finite() {
            return Err(SimError::config("mean anomaly must be finite"));
        }

        let mut ecc_anomaly = mean_anomaly;
        let mut lower = mean_anomaly - 1.0;
        let mut upper = mean_anomaly + 1.0;
        let mut residual = f64::INFINITY;

        for _ in 0..self.max_iterations {
            let f = ecc_anomaly - eccentricity * ecc_anomaly.sin() - mean_anomaly;
            if f < 0.0 {
                lower = ecc_anomaly;
            } else {
                upper = ecc_anomaly;
            }

            let f_prime = 1.0 - eccentricity * ecc_anomaly.cos();
            let mut next = ecc_anomaly - f / f_prime;
            if !(lower..=upper).contains(&next) {
                next = 0.5 * (lower + upper);
            }
            residual = (next - ecc_anomaly).abs();
            ecc_anomaly = next;

            if residual < self.tolerance {
                return Ok(ecc_anomaly);
            }
        }

        Err(SimError::ConvergenceFailure {
            iterations: self.max_iterations,
            residual,
        })
    }
}

/// Solve Kepler's equation with the default solver settings.
///
/// # Errors
///
/// See [`KeplerSolver::solve`].
pub fn solve_kepler(mean_anomaly: f64, eccentricity: f64) -> SimResult<f64> {
    KeplerSolver::default().solve(mean_anomaly, eccentricity)
}

/// Circular orbital speed `sqrt(μ/r)` at distance `r`.
#[must_use]
pub fn circular_velocity(mu: f64, r: f64) -> f64 {
    (mu / r).sqrt()
}

/// Escape speed `sqrt(2μ/r)` at distance `r`.
#[must_use]
pub fn escape_velocity(mu: f64, r: f64) -> f64 {
    (2.0 * mu / r).sqrt()
}

/// Classical orbital elements of a bound orbit.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OrbitalElements {
    /// Semi-major axis a (m).
    pub semi_major_axis: f64,
    /// Eccentricity e.
    pub eccentricity: f64,
    /// Inclination i ∈ [0, π].
    pub inclination: f64,
    /// Longitude of ascending node Ω ∈ [0, 2π).
    pub longitude_of_ascending_node: f64,
    /// Argument of periapsis ω ∈ [0, 2π).
    pub argument_of_periapsis: f64,
    /// True anomaly ν ∈ [0, 2π).
    pub true_anomaly: f64,
    /// Orbital period (s).
    pub period: f64,
    /// Periapsis distance a(1−e) (m).
    pub periapsis: f64,
    /// Apoapsis distance a(1+e) (m).
    pub apoapsis: f64,
    /// Specific orbital energy `v²/2 − μ/r` (J/kg).
    pub specific_energy: f64,
    /// Specific angular momentum vector `r × v` (m²/s).
    pub angular_momentum: Vector3,
    /// Unit vector toward periapsis; along the radius for circular orbits.
    pub periapsis_direction: Vector3,
    /// Gravitational parameter used (m³/s²).
    pub mu: f64,
}

impl OrbitalElements {
    /// Extract elements from a relative state vector.
    ///
    /// # Errors
    ///
    /// - [`SimError::Config`] if `μ` is not positive.
    /// - [`SimError::DegenerateVector`] if `r` is the zero vector.
    /// - [`SimError::UnboundOrbit`] if `2/|r| − |v|²/μ ≤ 0`.
    #[allow(clippy::many_single_char_names)] // Standard orbital mechanics notation
    pub fn from_state_vectors(position: Vector3, velocity: Vector3, mu: f64) -> SimResult<Self> {
        if !(mu.is_finite() && mu > 0.0) {
            return Err(SimError::config(format!(
                "gravitational parameter must be positive, got {mu}"
            )));
        }

        let r_hat = position.normalize()?;
        let r = position.magnitude();
        let v_sq = velocity.magnitude_squared();

        let denominator = 2.0 / r - v_sq / mu;
        let specific_energy = 0.5 * v_sq - mu / r;
        if denominator <= 0.0 {
            return Err(SimError::UnboundOrbit {
                energy: specific_energy,
            });
        }
        let a = 1.0 / denominator;

        let h_vec = position.cross(&velocity);
        let h = h_vec.magnitude();

        let e_vec = velocity.cross(&h_vec) / mu - r_hat;
        let e = e_vec.magnitude();

        let inclination = if h > 0.0 {
            clamped_acos(h_vec.z / h)
        } else {
            0.0
        };

        let n_vec = Vector3::unit_z().cross(&h_vec);
        let n = n_vec.magnitude();
        let equatorial = h <= 0.0 || n / h < ANGLE_EPSILON;
        let circular = e < ANGLE_EPSILON;

        let longitude_of_ascending_node = if equatorial {
            0.0
        } else {
            let omega = clamped_acos(n_vec.x / n);
            if n_vec.y < 0.0 {
                reflect(omega)
            } else {
                omega
            }
        };

        let argument_of_periapsis = if equatorial || circular {
            0.0
        } else {
            let w = clamped_acos(n_vec.dot(&e_vec) / (n * e));
            if e_vec.z < 0.0 {
                reflect(w)
            } else {
                w
            }
        };

        let true_anomaly = if circular {
            0.0
        } else {
            let nu = clamped_acos(e_vec.dot(&position) / (e * r));
            if position.dot(&velocity) < 0.0 {
                reflect(nu)
            } else {
                nu
            }
        };

        let periapsis_direction = if circular { r_hat } else { e_vec / e };

        Ok(Self {
            semi_major_axis: a,
            eccentricity: e,
            inclination,
            longitude_of_ascending_node,
            argument_of_periapsis,
            true_anomaly,
            period: TAU * (a.powi(3) / mu).sqrt(),
            periapsis: a * (1.0 - e),
            apoapsis: a * (1.0 + e),
            specific_energy,
            angular_momentum: h_vec,
            periapsis_direction,
            mu,
        })
    }

    /// Mean motion `n = sqrt(μ/a³)` (rad/s).
    #[must_use]
    pub fn mean_motion(&self) -> f64 {
        (self.mu / self.semi_major_axis.powi(3)).sqrt()
    }

    /// Eccentric anomaly for a given true anomaly.
    #[must_use]
    pub fn eccentric_anomaly_from_true(&self, true_anomaly: f64) -> f64 {
        let e = self.eccentricity;
        let half = 0.5 * true_anomaly;
        let ea = 2.0 * ((1.0 - e).sqrt() * half.sin()).atan2((1.0 + e).sqrt() * half.cos());
        ea.rem_euclid(TAU)
    }

    /// True anomaly for a given eccentric anomaly.
    #[must_use]
    pub fn true_anomaly_from_eccentric(&self, eccentric_anomaly: f64) -> f64 {
        let e = self.eccentricity;
        let half = 0.5 * eccentric_anomaly;
        let nu = 2.0 * ((1.0 + e).sqrt() * half.sin()).atan2((1.0 - e).sqrt() * half.cos());
        nu.rem_euclid(TAU)
    }

    /// Mean anomaly at the epoch of these elements.
    #[must_use]
    pub fn mean_anomaly(&self) -> f64 {
        let ea = self.eccentric_anomaly_from_true(self.true_anomaly);
        (ea - self.eccentricity * ea.sin()).rem_euclid(TAU)
    }

    /// Position relative to the central mass after `dt` seconds of pure
    /// two-body motion.
    ///
    /// # Errors
    ///
    /// - [`SimError::DegenerateVector`] for radial (zero angular momentum)
    ///   trajectories, which have no orbital plane.
    /// - Any error from `solver`.
    pub fn predict_position(&self, dt: f64, solver: &KeplerSolver) -> SimResult<Vector3> {
        let normal = self.angular_momentum.normalize()?;
        let p_hat = self.periapsis_direction;
        let q_hat = normal.cross(&p_hat);

        // Reduced to (-π, π] so the solver starts near the root.
        let mean = (self.mean_anomaly() + self.mean_motion() * dt + PI).rem_euclid(TAU) - PI;
        let ea = solver.solve(mean, self.eccentricity)?;
        let nu = self.true_anomaly_from_eccentric(ea);
        let radius = self.semi_major_axis * (1.0 - self.eccentricity * ea.cos());

        Ok(p_hat * (radius * nu.cos()) + q_hat * (radius * nu.sin()))
    }

    /// Inclination in degrees.
    #[must_use]
    pub fn inclination_degrees(&self) -> f64 {
        self.inclination * 180.0 / PI
    }
}

fn clamped_acos(x: f64) -> f64 {
    x.clamp(-1.0, 1.0).acos()
}

/// `2π − θ`, kept inside `[0, 2π)`.
fn reflect(angle: f64) -> f64 {
    let reflected = TAU - angle;
    if reflected >= TAU {
        0.0
    } else {
        reflected
    }
}
