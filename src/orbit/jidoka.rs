//! Jidoka (自働化) - post-step health checks with graceful degradation.
//!
//! The guard inspects the system after every integration step:
//! - non-finite position or velocity halts the run;
//! - total energy drifting past tolerance raises a warning, and optionally
//!   pauses the run once warnings accumulate.
//!
//! A pause stops the simulator but leaves state intact for inspection; it
//! never panics.
//!
//! # References
//!
//! [27] Avizienis et al., "Dependable and Secure Computing," IEEE TDSC, 2004.

use serde::{Deserialize, Serialize};

use crate::orbit::body::{total_energy, Body};

/// Jidoka response types with graceful degradation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum JidokaResponse {
    /// All checks passed, continue normally.
    Continue,

    /// Warning detected, continue with visual indicator.
    Warning {
        message: String,
        metric: String,
        current: f64,
        threshold: f64,
    },

    /// Repeated violations, stop and wait for intervention.
    Pause {
        violation: JidokaViolation,
        suggestion: String,
    },

    /// Unrecoverable state.
    Halt { violation: JidokaViolation },
}

impl JidokaResponse {
    /// Check if this response allows continuation.
    #[must_use]
    pub fn can_continue(&self) -> bool {
        matches!(self, Self::Continue | Self::Warning { .. })
    }

    /// Check if this is a warning.
    #[must_use]
    pub fn is_warning(&self) -> bool {
        matches!(self, Self::Warning { .. })
    }
}

/// Violation kinds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum JidokaViolation {
    /// Non-finite value (NaN or Inf) detected.
    NonFinite { body: String, field: String },

    /// Energy conservation violated.
    EnergyDrift {
        initial: f64,
        current: f64,
        relative_error: f64,
        tolerance: f64,
    },
}

impl std::fmt::Display for JidokaViolation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NonFinite { body, field } => write!(f, "Non-finite {field} on body {body}"),
            Self::EnergyDrift {
                relative_error,
                tolerance,
                ..
            } => write!(
                f,
                "Energy drift {relative_error:.2e} exceeds tolerance {tolerance:.2e}"
            ),
        }
    }
}

/// Jidoka configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct JidokaConfig {
    /// Check for non-finite values.
    pub check_finite: bool,
    /// Check energy conservation.
    pub check_energy: bool,
    /// Energy drift tolerance (relative).
    pub energy_tolerance: f64,
    /// Energy warning threshold (fraction of tolerance).
    pub energy_warning_fraction: f64,
    /// Pause after this many drift violations; `None` never pauses.
    pub max_warnings_before_pause: Option<usize>,
}

impl Default for JidokaConfig {
    fn default() -> Self {
        Self {
            check_finite: true,
            check_energy: true,
            energy_tolerance: 1e-6,
            energy_warning_fraction: 0.8,
            max_warnings_before_pause: None,
        }
    }
}

/// Jidoka status for visualization (Mieruka).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct JidokaStatus {
    /// Energy relative error against the baseline.
    pub energy_error: f64,
    /// Energy check passed.
    pub energy_ok: bool,
    /// All values finite.
    pub finite_ok: bool,
    /// Drift violations since the baseline was taken.
    pub warning_count: usize,
}

/// Energy and finiteness guard.
#[derive(Debug, Clone)]
pub struct JidokaGuard {
    config: JidokaConfig,
    initial_energy: Option<f64>,
    warning_count: usize,
    status: JidokaStatus,
}

impl JidokaGuard {
    /// Create a new guard with no baseline.
    #[must_use]
    pub fn new(config: JidokaConfig) -> Self {
        Self {
            config,
            initial_energy: None,
            warning_count: 0,
            status: JidokaStatus::default(),
        }
    }

    /// Capture the energy baseline; call whenever the body set changes.
    pub fn initialize(&mut self, bodies: &[Body], min_separation: f64) {
        self.initial_energy = Some(total_energy(bodies, min_separation));
        self.warning_count = 0;
        self.status = JidokaStatus {
            energy_ok: true,
            finite_ok: bodies.iter().all(Body::is_finite),
            ..JidokaStatus::default()
        };
    }

    /// Current status.
    #[must_use]
    pub fn status(&self) -> &JidokaStatus {
        &self.status
    }

    /// Baseline energy, if initialized.
    #[must_use]
    pub const fn initial_energy(&self) -> Option<f64> {
        self.initial_energy
    }

    /// Check state and return response.
    pub fn check(&mut self, bodies: &[Body], min_separation: f64) -> JidokaResponse {
        if self.config.check_finite {
            if let Some(response) = self.check_finite(bodies) {
                return response;
            }
        }

        if self.config.check_energy {
            if let Some(response) = self.check_energy(bodies, min_separation) {
                return response;
            }
        }

        JidokaResponse::Continue
    }

    fn check_finite(&mut self, bodies: &[Body]) -> Option<JidokaResponse> {
        for body in bodies {
            let field = if !body.position.is_finite() {
                "position"
            } else if !body.velocity.is_finite() {
                "velocity"
            } else {
                continue;
            };
            self.status.finite_ok = false;
            return Some(JidokaResponse::Halt {
                violation: JidokaViolation::NonFinite {
                    body: body.name.clone(),
                    field: field.to_string(),
                },
            });
        }
        self.status.finite_ok = true;
        None
    }

    fn check_energy(&mut self, bodies: &[Body], min_separation: f64) -> Option<JidokaResponse> {
        let initial = self.initial_energy?;

        let current = total_energy(bodies, min_separation);
        let relative_error = if initial.abs() > f64::EPSILON {
            (current - initial).abs() / initial.abs()
        } else {
            (current - initial).abs()
        };

        self.status.energy_error = relative_error;
        self.status.energy_ok = relative_error <= self.config.energy_tolerance;

        if relative_error > self.config.energy_tolerance {
            self.warning_count += 1;
            self.status.warning_count = self.warning_count;

            if let Some(limit) = self.config.max_warnings_before_pause {
                if self.warning_count >= limit {
                    return Some(JidokaResponse::Pause {
                        violation: JidokaViolation::EnergyDrift {
                            initial,
                            current,
                            relative_error,
                            tolerance: self.config.energy_tolerance,
                        },
                        suggestion: "Reduce the time step or increase min_separation".to_string(),
                    });
                }
            }

            return Some(JidokaResponse::Warning {
                message: format!("Energy drift: {relative_error:.2e}"),
                metric: "energy".to_string(),
                current: relative_error,
                threshold: self.config.energy_tolerance,
            });
        }

        let warning_threshold = self.config.energy_tolerance * self.config.energy_warning_fraction;
        if relative_error > warning_threshold {
            return Some(JidokaResponse::Warning {
                message: format!("Energy approaching tolerance: {relative_error:.2e}"),
                metric: "energy".to_string(),
                current: relative_error,
                threshold: self.config.energy_tolerance,
            });
        }

        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::orbit::body::DEFAULT_MIN_SEPARATION;
    use crate::orbit::units::{Vector3, AU, EARTH_MASS, G, SOLAR_MASS};

    fn system() -> Vec<Body> {
        let v = (G * SOLAR_MASS / AU).sqrt();
        vec![
            Body::new("Sun", SOLAR_MASS, Vector3::zero(), Vector3::zero()),
            Body::new("Earth", EARTH_MASS, Vector3::new(AU, 0.0, 0.0), Vector3::new(0.0, v, 0.0)),
        ]
    }

    #[test]
    fn test_uninitialized_guard_continues() {
        let mut guard = JidokaGuard::new(JidokaConfig::default());
        let response = guard.check(&system(), DEFAULT_MIN_SEPARATION);
        assert_eq!(response, JidokaResponse::Continue);
        assert!(guard.initial_energy().is_none());
    }

    #[test]
    fn test_unchanged_state_passes() {
        let bodies = system();
        let mut guard = JidokaGuard::new(JidokaConfig::default());
        guard.initialize(&bodies, DEFAULT_MIN_SEPARATION);

        let response = guard.check(&bodies, DEFAULT_MIN_SEPARATION);
        assert!(response.can_continue());
        assert!(!response.is_warning());
        assert!(guard.status().energy_ok);
        assert!(guard.status().finite_ok);
    }

    #[test]
    fn test_non_finite_halts() {
        let mut bodies = system();
        let mut guard = JidokaGuard::new(JidokaConfig::default());
        guard.initialize(&bodies, DEFAULT_MIN_SEPARATION);

        bodies[1].velocity.y = f64::NAN;
        let response = guard.check(&bodies, DEFAULT_MIN_SEPARATION);
        assert!(!response.can_continue());
        match response {
            JidokaResponse::Halt { violation } => {
                assert!(violation.to_string().contains("Earth"));
                assert!(violation.to_string().contains("velocity"));
            }
            other => panic!("expected halt, got {other:?}"),
        }
        assert!(!guard.status().finite_ok);
    }

    #[test]
    fn test_energy_drift_warns() {
        let mut bodies = system();
        let mut guard = JidokaGuard::new(JidokaConfig::default());
        guard.initialize(&bodies, DEFAULT_MIN_SEPARATION);

        bodies[1].velocity = bodies[1].velocity * 1.01;
        let response = guard.check(&bodies, DEFAULT_MIN_SEPARATION);
        assert!(response.is_warning());
        assert!(response.can_continue());
        assert!(!guard.status().energy_ok);
        assert_eq!(guard.status().warning_count, 1);
    }

    #[test]
    fn test_energy_drift_pauses_after_limit() {
        let mut bodies = system();
        let config = JidokaConfig {
            max_warnings_before_pause: Some(2),
            ..JidokaConfig::default()
        };
        let mut guard = JidokaGuard::new(config);
        guard.initialize(&bodies, DEFAULT_MIN_SEPARATION);

        bodies[1].velocity = bodies[1].velocity * 1.01;
        assert!(guard.check(&bodies, DEFAULT_MIN_SEPARATION).is_warning());
        let response = guard.check(&bodies, DEFAULT_MIN_SEPARATION);
        assert!(matches!(response, JidokaResponse::Pause { .. }));
        assert!(!response.can_continue());
    }

    #[test]
    fn test_disabled_checks() {
        let mut bodies = system();
        let config = JidokaConfig {
            check_finite: false,
            check_energy: false,
            ..JidokaConfig::default()
        };
        let mut guard = JidokaGuard::new(config);
        guard.initialize(&bodies, DEFAULT_MIN_SEPARATION);

        bodies[1].position.x = f64::INFINITY;
        assert_eq!(guard.check(&bodies, DEFAULT_MIN_SEPARATION), JidokaResponse::Continue);
    }

    #[test]
    fn test_reinitialize_resets_warnings() {
        let mut bodies = system();
        let mut guard = JidokaGuard::new(JidokaConfig::default());
        guard.initialize(&bodies, DEFAULT_MIN_SEPARATION);
        bodies[1].velocity = bodies[1].velocity * 1.01;
        let _ = guard.check(&bodies, DEFAULT_MIN_SEPARATION);

        guard.initialize(&bodies, DEFAULT_MIN_SEPARATION);
        assert_eq!(guard.status().warning_count, 0);
        assert_eq!(guard.check(&bodies, DEFAULT_MIN_SEPARATION), JidokaResponse::Continue);
    }
}
