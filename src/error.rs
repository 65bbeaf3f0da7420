//! Error types for orbsim.
//!
//! Every fallible operation returns `Result<T, SimError>`; nothing in the
//! engine panics on bad input. Geometric degeneracies that have a defined
//! answer (equatorial node, circular periapsis) are not errors and never
//! reach this type.

use thiserror::Error;

/// Result type alias for orbsim operations.
pub type SimResult<T> = Result<T, SimError>;

/// Unified error type for all orbsim operations.
#[derive(Debug, Error)]
pub enum SimError {
    // ===== Registry Errors =====
    /// A body with this name is already registered.
    #[error("body '{name}' already exists")]
    DuplicateName {
        /// The conflicting name.
        name: String,
    },

    /// Body mass is zero, negative or not finite.
    #[error("body '{name}' has invalid mass {mass:e} kg (must be positive)")]
    InvalidMass {
        /// Name of the rejected body.
        name: String,
        /// Rejected mass value.
        mass: f64,
    },

    /// No body with this name is registered.
    #[error("body '{name}' not found")]
    NotFound {
        /// The requested name.
        name: String,
    },

    // ===== Geometry / Orbit Errors =====
    /// Attempted to normalize a zero-length vector.
    #[error("cannot normalize a zero-length vector")]
    DegenerateVector,

    /// Trajectory is parabolic or hyperbolic; elliptical elements are undefined.
    #[error("trajectory is unbound (specific energy {energy:.6e} J/kg)")]
    UnboundOrbit {
        /// Specific orbital energy `v²/2 − μ/r`.
        energy: f64,
    },

    /// Orbital elements were requested for the reference body itself.
    #[error("body '{name}' is the reference mass; orbital elements are undefined")]
    ReferenceBody {
        /// Name of the central body.
        name: String,
    },

    /// Kepler's equation did not converge within the iteration cap.
    #[error("Kepler solver did not converge after {iterations} iterations (residual {residual:.3e})")]
    ConvergenceFailure {
        /// Iterations performed.
        iterations: usize,
        /// Last Newton step magnitude.
        residual: f64,
    },

    // ===== Jidoka Violations =====
    /// Numerical instability detected (NaN or Inf).
    #[error("Jidoka: non-finite value detected at {location}")]
    NonFiniteValue {
        /// Location where the non-finite value was detected.
        location: String,
    },

    // ===== Configuration Errors =====
    /// Invalid configuration parameter.
    #[error("Configuration error: {message}")]
    Config {
        /// Description of the configuration error.
        message: String,
    },

    /// YAML parsing error.
    #[error("YAML parsing error: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    /// Validation error.
    #[error("Validation error: {0}")]
    Validation(#[from] validator::ValidationErrors),

    /// JSON serialization error.
    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    /// File I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl SimError {
    /// Create a configuration error with a message.
    #[must_use]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a not-found error for `name`.
    #[must_use]
    pub fn not_found(name: impl Into<String>) -> Self {
        Self::NotFound { name: name.into() }
    }

    /// Check if this error is a Jidoka violation (requires immediate stop).
    #[must_use]
    pub const fn is_jidoka_violation(&self) -> bool {
        matches!(self, Self::NonFiniteValue { .. })
    }

    /// Check if this error reports an unknown body.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_jidoka_violation_detection() {
        let non_finite = SimError::NonFiniteValue {
            location: "Earth velocity".to_string(),
        };
        assert!(non_finite.is_jidoka_violation());

        assert!(!SimError::DegenerateVector.is_jidoka_violation());
        assert!(!SimError::config("invalid").is_jidoka_violation());
    }

    #[test]
    fn test_error_duplicate_display() {
        let err = SimError::DuplicateName {
            name: "Earth".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("Earth"));
        assert!(msg.contains("already exists"));
    }

    #[test]
    fn test_error_invalid_mass_display() {
        let err = SimError::InvalidMass {
            name: "Ghost".to_string(),
            mass: -1.0,
        };
        let msg = err.to_string();
        assert!(msg.contains("Ghost"));
        assert!(msg.contains("invalid mass"));
    }

    #[test]
    fn test_error_not_found() {
        let err = SimError::not_found("Pluto");
        assert!(err.is_not_found());
        assert!(err.to_string().contains("Pluto"));
        assert!(!SimError::DegenerateVector.is_not_found());
    }

    #[test]
    fn test_error_unbound_display() {
        let err = SimError::UnboundOrbit { energy: 1.5e8 };
        let msg = err.to_string();
        assert!(msg.contains("unbound"));
        assert!(msg.contains("1.500000e8"));
    }

    #[test]
    fn test_error_convergence_display() {
        let err = SimError::ConvergenceFailure {
            iterations: 50,
            residual: 1e-3,
        };
        let msg = err.to_string();
        assert!(msg.contains("50 iterations"));
    }

    #[test]
    fn test_error_config() {
        let err = SimError::config("time_step must be positive");
        let msg = err.to_string();
        assert!(msg.contains("Configuration error"));
        assert!(msg.contains("time_step"));
    }

    #[test]
    fn test_error_io_from() {
        let err: SimError = std::io::Error::other("disk gone").into();
        assert!(err.to_string().contains("I/O error"));
    }

    #[test]
    fn test_error_debug() {
        let err = SimError::ReferenceBody {
            name: "Sun".to_string(),
        };
        let debug = format!("{err:?}");
        assert!(debug.contains("ReferenceBody"));
    }
}
