//! # orbsim
//!
//! N-body orbital simulator with classical orbital-element analysis.
//!
//! A deterministic gravity engine implementing:
//! - Direct O(n²) Newtonian gravity with velocity-Verlet integration
//! - Orbital elements from state vectors, Kepler-equation propagation
//! - Toyota Production System (TPS): Jidoka guards, Poka-Yoke configuration
//!
//! ## Example
//!
//! ```rust
//! use orbsim::prelude::*;
//!
//! let config = SimConfig::builder()
//!     .time_step(3600.0)
//!     .build();
//! let sim = Simulator::new(config)?;
//! sim.add_body(BodyRequest::si("Earth", EARTH_MASS, AU, 29_780.0, 0.0))?;
//!
//! let elements = sim.orbital_elements("Earth")?;
//! assert!(elements.eccentricity < 0.02);
//! # Ok::<(), SimError>(())
//! ```

#![forbid(unsafe_code)]
#![deny(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![warn(clippy::pedantic, clippy::nursery)]
#![allow(
    clippy::module_name_repetitions,
    clippy::similar_names,
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::suboptimal_flops,  // Written as the textbook formulas
    clippy::imprecise_flops,
    clippy::many_single_char_names,  // Orbital element notation (a, e, i, h, n)
    clippy::too_many_lines,
    clippy::missing_const_for_fn,
    clippy::needless_range_loop,
)]

pub mod cli;
pub mod config;
pub mod error;
pub mod orbit;
pub mod simulator;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::config::{BodySeed, CentralBodyConfig, SimConfig, SimConfigBuilder};
    pub use crate::error::{SimError, SimResult};
    pub use crate::orbit::prelude::*;
    pub use crate::simulator::{
        BodyEnergy, BodyRequest, BodyView, EnergyReport, RunState, SimulationState, Simulator,
        Snapshot,
    };
}

/// Re-export for public API
pub use error::{SimError, SimResult};
pub use simulator::Simulator;
