//! CLI command handlers.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::process::ExitCode;
use tracing::info;

use crate::config::SimConfig;
use crate::error::SimResult;
use crate::orbit::jidoka::JidokaStatus;
use crate::orbit::kepler::OrbitalElements;
use crate::orbit::units::Vector3;
use crate::simulator::{RunState, SimulationState};

use super::output::{print_help, print_report, print_version, render_json};
use super::{Args, Command};

/// Outcome of a headless run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunReport {
    pub steps_requested: usize,
    pub steps_taken: usize,
    /// Simulated seconds elapsed.
    pub time: f64,
    pub initial_energy: f64,
    pub final_energy: f64,
    /// `|E₁ − E₀| / |E₀|`.
    pub energy_drift: f64,
    /// Whether the Jidoka guard stopped the run early.
    pub paused: bool,
    pub jidoka: JidokaStatus,
    pub bodies: Vec<BodyReport>,
}

/// Final state of one orbiting body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BodyReport {
    pub name: String,
    pub position: Vector3,
    pub velocity: Vector3,
    /// Absent when the body is unbound.
    pub elements: Option<OrbitalElements>,
    /// Why `elements` is absent.
    pub note: Option<String>,
}

/// Main CLI entry point.
#[must_use]
pub fn run_cli(args: Args) -> ExitCode {
    match args.command {
        Command::Run {
            config_path,
            steps,
            json,
        } => run_simulation(&config_path, steps, json),
        Command::Validate { config_path } => validate_config(&config_path),
        Command::Help => {
            print_help();
            ExitCode::SUCCESS
        }
        Command::Version => {
            print_version();
            ExitCode::SUCCESS
        }
    }
}

/// Load `path`, run `steps` steps and print the report.
#[must_use]
pub fn run_simulation(path: &Path, steps: usize, json: bool) -> ExitCode {
    let result = SimConfig::load(path).and_then(|config| simulate(config, steps));

    match result {
        Ok(report) => {
            if json {
                match render_json(&report) {
                    Ok(text) => println!("{text}"),
                    Err(e) => {
                        eprintln!("Error: {e}");
                        return ExitCode::from(1);
                    }
                }
            } else {
                print_report(&report);
            }
            if report.paused {
                ExitCode::from(2)
            } else {
                ExitCode::SUCCESS
            }
        }
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::from(1)
        }
    }
}

/// Validate a configuration file.
#[must_use]
pub fn validate_config(path: &Path) -> ExitCode {
    match SimConfig::load(path) {
        Ok(config) => {
            println!(
                "✓ {} is valid ({} seed bodies, dt = {} s)",
                path.display(),
                config.bodies.len(),
                config.effective_time_step()
            );
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("✗ {}: {e}", path.display());
            ExitCode::from(1)
        }
    }
}

/// Run a configured system for `steps` steps.
///
/// # Errors
///
/// Returns error on invalid configuration or a Jidoka halt.
pub fn simulate(config: SimConfig, steps: usize) -> SimResult<RunReport> {
    let mut state = SimulationState::new(config)?;
    let initial_energy = state.energy_analysis().total;

    info!(bodies = state.bodies().len(), steps, "Starting headless run");
    state.start();
    let steps_taken = state.run_steps(steps)?;
    let paused = state.run_state() == RunState::Stopped;
    state.stop();

    let final_energy = state.energy_analysis().total;
    let energy_drift = if initial_energy.abs() > f64::EPSILON {
        (final_energy - initial_energy).abs() / initial_energy.abs()
    } else {
        (final_energy - initial_energy).abs()
    };

    let bodies = state
        .bodies()
        .iter()
        .skip(1)
        .map(|body| {
            let (elements, note) = match state.orbital_elements(&body.name) {
                Ok(elements) => (Some(elements), None),
                Err(e) => (None, Some(e.to_string())),
            };
            BodyReport {
                name: body.name.clone(),
                position: body.position,
                velocity: body.velocity,
                elements,
                note,
            }
        })
        .collect();

    Ok(RunReport {
        steps_requested: steps,
        steps_taken,
        time: state.time(),
        initial_energy,
        final_energy,
        energy_drift,
        paused,
        jidoka: state.jidoka_status().clone(),
        bodies,
    })
}
