//! CLI output formatting.

use crate::error::SimResult;
use crate::orbit::units::{AU, SECONDS_PER_DAY};

use super::commands::RunReport;

/// Print version information.
pub fn print_version() {
    println!("{}", version_string());
}

/// Version line including build metadata when available.
#[must_use]
pub fn version_string() -> String {
    let version = option_env!("ORBSIM_VERSION").unwrap_or(env!("CARGO_PKG_VERSION"));
    match option_env!("ORBSIM_GIT_HASH") {
        Some(hash) if hash.len() >= 8 => format!("orbsim {version} ({})", &hash[..8]),
        _ => format!("orbsim {version}"),
    }
}

/// Print help message.
pub fn print_help() {
    println!(
        r"orbsim - N-body orbital simulator

USAGE:
    orbsim <COMMAND> [OPTIONS]

COMMANDS:
    run <config.yaml>           Run a simulation and report final state
        -n, --steps <N>         Steps to integrate (default: 8760)
        --json                  Emit the report as JSON

    validate <config.yaml>      Check a configuration file

    help                        Show this help message
    version                     Show version information

EXAMPLES:
    orbsim run demos/inner_planets.yaml
    orbsim run demos/inner_planets.yaml --steps 2000 --json

LOGGING:
    Set RUST_LOG (e.g. RUST_LOG=debug) to control log output on stderr.
"
    );
}

/// Serialize a report as pretty JSON.
///
/// # Errors
///
/// Returns error if serialization fails.
pub fn render_json(report: &RunReport) -> SimResult<String> {
    Ok(serde_json::to_string_pretty(report)?)
}

/// Human-readable report lines.
#[must_use]
pub fn format_report(report: &RunReport) -> Vec<String> {
    let mut lines = Vec::new();
    let status = if report.paused { "PAUSED" } else { "COMPLETED" };

    lines.push(format!(
        "Run {status}: {}/{} steps, {:.2} days simulated",
        report.steps_taken,
        report.steps_requested,
        report.time / SECONDS_PER_DAY
    ));
    lines.push(format!(
        "Energy: {:.6e} J -> {:.6e} J (drift {:.3e})",
        report.initial_energy, report.final_energy, report.energy_drift
    ));
    lines.push(format!(
        "Jidoka: finite={} energy_ok={} warnings={}",
        report.jidoka.finite_ok, report.jidoka.energy_ok, report.jidoka.warning_count
    ));

    for body in &report.bodies {
        match &body.elements {
            Some(el) => lines.push(format!(
                "  {:<12} a={:.4} AU  e={:.5}  i={:.3}°  T={:.2} d",
                body.name,
                el.semi_major_axis / AU,
                el.eccentricity,
                el.inclination_degrees(),
                el.period / SECONDS_PER_DAY
            )),
            None => lines.push(format!(
                "  {:<12} {}",
                body.name,
                body.note.as_deref().unwrap_or("no elements")
            )),
        }
    }

    lines
}

/// Print a run report.
pub fn print_report(report: &RunReport) {
    for line in format_report(report) {
        println!("{line}");
    }
}
