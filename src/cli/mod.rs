//! CLI module for orbsim.
//!
//! All CLI logic lives here rather than in main.rs so it can be tested.
//! The entry point `run_cli` is called from main.rs with parsed arguments.

mod args;
mod commands;
mod output;

pub use args::{Args, Command, DEFAULT_STEPS};
pub use commands::{run_cli, run_simulation, simulate, validate_config, BodyReport, RunReport};
pub use output::{format_report, print_help, print_report, print_version, render_json, version_string};
