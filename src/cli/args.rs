//! CLI argument parsing.
//!
//! Hand-rolled so parsing can be exercised with any iterator of strings.

use std::path::PathBuf;

/// Steps run when `--steps` is not given: one year of hourly steps.
pub const DEFAULT_STEPS: usize = 24 * 365;

/// CLI arguments container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Args {
    /// The command to execute.
    pub command: Command,
}

/// Available CLI commands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Run a simulation
    Run {
        /// Path to the configuration YAML file.
        config_path: PathBuf,
        /// Number of steps to integrate.
        steps: usize,
        /// Emit the report as JSON.
        json: bool,
    },
    /// Validate a configuration file without running it
    Validate {
        /// Path to the configuration YAML file.
        config_path: PathBuf,
    },
    /// Show help
    Help,
    /// Show version
    Version,
}

impl Args {
    /// Parse command-line arguments from an iterator.
    ///
    /// This method is testable as it accepts any iterator of strings,
    /// not just `std::env::args()`.
    #[must_use]
    pub fn parse_from<I, S>(args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let args: Vec<String> = args.into_iter().map(|s| s.as_ref().to_string()).collect();
        Self::parse_from_vec(&args)
    }

    /// Parse command-line arguments from the environment.
    #[must_use]
    pub fn parse() -> Self {
        Self::parse_from(std::env::args())
    }

    fn parse_from_vec(args: &[String]) -> Self {
        if args.len() < 2 {
            return Self {
                command: Command::Help,
            };
        }

        let command = match args[1].as_str() {
            "run" => Self::parse_run_command(args),
            "validate" => Self::parse_validate_command(args),
            "-h" | "--help" | "help" => Command::Help,
            "-V" | "--version" | "version" => Command::Version,
            unknown => {
                eprintln!("Unknown command: {unknown}");
                Command::Help
            }
        };

        Self { command }
    }

    fn parse_run_command(args: &[String]) -> Command {
        if args.len() < 3 {
            eprintln!("Error: 'run' command requires a configuration path");
            return Command::Help;
        }

        let mut steps = DEFAULT_STEPS;
        let mut json = false;

        let mut i = 3;
        while i < args.len() {
            match args[i].as_str() {
                "--steps" | "-n" => {
                    if let Some(value) = args.get(i + 1) {
                        match value.parse() {
                            Ok(n) => steps = n,
                            Err(_) => eprintln!("Ignoring invalid step count: {value}"),
                        }
                        i += 2;
                    } else {
                        i += 1;
                    }
                }
                "--json" => {
                    json = true;
                    i += 1;
                }
                other => {
                    eprintln!("Ignoring unknown option: {other}");
                    i += 1;
                }
            }
        }

        Command::Run {
            config_path: PathBuf::from(&args[2]),
            steps,
            json,
        }
    }

    fn parse_validate_command(args: &[String]) -> Command {
        if args.len() < 3 {
            eprintln!("Error: 'validate' command requires a configuration path");
            return Command::Help;
        }

        Command::Validate {
            config_path: PathBuf::from(&args[2]),
        }
    }
}
