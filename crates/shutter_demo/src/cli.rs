//! Command-line interface handling for the shutter demo.
//!
//! Built on `clap`'s builder API. Every option overrides a value from the
//! configuration file.

use crate::config::AppConfig;
use clap::{Arg, ArgAction, ArgMatches, Command};
use std::path::PathBuf;

const DEFAULT_CONFIG_PATH: &str = "shutter.toml";

/// Command line arguments parsed from user input.
#[derive(Debug, Clone)]
pub struct CliArgs {
    /// Path to the configuration file
    pub config_path: PathBuf,
    /// Optional override for log level
    pub log_level: Option<String>,
    /// Whether to force JSON log output
    pub json_logs: bool,
    /// Optional override for the component that shuts down first
    pub trigger: Option<String>,
}

impl CliArgs {
    fn command() -> Command {
        Command::new("shutter demo")
            .version(env!("CARGO_PKG_VERSION"))
            .about("Simulates bound components shutting down through shutters")
            .arg(
                Arg::new("config")
                    .short('c')
                    .long("config")
                    .value_name("FILE")
                    .help("Configuration file path")
                    .default_value(DEFAULT_CONFIG_PATH),
            )
            .arg(
                Arg::new("log-level")
                    .short('l')
                    .long("log-level")
                    .value_name("LEVEL")
                    .help("Log level (trace, debug, info, warn, error)"),
            )
            .arg(
                Arg::new("json-logs")
                    .long("json-logs")
                    .help("Output logs in JSON format")
                    .action(ArgAction::SetTrue),
            )
            .arg(
                Arg::new("trigger")
                    .short('t')
                    .long("trigger")
                    .value_name("COMPONENT")
                    .help("Component to shut down first"),
            )
    }

    /// Parses the process arguments, exiting with usage on error.
    pub fn parse() -> Self {
        Self::from_matches(&Self::command().get_matches())
    }

    /// Parses `args` (including the binary name).
    pub fn try_parse_from<I, T>(args: I) -> Result<Self, clap::Error>
    where
        I: IntoIterator<Item = T>,
        T: Into<std::ffi::OsString> + Clone,
    {
        Ok(Self::from_matches(&Self::command().try_get_matches_from(args)?))
    }

    fn from_matches(matches: &ArgMatches) -> Self {
        Self {
            config_path: PathBuf::from(
                matches
                    .get_one::<String>("config")
                    .map(String::as_str)
                    .unwrap_or(DEFAULT_CONFIG_PATH),
            ),
            log_level: matches.get_one::<String>("log-level").cloned(),
            json_logs: matches.get_flag("json-logs"),
            trigger: matches.get_one::<String>("trigger").cloned(),
        }
    }

    /// Applies the command-line overrides to `config`.
    pub fn apply_overrides(&self, config: &mut AppConfig) {
        if let Some(log_level) = &self.log_level {
            config.logging.level = log_level.clone();
        }
        if self.json_logs {
            config.logging.json_format = true;
        }
        if let Some(trigger) = &self.trigger {
            config.scenario.trigger = trigger.clone();
        }
    }
}
