//! # Shutter Demo
//!
//! Plays out a shutdown scenario over a set of simulated components, each
//! guarded by its own [`shutter::Shutter`]. One component fails after a delay
//! and the failure spreads along the configured bindings.
//!
//! ## Quick Start
//!
//! ```bash
//! # Run with the default scenario (writes shutter.toml if missing)
//! shutter_demo
//!
//! # Pick the failing component and watch every phase transition
//! shutter_demo --trigger gateway --log-level debug
//!
//! # JSON logging
//! shutter_demo --json-logs
//! ```

mod app;
mod cli;
mod config;
mod error;
mod logging;

pub use app::{Application, ComponentReport, RunReport};
pub use cli::CliArgs;
pub use config::{AppConfig, ComponentSettings, LoggingSettings, ScenarioSettings};
pub use error::DemoError;

/// Entry point for the `shutter_demo` binary.
///
/// 1. Parse command-line arguments
/// 2. Load the configuration file and apply overrides
/// 3. Initialize logging
/// 4. Run the scenario and log the summary
pub async fn init() -> Result<(), DemoError> {
    let args = CliArgs::parse();

    let mut config = AppConfig::load_from_file(&args.config_path).await?;
    args.apply_overrides(&mut config);

    logging::setup_logging(&config.logging, args.json_logs)?;
    tracing::info!("📂 Config: {}", args.config_path.display());

    let report = Application::new(config)?.run().await?;
    report.log_summary();
    Ok(())
}
