//! Error types for the demo application.

/// Everything that can stop the demo from running to completion.
#[derive(Debug, thiserror::Error)]
pub enum DemoError {
    /// Reading or writing the configuration file failed
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The configuration file is not valid TOML for [`AppConfig`](crate::AppConfig)
    #[error("Config parse error: {0}")]
    ConfigParse(#[from] toml::de::Error),

    /// The default configuration could not be rendered
    #[error("Config serialize error: {0}")]
    ConfigSerialize(#[from] toml::ser::Error),

    /// The configuration parsed but failed validation
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// A component name did not resolve
    #[error("Unknown component: {0}")]
    UnknownComponent(String),

    /// The tracing subscriber could not be installed
    #[error("Logging setup failed: {0}")]
    Logging(String),

    /// A worker or shutdown task panicked or was cancelled
    #[error("Task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}
