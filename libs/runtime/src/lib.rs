//! Process-level plumbing shared by the server binary: layered configuration,
//! logging initialization and shutdown signals.
pub mod config;
pub mod logging;
pub mod shutdown;

pub use config::{
    default_logging_config, AppConfig, AuthConfig, CliArgs, LoggingConfig, Section, ServerConfig,
};
pub use logging::init_logging_from_config;
pub use shutdown::shutdown_signal;
