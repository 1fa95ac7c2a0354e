//! Taskboard Backend
//!
//! Layered architecture:
//! - domain: Core entities, containers and errors
//! - repository: Storage traits with SQLite and in-memory implementations
//! - ordering: Dense per-container ordering of tasks and sections
//! - commands: Request handlers over the shared application state
//! - config: JSON board configuration

pub mod commands;
pub mod config;
pub mod domain;
pub mod ordering;
pub mod repository;

pub use commands::AppState;
pub use config::BoardConfig;

/// Name of the rolling log file
pub const APP_NAME: &str = "Taskboard";

/// Start file logging if the configuration names a log directory.
/// Returns whether a logger was installed.
pub fn init_logging(config: &BoardConfig) -> Result<bool, rolling_logger::LoggerError> {
    let Some(dir) = &config.log_dir else {
        return Ok(false);
    };
    rolling_logger::init_logger(dir.clone(), APP_NAME)?;
    rolling_logger::info("logging started")?;
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_logging_disabled_without_dir() {
        assert!(!init_logging(&BoardConfig::default()).unwrap());
    }
}
