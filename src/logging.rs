//! Structured logging setup.
//!
//! Logs always go to stderr; stdout carries command output only.
//! `RUST_LOG` directives are honoured on top of the configured level.

use std::env;
use std::sync::Once;
use tracing::Level;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

pub const ENV_LOG_LEVEL: &str = "JAVA_LAUNCHER_LOG_LEVEL";
pub const ENV_LOG_JSON: &str = "JAVA_LAUNCHER_LOG_JSON";

static INIT: Once = Once::new();

#[derive(Debug, Clone)]
pub struct LoggingConfig {
    pub level: Level,
    pub use_json: bool,
    pub include_target: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: Level::WARN,
            use_json: false,
            include_target: false,
        }
    }
}

impl LoggingConfig {
    /// `--log-level` / `--log-json`, then the environment, then defaults.
    pub fn resolve(cli_level: Option<&str>, cli_json: bool) -> Self {
        let env_level = env::var(ENV_LOG_LEVEL).ok();
        let level = cli_level
            .or(env_level.as_deref())
            .map(parse_level)
            .unwrap_or(Level::WARN);

        let use_json = cli_json
            || env::var(ENV_LOG_JSON)
                .ok()
                .and_then(|v| v.parse::<bool>().ok())
                .unwrap_or(false);

        Self {
            level,
            use_json,
            include_target: level >= Level::DEBUG,
        }
    }
}

/// Parses a level name case-insensitively, falling back to `warn`.
pub fn parse_level(level_str: &str) -> Level {
    match level_str.trim().to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" | "warning" => Level::WARN,
        "error" => Level::ERROR,
        other => {
            eprintln!(
                "Invalid log level '{other}', defaulting to warn. Valid levels: trace, debug, info, warn, error"
            );
            Level::WARN
        }
    }
}

/// Install the global subscriber. Later calls are ignored.
pub fn init_logging(config: LoggingConfig) {
    INIT.call_once(|| {
        let directive = format!("java_launcher={}", config.level);
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(format!("warn,{directive}")));

        if config.use_json {
            let _ = tracing_subscriber::registry()
                .with(filter)
                .with(
                    fmt::layer()
                        .json()
                        .with_writer(std::io::stderr)
                        .with_target(config.include_target),
                )
                .try_init();
        } else {
            let _ = tracing_subscriber::registry()
                .with(filter)
                .with(
                    fmt::layer()
                        .with_writer(std::io::stderr)
                        .with_target(config.include_target),
                )
                .try_init();
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_level_is_case_insensitive() {
        assert_eq!(parse_level("DEBUG"), Level::DEBUG);
        assert_eq!(parse_level(" info "), Level::INFO);
        assert_eq!(parse_level("Warning"), Level::WARN);
    }

    #[test]
    fn parse_level_invalid_defaults_to_warn() {
        assert_eq!(parse_level("loud"), Level::WARN);
        assert_eq!(parse_level(""), Level::WARN);
    }

    #[test]
    fn cli_flags_take_priority() {
        let config = LoggingConfig::resolve(Some("trace"), true);
        assert_eq!(config.level, Level::TRACE);
        assert!(config.use_json);
        assert!(config.include_target);
    }
}
