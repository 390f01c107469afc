//! Structured logging setup
//!
//! Logs always go to stderr so that `--format json` output on stdout stays
//! machine readable. The level comes from, in order: `--log-level`, `-v`,
//! `-q`, `DOCKHAND_LOG_LEVEL`, then `info`. `RUST_LOG`, when set, replaces the
//! computed filter entirely.

use std::env;
use std::sync::Once;
use tracing::Level;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Ensures logging is only initialized once
static INIT: Once = Once::new();

/// Noisy dependency targets capped at `warn` unless `RUST_LOG` says otherwise
const QUIET_TARGETS: &[&str] = &["h2", "hyper", "hyper_util", "reqwest", "bollard"];

#[derive(Debug, Clone)]
pub struct LoggingConfig {
    pub level: Level,

    /// Use JSON output format (for log shipping)
    pub use_json: bool,

    /// Include the module target (e.g., dockhand::migrate) in logs
    pub include_target: bool,

    /// Include file and line number information
    pub include_location: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: Level::INFO,
            use_json: false,
            include_target: false,
            include_location: false,
        }
    }
}

impl LoggingConfig {
    pub fn with_level(level: Level) -> Self {
        Self {
            level,
            ..Default::default()
        }
    }

    /// JSON lines with targets and source locations
    pub fn production() -> Self {
        Self {
            level: Level::INFO,
            use_json: true,
            include_target: true,
            include_location: true,
        }
    }

    /// Honors `DOCKHAND_LOG_JSON=true` on top of the given level
    pub fn from_env(level: Level) -> Self {
        let use_json = env::var("DOCKHAND_LOG_JSON")
            .ok()
            .and_then(|v| v.parse::<bool>().ok())
            .unwrap_or(false);

        if use_json {
            Self {
                level,
                ..Self::production()
            }
        } else {
            Self::with_level(level)
        }
    }
}

/// Parses a log level name (case-insensitive)
pub fn parse_level(level_str: &str) -> Option<Level> {
    match level_str.trim().to_lowercase().as_str() {
        "trace" => Some(Level::TRACE),
        "debug" => Some(Level::DEBUG),
        "info" => Some(Level::INFO),
        "warn" | "warning" => Some(Level::WARN),
        "error" => Some(Level::ERROR),
        _ => None,
    }
}

/// Picks the effective level from the CLI flags and the environment value
pub fn resolve_level(
    flag: Option<&str>,
    verbose: bool,
    quiet: bool,
    env_level: Option<&str>,
) -> Level {
    if let Some(level) = flag.and_then(parse_level) {
        return level;
    }
    if verbose {
        return Level::DEBUG;
    }
    if quiet {
        return Level::ERROR;
    }
    match env_level {
        Some(raw) => parse_level(raw).unwrap_or_else(|| {
            eprintln!(
                "Invalid log level '{}', defaulting to INFO. Valid levels: trace, debug, info, warn, error",
                raw
            );
            Level::INFO
        }),
        None => Level::INFO,
    }
}

fn build_filter(level: Level) -> EnvFilter {
    if env::var("RUST_LOG").is_ok() {
        return EnvFilter::from_default_env();
    }

    let mut filter = EnvFilter::new(format!("dockhand={}", level));
    for target in QUIET_TARGETS {
        if let Ok(directive) = format!("{}=warn", target).parse() {
            filter = filter.add_directive(directive);
        }
    }
    filter
}

/// Installs the global subscriber; later calls are ignored
pub fn init_logging(config: LoggingConfig) {
    INIT.call_once(|| {
        let filter = build_filter(config.level);

        if config.use_json {
            tracing_subscriber::registry()
                .with(filter)
                .with(
                    fmt::layer()
                        .json()
                        .with_target(config.include_target)
                        .with_file(config.include_location)
                        .with_line_number(config.include_location)
                        .with_writer(std::io::stderr),
                )
                .init();
        } else {
            tracing_subscriber::registry()
                .with(filter)
                .with(
                    fmt::layer()
                        .with_target(config.include_target)
                        .with_file(config.include_location)
                        .with_line_number(config.include_location)
                        .with_writer(std::io::stderr),
                )
                .init();
        }
    });
}
