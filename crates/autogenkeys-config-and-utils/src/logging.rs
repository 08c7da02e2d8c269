//! Logging initialization.
//!
//! Library code only uses `tracing` macros. Binaries call [`init_logging`]
//! once at startup. Output always goes to stderr so that stdout stays free
//! for key material and other command output.

use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

/// Output format for log lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// Compact human-readable lines.
    Compact,
    /// One JSON object per line.
    Json,
}

impl LogFormat {
    /// Read the format from `AUTOGENKEYS_LOG_FORMAT` (defaults to compact).
    pub fn from_env() -> Self {
        std::env::var("AUTOGENKEYS_LOG_FORMAT")
            .map(|raw| Self::parse(&raw))
            .unwrap_or(Self::Compact)
    }

    fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "json" | "jsonl" => Self::Json,
            _ => Self::Compact,
        }
    }
}

/// Initialize the logging system.
///
/// The filter comes from `RUST_LOG` when set, otherwise from `level`.
/// Calling this more than once is harmless; later calls are ignored.
///
/// ```ignore
/// init_logging("info");
/// tracing::info!("ready");
/// ```
pub fn init_logging(level: &str) {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(true)
        .with_writer(std::io::stderr);

    let _ = match LogFormat::from_env() {
        LogFormat::Json => builder.json().finish().try_init(),
        LogFormat::Compact => builder.compact().finish().try_init(),
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn log_format_parse() {
        assert_eq!(LogFormat::parse("json"), LogFormat::Json);
        assert_eq!(LogFormat::parse(" JSONL "), LogFormat::Json);
        assert_eq!(LogFormat::parse("pretty"), LogFormat::Compact);
    }

    #[test]
    fn init_logging_twice_does_not_panic() {
        init_logging("debug");
        init_logging("info");
        tracing::debug!("still alive");
    }
}
