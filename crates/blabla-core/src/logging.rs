use tracing::Level;

use crate::{Error, Result};

/// Maps a configured level name to a tracing level.
///
/// Accepts the classic syslog-style names (`fatal`, `crit`, `notice`,
/// `information`, ...) as well as tracing's own.
pub fn parse_level(name: &str) -> Option<Level> {
    match name.trim().to_lowercase().as_str() {
        "fatal" | "crit" | "critical" | "error" => Some(Level::ERROR),
        "warning" | "warn" => Some(Level::WARN),
        "notice" | "information" | "info" => Some(Level::INFO),
        "debug" => Some(Level::DEBUG),
        "trace" => Some(Level::TRACE),
        _ => None,
    }
}

/// Initialize logging/tracing for the bot. Call once at startup.
///
/// `RUST_LOG`, when set, overrides `level`.
pub fn init(service_name: &str, level: &str) -> Result<()> {
    use tracing_subscriber::{fmt, EnvFilter};

    let level = parse_level(level)
        .ok_or_else(|| Error::Config(format!("unknown log level {level:?}")))?;
    let default_level = level.to_string().to_lowercase();
    let crate_name = service_name.replace('-', "_");

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "warn,blabla_core={default_level},blabla_http={default_level},blabla_telegram={default_level},{crate_name}={default_level}"
        ))
    });

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_ansi(true)
        .try_init()
        .map_err(|e| Error::External(format!("logging already initialized: {e}")))
}
