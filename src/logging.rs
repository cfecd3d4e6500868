use anyhow::Result;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

/// Environment variable selecting the log level (`trace`, `debug`, `info`, `warn`, `error`).
pub const LOG_LEVEL_ENV: &str = "DYNAMODB_ADMIN_LOG";

/// Reads the log level from [`LOG_LEVEL_ENV`], defaulting to `INFO`.
pub fn level_from_env() -> Level {
    std::env::var(LOG_LEVEL_ENV)
        .ok()
        .and_then(|value| value.parse().ok())
        .unwrap_or(Level::INFO)
}

pub fn init_logging(level: Level) -> Result<()> {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_line_number(true)
        .with_file(true)
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;
    Ok(())
}
