//! Tracing subscriber setup.

use crate::error::{CliError, Result};
use std::fs::OpenOptions;
use std::path::Path;
use std::sync::Mutex;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

/// Build the log filter: an explicit level wins, then `RUST_LOG`, then `info`.
pub fn build_filter(level: Option<&str>) -> Result<EnvFilter> {
    match level {
        Some(level) => EnvFilter::try_new(level)
            .map_err(|e| CliError::Logging(format!("invalid log filter '{}': {}", level, e))),
        None => Ok(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))),
    }
}

/// Install the global subscriber.
///
/// Logs go to stderr and, when `log_file` is given, are appended to that
/// file as plain text.
pub fn init(level: Option<&str>, log_file: Option<&Path>) -> Result<()> {
    let filter = build_filter(level)?;

    let file_layer = match log_file {
        Some(path) => {
            let file = OpenOptions::new().create(true).append(true).open(path)?;
            Some(
                fmt::layer()
                    .with_ansi(false)
                    .with_target(false)
                    .with_writer(Mutex::new(file)),
            )
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(file_layer)
        .try_init()
        .map_err(|e| CliError::Logging(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_explicit_filter() {
        assert!(build_filter(Some("docket_extractor=debug,warn")).is_ok());
    }

    #[test]
    fn test_invalid_filter() {
        assert!(matches!(
            build_filter(Some("docket=notalevel")),
            Err(CliError::Logging(_))
        ));
    }
}
