//! Logging and tracing initialization.
//!
//! Logs go to stderr so they never interleave with command output on
//! stdout, or to the configured file when one is set.

use std::sync::Mutex;

use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::{fmt, EnvFilter};

use crate::config::LoggingConfig;

/// Install the global tracing subscriber. `RUST_LOG` overrides the
/// configured level. Calling it twice is harmless.
pub fn init_logging(config: &LoggingConfig) {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));
    let (writer, ansi) = log_writer(config);

    let installed = if config.json {
        let subscriber = fmt::Subscriber::builder()
            .with_env_filter(env_filter)
            .json()
            .with_writer(writer)
            .finish();
        tracing::subscriber::set_global_default(subscriber)
    } else {
        let subscriber = fmt::Subscriber::builder()
            .with_env_filter(env_filter)
            .with_target(true)
            .with_ansi(ansi)
            .with_file(false)
            .with_line_number(false)
            .with_writer(writer)
            .finish();
        tracing::subscriber::set_global_default(subscriber)
    };
    if installed.is_err() {
        tracing::debug!("Tracing subscriber already installed");
    }
}

/// Writer for the subscriber, and whether colours make sense on it.
fn log_writer(config: &LoggingConfig) -> (BoxMakeWriter, bool) {
    let Some(path) = &config.file else {
        return (BoxMakeWriter::new(std::io::stderr), true);
    };
    match std::fs::OpenOptions::new().create(true).append(true).open(path) {
        Ok(file) => (BoxMakeWriter::new(Mutex::new(file)), false),
        Err(e) => {
            eprintln!("Cannot open log file {}: {e}; logging to stderr", path.display());
            (BoxMakeWriter::new(std::io::stderr), true)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unwritable_log_file_falls_back_to_stderr() {
        let dir = tempfile::tempdir().unwrap();
        let config = LoggingConfig {
            file: Some(dir.path().join("missing").join("reelkit.log")),
            ..LoggingConfig::default()
        };
        let (_, ansi) = log_writer(&config);
        assert!(ansi);

        let config = LoggingConfig {
            file: Some(dir.path().join("reelkit.log")),
            ..LoggingConfig::default()
        };
        let (_, ansi) = log_writer(&config);
        assert!(!ansi);
        assert!(dir.path().join("reelkit.log").exists());
    }

    #[test]
    fn test_init_twice_is_harmless() {
        init_logging(&LoggingConfig::default());
        init_logging(&LoggingConfig::default());
    }
}
