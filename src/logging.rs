use anyhow::{Context, Result};
use camino::Utf8PathBuf;
use std::fs;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling;
use tracing_subscriber::{EnvFilter, Layer, layer::SubscriberExt, util::SubscriberInitExt};

/// How the process-wide subscriber is set up.
#[derive(Debug, Clone)]
pub struct LogOptions {
    /// Directory for the daily rotating log files
    pub dir: Utf8PathBuf,
    /// File name prefix, e.g. `slidedeck` gives `slidedeck.2026-10-16`
    pub prefix: String,
    /// Debug level instead of info. `RUST_LOG` overrides both.
    pub debug: bool,
    /// Also log to stderr
    pub console: bool,
    /// Write the file log as JSON lines
    pub json: bool,
}

impl Default for LogOptions {
    fn default() -> Self {
        Self {
            dir: Utf8PathBuf::from("logs"),
            prefix: crate::APP_NAME.to_string(),
            debug: false,
            console: true,
            json: false,
        }
    }
}

/// Install the global tracing subscriber.
///
/// Returns the appender guard; hold it for the life of the program or
/// buffered lines are lost. Fails instead of panicking when a subscriber is
/// already installed.
pub fn init(options: &LogOptions) -> Result<WorkerGuard> {
    if !options.dir.exists() {
        fs::create_dir_all(&options.dir)
            .with_context(|| format!("Failed to create log directory: {}", options.dir))?;
    }

    let file_appender = rolling::daily(&options.dir, &options.prefix);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(if options.debug { "debug" } else { "info" })
    });

    let file_layer = if options.json {
        tracing_subscriber::fmt::layer()
            .json()
            .with_writer(non_blocking)
            .with_target(true)
            .with_thread_ids(true)
            .boxed()
    } else {
        tracing_subscriber::fmt::layer()
            .with_writer(non_blocking)
            .with_ansi(false) // No ANSI codes in log files
            .with_target(true)
            .with_thread_ids(true)
            .with_file(true)
            .with_line_number(true)
            .boxed()
    };

    let console_layer = options.console.then(|| {
        tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .with_ansi(true)
            .with_target(false)
    });

    tracing_subscriber::registry()
        .with(env_filter)
        .with(file_layer)
        .with(console_layer)
        .try_init()
        .context("A global tracing subscriber is already installed")?;

    tracing::info!(
        "Logging initialized: dir={}, prefix={}, debug={}, console={}, json={}",
        options.dir,
        options.prefix,
        options.debug,
        options.console,
        options.json
    );

    Ok(guard)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_init_creates_directory() {
        let temp_dir = TempDir::new().unwrap();
        let dir = Utf8PathBuf::try_from(temp_dir.path().join("logs")).unwrap();
        let options = LogOptions {
            dir: dir.clone(),
            prefix: "test".to_string(),
            console: false,
            ..LogOptions::default()
        };

        // May fail if another test already installed a subscriber; the
        // directory is created either way
        let _result = init(&options);
        assert!(dir.exists());
    }

    #[test]
    fn test_second_init_is_an_error_not_a_panic() {
        let temp_dir = TempDir::new().unwrap();
        let options = LogOptions {
            dir: Utf8PathBuf::try_from(temp_dir.path().to_path_buf()).unwrap(),
            prefix: "twice".to_string(),
            console: false,
            json: true,
            ..LogOptions::default()
        };

        let first = init(&options);
        let second = init(&options);
        assert!(first.is_err() || second.is_err());
    }
}
