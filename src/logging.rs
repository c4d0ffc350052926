//! Structured logging to a daily rolling file.
//!
//! The filter defaults to `info` and honours `RUST_LOG`.

use crate::models::error::ModError;
use camino::Utf8Path;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

pub const LOG_FILE_NAME: &str = "modlist_keeper.log";

/// Installs the global subscriber. The returned guard flushes the file
/// writer when dropped and must be kept alive.
///
/// Calling this again after a subscriber is installed keeps the existing one.
pub fn init(log_dir: &Utf8Path) -> Result<WorkerGuard, ModError> {
    std::fs::create_dir_all(log_dir)?;

    let appender = tracing_appender::rolling::daily(log_dir, LOG_FILE_NAME);
    let (writer, guard) = tracing_appender::non_blocking(appender);

    let file_layer = tracing_subscriber::fmt::layer()
        .with_writer(writer)
        .with_ansi(false)
        .with_target(true);

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    if tracing_subscriber::registry()
        .with(env_filter)
        .with(file_layer)
        .try_init()
        .is_err()
    {
        tracing::debug!(dir = %log_dir, "Subscriber already installed, keeping it");
    }

    Ok(guard)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn init_twice_is_harmless() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = Utf8Path::from_path(tmp.path()).unwrap().join("logs");

        let _first = init(&dir).unwrap();
        let _second = init(&dir).unwrap();
        tracing::info!("logging initialised");
        assert!(dir.is_dir());
    }
}
