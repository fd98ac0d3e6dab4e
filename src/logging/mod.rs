//! Tracing subscriber initialization.
//!
//! The viewer owns the terminal, so diagnostics (rejected lines, connection
//! events, lane assignment) go to a file. Follow them with `tail -f`.

use std::path::{Path, PathBuf};
use thiserror::Error;

/// Why the log file could not be set up.
#[derive(Debug, Error)]
pub enum LoggingError {
    /// The log directory could not be created.
    #[error("Cannot create log directory {path:?}: {source}")]
    DirectoryCreation {
        /// Directory that could not be created.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The path does not end in a file name.
    #[error("Log path {0:?} does not name a file")]
    InvalidPath(PathBuf),

    /// A global subscriber is already installed.
    #[error("Tracing subscriber already initialized")]
    SubscriberAlreadySet,
}

/// Install the global subscriber, appending to `log_path`.
///
/// The filter comes from `RUST_LOG` and falls back to `info`; `debug` shows
/// every applied command. Lines carry the thread name, so output from each
/// file source and connection can be told apart.
///
/// # Errors
///
/// Returns `LoggingError` if the path names no file, the directory cannot
/// be created, or a subscriber is already installed.
pub fn init(log_path: &Path) -> Result<(), LoggingError> {
    use tracing_subscriber::EnvFilter;

    let (Some(directory), Some(file_name)) = (log_path.parent(), log_path.file_name()) else {
        return Err(LoggingError::InvalidPath(log_path.to_path_buf()));
    };
    // a bare file name has an empty parent: log next to the working directory
    let directory = if directory.as_os_str().is_empty() {
        Path::new(".")
    } else {
        directory
    };
    std::fs::create_dir_all(directory).map_err(|source| LoggingError::DirectoryCreation {
        path: directory.to_path_buf(),
        source,
    })?;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(tracing_appender::rolling::never(directory, file_name))
        .with_thread_names(true)
        .with_ansi(false)
        .try_init()
        .map_err(|_| LoggingError::SubscriberAlreadySet)
}
