//! Error types for vizexec.
//!
//! # Error Hierarchy
//!
//! - [`AppError`] - top-level failure returned from `main`
//!   - [`InputError`] - opening files, binding sockets, reading sources
//!   - `ConfigError`, `LoggingError`, `TuiError` (defined next to their modules)
//! - [`IngestError`] - one trace line could not be applied to the model
//!   - [`ParseError`] - the line did not form a valid command
//!
//! # Recovery
//!
//! Ingestion errors are **non-fatal**. A rejected line is logged and skipped;
//! the producing source keeps flowing and no other lifeline is affected.
//! Only startup failures (bad path, port in use, terminal setup) propagate.

use std::path::PathBuf;
use thiserror::Error;

/// Top-level application error.
#[derive(Debug, Error)]
pub enum AppError {
    /// An ingestion source could not be opened or read.
    #[error("Failed to read input: {0}")]
    Input(#[from] InputError),

    /// Configuration could not be loaded.
    #[error("Configuration error: {0}")]
    Config(#[from] crate::config::ConfigError),

    /// Tracing subscriber could not be installed.
    #[error("Logging error: {0}")]
    Logging(#[from] crate::logging::LoggingError),

    /// Terminal front end failed.
    #[error("Terminal error: {0}")]
    Tui(#[from] crate::view::TuiError),
}

/// Errors raised by ingestion adapters (files, sockets) and journal I/O.
#[derive(Debug, Error)]
pub enum InputError {
    /// The trace file does not exist.
    #[error("File not found: {path}")]
    FileNotFound {
        /// Path that was attempted.
        path: PathBuf,
    },

    /// The TCP listener could not be bound.
    #[error("Failed to bind trace server on port {port}: {source}")]
    Bind {
        /// Requested port.
        port: u16,
        /// Underlying socket error.
        #[source]
        source: std::io::Error,
    },

    /// Generic I/O failure.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// A line that does not form a valid command.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    /// First field is not a known mnemonic.
    #[error("Unknown command: {0}")]
    UnknownCommand(String),

    /// Wrong number of fields for the command.
    #[error("{command}: expected {expected} argument(s), found {found}")]
    Arity {
        /// Command mnemonic.
        command: &'static str,
        /// Arguments required (excluding the mnemonic).
        expected: usize,
        /// Arguments present.
        found: usize,
    },

    /// Time field is not an unsigned integer.
    #[error("{command}: invalid time field {value:?}")]
    InvalidTime {
        /// Command mnemonic.
        command: &'static str,
        /// Offending text.
        value: String,
    },

    /// A mandatory text field (name, correlation id) was empty.
    #[error("{command}: empty {field}")]
    EmptyField {
        /// Command mnemonic.
        command: &'static str,
        /// Which field was empty.
        field: &'static str,
    },
}

/// A command that parsed but could not be applied to the model.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IngestError {
    /// The line itself was invalid.
    #[error(transparent)]
    Parse(#[from] ParseError),

    /// `RET` (or `PHS` bookkeeping) on a lifeline whose stack is empty.
    #[error("Over-return on lifeline {lifeline}: call stack is empty")]
    OverReturn {
        /// Qualified lifeline id.
        lifeline: String,
    },

    /// `INF` with nothing to attach to.
    #[error("No prior entity on lifeline {lifeline} to annotate")]
    NoPriorEntity {
        /// Qualified lifeline id.
        lifeline: String,
    },

    /// Any event after `TRM`.
    #[error("Lifeline {lifeline} is already terminated")]
    LifelineTerminated {
        /// Qualified lifeline id.
        lifeline: String,
    },

    /// `TRM` for a lifeline that was never seen.
    #[error("Unknown lifeline {lifeline}")]
    UnknownLifeline {
        /// Qualified lifeline id.
        lifeline: String,
    },
}
