//! vizexec - live execution-trace sequence diagrams
//!
//! Producers (trace files, TCP connections) emit a line-oriented command
//! stream. Lines are tokenized, dispatched into a [`model::SequenceModel`]
//! that keeps one lifeline per thread, and the model is walked lazily to
//! paint or hit-test the visible slice of the diagram.
//!
//! Layering follows a pure core / impure shell split:
//! - pure: `parser`, `model`, `view_state`
//! - impure: `source` (threads, sockets, files), `view` (terminal),
//!   `config`, `logging`

pub mod config;
pub mod logging;
pub mod model;
pub mod parser;
pub mod source;
pub mod view;
pub mod view_state;
