//! Trace line parser.
//!
//! Pure functions turning one wire line into a [`ParsedLine`]. Parsing is
//! graceful: a malformed line becomes [`ParsedLine::Invalid`] carrying its
//! fields and the reason, so callers can journal it and move on.

pub mod command;
pub mod lexer;

pub use command::{is_unroutable_thread, Command, CommandKind, TraceTime};
pub use lexer::{join_fields, quote_field, split_fields, tokenize, TokenizedLine};

use crate::model::ParseError;

/// Result of parsing a single line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParsedLine {
    /// Nothing but whitespace.
    Blank,
    /// `# text` comment.
    Comment(String),
    /// A valid command.
    Command(Command),
    /// Fields that do not form a valid command.
    Invalid {
        /// Fields as tokenized.
        fields: Vec<String>,
        /// Why they were rejected.
        error: ParseError,
    },
}

/// Parse one line of the wire format.
pub fn parse_line(line: &str) -> ParsedLine {
    match tokenize(line) {
        TokenizedLine::Blank => ParsedLine::Blank,
        TokenizedLine::Comment(text) => ParsedLine::Comment(text),
        TokenizedLine::Fields(fields) => match Command::parse(&fields) {
            Ok(command) => ParsedLine::Command(command),
            Err(error) => ParsedLine::Invalid { fields, error },
        },
    }
}
