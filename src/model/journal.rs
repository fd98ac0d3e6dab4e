//! Append-only journal of accepted lines.
//!
//! The journal, not the derived layout, is the durable artifact: writing it
//! out and replaying it through `ingest` rebuilds an equivalent model.
//! Command lines are stored with their lifeline id already qualified.

use crate::parser::join_fields;
use std::io::{self, Write};
use std::path::Path;

/// One journaled line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JournalRecord {
    /// Comment; holds the text after `#` exactly as received.
    Comment(String),
    /// Command fields (mnemonic first).
    Fields(Vec<String>),
}

impl JournalRecord {
    /// Render as one wire line without the newline.
    pub fn to_line(&self) -> String {
        match self {
            JournalRecord::Comment(text) => format!("#{}", text),
            JournalRecord::Fields(fields) => join_fields(fields),
        }
    }
}

/// The raw log.
#[derive(Debug, Clone, Default)]
pub struct RawLog {
    records: Vec<JournalRecord>,
}

impl RawLog {
    /// Empty journal.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a comment.
    pub fn push_comment(&mut self, text: impl Into<String>) {
        self.records.push(JournalRecord::Comment(text.into()));
    }

    /// Append a command line.
    pub fn push_fields(&mut self, fields: Vec<String>) {
        self.records.push(JournalRecord::Fields(fields));
    }

    /// All records, oldest first.
    pub fn records(&self) -> &[JournalRecord] {
        &self.records
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether nothing has been journaled.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Iterate rendered lines.
    pub fn lines(&self) -> impl Iterator<Item = String> + '_ {
        self.records.iter().map(JournalRecord::to_line)
    }

    /// Write every record, one line each.
    pub fn write_to<W: Write>(&self, mut writer: W) -> io::Result<()> {
        for line in self.lines() {
            writeln!(writer, "{}", line)?;
        }
        writer.flush()
    }

    /// Write the journal to a file, replacing it.
    pub fn save(&self, path: &Path) -> io::Result<()> {
        let file = std::fs::File::create(path)?;
        self.write_to(io::BufWriter::new(file))
    }
}
