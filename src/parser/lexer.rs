//! Line tokenizer for the trace wire format.
//!
//! # Quoting grammar
//!
//! ```text
//! line    := ws* (comment | fields)? ws*
//! comment := '#' (ws rest-of-line)?     -- rest kept as written
//! fields  := field (ws+ field)*
//! field   := (bare | quoted)+            -- adjacent pieces glue into one field
//! bare    := any char except ws and '"'
//! quoted  := '"' (escape | any char except '"' and '\')* '"'?
//! escape  := '\' ('"' | '\')             -- any other '\x' is kept literally
//! ```
//!
//! A quoted region that is never closed extends to the end of the line.
//! `""` yields an empty field, which is how producers mark a missing
//! thread id.

use std::borrow::Cow;

/// One line of input after tokenization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenizedLine {
    /// Empty or whitespace-only line.
    Blank,
    /// `# text` line. Holds the text after the marker, verbatim.
    Comment(String),
    /// Ordinary command line split into fields (quotes stripped).
    Fields(Vec<String>),
}

/// Tokenize a single line (trailing newline is tolerated).
pub fn tokenize(line: &str) -> TokenizedLine {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return TokenizedLine::Blank;
    }

    // Only the line terminator is stripped from a comment; the text after
    // '#' is journaled byte for byte.
    let unterminated = line.trim_start().trim_end_matches(['\n', '\r']);
    if let Some(rest) = unterminated.strip_prefix('#') {
        if rest.is_empty() || rest.starts_with(char::is_whitespace) {
            return TokenizedLine::Comment(rest.to_string());
        }
    }

    TokenizedLine::Fields(split_fields(trimmed))
}

/// Split a line into fields, honouring double quotes.
///
/// Never fails: malformed quoting degrades to "field runs to end of line".
pub fn split_fields(line: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut in_field = false;
    let mut chars = line.chars();

    while let Some(c) = chars.next() {
        match c {
            '"' => {
                in_field = true;
                loop {
                    match chars.next() {
                        None | Some('"') => break,
                        Some('\\') => match chars.next() {
                            Some(escaped @ ('"' | '\\')) => current.push(escaped),
                            Some(other) => {
                                current.push('\\');
                                current.push(other);
                            }
                            None => current.push('\\'),
                        },
                        Some(other) => current.push(other),
                    }
                }
            }
            c if c.is_whitespace() => {
                if in_field {
                    fields.push(std::mem::take(&mut current));
                    in_field = false;
                }
            }
            c => {
                in_field = true;
                current.push(c);
            }
        }
    }

    if in_field {
        fields.push(current);
    }

    fields
}

/// Quote a field for output so that [`split_fields`] reads it back unchanged.
pub fn quote_field(field: &str) -> Cow<'_, str> {
    let needs_quotes = field.is_empty()
        || field.starts_with('#')
        || field
            .chars()
            .any(|c| c.is_whitespace() || c == '"' || c == '\\');

    if !needs_quotes {
        return Cow::Borrowed(field);
    }

    let mut quoted = String::with_capacity(field.len() + 2);
    quoted.push('"');
    for c in field.chars() {
        if c == '"' || c == '\\' {
            quoted.push('\\');
        }
        quoted.push(c);
    }
    quoted.push('"');
    Cow::Owned(quoted)
}

/// Join fields into one wire line (no trailing newline).
pub fn join_fields<S: AsRef<str>>(fields: &[S]) -> String {
    fields
        .iter()
        .map(|f| quote_field(f.as_ref()))
        .collect::<Vec<_>>()
        .join(" ")
}
