//! Reassembles newline-terminated lines from arbitrary byte chunks.

use tracing::warn;

/// Longest line kept while waiting for its newline. Anything longer is
/// dropped up to and including the next newline.
pub const MAX_LINE_BYTES: usize = 1 << 20;

/// Byte accumulator for a stream that delivers partial reads.
#[derive(Debug, Default)]
pub struct LineBuffer {
    pending: Vec<u8>,
    // pending[..scanned] holds no newline
    scanned: usize,
    overlong: bool,
}

impl LineBuffer {
    /// Empty buffer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a chunk and return every line it completed.
    ///
    /// Line terminators (`\n`, `\r\n`) are stripped; invalid UTF-8 is
    /// replaced rather than rejected.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        self.pending.extend_from_slice(chunk);
        let mut lines = Vec::new();
        let mut start = 0;
        let mut from = self.scanned;
        while let Some(offset) = self.pending[from..].iter().position(|&b| b == b'\n') {
            let end = from + offset;
            if self.overlong {
                self.overlong = false;
            } else {
                lines.push(decode_line(&self.pending[start..end]));
            }
            start = end + 1;
            from = start;
        }
        self.pending.drain(..start);
        self.scanned = self.pending.len();
        if self.pending.len() > MAX_LINE_BYTES {
            warn!(bytes = self.pending.len(), "Dropping overlong line");
            self.clear();
            self.overlong = true;
        }
        lines
    }

    /// Take whatever is buffered as a final line, if anything.
    pub fn take_remainder(&mut self) -> Option<String> {
        let line = (!self.pending.is_empty() && !self.overlong)
            .then(|| decode_line(&self.pending));
        self.clear();
        self.overlong = false;
        line
    }

    fn clear(&mut self) {
        self.pending.clear();
        self.scanned = 0;
    }
}

/// Decode one line, dropping a trailing `\r`.
pub(crate) fn decode_line(bytes: &[u8]) -> String {
    let bytes = bytes.strip_suffix(b"\r").unwrap_or(bytes);
    String::from_utf8_lossy(bytes).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_complete_lines() {
        let mut buf = LineBuffer::new();
        assert_eq!(buf.push(b"CAL a 1 f\nRET a 2\n"), vec!["CAL a 1 f", "RET a 2"]);
        assert_eq!(buf.pending.len(), 0);
    }

    #[test]
    fn holds_partial_line_until_newline() {
        let mut buf = LineBuffer::new();
        assert!(buf.push(b"CAL a 1").is_empty());
        assert_eq!(buf.push(b" f\nRET"), vec!["CAL a 1 f"]);
        assert_eq!(buf.pending.len(), 3);
        assert_eq!(buf.push(b" a 2\n"), vec!["RET a 2"]);
    }

    #[test]
    fn strips_crlf() {
        let mut buf = LineBuffer::new();
        assert_eq!(buf.push(b"TRM a\r\n"), vec!["TRM a"]);
    }

    #[test]
    fn empty_lines_are_preserved() {
        let mut buf = LineBuffer::new();
        assert_eq!(buf.push(b"\n\n"), vec!["", ""]);
    }

    #[test]
    fn invalid_utf8_is_replaced() {
        let mut buf = LineBuffer::new();
        let lines = buf.push(b"EVT a 1 \xff\n");
        assert_eq!(lines, vec!["EVT a 1 \u{fffd}"]);
    }

    #[test]
    fn line_split_into_many_chunks_is_reassembled() {
        let mut buf = LineBuffer::new();
        for byte in b"EVT a 1 tick" {
            assert!(buf.push(&[*byte]).is_empty());
        }
        assert_eq!(buf.scanned, buf.pending.len());
        assert_eq!(buf.push(b"\nRET"), vec!["EVT a 1 tick"]);
        assert_eq!(buf.scanned, 3);
    }

    #[test]
    fn overlong_line_is_dropped_through_its_newline() {
        // GIVEN a line that outgrows the limit before its newline arrives
        let mut buf = LineBuffer::new();
        let junk = vec![b'x'; MAX_LINE_BYTES / 2 + 1];
        assert!(buf.push(&junk).is_empty());
        assert!(buf.push(&junk).is_empty());
        assert_eq!(buf.pending.len(), 0);

        // WHEN the rest of it and a normal line follow
        let lines = buf.push(b"xxx\nTRM a\n");

        // THEN only the normal line comes out
        assert_eq!(lines, vec!["TRM a"]);
        assert_eq!(buf.take_remainder(), None);
    }

    #[test]
    fn overlong_remainder_is_not_a_line() {
        let mut buf = LineBuffer::new();
        buf.push(&vec![b'x'; MAX_LINE_BYTES + 1]);
        assert_eq!(buf.take_remainder(), None);
        assert_eq!(buf.push(b"TRM a\n"), vec!["TRM a"]);
    }

    #[test]
    fn remainder_is_taken_once() {
        let mut buf = LineBuffer::new();
        buf.push(b"TRM a");
        assert_eq!(buf.take_remainder(), Some("TRM a".to_string()));
        assert_eq!(buf.take_remainder(), None);
    }
}
