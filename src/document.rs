//! Loading raw bytes into a text document.
//!
//! [`DocumentWriter`] is the sink at the end of a load: it validates UTF-8
//! incrementally, so a multi-byte character split across two writes is
//! inserted intact, and turns every byte of an invalid sequence or of a
//! noncharacter into a visible `\XX` escape instead of failing the load.
use std::io::{self, Read, Write};

use crate::{
    boundary,
    wrappers::io::IoExt,
    Error, NewlineType,
};

/// Longest prefix of a UTF-8 sequence that can still be incomplete.
const MAX_PENDING: usize = 3;

const HEX_DIGITS: &[u8; 16] = b"0123456789ABCDEF";

/// A `std::io::Write` implementation that appends to a text buffer.
#[derive(Debug, Default)]
pub struct DocumentWriter {
    text: String,
    pending: Vec<u8>,
    escaped: usize,
    closed: bool,
}

impl DocumentWriter {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The text inserted so far. Bytes of an incomplete trailing sequence are
    /// not part of it until the sequence completes or the writer is closed.
    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    #[must_use]
    pub fn into_text(self) -> String {
        self.text
    }

    /// Number of invalid bytes that were inserted as escapes.
    #[must_use]
    pub fn escaped_bytes(&self) -> usize {
        self.escaped
    }

    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Number of lines in the text; an empty document has one line.
    #[must_use]
    pub fn line_count(&self) -> usize {
        boundary::boundaries(self.text.as_bytes()).count() + 1
    }

    /// Newline type of the first line of the text, `Lf` if it has only one line.
    #[must_use]
    pub fn detect_newline_type(&self) -> NewlineType {
        boundary::detect(self.text.as_bytes()).unwrap_or_default()
    }

    /// End the document.
    ///
    /// Escapes an incomplete trailing sequence and removes one trailing line
    /// boundary, so that a final newline does not show up as an extra empty
    /// line. Closing twice does nothing.
    pub fn close(&mut self) {
        if self.closed {
            return;
        }
        let pending = std::mem::take(&mut self.pending);
        self.escape(&pending);
        self.remove_ending_newline();
        self.closed = true;
        tracing::debug!(
            len = self.text.len(),
            escaped = self.escaped,
            "document output stream closed"
        );
    }

    fn remove_ending_newline(&mut self) {
        let bytes = self.text.as_bytes();
        let ending = match bytes {
            [.., b'\r', b'\n'] => 2,
            [.., b'\r' | b'\n'] => 1,
            _ => 0,
        };
        self.text.truncate(self.text.len() - ending);
    }

    fn escape(&mut self, invalid: &[u8]) {
        if invalid.is_empty() {
            return;
        }
        tracing::warn!(bytes = invalid.len(), "escaping invalid UTF-8");
        for &byte in invalid {
            self.text.push('\\');
            self.text.push(char::from(HEX_DIGITS[usize::from(byte >> 4)]));
            self.text.push(char::from(HEX_DIGITS[usize::from(byte & 0x0f)]));
        }
        self.escaped += invalid.len();
    }

    // Noncharacters are valid UTF-8 but not text; they are escaped too.
    fn push_valid(&mut self, valid: &str) {
        let mut run_start = 0;
        for (offset, c) in valid.char_indices() {
            if is_noncharacter(c) {
                self.text.push_str(&valid[run_start..offset]);
                run_start = offset + c.len_utf8();
                self.escape(&valid.as_bytes()[offset..run_start]);
            }
        }
        self.text.push_str(&valid[run_start..]);
    }

    fn insert(&mut self, bytes: &[u8]) {
        let mut chunks = bytes.utf8_chunks().peekable();
        while let Some(chunk) = chunks.next() {
            self.push_valid(chunk.valid());
            let invalid = chunk.invalid();
            if chunks.peek().is_none() && is_incomplete(invalid) {
                // May be completed by the next write.
                debug_assert!(invalid.len() <= MAX_PENDING);
                self.pending.extend_from_slice(invalid);
            } else {
                self.escape(invalid);
            }
        }
    }
}

fn is_noncharacter(c: char) -> bool {
    let c = u32::from(c);
    (0xFDD0..=0xFDEF).contains(&c) || c & 0xFFFE == 0xFFFE
}

/// Whether `tail` is the start of a sequence cut off by the end of the input.
fn is_incomplete(tail: &[u8]) -> bool {
    !tail.is_empty()
        && std::str::from_utf8(tail).is_err_and(|err| err.error_len().is_none())
}

impl Write for DocumentWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if self.closed {
            return Err(io::Error::other(Error::DocumentClosed));
        }
        if self.pending.is_empty() {
            self.insert(buf);
        } else {
            let mut joined = std::mem::take(&mut self.pending);
            joined.extend_from_slice(buf);
            self.insert(&joined);
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        // An incomplete sequence stays pending; only `close` gives up on it.
        Ok(())
    }
}

/// A document read from a byte source, with the newline type it was using.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadedDocument {
    pub text: String,
    pub newline_type: NewlineType,
}

impl LoadedDocument {
    /// Write the document through a converter for `self.newline_type`,
    /// adding back the final line boundary removed on load.
    ///
    /// # Errors
    ///
    /// Returns any error of the underlying writer.
    pub fn save<W: Write>(&self, writer: W) -> io::Result<W> {
        let mut converted = self.newline_type.wrap_writer(writer);
        converted.write_all(self.text.as_bytes())?;
        // Appended after the converted text so a trailing CR in the text
        // stays a line of its own.
        let mut writer = converted.finish()?;
        writer.write_all(self.newline_type.as_bytes())?;
        Ok(writer)
    }

    /// Number of lines that are not using `self.newline_type`.
    #[must_use]
    pub fn foreign_newlines(&self) -> usize {
        boundary::boundaries(self.text.as_bytes())
            .filter(|(_, kind)| *kind != self.newline_type)
            .count()
    }
}

/// Read `reader` to the end into a new document.
///
/// # Errors
///
/// Returns any error of the underlying reader.
pub fn load<R: Read>(mut reader: R) -> io::Result<LoadedDocument> {
    let mut document = DocumentWriter::new();
    io::copy(&mut reader, &mut document)?;
    let newline_type = document.detect_newline_type();
    document.close();
    Ok(LoadedDocument {
        text: document.into_text(),
        newline_type,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    #[tracing_test::traced_test]
    fn invalid_bytes_are_escaped_and_logged() {
        let mut document = DocumentWriter::new();
        document.write_all(b"a\xffb").unwrap();
        document.close();
        assert_eq!(document.text(), "a\\FFb");
        assert_eq!(document.escaped_bytes(), 1);
        assert!(logs_contain("escaping invalid UTF-8"));
        assert!(logs_contain("document output stream closed"));
    }

    #[test]
    fn close_is_idempotent() {
        let mut document = DocumentWriter::new();
        document.write_all(b"a\n\n").unwrap();
        document.close();
        document.close();
        assert_eq!(document.text(), "a\n");
    }
}
