//! Streaming newline conversion.
//!
//! [`NewlineConverter::convert`] is the chunk primitive everything else in
//! this crate is built on. It rewrites every line boundary (`\r`, `\n` or
//! `\r\n`) in its input to the configured [`NewlineType`], copies everything
//! else verbatim, and never writes past the end of the output buffer.
//!
//! The caller owns all buffering: whatever a call did not consume must be
//! presented again, followed by new data, on the next call. A `\r` that ends
//! the input is only consumed once the converter can tell whether a `\n`
//! follows, i.e. when more input arrives or the caller sets
//! [`ConvertFlags::INPUT_AT_END`] or [`ConvertFlags::FLUSH`].
use std::{fmt, ops::BitOr, string::FromUtf8Error};

use crate::{
    boundary::{find_boundary, Scan},
    types::{NewlineType, LF},
    Error, Result,
};

/// Smallest output buffer `convert` accepts; enough for one `\r\n`.
pub const MIN_OUTPUT_SIZE: usize = 2;

/// Stream state the caller hands to [`NewlineConverter::convert`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct ConvertFlags {
    input_at_end: bool,
    flush: bool,
}

impl ConvertFlags {
    /// More input may follow.
    pub const NONE: Self = Self {
        input_at_end: false,
        flush: false,
    };
    /// The input of this call is the end of the stream.
    pub const INPUT_AT_END: Self = Self {
        input_at_end: true,
        flush: false,
    };
    /// Emit everything that can be emitted now, even if more input follows.
    pub const FLUSH: Self = Self {
        input_at_end: false,
        flush: true,
    };

    #[must_use]
    pub const fn input_at_end(self) -> bool {
        self.input_at_end
    }

    #[must_use]
    pub const fn flush(self) -> bool {
        self.flush
    }
}

impl BitOr for ConvertFlags {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self {
            input_at_end: self.input_at_end || rhs.input_at_end,
            flush: self.flush || rhs.flush,
        }
    }
}

/// How far a `convert` call got.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConvertStatus {
    /// Some input may be left; call again with the rest and/or more input.
    Converted,
    /// All input was consumed and the stream ended.
    Finished,
    /// All input was consumed in response to a flush request.
    Flushed,
}

/// Outcome of a successful `convert` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConvertResult {
    status: ConvertStatus,
    bytes_read: usize,
    bytes_written: usize,
}

impl ConvertResult {
    #[must_use]
    pub(crate) fn new(status: ConvertStatus, bytes_read: usize, bytes_written: usize) -> Self {
        Self {
            status,
            bytes_read,
            bytes_written,
        }
    }

    #[must_use]
    pub fn status(&self) -> ConvertStatus {
        self.status
    }

    /// Number of input bytes consumed. The rest must be presented again.
    #[must_use]
    pub fn bytes_read(&self) -> usize {
        self.bytes_read
    }

    /// Number of bytes written to the start of the output buffer.
    #[must_use]
    pub fn bytes_written(&self) -> usize {
        self.bytes_written
    }
}

/// Handle returned by [`NewlineConverter::connect_target_changed`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerId(u64);

type Listener = Box<dyn FnMut(NewlineType) + Send>;

/// Converts line boundaries in a byte stream to a single [`NewlineType`].
pub struct NewlineConverter {
    target: NewlineType,
    // A trailing CR was emitted by a flush; an LF opening the next call
    // belongs to it.
    after_flushed_cr: bool,
    listeners: Vec<(ListenerId, Listener)>,
    next_listener: u64,
}

impl NewlineConverter {
    #[must_use]
    pub fn new(target: NewlineType) -> Self {
        Self {
            target,
            after_flushed_cr: false,
            listeners: Vec::new(),
            next_listener: 0,
        }
    }

    #[must_use]
    pub fn target(&self) -> NewlineType {
        self.target
    }

    /// Set the newline type boundaries are converted to.
    ///
    /// Returns `true` and notifies every listener if the value changed.
    pub fn set_target(&mut self, target: NewlineType) -> bool {
        if self.target == target {
            return false;
        }
        tracing::debug!(from = %self.target, to = %target, "newline target changed");
        self.target = target;
        for (_, listener) in &mut self.listeners {
            listener(target);
        }
        true
    }

    /// Register `listener` to be called with the new target whenever it changes.
    pub fn connect_target_changed<F>(&mut self, listener: F) -> ListenerId
    where
        F: FnMut(NewlineType) + Send + 'static,
    {
        let id = ListenerId(self.next_listener);
        self.next_listener += 1;
        self.listeners.push((id, Box::new(listener)));
        id
    }

    /// Remove a listener. Returns `false` if it was not registered.
    pub fn disconnect(&mut self, id: ListenerId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(listener_id, _)| *listener_id != id);
        self.listeners.len() != before
    }

    /// Forget any state carried over from previous calls so the converter
    /// can start on a new stream.
    pub fn reset(&mut self) {
        if self.after_flushed_cr {
            tracing::debug!("reset dropped pending CR LF pairing");
        }
        self.after_flushed_cr = false;
    }

    /// Convert one chunk of `input` into `output`.
    ///
    /// Copies runs without line boundaries verbatim and replaces each boundary
    /// with the target newline, stopping when either buffer runs out. A
    /// boundary is never written partially; if it does not fit it is left for
    /// the next call.
    ///
    /// # Errors
    ///
    /// - [`Error::InsufficientOutputSpace`] if `output` is shorter than
    ///   [`MIN_OUTPUT_SIZE`].
    /// - [`Error::AmbiguousStreamState`] if `input` is empty and neither
    ///   `INPUT_AT_END` nor `FLUSH` is set. The same error is returned when
    ///   `input` is a single `\r` without either flag: whether it pairs with
    ///   a following `\n` is unknown, so the call cannot make progress. Such
    ///   a call behaves like a partial-input condition; present the `\r`
    ///   again together with more input, or set one of the flags.
    ///
    /// Nothing is read or written when an error is returned.
    pub fn convert(
        &mut self,
        input: &[u8],
        output: &mut [u8],
        flags: ConvertFlags,
    ) -> Result<ConvertResult> {
        if output.len() < MIN_OUTPUT_SIZE {
            return Err(Error::InsufficientOutputSpace {
                required: MIN_OUTPUT_SIZE,
            });
        }

        if input.is_empty() {
            return if flags.input_at_end() {
                self.after_flushed_cr = false;
                Ok(ConvertResult::new(ConvertStatus::Finished, 0, 0))
            } else if flags.flush() {
                Ok(ConvertResult::new(ConvertStatus::Flushed, 0, 0))
            } else {
                Err(Error::AmbiguousStreamState)
            };
        }

        let mut read_pos = 0;
        let mut write_pos = 0;

        if std::mem::take(&mut self.after_flushed_cr) && input[0] == LF {
            // The CR half of this CR LF went out with the previous flush.
            read_pos = 1;
        }

        let newline = self.target.as_bytes();

        while read_pos < input.len() && write_pos < output.len() {
            let in_left = input.len() - read_pos;
            let out_left = output.len() - write_pos;

            let (start, kind, trailing) = match find_boundary(&input[read_pos..]) {
                Scan::NotFound => {
                    copy_run(input, output, &mut read_pos, &mut write_pos, in_left.min(out_left));
                    break;
                }
                Scan::Found { start, kind } => (start, kind, false),
                Scan::TrailingCr { start } if flags.input_at_end() || flags.flush() => {
                    (start, NewlineType::Cr, true)
                }
                Scan::TrailingCr { start } => {
                    let bytes_now = start.min(out_left);
                    copy_run(input, output, &mut read_pos, &mut write_pos, bytes_now);
                    if bytes_now == start {
                        tracing::debug!(offset = read_pos, "holding back trailing CR");
                    }
                    break;
                }
            };

            if start > out_left {
                copy_run(input, output, &mut read_pos, &mut write_pos, out_left);
                break;
            }
            if start == out_left {
                // Leave the boundary for the next call instead of starting it
                // in a full buffer.
                copy_run(input, output, &mut read_pos, &mut write_pos, out_left - 1);
                break;
            }
            if start + newline.len() > out_left {
                copy_run(input, output, &mut read_pos, &mut write_pos, start);
                break;
            }

            copy_run(input, output, &mut read_pos, &mut write_pos, start);
            output[write_pos..write_pos + newline.len()].copy_from_slice(newline);
            write_pos += newline.len();
            read_pos += kind.len();

            if trailing && !flags.input_at_end() {
                self.after_flushed_cr = true;
            }
        }

        if read_pos == 0 && write_pos == 0 {
            // Only a lone CR was given and we may not decide what it is yet.
            return Err(Error::AmbiguousStreamState);
        }

        let status = if read_pos < input.len() {
            ConvertStatus::Converted
        } else if flags.input_at_end() {
            self.after_flushed_cr = false;
            ConvertStatus::Finished
        } else if flags.flush() {
            ConvertStatus::Flushed
        } else {
            ConvertStatus::Converted
        };

        tracing::trace!(
            newline = %self.target,
            bytes_read = read_pos,
            bytes_written = write_pos,
            ?status,
            "converted chunk"
        );

        Ok(ConvertResult::new(status, read_pos, write_pos))
    }

    /// Convert a whole byte slice, returning an owned `Vec<u8>`.
    ///
    /// The slice is treated as a complete stream.
    #[must_use]
    pub fn convert_all(&mut self, input: &[u8]) -> Vec<u8> {
        // Every input byte produces at most two output bytes.
        let mut output = vec![0u8; input.len() * 2 + MIN_OUTPUT_SIZE];
        let mut read_pos = 0;
        let mut write_pos = 0;
        loop {
            let result = self
                .convert(
                    &input[read_pos..],
                    &mut output[write_pos..],
                    ConvertFlags::INPUT_AT_END,
                )
                .unwrap_or_else(|err| unreachable!("{err} (should be impossible)"));
            read_pos += result.bytes_read();
            write_pos += result.bytes_written();
            if result.status() == ConvertStatus::Finished {
                break;
            }
        }
        output.truncate(write_pos);
        output
    }

    /// Convert a UTF-8 string, returning an owned `String`.
    ///
    /// Conversion only replaces ASCII CR/LF bytes and therefore preserves
    /// UTF-8 validity.
    #[must_use]
    pub fn convert_str(&mut self, input: &str) -> String {
        String::from_utf8(self.convert_all(input.as_bytes())).unwrap_or_else(
            |FromUtf8Error { .. }| unreachable!("conversion produced invalid UTF-8"),
        )
    }
}

impl Default for NewlineConverter {
    fn default() -> Self {
        Self::new(NewlineType::default())
    }
}

impl fmt::Debug for NewlineConverter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NewlineConverter")
            .field("target", &self.target)
            .field("after_flushed_cr", &self.after_flushed_cr)
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

fn copy_run(
    input: &[u8],
    output: &mut [u8],
    read_pos: &mut usize,
    write_pos: &mut usize,
    len: usize,
) {
    output[*write_pos..*write_pos + len].copy_from_slice(&input[*read_pos..*read_pos + len]);
    *read_pos += len;
    *write_pos += len;
}

impl NewlineType {
    /// Convert a whole byte slice to this newline type.
    #[must_use]
    pub fn normalize(self, input: &[u8]) -> Vec<u8> {
        NewlineConverter::new(self).convert_all(input)
    }

    /// Convert a whole string to this newline type.
    #[must_use]
    pub fn normalize_str(self, input: &str) -> String {
        NewlineConverter::new(self).convert_str(input)
    }
}
