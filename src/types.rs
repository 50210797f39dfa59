use std::{fmt, str::FromStr};

pub const CR: u8 = b'\r';
pub const LF: u8 = b'\n';

/// Line ending convention.
///
/// Used both as the kind of a boundary found in the input and as the target
/// every boundary is rewritten to by a [`NewlineConverter`](crate::NewlineConverter).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum NewlineType {
    /// `\r`, classic Mac OS.
    Cr,
    /// `\n`, most UNIX platforms.
    #[default]
    Lf,
    /// `\r\n`, Windows.
    CrLf,
}

impl NewlineType {
    pub const ALL: [NewlineType; 3] = [NewlineType::Cr, NewlineType::Lf, NewlineType::CrLf];

    /// The bytes written for a boundary of this kind.
    #[must_use]
    pub const fn as_bytes(self) -> &'static [u8] {
        match self {
            NewlineType::Cr => &[CR],
            NewlineType::Lf => &[LF],
            NewlineType::CrLf => &[CR, LF],
        }
    }

    #[must_use]
    #[allow(clippy::len_without_is_empty)]
    pub const fn len(self) -> usize {
        self.as_bytes().len()
    }

    /// Preference name of this newline type.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            NewlineType::Cr => "cr",
            NewlineType::Lf => "lf",
            NewlineType::CrLf => "cr-lf",
        }
    }
}

impl fmt::Display for NewlineType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for NewlineType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "cr" => Ok(NewlineType::Cr),
            "lf" => Ok(NewlineType::Lf),
            "cr-lf" | "crlf" | "cr_lf" => Ok(NewlineType::CrLf),
            _ => Err(Error::UnknownNewlineType(s.to_owned())),
        }
    }
}

/// Error type for conversion operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// The provided output buffer was too small to guarantee progress.
    ///
    /// Nothing was read or written; retry the same input with at least
    /// `required` bytes of output space.
    #[error("not enough space in destination; required {required} bytes")]
    InsufficientOutputSpace { required: usize },

    /// No progress can be made without more input, or without telling the
    /// converter the stream ended (`INPUT_AT_END`) or must be flushed (`FLUSH`).
    #[error("incomplete input; supply more input or set INPUT_AT_END or FLUSH")]
    AmbiguousStreamState,

    /// A preference value did not name a newline type.
    #[error("unknown newline type {0:?}")]
    UnknownNewlineType(String),

    /// A document was written to after it was closed.
    #[error("document output stream is already closed")]
    DocumentClosed,
}

impl Error {
    /// Output size that would have been accepted, if this is a space error.
    #[must_use]
    pub fn required_size(&self) -> Option<usize> {
        match self {
            Error::InsufficientOutputSpace { required } => Some(*required),
            _ => None,
        }
    }
}

/// Result type alias for conversion operations.
pub type Result<T> = std::result::Result<T, Error>;
