//! Line boundary scanning.
//!
//! Only the three ASCII conventions are recognized: `\r`, `\n` and `\r\n`
//! (one boundary, never two). Unicode separators such as NEL, LS or PS are
//! treated as ordinary text.

use memchr::memchr2;

use crate::types::{NewlineType, CR, LF};

/// Outcome of scanning a slice for its first line boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scan {
    /// The slice contains no CR or LF.
    NotFound,
    /// A complete boundary of `kind` starts at `start`.
    Found { start: usize, kind: NewlineType },
    /// The first boundary is a CR that is also the last byte of the slice.
    ///
    /// Whether it is a lone CR or the first half of CR LF depends on bytes the
    /// caller has not supplied yet.
    TrailingCr { start: usize },
}

impl Scan {
    /// Offset of the first boundary byte, if any.
    #[must_use]
    pub fn start(&self) -> Option<usize> {
        match *self {
            Scan::NotFound => None,
            Scan::Found { start, .. } | Scan::TrailingCr { start } => Some(start),
        }
    }
}

/// Find the first line boundary in `input`.
#[must_use]
pub fn find_boundary(input: &[u8]) -> Scan {
    let Some(start) = memchr2(CR, LF, input) else {
        return Scan::NotFound;
    };
    match (input[start], input.get(start + 1).copied()) {
        (LF, _) => Scan::Found {
            start,
            kind: NewlineType::Lf,
        },
        (_, Some(LF)) => Scan::Found {
            start,
            kind: NewlineType::CrLf,
        },
        (_, Some(_)) => Scan::Found {
            start,
            kind: NewlineType::Cr,
        },
        (_, None) => Scan::TrailingCr { start },
    }
}

/// Iterate over every boundary in `input`, treating a trailing CR as `Cr`.
pub fn boundaries(input: &[u8]) -> impl Iterator<Item = (usize, NewlineType)> + '_ {
    let mut pos = 0;
    std::iter::from_fn(move || {
        let (start, kind) = match find_boundary(&input[pos..]) {
            Scan::NotFound => return None,
            Scan::Found { start, kind } => (pos + start, kind),
            Scan::TrailingCr { start } => (pos + start, NewlineType::Cr),
        };
        pos = start + kind.len();
        Some((start, kind))
    })
}

/// Kind of the first line boundary in `input`, if there is one.
#[must_use]
pub fn detect(input: &[u8]) -> Option<NewlineType> {
    boundaries(input).next().map(|(_, kind)| kind)
}

/// Number of boundaries of each kind found in a buffer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NewlineCounts {
    pub cr: usize,
    pub lf: usize,
    pub crlf: usize,
}

impl NewlineCounts {
    #[must_use]
    pub fn count(input: &[u8]) -> Self {
        let mut counts = Self::default();
        for (_, kind) in boundaries(input) {
            match kind {
                NewlineType::Cr => counts.cr += 1,
                NewlineType::Lf => counts.lf += 1,
                NewlineType::CrLf => counts.crlf += 1,
            }
        }
        counts
    }

    #[must_use]
    pub fn total(&self) -> usize {
        self.cr + self.lf + self.crlf
    }

    /// Whether more than one convention occurs.
    #[must_use]
    pub fn is_mixed(&self) -> bool {
        [self.cr, self.lf, self.crlf].iter().filter(|&&n| n > 0).count() > 1
    }

    /// The most frequent convention, `None` when there are no boundaries.
    ///
    /// Ties prefer `Lf`, then `CrLf`, then `Cr`.
    #[must_use]
    pub fn dominant(&self) -> Option<NewlineType> {
        if self.total() == 0 {
            return None;
        }
        [
            (self.lf, NewlineType::Lf),
            (self.crlf, NewlineType::CrLf),
            (self.cr, NewlineType::Cr),
        ]
        .into_iter()
        .reduce(|best, next| if next.0 > best.0 { next } else { best })
        .map(|(_, kind)| kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_boundary() {
        assert_eq!(find_boundary(b"hello"), Scan::NotFound);
        assert_eq!(find_boundary(b""), Scan::NotFound);
    }

    #[test]
    fn each_kind() {
        assert_eq!(
            find_boundary(b"ab\ncd"),
            Scan::Found {
                start: 2,
                kind: NewlineType::Lf
            }
        );
        assert_eq!(
            find_boundary(b"ab\rcd"),
            Scan::Found {
                start: 2,
                kind: NewlineType::Cr
            }
        );
        assert_eq!(
            find_boundary(b"ab\r\ncd"),
            Scan::Found {
                start: 2,
                kind: NewlineType::CrLf
            }
        );
    }

    #[test]
    fn lf_cr_is_two_boundaries() {
        let found: Vec<_> = boundaries(b"\n\r").collect();
        assert_eq!(found, vec![(0, NewlineType::Lf), (1, NewlineType::Cr)]);
    }

    #[test]
    fn cr_at_end_is_undecided() {
        assert_eq!(find_boundary(b"ab\r"), Scan::TrailingCr { start: 2 });
        assert_eq!(find_boundary(b"ab\r").start(), Some(2));
    }

    #[test]
    fn mixed_boundaries() {
        let found: Vec<_> = boundaries(b"hello\n\r\r\nhello\r\n").collect();
        assert_eq!(
            found,
            vec![
                (5, NewlineType::Lf),
                (6, NewlineType::Cr),
                (7, NewlineType::CrLf),
                (14, NewlineType::CrLf),
            ]
        );
    }

    #[test]
    fn detect_first() {
        assert_eq!(detect(b"a\r\nb\nc"), Some(NewlineType::CrLf));
        assert_eq!(detect(b"a\r"), Some(NewlineType::Cr));
        assert_eq!(detect(b"abc"), None);
    }

    #[test]
    fn counts() {
        let counts = NewlineCounts::count(b"a\nb\r\nc\rd\n");
        assert_eq!(
            counts,
            NewlineCounts {
                cr: 1,
                lf: 2,
                crlf: 1
            }
        );
        assert_eq!(counts.total(), 4);
        assert!(counts.is_mixed());
        assert_eq!(counts.dominant(), Some(NewlineType::Lf));
    }

    #[test]
    fn dominant_ties_and_empty() {
        assert_eq!(NewlineCounts::count(b"abc").dominant(), None);
        assert_eq!(
            NewlineCounts::count(b"a\rb\r\n").dominant(),
            Some(NewlineType::CrLf)
        );
        assert!(!NewlineCounts::count(b"a\r\nb\r\n").is_mixed());
    }
}
