use std::fmt;
use std::fmt::Write as _;

/// What went wrong. At most one error is ever recorded per parse attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ErrorKind {
    /// A byte that does not fit the grammar at its position.
    #[error("unexpected input")]
    Unexpected,
    /// `finish` was called with open containers, mid-string, mid-literal,
    /// or before any value was seen.
    #[error("incomplete document")]
    Incomplete,
    /// The node arena or the container stack would exceed its preallocated
    /// bound.
    #[error("capacity exceeded")]
    Capacity,
}

/// A parse error: a kind, the absolute byte offset of the byte under
/// examination in the logical stream, and the line counter at that point.
///
/// Errors are sticky. Once one is recorded, `feed` and `finish` return a
/// clone of it without touching the arena; recovery means calling
/// [`Parser::reset`](crate::Parser::reset). Already-closed subtrees stay
/// structurally consistent and may still be inspected for diagnostics.
#[derive(Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("{kind} at byte {offset} (line {line})")]
pub struct Error {
    pub(crate) kind: ErrorKind,
    pub(crate) offset: usize,
    pub(crate) line: usize,
}

impl Error {
    pub(crate) fn new(kind: ErrorKind, offset: usize, line: usize) -> Self {
        Self { kind, offset, line }
    }

    /// The error's kind.
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// Absolute byte offset into the logical stream where the error was
    /// detected.
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Line counter at the error, counting `\n` and `\r` seen between
    /// values.
    pub fn line(&self) -> usize {
        self.line
    }

    /// Render a human-readable report: a window of up to 20 bytes on each
    /// side of the error offset, with a caret under the offending byte.
    ///
    /// `source` is the caller-retained input. Control bytes in the window
    /// are shown as spaces so the caret stays aligned.
    pub fn annotate(&self, source: &[u8]) -> String {
        let at = self.offset.min(source.len());
        let start = at.saturating_sub(20);
        let end = (at + 20).min(source.len());

        let mut window = String::new();
        for chunk in String::from_utf8_lossy(&source[start..end]).chars() {
            window.push(if chunk.is_control() { ' ' } else { chunk });
        }
        let caret = String::from_utf8_lossy(&source[start..at]).chars().count();

        let mut out = String::new();
        let _ = writeln!(out, "{self}");
        let _ = writeln!(out, "  {window}");
        let _ = writeln!(out, "  {:caret$}^", "");
        out
    }
}

impl fmt::Debug for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}@{} line:{}", self.kind, self.offset, self.line)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn display_names_kind_offset_and_line() {
        let err = Error::new(ErrorKind::Unexpected, 14, 2);
        assert_eq!(err.to_string(), "unexpected input at byte 14 (line 2)");
        assert_eq!(format!("{err:?}"), "Unexpected@14 line:2");
    }

    #[test]
    fn annotate_puts_the_caret_under_the_offending_byte() {
        let source = b"{\"a\":}";
        let err = Error::new(ErrorKind::Unexpected, 5, 0);
        let report = err.annotate(source);
        let lines: Vec<&str> = report.lines().collect();
        assert_eq!(lines[1], "  {\"a\":}");
        assert_eq!(lines[2], "       ^");
    }

    #[test]
    fn annotate_windows_long_input() {
        let source = vec![b'x'; 100];
        let err = Error::new(ErrorKind::Unexpected, 50, 0);
        let report = err.annotate(&source);
        let lines: Vec<&str> = report.lines().collect();
        // 20 bytes either side of the error offset
        assert_eq!(lines[1].len(), 2 + 40);
        assert_eq!(lines[2], format!("  {}^", " ".repeat(20)));
    }
}
