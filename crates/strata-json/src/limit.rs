use std::fmt;

/// A LimitTracker enforces the container-stack depth bound and keeps track
/// of utilization so callers can report how close to the limit a parse
/// came over the lifetime of the tracker.
///
/// ```rust
/// use strata_json::Parser;
///
/// let mut parser = Parser::new(64, 8);
/// parser.feed(b"[[1, 2], [3]]").unwrap();
/// parser.finish().unwrap();
///
/// let usage = parser.depth_usage();
/// assert_eq!(usage.limit, 8);
/// assert_eq!(usage.high, 2);
/// ```
#[derive(PartialEq, Eq, Clone, Copy)]
pub struct LimitTracker {
    current: usize,
    /// High water mark for this limit.
    pub high: usize,
    /// Limit.
    pub limit: usize,
}

impl LimitTracker {
    /// Track utilization against `limit`.
    pub fn new(limit: usize) -> Self {
        Self {
            current: 0,
            high: 0,
            limit,
        }
    }

    /// Whether utilization has gone past the limit.
    pub fn limited(&self) -> bool {
        self.current > self.limit
    }

    /// Take one unit; remembers the high water mark.
    pub fn consume(&mut self) {
        self.current += 1;
        if self.current > self.high {
            self.high = self.current;
        }
    }

    /// Give one unit back.
    pub fn release(&mut self) {
        self.current = self.current.saturating_sub(1);
    }

    /// Drop current utilization back to zero. The high water mark is kept:
    /// it describes the tracker's lifetime, not one parse.
    pub fn reset(&mut self) {
        self.current = 0;
    }
}

impl fmt::Debug for LimitTracker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "depth limit: {}, high: {}", self.limit, self.high)
    }
}
