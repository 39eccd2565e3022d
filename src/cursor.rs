//! Path cursor: how much of the request path has been matched so far.

use crate::captures::CaptureScope;
use crate::pattern::{CompiledPattern, PrefixMatch};

/// A saved cursor position, produced by [`PathCursor::mark`].
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) struct Mark(usize);

/// The full request path split into a matched prefix and the remainder.
///
/// Held as one string plus a split offset, so `matched() + remaining()` is
/// always the original path, and `remaining()` is empty or starts with `/`.
/// Only successful consumption moves the split forward;
/// [`restore`](Self::restore) moves it back.
#[derive(Clone, Debug, Eq, PartialEq)]
pub(crate) struct PathCursor {
    path: String,
    split: usize,
}

impl PathCursor {
    pub(crate) fn new(path: impl Into<String>) -> Self {
        Self { path: path.into(), split: 0 }
    }

    pub(crate) fn matched(&self) -> &str { &self.path[..self.split] }
    pub(crate) fn remaining(&self) -> &str { &self.path[self.split..] }

    pub(crate) fn mark(&self) -> Mark {
        Mark(self.split)
    }

    pub(crate) fn restore(&mut self, mark: Mark) {
        self.split = mark.0;
    }

    /// Matches `pattern` at the start of the remaining path. On success the
    /// consumed text moves into the matched prefix and the pattern's groups
    /// are appended to `captures`; on failure nothing changes.
    pub(crate) fn consume(&mut self, pattern: &CompiledPattern, captures: &mut CaptureScope) -> bool {
        match pattern.match_prefix(self.remaining()) {
            Some(m) => {
                self.accept(m, captures);
                true
            }
            None => false,
        }
    }

    /// Moves a prefix match into the matched part. `m` must come from
    /// matching the current remaining path.
    pub(crate) fn accept(&mut self, m: PrefixMatch, captures: &mut CaptureScope) {
        self.split += m.len;
        captures.append(m.captures);
    }

    /// Advances by `len` bytes. Returns `false`, leaving the cursor alone, if
    /// that would leave the path, split a character or stop inside a segment.
    pub(crate) fn advance(&mut self, len: usize) -> bool {
        let Some(to) = self.split.checked_add(len) else { return false };
        if !self.path.is_char_boundary(to) {
            return false;
        }
        if to != self.path.len() && !self.path[to..].starts_with('/') {
            return false;
        }
        self.split = to;
        true
    }
}
