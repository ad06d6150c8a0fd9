//! # Docwright Buffer
//!
//! Rope-backed text storage for the editor.
//!
//! Every mutation reports which lines it touched as a [`LineEdit`], so the
//! layer above can keep per-line state (such as applied styles) aligned with
//! the text and knows which blocks to re-highlight.

mod buffer;

use std::ops::Range;

pub use buffer::TextBuffer;

/// Result type for buffer operations
pub type BufferResult<T> = Result<T, BufferError>;

/// Errors that can occur during buffer operations
#[derive(Debug, thiserror::Error)]
pub enum BufferError {
    #[error("Line {0} is out of bounds")]
    LineOutOfBounds(usize),

    #[error("Invalid character index: {0}")]
    InvalidCharIndex(usize),

    #[error("Invalid range: {start}..{end}")]
    InvalidRange { start: usize, end: usize },

    #[error("Buffer has no file path")]
    NoFilePath,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// The lines an edit replaced.
///
/// Lines `first_line..first_line + removed_lines` of the old text were
/// replaced by lines `first_line..first_line + inserted_lines` of the new
/// text. Lines before are untouched; lines after only moved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineEdit {
    pub first_line: usize,
    pub removed_lines: usize,
    pub inserted_lines: usize,
}

impl LineEdit {
    /// An edit that changed nothing.
    pub fn unchanged(line: usize) -> Self {
        Self {
            first_line: line,
            removed_lines: 0,
            inserted_lines: 0,
        }
    }

    /// An edit covering old lines `first..=old_last`, given the line counts
    /// before and after it.
    pub(crate) fn spanning(
        first: usize,
        old_last: usize,
        lines_before: usize,
        lines_after: usize,
    ) -> Self {
        let removed = old_last - first + 1;
        let inserted = (removed + lines_after)
            .checked_sub(lines_before)
            .unwrap_or_default();
        Self {
            first_line: first,
            removed_lines: removed,
            inserted_lines: inserted,
        }
    }

    /// Lines of the old text this edit replaced.
    pub fn old_lines(&self) -> Range<usize> {
        self.first_line..self.first_line + self.removed_lines
    }

    /// Lines of the new text this edit produced.
    pub fn new_lines(&self) -> Range<usize> {
        self.first_line..self.first_line + self.inserted_lines
    }

    /// Returns true if no line changed.
    pub fn is_noop(&self) -> bool {
        self.removed_lines == 0 && self.inserted_lines == 0
    }
}
