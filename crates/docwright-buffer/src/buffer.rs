//! Core text buffer implementation using rope data structure.
//!
//! Lines double as the blocks the highlighter paints: a block is one line
//! without its terminator, addressed by line index, and its offset is the
//! character index of the line start.

use ropey::Rope;
use std::borrow::Cow;
use std::ops::Range;
use std::path::{Path, PathBuf};

use crate::{BufferError, BufferResult, LineEdit};

/// A text buffer backed by a rope.
#[derive(Debug, Clone)]
pub struct TextBuffer {
    /// The rope holding our text content
    rope: Rope,

    /// Whether the buffer has unsaved changes
    modified: bool,

    /// Associated file path (if any)
    file_path: Option<PathBuf>,
}

impl TextBuffer {
    /// Creates a new empty buffer.
    ///
    /// # Example
    /// ```
    /// use docwright_buffer::TextBuffer;
    ///
    /// let buffer = TextBuffer::new();
    /// assert!(buffer.is_empty());
    /// assert_eq!(buffer.len_lines(), 1);
    /// ```
    pub fn new() -> Self {
        Self {
            rope: Rope::new(),
            modified: false,
            file_path: None,
        }
    }

    /// Loads a buffer from a file.
    pub fn from_file(path: impl AsRef<Path>) -> BufferResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;

        Ok(Self {
            rope: Rope::from_str(&content),
            modified: false,
            file_path: Some(path.to_path_buf()),
        })
    }

    /// Saves the buffer to its associated file.
    pub fn save(&mut self) -> BufferResult<()> {
        let path = self.file_path.clone().ok_or(BufferError::NoFilePath)?;
        self.save_as(&path)
    }

    /// Saves the buffer to a specific path and adopts it.
    pub fn save_as(&mut self, path: impl AsRef<Path>) -> BufferResult<()> {
        let path = path.as_ref();

        // Write to a temporary file first, then rename (atomic write)
        let temp_path = path.with_extension("tmp");
        std::fs::write(&temp_path, self.text().as_bytes())?;
        std::fs::rename(&temp_path, path)?;

        self.file_path = Some(path.to_path_buf());
        self.modified = false;
        Ok(())
    }

    // ==================== Text Access ====================

    /// Returns the entire text content.
    #[inline]
    pub fn text(&self) -> Cow<'_, str> {
        self.rope.slice(..).into()
    }

    /// Returns a line including its terminator.
    pub fn line(&self, line_idx: usize) -> BufferResult<Cow<'_, str>> {
        self.check_line(line_idx)?;
        Ok(self.rope.line(line_idx).into())
    }

    /// Returns a line without its terminator.
    pub fn line_text(&self, line_idx: usize) -> BufferResult<Cow<'_, str>> {
        Ok(match self.line(line_idx)? {
            Cow::Borrowed(s) => Cow::Borrowed(strip_line_break(s)),
            Cow::Owned(mut s) => {
                let keep = strip_line_break(&s).len();
                s.truncate(keep);
                Cow::Owned(s)
            }
        })
    }

    /// Returns a slice of text by character range.
    pub fn slice(&self, range: Range<usize>) -> BufferResult<Cow<'_, str>> {
        self.check_range(&range)?;
        Ok(self.rope.slice(range).into())
    }

    // ==================== Measurements ====================

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.rope.len_chars() == 0
    }

    /// Returns the number of characters (Unicode scalar values).
    #[inline]
    pub fn len_chars(&self) -> usize {
        self.rope.len_chars()
    }

    /// Returns the number of lines.
    ///
    /// An empty buffer has 1 line. A buffer ending with `\n` counts
    /// the empty line after it.
    #[inline]
    pub fn len_lines(&self) -> usize {
        self.rope.len_lines()
    }

    /// Returns the length of a line in characters, without its terminator.
    pub fn line_len(&self, line_idx: usize) -> BufferResult<usize> {
        Ok(self.line_text(line_idx)?.chars().count())
    }

    /// Returns the character index where a line starts.
    pub fn line_to_char(&self, line_idx: usize) -> BufferResult<usize> {
        self.check_line(line_idx)?;
        Ok(self.rope.line_to_char(line_idx))
    }

    /// Returns the line containing a character index.
    pub fn char_to_line(&self, char_idx: usize) -> BufferResult<usize> {
        if char_idx > self.len_chars() {
            return Err(BufferError::InvalidCharIndex(char_idx));
        }
        Ok(self.rope.char_to_line(char_idx))
    }

    // ==================== Mutations ====================

    /// Inserts text at a character index.
    pub fn insert(&mut self, char_idx: usize, text: &str) -> BufferResult<LineEdit> {
        if char_idx > self.len_chars() {
            return Err(BufferError::InvalidCharIndex(char_idx));
        }
        if text.is_empty() {
            let line = self.rope.char_to_line(char_idx);
            return Ok(LineEdit::unchanged(line));
        }

        let first_line = self.first_affected_line(char_idx);
        let old_last = self.rope.char_to_line(char_idx);
        let lines_before = self.len_lines();

        self.rope.insert(char_idx, text);
        self.modified = true;

        Ok(LineEdit::spanning(first_line, old_last, lines_before, self.len_lines()))
    }

    /// Deletes text in a character range, returning what was removed.
    pub fn delete(&mut self, range: Range<usize>) -> BufferResult<(String, LineEdit)> {
        self.check_range(&range)?;
        if range.is_empty() {
            let line = self.rope.char_to_line(range.start);
            return Ok((String::new(), LineEdit::unchanged(line)));
        }

        let first_line = self.first_affected_line(range.start);
        let old_last = self.rope.char_to_line(range.end);
        let lines_before = self.len_lines();

        let deleted: String = self.rope.slice(range.clone()).into();
        self.rope.remove(range);
        self.modified = true;

        let edit = LineEdit::spanning(first_line, old_last, lines_before, self.len_lines());
        Ok((deleted, edit))
    }

    /// Replaces the whole content.
    pub fn set_text(&mut self, text: &str) -> LineEdit {
        let lines_before = self.len_lines();
        self.rope = Rope::from_str(text);
        self.modified = true;
        LineEdit {
            first_line: 0,
            removed_lines: lines_before,
            inserted_lines: self.len_lines(),
        }
    }

    // ==================== State Queries ====================

    /// Returns true if the buffer has unsaved changes.
    pub fn is_modified(&self) -> bool {
        self.modified
    }

    /// Returns the associated file path, if any.
    pub fn file_path(&self) -> Option<&Path> {
        self.file_path.as_deref()
    }

    // ==================== Helpers ====================

    /// The line where an edit at `char_idx` starts to matter.
    ///
    /// Editing right after a `\r` can join or split a `\r\n` pair, which
    /// changes the previous line's terminator as well.
    fn first_affected_line(&self, char_idx: usize) -> usize {
        let line = self.rope.char_to_line(char_idx);
        if char_idx > 0 && self.rope.char(char_idx - 1) == '\r' {
            line.saturating_sub(1)
        } else {
            line
        }
    }

    fn check_line(&self, line_idx: usize) -> BufferResult<()> {
        if line_idx >= self.len_lines() {
            return Err(BufferError::LineOutOfBounds(line_idx));
        }
        Ok(())
    }

    fn check_range(&self, range: &Range<usize>) -> BufferResult<()> {
        if range.start > range.end {
            return Err(BufferError::InvalidRange {
                start: range.start,
                end: range.end,
            });
        }
        if range.end > self.len_chars() {
            return Err(BufferError::InvalidCharIndex(range.end));
        }
        Ok(())
    }
}

impl Default for TextBuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl From<&str> for TextBuffer {
    fn from(s: &str) -> Self {
        Self {
            rope: Rope::from_str(s),
            modified: false,
            file_path: None,
        }
    }
}

impl From<String> for TextBuffer {
    fn from(s: String) -> Self {
        Self::from(s.as_str())
    }
}

/// Strips one trailing line break, as ropey recognizes them.
fn strip_line_break(line: &str) -> &str {
    if let Some(stripped) = line.strip_suffix("\r\n") {
        return stripped;
    }
    match line.chars().next_back() {
        Some('\n' | '\r' | '\u{000B}' | '\u{000C}' | '\u{0085}' | '\u{2028}' | '\u{2029}') => {
            let last = line.chars().next_back().map_or(0, char::len_utf8);
            &line[..line.len() - last]
        }
        _ => line,
    }
}
