//! The styled document: the editing surface the highlighter paints on.
//!
//! Text lives in a [`TextBuffer`]; every line is a block. Next to the text
//! each block keeps one optional style per character. Edits splice the
//! style vectors of the lines they replaced, so the remaining blocks keep
//! their styles and only the touched blocks need a new pass.

use std::borrow::Cow;
use std::ops::Range;
use std::path::Path;

use docwright_buffer::{LineEdit, TextBuffer};
use docwright_syntax::{StyleDescriptor, TextSurface};

use crate::CoreResult;

/// Index of a block (line) in a [`StyledDocument`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BlockId(pub usize);

/// Styles applied to one block.
#[derive(Debug, Clone, Default, PartialEq)]
struct BlockFormat {
    styles: Vec<Option<StyleDescriptor>>,
    formatted: bool,
}

impl BlockFormat {
    fn blank(len: usize) -> Self {
        Self {
            styles: vec![None; len],
            formatted: false,
        }
    }
}

/// A run of characters sharing one style.
#[derive(Debug, Clone, PartialEq)]
pub struct StyledRun {
    pub style: Option<StyleDescriptor>,
    pub text: String,
}

/// A text buffer with per-character block styles.
pub struct StyledDocument {
    buffer: TextBuffer,
    blocks: Vec<BlockFormat>,
}

impl StyledDocument {
    /// Creates an empty document.
    pub fn new() -> Self {
        Self::from_buffer(TextBuffer::new())
    }

    /// Opens a file.
    pub fn open(path: impl AsRef<Path>) -> CoreResult<Self> {
        let buffer = TextBuffer::from_file(path.as_ref())?;
        tracing::info!(
            "opened {} ({} lines)",
            path.as_ref().display(),
            buffer.len_lines()
        );
        Ok(Self::from_buffer(buffer))
    }

    fn from_buffer(buffer: TextBuffer) -> Self {
        let blocks = (0..buffer.len_lines())
            .map(|line| BlockFormat::blank(buffer.line_len(line).unwrap_or(0)))
            .collect();
        Self { buffer, blocks }
    }

    // ==================== Text ====================

    pub fn buffer(&self) -> &TextBuffer {
        &self.buffer
    }

    pub fn text(&self) -> Cow<'_, str> {
        self.buffer.text()
    }

    pub fn path(&self) -> Option<&Path> {
        self.buffer.file_path()
    }

    pub fn is_modified(&self) -> bool {
        self.buffer.is_modified()
    }

    pub fn save(&mut self) -> CoreResult<()> {
        Ok(self.buffer.save()?)
    }

    pub fn save_as(&mut self, path: impl AsRef<Path>) -> CoreResult<()> {
        Ok(self.buffer.save_as(path)?)
    }

    // ==================== Blocks ====================

    pub fn len_blocks(&self) -> usize {
        self.blocks.len()
    }

    /// All block ids, in document order.
    pub fn block_ids(&self) -> impl Iterator<Item = BlockId> + use<> {
        (0..self.blocks.len()).map(BlockId)
    }

    /// Styles currently applied to a block, one per character.
    pub fn block_styles(&self, block: BlockId) -> Option<&[Option<StyleDescriptor>]> {
        self.blocks.get(block.0).map(|b| b.styles.as_slice())
    }

    /// Returns true once a highlight pass has run over the block.
    pub fn is_formatted(&self, block: BlockId) -> bool {
        self.blocks.get(block.0).is_some_and(|b| b.formatted)
    }

    pub(crate) fn mark_formatted(&mut self, block: BlockId) {
        if let Some(format) = self.blocks.get_mut(block.0) {
            format.formatted = true;
        }
    }

    /// Blocks in `lines` that have never been highlighted.
    pub fn unformatted_blocks(&self, lines: Range<usize>) -> Vec<BlockId> {
        let end = lines.end.min(self.blocks.len());
        (lines.start.min(end)..end)
            .filter(|&line| !self.blocks[line].formatted)
            .map(BlockId)
            .collect()
    }

    /// Splits a block into runs of equally styled characters.
    pub fn styled_runs(&self, block: BlockId) -> Vec<StyledRun> {
        let Some(format) = self.blocks.get(block.0) else {
            return Vec::new();
        };
        let text = self.block_text(block);

        let mut runs: Vec<StyledRun> = Vec::new();
        for (ch, style) in text.chars().zip(format.styles.iter()) {
            match runs.last_mut() {
                Some(run) if run.style == *style => run.text.push(ch),
                _ => runs.push(StyledRun {
                    style: *style,
                    text: ch.to_string(),
                }),
            }
        }
        runs
    }

    // ==================== Editing ====================

    /// Inserts text and returns the blocks that changed.
    pub fn insert(&mut self, char_idx: usize, text: &str) -> CoreResult<Vec<BlockId>> {
        let edit = self.buffer.insert(char_idx, text)?;
        Ok(self.apply_edit(edit))
    }

    /// Deletes a character range and returns the blocks that changed.
    pub fn delete(&mut self, range: Range<usize>) -> CoreResult<Vec<BlockId>> {
        let (_, edit) = self.buffer.delete(range)?;
        Ok(self.apply_edit(edit))
    }

    /// Replaces the whole text; every block changes.
    pub fn set_text(&mut self, text: &str) -> Vec<BlockId> {
        let edit = self.buffer.set_text(text);
        self.apply_edit(edit)
    }

    /// Replaces the formats of the lines an edit touched with blank ones.
    fn apply_edit(&mut self, edit: LineEdit) -> Vec<BlockId> {
        if edit.is_noop() {
            return Vec::new();
        }
        let fresh: Vec<BlockFormat> = edit
            .new_lines()
            .map(|line| BlockFormat::blank(self.buffer.line_len(line).unwrap_or(0)))
            .collect();
        self.blocks.splice(edit.old_lines(), fresh);
        debug_assert_eq!(self.blocks.len(), self.buffer.len_lines());

        edit.new_lines().map(BlockId).collect()
    }
}

impl Default for StyledDocument {
    fn default() -> Self {
        Self::new()
    }
}

impl From<&str> for StyledDocument {
    fn from(text: &str) -> Self {
        Self::from_buffer(TextBuffer::from(text))
    }
}

impl TextSurface for StyledDocument {
    type Block = BlockId;

    fn full_text(&self) -> Cow<'_, str> {
        self.buffer.text()
    }

    fn block_text(&self, block: BlockId) -> Cow<'_, str> {
        self.buffer.line_text(block.0).unwrap_or(Cow::Borrowed(""))
    }

    fn block_offset(&self, block: BlockId) -> usize {
        self.buffer
            .line_to_char(block.0)
            .unwrap_or_else(|_| self.buffer.len_chars())
    }

    fn set_char_style(&mut self, block: BlockId, index: usize, style: StyleDescriptor) {
        match self
            .blocks
            .get_mut(block.0)
            .and_then(|format| format.styles.get_mut(index))
        {
            Some(slot) => *slot = Some(style),
            None => tracing::trace!(?block, index, "style for character outside block dropped"),
        }
    }
}
