//! The text-editing surface the highlighter paints on.

use std::borrow::Cow;
use std::fmt;

use crate::style::StyleDescriptor;

/// A text surface divided into blocks.
///
/// The surface owns the document text. The highlighter only reads snapshots
/// of it and writes per-character styles back, one block at a time. Indices
/// passed to [`set_char_style`](TextSurface::set_char_style) are character
/// indices local to the block.
pub trait TextSurface {
    /// Handle identifying one block.
    type Block: Copy + fmt::Debug;

    /// The full document text.
    fn full_text(&self) -> Cow<'_, str>;

    /// The text of one block.
    fn block_text(&self, block: Self::Block) -> Cow<'_, str>;

    /// Character offset of the block's first character in the full text.
    fn block_offset(&self, block: Self::Block) -> usize;

    /// Applies a style to one character of a block.
    fn set_char_style(&mut self, block: Self::Block, index: usize, style: StyleDescriptor);
}
