//! Whole-document highlighting applied one block at a time.
//!
//! Every pass re-tokenizes the full text: there is no lexer state kept
//! between passes, so a pass costs O(document length). The [`Restyle`]
//! trait is the seam where an incremental tokenizer would plug in.

use std::collections::HashMap;
use std::sync::Arc;

use crate::grammar::{ClassId, Grammar};
use crate::registry::GrammarRegistry;
use crate::style::StyleDescriptor;
use crate::surface::TextSurface;
use crate::theme::Theme;
use crate::{SyntaxError, SyntaxResult};

/// Styles for every token class of one grammar under one theme.
///
/// Built once and never modified. Every class the grammar can emit has an
/// entry, so lookups by [`ClassId`] cannot miss.
#[derive(Debug, Clone)]
pub struct StyleMap {
    styles: Vec<StyleDescriptor>,
    index: HashMap<String, ClassId>,
}

impl StyleMap {
    /// Resolves every class of `grammar` against `theme`.
    ///
    /// Fails with [`SyntaxError::StyleLookupMiss`] on the first class that
    /// neither the theme nor any of the class's ancestors covers.
    pub fn build(grammar: &Grammar, theme: &Theme) -> SyntaxResult<Self> {
        let mut styles = Vec::with_capacity(grammar.token_classes().len());
        let mut index = HashMap::with_capacity(grammar.token_classes().len());

        for (id, class) in grammar.token_classes().iter().enumerate() {
            let style = theme
                .resolve(class)
                .ok_or_else(|| SyntaxError::StyleLookupMiss {
                    class: class.clone(),
                    grammar: grammar.name().to_string(),
                    theme: theme.name.clone(),
                })?;
            styles.push(*style);
            index.insert(class.clone(), id);
        }

        Ok(Self { styles, index })
    }

    /// Looks up a style by class name.
    pub fn get(&self, class: &str) -> Option<&StyleDescriptor> {
        self.index.get(class).map(|&id| &self.styles[id])
    }

    /// Looks up a style by class id.
    pub fn by_id(&self, id: ClassId) -> &StyleDescriptor {
        &self.styles[id]
    }

    pub fn len(&self) -> usize {
        self.styles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.styles.is_empty()
    }
}

/// One style per character of a text snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct StyleBuffer(Vec<StyleDescriptor>);

impl StyleBuffer {
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Style of the character at `index`, if the snapshot was that long.
    pub fn get(&self, index: usize) -> Option<&StyleDescriptor> {
        self.0.get(index)
    }

    pub fn as_slice(&self) -> &[StyleDescriptor] {
        &self.0
    }
}

/// Produces per-character styles for a whole text snapshot.
pub trait Restyle {
    fn restyle(&self, text: &str) -> StyleBuffer;
}

/// Outcome of highlighting one block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockPass {
    /// Offset of the block in the full text
    pub offset: usize,
    /// Characters that received a style
    pub styled: usize,
    /// Characters past the end of the computed style buffer
    pub skipped: usize,
}

/// A syntax highlighter bound to one grammar and one theme.
#[derive(Debug, Clone)]
pub struct Highlighter {
    grammar: Arc<Grammar>,
    theme_name: String,
    styles: StyleMap,
}

impl Highlighter {
    /// Resolves `grammar_name` in the registry and builds its style map.
    ///
    /// This is the expensive step; keep the result for as long as the
    /// grammar and theme stay the same.
    pub fn new(registry: &GrammarRegistry, grammar_name: &str, theme: &Theme) -> SyntaxResult<Self> {
        let grammar = registry.resolve(grammar_name)?;
        Self::with_grammar(grammar, theme)
    }

    /// Builds a highlighter for an already resolved grammar.
    pub fn with_grammar(grammar: Arc<Grammar>, theme: &Theme) -> SyntaxResult<Self> {
        let styles = StyleMap::build(&grammar, theme)?;
        tracing::info!(
            grammar = grammar.name(),
            theme = %theme.name,
            classes = styles.len(),
            "highlighter initialized"
        );
        Ok(Self {
            grammar,
            theme_name: theme.name.clone(),
            styles,
        })
    }

    pub fn grammar(&self) -> &Grammar {
        &self.grammar
    }

    pub fn theme_name(&self) -> &str {
        &self.theme_name
    }

    pub fn style_map(&self) -> &StyleMap {
        &self.styles
    }

    /// Re-highlights the document and applies the result to one block.
    ///
    /// Characters of the block that fall past the end of the freshly
    /// computed style buffer are left untouched; the next pass covers them.
    pub fn highlight_block<S>(&self, surface: &mut S, block: S::Block) -> BlockPass
    where
        S: TextSurface + ?Sized,
    {
        let buffer = self.restyle_surface(surface);
        apply_block(surface, block, &buffer)
    }

    /// Highlights several blocks from a single pass over the document.
    ///
    /// Equivalent to calling [`highlight_block`](Self::highlight_block) for
    /// each block as long as the text does not change in between.
    pub fn highlight_blocks<S, I>(&self, surface: &mut S, blocks: I) -> Vec<BlockPass>
    where
        S: TextSurface + ?Sized,
        I: IntoIterator<Item = S::Block>,
    {
        let buffer = self.restyle_surface(surface);
        blocks
            .into_iter()
            .map(|block| apply_block(surface, block, &buffer))
            .collect()
    }

    fn restyle_surface<S: TextSurface + ?Sized>(&self, surface: &S) -> StyleBuffer {
        let text = surface.full_text();
        self.restyle(&text)
    }
}

/// Copies the block's slice of `buffer` onto the surface.
///
/// Stops at the first character past the end of the buffer; the rest of
/// the block keeps whatever style it had.
fn apply_block<S>(surface: &mut S, block: S::Block, buffer: &StyleBuffer) -> BlockPass
where
    S: TextSurface + ?Sized,
{
    let offset = surface.block_offset(block);
    let block_len = surface.block_text(block).chars().count();

    let mut styled = 0;
    for i in 0..block_len {
        match buffer.get(offset + i) {
            Some(style) => {
                surface.set_char_style(block, i, *style);
                styled += 1;
            }
            None => break,
        }
    }

    let skipped = block_len - styled;
    if skipped > 0 {
        tracing::debug!(
            ?block,
            offset,
            block_len,
            buffer_len = buffer.len(),
            skipped,
            "block extends past style buffer"
        );
    }

    BlockPass {
        offset,
        styled,
        skipped,
    }
}

impl Restyle for Highlighter {
    fn restyle(&self, text: &str) -> StyleBuffer {
        let mut styles = Vec::with_capacity(text.len());
        for token in self.grammar.tokenize(text) {
            let style = *self.styles.by_id(token.class_id);
            styles.extend(std::iter::repeat_n(style, token.char_len()));
        }
        StyleBuffer(styles)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grammar::GrammarSpec;
    use crate::style::Color;
    use std::borrow::Cow;

    fn heading_theme() -> Theme {
        Theme::new("test")
            .with("comment.heading", StyleDescriptor::fg(Color::from_hex(0x000080)).bold())
            .with("text.plain", StyleDescriptor::PLAIN)
    }

    fn heading_highlighter() -> Highlighter {
        let grammar = GrammarSpec::new("notes", "text.plain")
            .line_rule(r"#[^\n]*", "comment.heading")
            .build()
            .unwrap();
        Highlighter::with_grammar(Arc::new(grammar), &heading_theme()).unwrap()
    }

    /// A surface whose single block can disagree with the full text.
    struct SnapshotSurface {
        full: String,
        block: String,
        offset: usize,
        applied: Vec<Option<StyleDescriptor>>,
    }

    impl SnapshotSurface {
        fn new(full: &str, block: &str, offset: usize) -> Self {
            Self {
                full: full.to_string(),
                block: block.to_string(),
                offset,
                applied: vec![None; block.chars().count()],
            }
        }
    }

    impl TextSurface for SnapshotSurface {
        type Block = ();

        fn full_text(&self) -> Cow<'_, str> {
            Cow::Borrowed(&self.full)
        }

        fn block_text(&self, _block: ()) -> Cow<'_, str> {
            Cow::Borrowed(&self.block)
        }

        fn block_offset(&self, _block: ()) -> usize {
            self.offset
        }

        fn set_char_style(&mut self, _block: (), index: usize, style: StyleDescriptor) {
            self.applied[index] = Some(style);
        }
    }

    #[test]
    fn test_heading_scenario() {
        let highlighter = heading_highlighter();
        let heading = *highlighter.style_map().get("comment.heading").unwrap();
        let plain = *highlighter.style_map().get("text.plain").unwrap();

        let buffer = highlighter.restyle("# title\ntext");
        assert_eq!(buffer.len(), 12);
        assert!(buffer.as_slice()[0..7].iter().all(|s| *s == heading));
        assert!(buffer.as_slice()[8..12].iter().all(|s| *s == plain));

        let extended = highlighter.restyle("# title\ntexts");
        assert_eq!(extended.len(), 13);
        assert_eq!(&extended.as_slice()[0..7], &buffer.as_slice()[0..7]);
    }

    #[test]
    fn test_unsupported_grammar() {
        let registry = GrammarRegistry::with_builtins();
        let err = Highlighter::new(&registry, "not-a-real-grammar", &Theme::paper()).unwrap_err();
        assert!(matches!(err, SyntaxError::UnsupportedGrammar(name) if name == "not-a-real-grammar"));
    }

    #[test]
    fn test_theme_missing_class_fails_at_init() {
        let grammar = GrammarSpec::new("g", "text")
            .rule("[0-9]+", "literal.number")
            .build()
            .unwrap();
        let theme = Theme::new("sparse").with("text", StyleDescriptor::PLAIN);

        let err = Highlighter::with_grammar(Arc::new(grammar), &theme).unwrap_err();
        match err {
            SyntaxError::StyleLookupMiss { class, .. } => assert_eq!(class, "literal.number"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_style_map_uses_ancestors() {
        let registry = GrammarRegistry::with_builtins();
        let highlighter = Highlighter::new(&registry, "rst", &Theme::paper()).unwrap();
        let map = highlighter.style_map();

        assert_eq!(map.len(), highlighter.grammar().token_classes().len());
        assert_eq!(map.get("name.role"), Theme::paper().styles.get("name"));
        assert!(map.get("no.such.class").is_none());
    }

    #[test]
    fn test_restyle_is_deterministic() {
        let registry = GrammarRegistry::with_builtins();
        let highlighter = Highlighter::new(&registry, "rst", &Theme::dusk()).unwrap();
        let text = "Intro\n=====\n\nSee :doc:`usage` and *this*.\n\n.. note::\n   Hi\n";

        assert_eq!(highlighter.restyle(text), highlighter.restyle(text));
    }

    #[test]
    fn test_highlight_block_applies_block_slice() {
        let highlighter = heading_highlighter();
        let heading = *highlighter.style_map().get("comment.heading").unwrap();
        let plain = *highlighter.style_map().get("text.plain").unwrap();

        let mut surface = SnapshotSurface::new("# title\ntext", "text", 8);
        let pass = highlighter.highlight_block(&mut surface, ());
        assert_eq!(pass, BlockPass { offset: 8, styled: 4, skipped: 0 });
        assert!(surface.applied.iter().all(|s| *s == Some(plain)));

        let mut surface = SnapshotSurface::new("# title\ntext", "# title", 0);
        highlighter.highlight_block(&mut surface, ());
        assert!(surface.applied.iter().all(|s| *s == Some(heading)));
    }

    #[test]
    fn test_highlight_block_twice_is_idempotent() {
        let highlighter = heading_highlighter();
        let mut surface = SnapshotSurface::new("# a\n# b\nc", "# b", 4);

        highlighter.highlight_block(&mut surface, ());
        let first = surface.applied.clone();
        highlighter.highlight_block(&mut surface, ());
        assert_eq!(surface.applied, first);
    }

    #[test]
    fn test_stale_block_is_tolerated() {
        let highlighter = heading_highlighter();
        // The document shrank to 5 chars but the block still claims 6 from offset 2.
        let mut surface = SnapshotSurface::new("# abc", "abcdef", 2);

        let pass = highlighter.highlight_block(&mut surface, ());
        assert_eq!(pass.styled, 3);
        assert_eq!(pass.skipped, 3);
        assert!(surface.applied[..3].iter().all(Option::is_some));
        assert!(surface.applied[3..].iter().all(Option::is_none));
    }

    #[test]
    fn test_block_entirely_past_end() {
        let highlighter = heading_highlighter();
        let mut surface = SnapshotSurface::new("ab", "xyz", 10);

        let pass = highlighter.highlight_block(&mut surface, ());
        assert_eq!(pass, BlockPass { offset: 10, styled: 0, skipped: 3 });
    }

    #[test]
    fn test_highlight_blocks_matches_single_passes() {
        let highlighter = heading_highlighter();
        let mut batch = SnapshotSurface::new("# title\ntext", "text", 8);
        let passes = highlighter.highlight_blocks(&mut batch, [(), ()]);
        assert_eq!(passes.len(), 2);

        let mut single = SnapshotSurface::new("# title\ntext", "text", 8);
        assert_eq!(highlighter.highlight_block(&mut single, ()), passes[0]);
        assert_eq!(single.applied, batch.applied);
    }

    mod props {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn buffer_length_matches_text(text in "\\PC{0,200}") {
                let registry = GrammarRegistry::with_builtins();
                let highlighter = Highlighter::new(&registry, "rst", &Theme::paper()).unwrap();
                prop_assert_eq!(highlighter.restyle(&text).len(), text.chars().count());
            }

            #[test]
            fn prefix_styles_are_stable(line in "# [a-z ]{0,20}", tail in "[a-z\n]{0,20}") {
                let highlighter = heading_highlighter();
                let text = format!("{line}\n{tail}");
                let before = highlighter.restyle(&text);
                let after = highlighter.restyle(&format!("{text}x"));
                let n = line.chars().count();
                prop_assert_eq!(&before.as_slice()[..n], &after.as_slice()[..n]);
            }
        }
    }
}
