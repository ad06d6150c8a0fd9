//! Editor session: one document, one highlighter.
//!
//! The session is the glue between the text surface and the highlighter.
//! Every edit reports the blocks it touched and each of them gets a
//! highlight pass before the call returns; nothing runs in the background.

use std::ops::Range;
use std::path::Path;
use std::sync::Arc;

use docwright_syntax::{GrammarRegistry, Highlighter, HighlighterCache, Theme};

use crate::config::Config;
use crate::document::{BlockId, StyledDocument};
use crate::CoreResult;

/// Counters over the highlight passes of a session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PassStats {
    /// Block passes run
    pub passes: usize,
    /// Passes where part of the block lay past the computed styles
    pub stale_passes: usize,
    /// Characters left unstyled by those passes
    pub skipped_chars: usize,
}

/// An editing session.
pub struct EditorSession {
    registry: GrammarRegistry,
    cache: HighlighterCache,
    theme: Theme,
    /// Grammar for files whose extension no grammar claims
    default_grammar: String,
    highlighter: Arc<Highlighter>,
    document: StyledDocument,
    stats: PassStats,
}

impl EditorSession {
    /// Starts a session with an empty document.
    ///
    /// Fails if the grammar is unknown or the theme does not style every
    /// token class of the grammar.
    pub fn new(registry: GrammarRegistry, theme: Theme, grammar: &str) -> CoreResult<Self> {
        let mut cache = HighlighterCache::new();
        let highlighter = cache.get_or_init(&registry, grammar, &theme)?;
        Ok(Self {
            registry,
            cache,
            theme,
            default_grammar: grammar.to_string(),
            highlighter,
            document: StyledDocument::new(),
            stats: PassStats::default(),
        })
    }

    /// Starts a session from user configuration.
    pub fn from_config(config: &Config) -> CoreResult<Self> {
        let registry = config.grammar_registry()?;
        let theme = config.theme()?;
        Self::new(registry, theme, &config.syntax.grammar)
    }

    // ==================== Accessors ====================

    pub fn document(&self) -> &StyledDocument {
        &self.document
    }

    pub fn highlighter(&self) -> &Highlighter {
        &self.highlighter
    }

    pub fn registry(&self) -> &GrammarRegistry {
        &self.registry
    }

    pub fn theme(&self) -> &Theme {
        &self.theme
    }

    pub fn stats(&self) -> PassStats {
        self.stats
    }

    // ==================== Files ====================

    /// Opens a file, picking the grammar from its extension.
    ///
    /// On failure the session keeps its current document and grammar.
    pub fn open_file(&mut self, path: impl AsRef<Path>) -> CoreResult<()> {
        let path = path.as_ref();
        let document = StyledDocument::open(path)?;

        let grammar = match self.registry.for_path(path) {
            Some(grammar) => grammar.name().to_string(),
            None => self.default_grammar.clone(),
        };
        let highlighter = self.cache.get_or_init(&self.registry, &grammar, &self.theme)?;

        self.document = document;
        self.highlighter = highlighter;
        self.rehighlight();
        Ok(())
    }

    pub fn save(&mut self) -> CoreResult<()> {
        self.document.save()
    }

    pub fn save_as(&mut self, path: impl AsRef<Path>) -> CoreResult<()> {
        self.document.save_as(path)
    }

    // ==================== Highlighting setup ====================

    /// Switches the grammar and re-highlights everything.
    ///
    /// Switching to the grammar already in use does nothing.
    pub fn set_grammar(&mut self, name: &str) -> CoreResult<()> {
        if self.switch_grammar(name)? {
            self.rehighlight();
        }
        Ok(())
    }

    /// Switches the theme and re-highlights everything.
    pub fn set_theme(&mut self, theme: Theme) -> CoreResult<()> {
        let grammar = self.highlighter.grammar().name().to_string();
        // A theme loaded from disk may reuse a name with different styles.
        self.cache.invalidate_theme(&theme.name);
        self.highlighter = self.cache.get_or_init(&self.registry, &grammar, &theme)?;
        self.theme = theme;
        self.rehighlight();
        Ok(())
    }

    /// Returns true if the highlighter changed.
    fn switch_grammar(&mut self, name: &str) -> CoreResult<bool> {
        let grammar = self.registry.resolve(name)?;
        if grammar.name() == self.highlighter.grammar().name() {
            return Ok(false);
        }
        self.highlighter = self.cache.get_or_init(&self.registry, name, &self.theme)?;
        tracing::debug!("switched grammar to {}", grammar.name());
        Ok(true)
    }

    // ==================== Editing ====================

    /// Replaces the whole document text.
    pub fn set_text(&mut self, text: &str) {
        let changed = self.document.set_text(text);
        self.highlight_all(&changed);
    }

    /// Inserts text at a character index.
    pub fn insert(&mut self, char_idx: usize, text: &str) -> CoreResult<()> {
        let changed = self.document.insert(char_idx, text)?;
        self.highlight_each(&changed);
        Ok(())
    }

    /// Deletes a character range.
    pub fn delete(&mut self, range: Range<usize>) -> CoreResult<()> {
        let changed = self.document.delete(range)?;
        self.highlight_each(&changed);
        Ok(())
    }

    /// Highlights blocks of `lines` that have not been highlighted yet.
    ///
    /// Returns how many blocks were highlighted.
    pub fn reveal(&mut self, lines: Range<usize>) -> usize {
        let pending = self.document.unformatted_blocks(lines);
        self.highlight_all(&pending);
        pending.len()
    }

    /// Highlights every block.
    pub fn rehighlight(&mut self) {
        let blocks: Vec<BlockId> = self.document.block_ids().collect();
        self.highlight_all(&blocks);
    }

    /// One full pass per block, as block-change notifications arrive.
    fn highlight_each(&mut self, blocks: &[BlockId]) {
        for &block in blocks {
            let pass = self.highlighter.highlight_block(&mut self.document, block);
            self.record(block, pass.skipped);
        }
    }

    /// One shared pass for blocks that change together.
    fn highlight_all(&mut self, blocks: &[BlockId]) {
        let passes = self
            .highlighter
            .highlight_blocks(&mut self.document, blocks.iter().copied());
        for (&block, pass) in blocks.iter().zip(passes) {
            self.record(block, pass.skipped);
        }
    }

    fn record(&mut self, block: BlockId, skipped: usize) {
        self.document.mark_formatted(block);
        self.stats.passes += 1;
        if skipped > 0 {
            self.stats.stale_passes += 1;
            self.stats.skipped_chars += skipped;
        }
    }
}
