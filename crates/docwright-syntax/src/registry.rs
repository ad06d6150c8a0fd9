//! Grammar registry and the per-session highlighter cache.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use crate::grammar::{self, Grammar};
use crate::highlighter::Highlighter;
use crate::theme::Theme;
use crate::{SyntaxError, SyntaxResult};

/// The grammars known to an editor session.
pub struct GrammarRegistry {
    grammars: Vec<Arc<Grammar>>,
}

impl GrammarRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self {
            grammars: Vec::new(),
        }
    }

    /// Creates a registry holding the built-in grammars.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        for spec in [grammar::restructured_text(), grammar::plain_text()] {
            match spec.build() {
                Ok(grammar) => {
                    registry.register(grammar);
                }
                Err(e) => tracing::error!("built-in grammar {} failed to compile: {}", spec.name, e),
            }
        }
        registry
    }

    /// Adds a grammar, replacing any grammar with the same name.
    pub fn register(&mut self, grammar: Grammar) -> Arc<Grammar> {
        let grammar = Arc::new(grammar);
        match self.grammars.iter_mut().find(|g| g.name() == grammar.name()) {
            Some(slot) => {
                tracing::debug!("replacing grammar {}", grammar.name());
                *slot = Arc::clone(&grammar);
            }
            None => self.grammars.push(Arc::clone(&grammar)),
        }
        grammar
    }

    /// Loads a grammar definition file and registers it.
    pub fn load_file(&mut self, path: impl AsRef<Path>) -> SyntaxResult<Arc<Grammar>> {
        let grammar = Grammar::load(path.as_ref())?;
        tracing::info!("loaded grammar {} from {}", grammar.name(), path.as_ref().display());
        Ok(self.register(grammar))
    }

    /// Finds a grammar by name or alias.
    pub fn resolve(&self, name: &str) -> SyntaxResult<Arc<Grammar>> {
        self.grammars
            .iter()
            .find(|g| g.answers_to(name))
            .cloned()
            .ok_or_else(|| SyntaxError::UnsupportedGrammar(name.to_string()))
    }

    /// Finds the grammar registered for a file extension.
    pub fn for_extension(&self, ext: &str) -> Option<Arc<Grammar>> {
        self.grammars
            .iter()
            .find(|g| g.extensions().iter().any(|e| e.eq_ignore_ascii_case(ext)))
            .cloned()
    }

    /// Finds the grammar for a path by its extension.
    pub fn for_path(&self, path: impl AsRef<Path>) -> Option<Arc<Grammar>> {
        let ext = path.as_ref().extension()?.to_str()?;
        self.for_extension(ext)
    }

    /// Canonical names of all registered grammars.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.grammars.iter().map(|g| g.name())
    }

    pub fn grammars(&self) -> &[Arc<Grammar>] {
        &self.grammars
    }
}

impl Default for GrammarRegistry {
    fn default() -> Self {
        Self::with_builtins()
    }
}

/// Highlighters keyed by (grammar, theme).
///
/// Building a highlighter resolves every token class against the theme, so
/// each pair is built at most once per session.
#[derive(Default)]
pub struct HighlighterCache {
    entries: HashMap<(String, String), Arc<Highlighter>>,
}

impl HighlighterCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the highlighter for a grammar and theme, building it on first use.
    pub fn get_or_init(
        &mut self,
        registry: &GrammarRegistry,
        grammar_name: &str,
        theme: &Theme,
    ) -> SyntaxResult<Arc<Highlighter>> {
        let grammar = registry.resolve(grammar_name)?;
        let key = (grammar.name().to_string(), theme.name.clone());

        if let Some(highlighter) = self.entries.get(&key) {
            return Ok(Arc::clone(highlighter));
        }

        let highlighter = Arc::new(Highlighter::with_grammar(grammar, theme)?);
        self.entries.insert(key, Arc::clone(&highlighter));
        Ok(highlighter)
    }

    /// Drops every cached highlighter built with the named theme.
    pub fn invalidate_theme(&mut self, theme_name: &str) {
        self.entries.retain(|(_, theme), _| theme != theme_name);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
