//! # Docwright Syntax
//!
//! Grammar-driven syntax highlighting for documentation sources.
//!
//! ## How a pass works
//!
//! ```text
//!  full text ──► Grammar::tokenize ──► (class, text) tokens
//!                                          │
//!                       StyleMap (class → style, built once)
//!                                          │
//!                                          ▼
//!                        StyleBuffer: one style per character
//!                                          │
//!            block offset ─────────────────┤
//!                                          ▼
//!                     TextSurface::set_char_style for one block
//! ```
//!
//! The style map is built and validated when a [`Highlighter`] is created,
//! so a theme that leaves a token class unstyled is rejected up front
//! instead of failing in the middle of a pass.

pub mod grammar;
pub mod highlighter;
pub mod registry;
pub mod style;
pub mod surface;
pub mod theme;
pub mod tokenizer;

pub use grammar::{ClassId, Grammar, GrammarSpec, RuleSpec};
pub use highlighter::{BlockPass, Highlighter, Restyle, StyleBuffer, StyleMap};
pub use registry::{GrammarRegistry, HighlighterCache};
pub use style::{Color, StyleDescriptor};
pub use surface::TextSurface;
pub use theme::Theme;
pub use tokenizer::{Token, Tokens};

/// Result type for syntax operations
pub type SyntaxResult<T> = Result<T, SyntaxError>;

/// Errors that can occur while setting up highlighting.
#[derive(Debug, thiserror::Error)]
pub enum SyntaxError {
    #[error("Unsupported grammar: {0}")]
    UnsupportedGrammar(String),

    #[error("Theme '{theme}' has no style for token class '{class}' of grammar '{grammar}'")]
    StyleLookupMiss {
        class: String,
        grammar: String,
        theme: String,
    },

    #[error("Invalid pattern {pattern:?} in grammar '{grammar}': {source}")]
    InvalidPattern {
        grammar: String,
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("Rule {pattern:?} in grammar '{grammar}' names {groups} groups but has {captures}")]
    GroupCount {
        grammar: String,
        pattern: String,
        groups: usize,
        captures: usize,
    },

    #[error("Invalid color: {0}")]
    InvalidColor(String),

    #[error("Theme parse error: {0}")]
    ThemeParse(#[source] toml::de::Error),

    #[error("Grammar parse error: {0}")]
    GrammarParse(#[source] toml::de::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
