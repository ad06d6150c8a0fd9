//! # Docwright Core
//!
//! Editor state for a documentation project.
//!
//! ```text
//! ┌──────────────────────────────────────────────┐
//! │                EditorSession                 │
//! │  ┌──────────────┐      ┌──────────────────┐  │
//! │  │ Highlighter  │─────▶│  StyledDocument  │  │
//! │  │ (cached per  │ pass │  TextBuffer +    │  │
//! │  │ grammar,     │      │  block styles    │  │
//! │  │ theme)       │      └──────────────────┘  │
//! │  └──────────────┘                            │
//! └──────────────────────────────────────────────┘
//!        ▲                         ▲
//!      Config                 DocsProject
//! ```

pub mod config;
pub mod document;
pub mod editor;
pub mod project;

pub use config::{Config, ConfigError};
pub use document::{BlockId, StyledDocument, StyledRun};
pub use editor::{EditorSession, PassStats};
pub use project::DocsProject;

/// Result type for core operations
pub type CoreResult<T> = Result<T, CoreError>;

/// Errors that can occur in core operations
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Not a directory: {0}")]
    NotADirectory(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Buffer error: {0}")]
    Buffer(#[from] docwright_buffer::BufferError),

    #[error("Syntax error: {0}")]
    Syntax(#[from] docwright_syntax::SyntaxError),

    #[error("Config error: {0}")]
    Config(#[from] ConfigError),
}
