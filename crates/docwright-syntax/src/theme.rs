//! Themes: explicit mappings from token class to style.
//!
//! Token classes are hierarchical (`name.reference` is a kind of `name`),
//! and so is lookup: a class without an entry of its own takes the style of
//! its nearest ancestor that has one.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

use crate::style::{Color, StyleDescriptor};
use crate::{SyntaxError, SyntaxResult};

/// A named set of token-class styles.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Theme {
    pub name: String,
    #[serde(default)]
    pub styles: BTreeMap<String, StyleDescriptor>,
}

impl Theme {
    /// Creates an empty theme.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            styles: BTreeMap::new(),
        }
    }

    /// Adds or replaces the style for a class.
    pub fn with(mut self, class: impl Into<String>, style: StyleDescriptor) -> Self {
        self.styles.insert(class.into(), style);
        self
    }

    /// Parses a theme from TOML.
    pub fn from_toml(content: &str) -> SyntaxResult<Self> {
        toml::from_str(content).map_err(SyntaxError::ThemeParse)
    }

    /// Loads a theme from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> SyntaxResult<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::from_toml(&content)
    }

    /// Looks up a built-in theme by name.
    pub fn builtin(name: &str) -> Option<Self> {
        match name {
            "paper" => Some(Self::paper()),
            "dusk" => Some(Self::dusk()),
            _ => None,
        }
    }

    /// Names of the built-in themes.
    pub fn builtin_names() -> &'static [&'static str] {
        &["paper", "dusk"]
    }

    /// Resolves the style of a token class, walking up the class hierarchy.
    pub fn resolve(&self, class: &str) -> Option<&StyleDescriptor> {
        let mut current = class;
        loop {
            if let Some(style) = self.styles.get(current) {
                return Some(style);
            }
            current = current.rsplit_once('.')?.0;
        }
    }

    /// Light theme.
    pub fn paper() -> Self {
        let blue = Color::from_hex(0x0000ff);
        Self::new("paper")
            .with("text", StyleDescriptor::PLAIN)
            .with("comment", StyleDescriptor::fg(Color::from_hex(0x408080)).italic())
            .with("keyword", StyleDescriptor::fg(Color::from_hex(0x008000)).bold())
            .with("keyword.directive", StyleDescriptor::fg(Color::from_hex(0xaa22ff)).bold())
            .with("name", StyleDescriptor::fg(Color::from_hex(0x19177c)))
            .with("name.label", StyleDescriptor::fg(Color::from_hex(0xa0a000)))
            .with("name.field", StyleDescriptor::fg(Color::from_hex(0x008000)).bold())
            .with("name.reference", StyleDescriptor::fg(blue).underline())
            .with("name.footnote", StyleDescriptor::fg(blue))
            .with("name.substitution", StyleDescriptor::fg(Color::from_hex(0x880000)))
            .with("generic", StyleDescriptor::PLAIN)
            .with("generic.heading", StyleDescriptor::fg(Color::from_hex(0x000080)).bold())
            .with("generic.strong", StyleDescriptor::PLAIN.bold())
            .with("generic.emphasis", StyleDescriptor::PLAIN.italic())
            .with("generic.prompt", StyleDescriptor::fg(Color::from_hex(0x000080)).bold())
            .with("literal", StyleDescriptor::fg(Color::from_hex(0xba2121)))
            .with("literal.url", StyleDescriptor::fg(blue).underline())
            .with("punctuation", StyleDescriptor::fg(Color::from_hex(0x666666)))
    }

    /// Dark theme.
    pub fn dusk() -> Self {
        Self::new("dusk")
            .with("text", StyleDescriptor::fg(Color::from_hex(0xcdd6f4)))
            .with("comment", StyleDescriptor::fg(Color::from_hex(0x6c7086)).italic())
            .with("keyword", StyleDescriptor::fg(Color::from_hex(0xcba6f7)))
            .with("name", StyleDescriptor::fg(Color::from_hex(0xf9e2af)))
            .with("name.reference", StyleDescriptor::fg(Color::from_hex(0x74c7ec)).underline())
            .with("generic", StyleDescriptor::fg(Color::from_hex(0xcdd6f4)))
            .with("generic.heading", StyleDescriptor::fg(Color::from_hex(0x89b4fa)).bold())
            .with("generic.strong", StyleDescriptor::fg(Color::from_hex(0xcdd6f4)).bold())
            .with("generic.emphasis", StyleDescriptor::fg(Color::from_hex(0xcdd6f4)).italic())
            .with("generic.prompt", StyleDescriptor::fg(Color::from_hex(0xf38ba8)))
            .with("literal", StyleDescriptor::fg(Color::from_hex(0xa6e3a1)))
            .with("literal.url", StyleDescriptor::fg(Color::from_hex(0x89dceb)).underline())
            .with("punctuation", StyleDescriptor::fg(Color::from_hex(0x9399b2)))
    }
}

impl Default for Theme {
    fn default() -> Self {
        Self::paper()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hierarchical_resolution() {
        let theme = Theme::new("t")
            .with("name", StyleDescriptor::PLAIN.bold())
            .with("name.reference", StyleDescriptor::PLAIN.underline());

        assert!(theme.resolve("name.reference").unwrap().underline);
        assert!(theme.resolve("name.reference.external").unwrap().underline);
        assert!(theme.resolve("name.label").unwrap().bold);
        assert!(theme.resolve("comment").is_none());
    }

    #[test]
    fn test_builtin_lookup() {
        for name in Theme::builtin_names() {
            assert_eq!(Theme::builtin(name).unwrap().name, *name);
        }
        assert!(Theme::builtin("solarized").is_none());
    }

    #[test]
    fn test_theme_from_toml() {
        let theme = Theme::from_toml(
            r##"
            name = "mono"

            [styles]
            text = {}
            comment = { foreground = "#808080", italic = true }
            "generic.heading" = { bold = true, underline = true }
            "##,
        )
        .unwrap();

        assert_eq!(theme.name, "mono");
        assert!(theme.resolve("text").unwrap().is_plain());
        assert!(theme.resolve("comment.single").unwrap().italic);
        assert!(theme.resolve("generic.heading").unwrap().underline);
    }

    #[test]
    fn test_theme_with_bad_color() {
        let err = Theme::from_toml("name = \"x\"\n[styles]\ntext = { foreground = \"blue\" }\n")
            .unwrap_err();
        assert!(matches!(err, SyntaxError::ThemeParse(_)));
    }

    #[test]
    fn test_toml_roundtrip() {
        let theme = Theme::dusk();
        let content = toml::to_string(&theme).unwrap();
        assert_eq!(Theme::from_toml(&content).unwrap(), theme);
    }
}
