//! Visual style descriptors.
//!
//! A [`StyleDescriptor`] is what a theme assigns to a token class and what
//! the highlighter hands to the text surface, one per character.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::SyntaxError;

/// A 24-bit RGB color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Builds a color from a packed `0xRRGGBB` value.
    pub const fn from_hex(hex: u32) -> Self {
        Self {
            r: ((hex >> 16) & 0xff) as u8,
            g: ((hex >> 8) & 0xff) as u8,
            b: (hex & 0xff) as u8,
        }
    }
}

impl FromStr for Color {
    type Err = SyntaxError;

    /// Parses `#rrggbb` or `rrggbb`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let digits = s.trim().trim_start_matches('#');
        if digits.len() != 6 || !digits.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(SyntaxError::InvalidColor(s.to_string()));
        }
        let value =
            u32::from_str_radix(digits, 16).map_err(|_| SyntaxError::InvalidColor(s.to_string()))?;
        Ok(Self::from_hex(value))
    }
}

impl TryFrom<String> for Color {
    type Error = SyntaxError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Color> for String {
    fn from(color: Color) -> Self {
        color.to_string()
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

/// How a span of text should look.
///
/// Every attribute is optional in the sense that an unset color or a
/// `false` flag leaves the surface's default in place.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StyleDescriptor {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub foreground: Option<Color>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub background: Option<Color>,
    pub bold: bool,
    pub italic: bool,
    pub underline: bool,
}

impl StyleDescriptor {
    /// A style that changes nothing.
    pub const PLAIN: Self = Self {
        foreground: None,
        background: None,
        bold: false,
        italic: false,
        underline: false,
    };

    pub const fn fg(color: Color) -> Self {
        Self {
            foreground: Some(color),
            ..Self::PLAIN
        }
    }

    pub const fn with_background(mut self, color: Color) -> Self {
        self.background = Some(color);
        self
    }

    pub const fn bold(mut self) -> Self {
        self.bold = true;
        self
    }

    pub const fn italic(mut self) -> Self {
        self.italic = true;
        self
    }

    pub const fn underline(mut self) -> Self {
        self.underline = true;
        self
    }

    /// Returns true if applying this style would not change anything.
    pub fn is_plain(&self) -> bool {
        *self == Self::PLAIN
    }
}
