//! User preferences.
//!
//! The record is small: the last opened folder, the editor font and the
//! highlighting setup. It is stored as TOML in the platform config
//! directory. Older installs kept a flat `config.json` next to the
//! executable; that file is still read when no TOML config exists.
//!
//! Loading is best-effort. A missing or unreadable file never stops the
//! editor from starting, but the fallback is logged.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use docwright_syntax::{GrammarRegistry, Theme};

/// Legacy JSON record, looked up relative to the working directory.
pub const LEGACY_CONFIG_FILE: &str = "config.json";

/// Main configuration.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Folder opened in the previous session
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_folder: Option<PathBuf>,

    /// Editor appearance
    pub editor: EditorConfig,

    /// Highlighting setup
    pub syntax: SyntaxConfig,
}

impl Config {
    /// Loads config from the default location, falling back to defaults.
    pub fn load() -> Self {
        match Self::load_from_default_path() {
            Ok(Some(config)) => config,
            Ok(None) => {
                tracing::info!("no config file found, using defaults");
                Self::default()
            }
            Err(e) => {
                tracing::warn!("failed to load config, using defaults: {}", e);
                Self::default()
            }
        }
    }

    /// Loads config from a file if it exists and parses.
    ///
    /// Failures other than a missing file are logged.
    pub fn load_optional(path: impl AsRef<Path>) -> Option<Self> {
        let path = path.as_ref();
        if !path.exists() {
            tracing::debug!("config file {} does not exist", path.display());
            return None;
        }
        match Self::load_from(path) {
            Ok(config) => Some(config),
            Err(e) => {
                tracing::warn!("ignoring config file {}: {}", path.display(), e);
                None
            }
        }
    }

    /// Loads config from a file.
    ///
    /// Files with a `.json` extension are read as the legacy flat record.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        if path.extension().is_some_and(|ext| ext == "json") {
            let legacy: LegacyConfig = serde_json::from_str(&content)?;
            return Ok(legacy.into());
        }
        Ok(toml::from_str(&content)?)
    }

    /// Loads from the default config path, then the legacy JSON file.
    fn load_from_default_path() -> Result<Option<Self>, ConfigError> {
        match Self::default_path() {
            Ok(path) if path.exists() => return Self::load_from(&path).map(Some),
            Ok(_) => {}
            Err(e) => tracing::warn!("{}, looking for legacy config only", e),
        }
        Self::load_legacy(Path::new(LEGACY_CONFIG_FILE))
    }

    /// Loads the legacy JSON record if it exists.
    fn load_legacy(legacy: &Path) -> Result<Option<Self>, ConfigError> {
        if !legacy.exists() {
            return Ok(None);
        }
        tracing::info!("importing legacy config from {}", legacy.display());
        Self::load_from(legacy).map(Some)
    }

    /// Returns the default config file path.
    pub fn default_path() -> Result<PathBuf, ConfigError> {
        let config_dir = dirs::config_dir().ok_or(ConfigError::NoConfigDir)?;
        Ok(config_dir.join("docwright").join("config.toml"))
    }

    /// Saves the config to the default location.
    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(Self::default_path()?)
    }

    /// Saves the config as TOML.
    pub fn save_to(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        tracing::debug!("saved config to {}", path.display());
        Ok(())
    }

    /// Records the folder that was just opened.
    pub fn remember_folder(&mut self, folder: impl Into<PathBuf>) {
        self.last_folder = Some(folder.into());
    }

    /// Records the editor font.
    pub fn set_font(&mut self, family: impl Into<String>, size: u32) {
        self.editor.font_family = family.into();
        self.editor.font_size = size;
    }

    /// Resolves the configured theme.
    ///
    /// A theme file takes precedence over the built-in theme name.
    pub fn theme(&self) -> Result<Theme, ConfigError> {
        if let Some(path) = &self.syntax.theme_path {
            return Theme::load(path).map_err(|e| ConfigError::Theme(e.to_string()));
        }
        Theme::builtin(&self.syntax.theme)
            .ok_or_else(|| ConfigError::UnknownTheme(self.syntax.theme.clone()))
    }

    /// Builds a grammar registry with the built-ins plus configured grammar files.
    pub fn grammar_registry(&self) -> Result<GrammarRegistry, ConfigError> {
        let mut registry = GrammarRegistry::with_builtins();
        for path in &self.syntax.grammar_paths {
            registry
                .load_file(path)
                .map_err(|e| ConfigError::Grammar(format!("{}: {}", path.display(), e)))?;
        }
        Ok(registry)
    }
}

/// Editor appearance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    /// Font family
    pub font_family: String,

    /// Font size in points
    pub font_size: u32,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            font_family: "monospace".to_string(),
            font_size: 11,
        }
    }
}

/// Highlighting setup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyntaxConfig {
    /// Grammar used when a file's extension is not recognized
    pub grammar: String,

    /// Built-in theme name
    pub theme: String,

    /// Theme file overriding `theme`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub theme_path: Option<PathBuf>,

    /// Extra grammar definition files
    pub grammar_paths: Vec<PathBuf>,
}

impl Default for SyntaxConfig {
    fn default() -> Self {
        Self {
            grammar: "rst".to_string(),
            theme: "paper".to_string(),
            theme_path: None,
            grammar_paths: Vec::new(),
        }
    }
}

/// The flat JSON record written by earlier versions.
#[derive(Debug, Deserialize)]
struct LegacyConfig {
    last_folder: Option<PathBuf>,
    font_family: Option<String>,
    font_size: Option<u32>,
}

impl From<LegacyConfig> for Config {
    fn from(legacy: LegacyConfig) -> Self {
        let mut config = Config {
            last_folder: legacy.last_folder,
            ..Config::default()
        };
        if let Some(family) = legacy.font_family {
            config.editor.font_family = family;
        }
        if let Some(size) = legacy.font_size {
            config.editor.font_size = size;
        }
        config
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Config directory not found")]
    NoConfigDir,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Legacy config parse error: {0}")]
    LegacyParse(#[from] serde_json::Error),

    #[error("Serialize error: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("Unknown theme: {0}")]
    UnknownTheme(String),

    #[error("Theme error: {0}")]
    Theme(String),

    #[error("Grammar error: {0}")]
    Grammar(String),
}
