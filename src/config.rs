//! Run configuration.
//!
//! A run is driven by one [`Config`]: content globs to scan, theme
//! overrides, safelist/blocklist policy, and the ordered plugin list.
//! Configuration is read-only for the duration of a run. Unrecognized
//! top-level keys are reported with a warning and ignored, never fatal.

use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::warn;

use crate::error::EngineError;
use crate::theme::ThemeOverrides;

#[derive(Debug, Clone, PartialEq, Deserialize, Default)]
pub struct Config {
    /// Content sources to scan for class-name tokens.
    #[serde(default)]
    pub content: Vec<ContentSource>,

    /// Directory the content globs are resolved against. Defaults to the
    /// current directory.
    #[serde(default)]
    pub base_path: Option<PathBuf>,

    /// Partial theme tables overlaid on the built-in defaults.
    #[serde(default)]
    pub theme: ThemeOverrides,

    /// Class names (or trailing-`*` prefixes) forced into the output even
    /// when never scanned.
    #[serde(default)]
    pub safelist: Vec<String>,

    /// Class names (or trailing-`*` prefixes) removed from the output
    /// regardless of origin. Wins over the safelist.
    #[serde(default)]
    pub blocklist: Vec<String>,

    /// Plugin ids loaded in declaration order before scanning begins.
    #[serde(default)]
    pub plugins: Vec<String>,

    /// Extra token boundary characters on top of whitespace and quotes.
    #[serde(default)]
    pub delimiters: Vec<char>,

    /// Raw CSS emitted ahead of the generated utilities, unmodified.
    #[serde(default)]
    pub base_css: Option<String>,

    #[serde(flatten)]
    unknown: BTreeMap<String, toml::Value>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ContentSource {
    /// Glob pattern relative to the scan base directory.
    pub pattern: String,
    #[serde(default)]
    pub kind: SourceKind,
}

impl ContentSource {
    pub fn new(pattern: impl Into<String>, kind: SourceKind) -> Self {
        Self {
            pattern: pattern.into(),
            kind,
        }
    }
}

/// Coarse file-type tag. The scan itself is uniform across kinds; the tag
/// selects which extra boundary characters apply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    #[default]
    Markup,
    Template,
    Script,
}

impl Config {
    pub fn from_toml_str(text: &str) -> Result<Self, EngineError> {
        let config: Config = toml::from_str(text)
            .map_err(|err| EngineError::Config(format!("failed to parse config: {}", err)))?;
        config.warn_unknown_keys();
        Ok(config)
    }

    pub fn from_toml_file(path: &Path) -> Result<Self, EngineError> {
        let text = fs::read_to_string(path).map_err(|err| {
            EngineError::Config(format!("failed to read config {}: {}", path.display(), err))
        })?;
        Self::from_toml_str(&text)
    }

    fn warn_unknown_keys(&self) {
        for key in self.unknown.keys() {
            warn!("ignoring unrecognized configuration key '{}'", key);
        }
    }
}
