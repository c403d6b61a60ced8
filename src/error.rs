//! Fatal error taxonomy.
//!
//! Everything here aborts the run before a stylesheet is produced.
//! Recoverable per-file and per-token issues never surface as errors; they
//! are collected as [`crate::diagnostics::Diagnostic`] values instead.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("invalid glob pattern '{pattern}': {reason}")]
    Pattern { pattern: String, reason: String },

    #[error("invalid safelist/blocklist entry '{entry}': {reason}")]
    PolicyEntry { entry: String, reason: String },

    #[error("plugin '{plugin}' failed to load: {source}")]
    Plugin {
        plugin: String,
        #[source]
        source: PluginError,
    },

    #[error("run cancelled")]
    Cancelled,
}

/// Why a plugin could not be loaded. Wrapped in [`EngineError::Plugin`]
/// together with the plugin name so configuration mistakes are attributable.
#[derive(Debug, Error)]
pub enum PluginError {
    #[error("no such plugin in the built-in catalog")]
    Unknown,

    #[error("registration failed: {0}")]
    Registration(String),
}
