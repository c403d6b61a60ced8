//! Non-fatal diagnostics collected during a run.
//!
//! Diagnostics are returned alongside the stylesheet, never interleaved
//! with output. File-level problems (unreadable file) are warnings;
//! token-level resolution misses are informational notices.

use std::fmt;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Warning,
    Notice,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Warning => write!(f, "warning"),
            Self::Notice => write!(f, "notice"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub severity: Severity,
    pub message: String,
    /// Originating file, when the diagnostic is attributable to one.
    pub file: Option<PathBuf>,
    /// The token that triggered a per-token notice.
    pub token: Option<String>,
}

impl Diagnostic {
    pub fn file_warning(file: &Path, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            message: message.into(),
            file: Some(file.to_path_buf()),
            token: None,
        }
    }

    pub fn token_notice(token: &str, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Notice,
            message: message.into(),
            file: None,
            token: Some(token.to_string()),
        }
    }

    /// A token notice attributed to the file of the first occurrence.
    pub fn token_notice_in(file: &Path, token: &str, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Notice,
            message: message.into(),
            file: Some(file.to_path_buf()),
            token: Some(token.to_string()),
        }
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            message: message.into(),
            file: None,
            token: None,
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.file {
            Some(file) => write!(f, "{}: {}: {}", self.severity, file.display(), self.message),
            None => write!(f, "{}: {}", self.severity, self.message),
        }
    }
}
