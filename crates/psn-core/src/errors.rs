//! Structured error types shared across PSN crates.

use std::collections::BTreeMap;
use std::fmt::{self, Display};
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Structured payload attached to every [`PsnError`] variant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorInfo {
    /// Stable machine readable error code.
    pub code: String,
    /// Human readable diagnostic message.
    pub message: String,
    /// Contextual key value pairs (paths, bounds, executable names, etc.).
    #[serde(default)]
    pub context: BTreeMap<String, String>,
    /// Optional hint that may help the caller resolve the issue.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
}

impl ErrorInfo {
    /// Creates a new error payload with the provided code and message.
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            context: BTreeMap::new(),
            hint: None,
        }
    }

    /// Adds a context entry to the payload.
    pub fn with_context(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.context.insert(key.into(), value.into());
        self
    }

    /// Adds a `path` context entry rendered with [`Path::display`].
    pub fn with_path(self, path: &Path) -> Self {
        self.with_context("path", path.display().to_string())
    }

    /// Sets a human readable hint for remediation.
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}

/// Canonical error type for the sweep driver.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Error)]
#[serde(tag = "family", content = "detail")]
pub enum PsnError {
    /// The checker executable could not be resolved on the search path.
    #[error("external tool missing: {0}")]
    ExternalToolMissing(ErrorInfo),
    /// Sweep or block parameters were rejected before any work started.
    #[error("invalid request: {0}")]
    InvalidRequest(ErrorInfo),
    /// The checker process could not be spawned, waited on, or timed out.
    #[error("process invocation failed: {0}")]
    ProcessInvocation(ErrorInfo),
    /// The model renderer failed to produce a program for a block.
    #[error("render error: {0}")]
    Render(ErrorInfo),
    /// Filesystem errors while staging models or persisting results.
    #[error("io error: {0}")]
    Io(ErrorInfo),
    /// Plan or configuration files could not be read or decoded.
    #[error("config error: {0}")]
    Config(ErrorInfo),
}

impl Display for ErrorInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (code: {})", self.message, self.code)?;
        if !self.context.is_empty() {
            write!(f, " | context: [")?;
            for (idx, (key, value)) in self.context.iter().enumerate() {
                if idx > 0 {
                    write!(f, ", ")?;
                }
                write!(f, "{key}={value}")?;
            }
            write!(f, "]")?;
        }
        if let Some(hint) = &self.hint {
            write!(f, " | hint: {hint}")?;
        }
        Ok(())
    }
}

impl PsnError {
    /// Returns a reference to the payload describing the error.
    pub fn info(&self) -> &ErrorInfo {
        match self {
            PsnError::ExternalToolMissing(info)
            | PsnError::InvalidRequest(info)
            | PsnError::ProcessInvocation(info)
            | PsnError::Render(info)
            | PsnError::Io(info)
            | PsnError::Config(info) => info,
        }
    }

    /// Shorthand for an [`PsnError::InvalidRequest`] with the given code.
    pub fn invalid(code: impl Into<String>, message: impl Into<String>) -> Self {
        PsnError::InvalidRequest(ErrorInfo::new(code, message))
    }

    /// Wraps an I/O error raised while touching `path`.
    pub fn io(code: impl Into<String>, err: std::io::Error, path: &Path) -> Self {
        PsnError::Io(ErrorInfo::new(code, err.to_string()).with_path(path))
    }
}
