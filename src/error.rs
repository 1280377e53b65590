//! Structured error types for configuration access.

use serde::Serialize;
use std::fmt;
use std::path::Path;

/// Error codes for programmatic error handling.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    // Lookup errors
    NotFound,

    // Validation errors
    InvalidFormat,
    InvalidPath,
    InvalidName,
    Conflict,

    // Resolution errors
    ResolutionLimit,
    InvalidState,

    // Loading and I/O
    LoadFailed,
    Io,
}

/// Structured error raised by the configuration engine.
#[derive(Debug, Serialize, thiserror::Error)]
#[error("{}", render(.property, .message, .details))]
pub struct ConfigError {
    pub code: ErrorCode,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub property: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ConfigError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            property: None,
            details: None,
        }
    }

    pub fn with_property(mut self, property: impl Into<String>) -> Self {
        self.property = Some(property.into());
        self
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    // Convenience constructors

    pub fn not_found(property: &str) -> Self {
        Self::new(
            ErrorCode::NotFound,
            "Required property is undefined or blank",
        )
        .with_property(property)
    }

    pub fn invalid_format(property: &str, reason: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidFormat, reason).with_property(property)
    }

    /// A path-typed property that does not name an existing file system entry.
    pub fn missing_path(property: &str, path: &Path) -> Self {
        Self::new(
            ErrorCode::InvalidPath,
            format!("Path does not exist: {}", path.display()),
        )
        .with_property(property)
    }

    /// A path-typed property that exists but is the wrong kind of entry.
    pub fn wrong_path_kind(property: &str, path: &Path, expected: PathKind) -> Self {
        Self::new(
            ErrorCode::InvalidPath,
            format!("{} must be {}", path.display(), expected),
        )
        .with_property(property)
    }

    pub fn invalid_name(property: &str, reason: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidName, reason).with_property(property)
    }

    pub fn conflict(properties: &[&str], reason: &str) -> Self {
        Self::new(ErrorCode::Conflict, reason).with_property(properties.join(", "))
    }

    pub fn resolution_limit(raw: &str, passes: usize) -> Self {
        Self::new(
            ErrorCode::ResolutionLimit,
            format!("Variable substitution did not settle after {} passes", passes),
        )
        .with_details(raw)
    }

    pub fn invalid_state(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidState, message)
    }

    pub fn load_failed(path: &Path, reason: impl fmt::Display) -> Self {
        Self::new(
            ErrorCode::LoadFailed,
            format!("Failed to load config file {}", path.display()),
        )
        .with_details(reason.to_string())
    }

    pub fn malformed_line(path: &Path, line: usize, reason: &str) -> Self {
        Self::new(
            ErrorCode::LoadFailed,
            format!("Malformed line {} in {}", line, path.display()),
        )
        .with_details(reason)
    }

    pub fn io(err: impl fmt::Display) -> Self {
        Self::new(ErrorCode::Io, err.to_string())
    }
}

impl From<std::io::Error> for ConfigError {
    fn from(err: std::io::Error) -> Self {
        ConfigError::io(err)
    }
}

fn render(property: &Option<String>, message: &str, details: &Option<String>) -> String {
    let mut out = match property {
        Some(property) => format!("[{}] {}", property, message),
        None => message.to_string(),
    };
    if let Some(details) = details {
        out.push_str(": ");
        out.push_str(details);
    }
    out
}

/// Kind of file system entry a path-typed property must name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathKind {
    File,
    Directory,
}

impl fmt::Display for PathKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathKind::File => write!(f, "FILE"),
            PathKind::Directory => write!(f, "DIRECTORY"),
        }
    }
}

/// Result type for configuration operations.
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;
