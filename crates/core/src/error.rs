//! Structured error handling with context and recovery suggestions
//!
//! Every error carries:
//! - An [`ErrorCode`] for programmatic handling
//! - Optional context (usually the file being processed)
//! - An optional recovery suggestion
//! - A serializable [`ErrorReport`] form for `--format json`

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use thiserror::Error;

/// Error codes for programmatic error handling
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    // General errors (1xxx)
    /// Bug in droidcfg itself
    Internal = 1001,

    // IO errors (2xxx)
    /// Unclassified I/O failure
    IoError = 2000,
    /// File vanished between check and read
    FileNotFound = 2001,
    /// File exists but is not readable
    PermissionDenied = 2002,

    // Configuration errors (3xxx)
    /// Config file could not be read
    ConfigError = 3000,
    /// Explicit `--config` path does not exist
    ConfigNotFound = 3001,
    /// Malformed TOML or property file
    ConfigParseError = 3002,
    /// Config parsed but failed validation
    ConfigValidationError = 3003,
    /// A property value has the wrong shape
    InvalidConfigValue = 3004,

    // Signing errors (4xxx)
    /// Release keystore missing under the `fail` policy
    ReleaseKeystoreMissing = 4001,
}

impl ErrorCode {
    /// Get the numeric code
    pub fn code(&self) -> u32 {
        *self as u32
    }

    /// Get a human-readable category
    pub fn category(&self) -> &'static str {
        match self.code() / 1000 {
            1 => "General",
            2 => "IO",
            3 => "Configuration",
            4 => "Signing",
            _ => "Unknown",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "E{:04}", self.code())
    }
}

/// Main error type with rich context
#[derive(Error, Debug)]
pub struct Error {
    /// Error code for programmatic handling
    pub code: ErrorCode,
    /// Human-readable message
    pub message: String,
    /// Additional context
    pub context: Option<String>,
    /// Recovery suggestion
    pub suggestion: Option<String>,
    /// Source error
    #[source]
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)?;
        if let Some(ctx) = &self.context {
            write!(f, "\n  Context: {}", ctx)?;
        }
        if let Some(suggestion) = &self.suggestion {
            write!(f, "\n  Suggestion: {}", suggestion)?;
        }
        Ok(())
    }
}

impl Error {
    /// Create a new error
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            context: None,
            suggestion: None,
            source: None,
        }
    }

    /// Add context to the error
    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }

    /// Add a recovery suggestion
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }

    /// Add a source error
    pub fn with_source(mut self, source: impl std::error::Error + Send + Sync + 'static) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    /// Convert to a serializable report
    pub fn to_report(&self) -> ErrorReport {
        ErrorReport {
            code: self.code,
            code_str: self.code.to_string(),
            category: self.code.category().to_string(),
            message: self.message.clone(),
            context: self.context.clone(),
            suggestion: self.suggestion.clone(),
            source: self.source.as_ref().map(|e| e.to_string()),
        }
    }

    /// CLI exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self.code.category() {
            "Configuration" => exit_codes::CONFIG_ERROR,
            "Signing" => exit_codes::SIGNING_ERROR,
            _ => exit_codes::FAILURE,
        }
    }

    // Convenience constructors

    /// Config file could not be read
    pub fn config(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::ConfigError, message)
    }

    /// Explicit config path does not exist
    pub fn config_not_found(path: impl AsRef<Path>) -> Self {
        Self::new(
            ErrorCode::ConfigNotFound,
            format!("Configuration file not found: {}", path.as_ref().display()),
        )
        .with_suggestion("Create a .droidcfg.toml file or use --config to specify a path")
    }

    /// Malformed TOML or property content
    pub fn config_parse(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::ConfigParseError, message)
    }

    /// Malformed property file, with the file as context
    pub fn malformed_properties(path: impl AsRef<Path>, message: impl Into<String>) -> Self {
        Self::config_parse(message)
            .with_context(format!("While reading {}", path.as_ref().display()))
            .with_suggestion("Fix the property file syntax; lines use key=value")
    }

    /// A key holds a value of the wrong shape
    pub fn invalid_value(key: &str, value: &str, expected: &str) -> Self {
        Self::new(
            ErrorCode::InvalidConfigValue,
            format!("Invalid value for {}: '{}' (expected {})", key, value, expected),
        )
    }

    /// Config failed validation
    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::ConfigValidationError, message)
    }

    /// Release build would fall back to the debug key under the `fail` policy
    pub fn release_keystore_missing(key_properties: impl AsRef<Path>) -> Self {
        Self::new(
            ErrorCode::ReleaseKeystoreMissing,
            "Release keystore not found; refusing to sign the release build with the debug key",
        )
        .with_context(format!(
            "Signing properties: {}",
            key_properties.as_ref().display()
        ))
        .with_suggestion(
            "Provide storeFile in the signing properties, or set signing.fallback = \"debug\"",
        )
    }
}

/// Serializable error report for logging and JSON output
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorReport {
    /// Symbolic code
    pub code: ErrorCode,
    /// Code as `E####`
    pub code_str: String,
    /// Code category
    pub category: String,
    /// Human-readable message
    pub message: String,
    /// Additional context
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
    /// Recovery suggestion
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
    /// Source error, rendered
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// Exit codes for CLI commands
pub mod exit_codes {
    /// Command succeeded
    pub const SUCCESS: i32 = 0;
    /// Unclassified failure
    pub const FAILURE: i32 = 1;
    /// Configuration or property file error
    pub const CONFIG_ERROR: i32 = 3;
    /// Release signing refused
    pub const SIGNING_ERROR: i32 = 5;
    /// Release build would be signed with the debug identity
    pub const SIGNING_FALLBACK: i32 = 6;
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        let code = match err.kind() {
            std::io::ErrorKind::NotFound => ErrorCode::FileNotFound,
            std::io::ErrorKind::PermissionDenied => ErrorCode::PermissionDenied,
            _ => ErrorCode::IoError,
        };
        Error::new(code, err.to_string()).with_source(err)
    }
}

impl From<toml::de::Error> for Error {
    fn from(err: toml::de::Error) -> Self {
        Error::new(ErrorCode::ConfigParseError, format!("TOML parse error: {}", err))
            .with_source(err)
    }
}

impl From<regex::Error> for Error {
    fn from(err: regex::Error) -> Self {
        Error::new(ErrorCode::Internal, format!("Regex error: {}", err)).with_source(err)
    }
}

/// Extension trait for adding context to Results
pub trait ResultExt<T> {
    /// Attach context to the error, if any
    fn context(self, context: impl Into<String>) -> Result<T>;
    /// Attach a recovery suggestion to the error, if any
    fn with_suggestion(self, suggestion: impl Into<String>) -> Result<T>;
}

impl<T> ResultExt<T> for Result<T> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| e.with_context(context))
    }

    fn with_suggestion(self, suggestion: impl Into<String>) -> Result<T> {
        self.map_err(|e| e.with_suggestion(suggestion))
    }
}
