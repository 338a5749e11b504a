//! Configuration validation
//!
//! ```rust,ignore
//! use droidcfg_core::validation::Validator;
//!
//! let result = Validator::new()
//!     .required("app.namespace", &schema.app.namespace)
//!     .range("toolchain.min_sdk", schema.toolchain.min_sdk, 1, 99)
//!     .validate();
//!
//! for error in result.errors() {
//!     eprintln!("Validation error: {}", error);
//! }
//! ```

use crate::config::ConfigSchema;
use crate::error::{Error, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};

const PACKAGE_PATTERN: &str = r"^[a-zA-Z][a-zA-Z0-9_]*(\.[a-zA-Z][a-zA-Z0-9_]*)+$";
const NDK_VERSION_PATTERN: &str = r"^\d+\.\d+\.\d+$";

/// Validation error
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationError {
    /// Field that failed validation
    pub field: String,
    /// Error message
    pub message: String,
    /// Error code
    pub code: String,
    /// Expected value (if applicable)
    pub expected: Option<String>,
    /// Actual value (if applicable)
    pub actual: Option<String>,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Validation result
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ValidationResult {
    errors: Vec<ValidationError>,
    warnings: Vec<ValidationError>,
}

impl ValidationResult {
    /// Create a new empty result
    pub fn new() -> Self {
        Self::default()
    }

    /// Check if validation passed
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    /// Get all errors
    pub fn errors(&self) -> &[ValidationError] {
        &self.errors
    }

    /// Get all warnings
    pub fn warnings(&self) -> &[ValidationError] {
        &self.warnings
    }

    /// Add an error
    pub fn add_error(&mut self, error: ValidationError) {
        self.errors.push(error);
    }

    /// Add a warning
    pub fn add_warning(&mut self, warning: ValidationError) {
        self.warnings.push(warning);
    }

    /// Convert to Result type
    pub fn to_result(self) -> Result<()> {
        if self.is_valid() {
            Ok(())
        } else {
            let messages: Vec<String> = self.errors.iter().map(|e| e.to_string()).collect();
            Err(Error::validation(format!(
                "Invalid configuration: {}",
                messages.join("; ")
            )))
        }
    }
}

/// Fluent validator builder
pub struct Validator {
    result: ValidationResult,
}

impl Default for Validator {
    fn default() -> Self {
        Self::new()
    }
}

impl Validator {
    /// Create a new validator
    pub fn new() -> Self {
        Self {
            result: ValidationResult::new(),
        }
    }

    /// Validate that a field is not empty
    pub fn required(mut self, field: &str, value: &str) -> Self {
        if value.trim().is_empty() {
            self.result.add_error(ValidationError {
                field: field.to_string(),
                message: "Field is required".to_string(),
                code: "REQUIRED".to_string(),
                expected: Some("non-empty value".to_string()),
                actual: Some("empty".to_string()),
            });
        }
        self
    }

    /// Validate against a regex pattern
    pub fn pattern(mut self, field: &str, value: &str, pattern: &str, description: &str) -> Self {
        match Regex::new(pattern) {
            Ok(re) => {
                if !re.is_match(value) {
                    self.result.add_error(ValidationError {
                        field: field.to_string(),
                        message: format!("Must match {}", description),
                        code: "PATTERN".to_string(),
                        expected: Some(description.to_string()),
                        actual: Some(value.to_string()),
                    });
                }
            }
            Err(_) => {
                self.result.add_error(ValidationError {
                    field: field.to_string(),
                    message: "Invalid validation pattern".to_string(),
                    code: "INTERNAL".to_string(),
                    expected: None,
                    actual: None,
                });
            }
        }
        self
    }

    /// Validate a numeric range
    pub fn range<T: PartialOrd + std::fmt::Display>(
        mut self,
        field: &str,
        value: T,
        min: T,
        max: T,
    ) -> Self {
        if value < min || value > max {
            self.result.add_error(ValidationError {
                field: field.to_string(),
                message: format!("Must be between {} and {}", min, max),
                code: "RANGE".to_string(),
                expected: Some(format!("{} - {}", min, max)),
                actual: Some(value.to_string()),
            });
        }
        self
    }

    /// Add a custom validation
    pub fn custom<F>(mut self, field: &str, f: F) -> Self
    where
        F: FnOnce() -> Option<String>,
    {
        if let Some(message) = f() {
            self.result.add_error(ValidationError {
                field: field.to_string(),
                message,
                code: "CUSTOM".to_string(),
                expected: None,
                actual: None,
            });
        }
        self
    }

    /// Add a warning (non-blocking)
    pub fn warn_if(mut self, field: &str, condition: bool, message: &str) -> Self {
        if condition {
            self.result.add_warning(ValidationError {
                field: field.to_string(),
                message: message.to_string(),
                code: "WARNING".to_string(),
                expected: None,
                actual: None,
            });
        }
        self
    }

    /// Complete validation and return result
    pub fn validate(self) -> ValidationResult {
        self.result
    }
}

/// Validate a loaded configuration schema
pub fn validate_schema(schema: &ConfigSchema) -> ValidationResult {
    let app = &schema.app;
    let toolchain = &schema.toolchain;

    Validator::new()
        .required("app.namespace", &app.namespace)
        .pattern("app.namespace", &app.namespace, PACKAGE_PATTERN, "a Java package name")
        .required("app.application_id", &app.application_id)
        .pattern(
            "app.application_id",
            &app.application_id,
            PACKAGE_PATTERN,
            "a Java package name",
        )
        .range("app.java_version", app.java_version, 8, 25)
        .range("toolchain.min_sdk", toolchain.min_sdk, 1, 99)
        .range("toolchain.target_sdk", toolchain.target_sdk, 1, 99)
        .range("toolchain.compile_sdk", toolchain.compile_sdk, 1, 99)
        .custom("toolchain.min_sdk", || {
            (toolchain.min_sdk > toolchain.target_sdk).then(|| {
                format!(
                    "min_sdk ({}) must not exceed target_sdk ({})",
                    toolchain.min_sdk, toolchain.target_sdk
                )
            })
        })
        .custom("toolchain.target_sdk", || {
            (toolchain.target_sdk > toolchain.compile_sdk).then(|| {
                format!(
                    "target_sdk ({}) must not exceed compile_sdk ({})",
                    toolchain.target_sdk, toolchain.compile_sdk
                )
            })
        })
        .pattern(
            "toolchain.ndk_version",
            &toolchain.ndk_version,
            NDK_VERSION_PATTERN,
            "major.minor.build",
        )
        .warn_if(
            "app.namespace",
            app.namespace.starts_with("com.example."),
            "Placeholder namespace; the Play Store rejects com.example packages",
        )
        .validate()
}
