//! Core utilities for droidcfg
//!
//! Shared functionality used by the resolver and the CLI:
//!
//! - **Error handling**: errors with codes, context, and recovery suggestions
//! - **Property files**: Java `.properties` reader for `local.properties` and `key.properties`
//! - **Configuration**: TOML-based configuration with validation
//!
//! # Example
//!
//! ```rust,no_run
//! use droidcfg_core::properties::PropertySource;
//! use std::path::Path;
//!
//! let local = PropertySource::load_optional(Path::new("local.properties"))?;
//! let version_name = local.get_or("flutter.versionName", "1.0");
//! # Ok::<(), droidcfg_core::Error>(())
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod error;
pub mod properties;
pub mod validation;

pub use error::{Error, ErrorCode, Result, ResultExt};

/// Re-export commonly used types
pub mod prelude {
    pub use crate::config::{Config, ConfigSchema, FallbackPolicy};
    pub use crate::error::{exit_codes, Error, ErrorCode, Result, ResultExt};
    pub use crate::properties::PropertySource;
    pub use crate::validation::{ValidationResult, Validator};
}
