//! Configuration file loading

use super::schema::ConfigSchema;
use crate::error::{Error, Result, ResultExt};
use crate::validation::{validate_schema, ValidationError};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Configuration wrapper
#[derive(Debug, Clone)]
pub struct Config {
    /// Parsed (or default) settings
    pub schema: ConfigSchema,
    /// File the settings came from; `None` when running on defaults
    pub path: Option<PathBuf>,
    /// Non-blocking validation findings
    pub warnings: Vec<ValidationError>,
}

impl Config {
    /// Load configuration from a file path or use defaults.
    ///
    /// An explicit path must exist; otherwise the standard locations under
    /// `base_dir` are searched and defaults are used when none is found.
    pub fn load(path: Option<&Path>, base_dir: &Path) -> Result<Self> {
        let config_path = match path {
            Some(p) if !p.exists() => return Err(Error::config_not_found(p)),
            Some(p) => Some(p.to_path_buf()),
            None => find_config_file(base_dir),
        };

        let schema = match config_path {
            Some(ref p) => load_config_file(p)?,
            None => ConfigSchema::default(),
        };

        let validation = validate_schema(&schema);
        let warnings = validation.warnings().to_vec();
        validation
            .to_result()
            .context(match config_path {
                Some(ref p) => format!("While validating {}", p.display()),
                None => "While validating default configuration".to_string(),
            })?;

        for warning in &warnings {
            warn!(field = %warning.field, "{}", warning.message);
        }

        Ok(Self {
            schema,
            path: config_path,
            warnings,
        })
    }

    /// Load with defaults only (no file)
    pub fn defaults() -> Self {
        Self {
            schema: ConfigSchema::default(),
            path: None,
            warnings: Vec::new(),
        }
    }
}

/// Find configuration file in standard locations
fn find_config_file(base_dir: &Path) -> Option<PathBuf> {
    let candidates = [".droidcfg.toml", "droidcfg.toml", ".config/droidcfg.toml"];

    candidates
        .iter()
        .map(|candidate| base_dir.join(candidate))
        .find(|candidate| candidate.exists())
        .inspect(|found| debug!(path = %found.display(), "found configuration file"))
}

/// Load and parse a TOML configuration file
fn load_config_file(path: &Path) -> Result<ConfigSchema> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        Error::config(format!("Failed to read config file {}: {}", path.display(), e))
            .with_source(e)
    })?;

    toml::from_str(&content)
        .map_err(Error::from)
        .context(format!("While parsing {}", path.display()))
}
