//! App version from `local.properties`

use droidcfg_core::error::{Error, Result, ResultExt};
use droidcfg_core::properties::PropertySource;
use serde::Serialize;
use std::path::Path;

/// Property key for the integer version code
pub const VERSION_CODE: &str = "flutter.versionCode";
/// Property key for the display version name
pub const VERSION_NAME: &str = "flutter.versionName";

const DEFAULT_VERSION_CODE: &str = "1";
const DEFAULT_VERSION_NAME: &str = "1.0";

/// Largest version code Google Play accepts
pub const MAX_VERSION_CODE: u32 = 2_100_000_000;

/// `versionCode` / `versionName` pair for `defaultConfig`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AppVersion {
    /// Monotonic integer version (`versionCode`)
    pub version_code: u32,
    /// User-visible version string (`versionName`)
    pub version_name: String,
}

impl Default for AppVersion {
    fn default() -> Self {
        Self {
            version_code: 1,
            version_name: DEFAULT_VERSION_NAME.to_string(),
        }
    }
}

impl AppVersion {
    /// Read from already loaded local properties, applying defaults
    pub fn from_properties(props: &PropertySource) -> Result<Self> {
        let raw_code = props.get_or(VERSION_CODE, DEFAULT_VERSION_CODE);
        let version_code = raw_code
            .parse::<u32>()
            .ok()
            .filter(|code| *code <= MAX_VERSION_CODE)
            .ok_or_else(|| {
                Error::invalid_value(VERSION_CODE, raw_code, "an integer between 0 and 2100000000")
            })?;

        Ok(Self {
            version_code,
            version_name: props.get_or(VERSION_NAME, DEFAULT_VERSION_NAME).to_string(),
        })
    }

    /// Load `local.properties`; a missing file gives the defaults
    pub fn load(local_properties: &Path) -> Result<Self> {
        let props = PropertySource::load_optional(local_properties)?;
        Self::from_properties(&props)
            .context(format!("While reading {}", local_properties.display()))
    }
}
