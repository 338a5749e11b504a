//! Toolchain-provided values
//!
//! SDK levels, the NDK version and the debug signing identity normally come
//! from the Flutter Gradle plugin and the Android SDK. They are passed to the
//! resolver explicitly so resolution never depends on ambient state.

use crate::signing::SigningIdentity;
use droidcfg_core::config::{SigningConfig, ToolchainConfig};
use serde::Serialize;
use std::path::PathBuf;

/// SDK/NDK levels and debug signing material for one build invocation
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ToolchainContext {
    /// API level compiled against
    pub compile_sdk: u32,
    /// Lowest supported API level
    pub min_sdk: u32,
    /// API level the app is tested against
    pub target_sdk: u32,
    /// NDK release used for native code
    pub ndk_version: String,
    /// Keystore backing the debug identity
    pub debug_keystore: PathBuf,
}

impl Default for ToolchainContext {
    fn default() -> Self {
        Self::from_config(&ToolchainConfig::default(), &SigningConfig::default())
    }
}

impl ToolchainContext {
    /// Build from the `[toolchain]` and `[signing]` configuration sections
    pub fn from_config(toolchain: &ToolchainConfig, signing: &SigningConfig) -> Self {
        Self {
            compile_sdk: toolchain.compile_sdk,
            min_sdk: toolchain.min_sdk,
            target_sdk: toolchain.target_sdk,
            ndk_version: toolchain.ndk_version.clone(),
            debug_keystore: signing
                .debug_keystore
                .clone()
                .unwrap_or_else(default_debug_keystore),
        }
    }

    /// Override the debug keystore location
    pub fn with_debug_keystore(mut self, path: impl Into<PathBuf>) -> Self {
        self.debug_keystore = path.into();
        self
    }

    /// The debug signing identity; always usable, the SDK creates the
    /// keystore on first debug build
    pub fn debug_identity(&self) -> SigningIdentity {
        SigningIdentity::debug(self.debug_keystore.clone())
    }
}

/// `~/.android/debug.keystore`, or a relative path when there is no home
pub fn default_debug_keystore() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_default()
        .join(".android")
        .join("debug.keystore")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signing::DEBUG_KEY_ALIAS;

    #[test]
    fn test_defaults_follow_toolchain_config() {
        let ctx = ToolchainContext::default();
        assert_eq!(ctx.compile_sdk, 35);
        assert_eq!(ctx.min_sdk, 21);
        assert_eq!(ctx.target_sdk, 35);
        assert_eq!(ctx.ndk_version, "27.0.12077973");
        assert!(ctx.debug_keystore.ends_with(".android/debug.keystore"));
    }

    #[test]
    fn test_debug_keystore_override() {
        let signing = SigningConfig {
            debug_keystore: Some(PathBuf::from("/ci/debug.keystore")),
            ..Default::default()
        };
        let ctx = ToolchainContext::from_config(&ToolchainConfig::default(), &signing);
        assert_eq!(ctx.debug_keystore, PathBuf::from("/ci/debug.keystore"));

        let identity = ctx.debug_identity();
        assert!(identity.is_usable());
        assert_eq!(identity.key_alias.as_deref(), Some(DEBUG_KEY_ALIAS));
    }

    #[test]
    fn test_with_debug_keystore() {
        let ctx = ToolchainContext::default().with_debug_keystore("dbg.keystore");
        assert_eq!(
            ctx.debug_identity().store_file,
            Some(PathBuf::from("dbg.keystore"))
        );
    }
}
