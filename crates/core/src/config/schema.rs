//! Configuration schema definitions
//!
//! Every section has defaults matching a stock Flutter Android module, so an
//! empty or missing `.droidcfg.toml` is a valid configuration.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration schema
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct ConfigSchema {
    /// `[project]` file locations
    #[serde(default)]
    pub project: ProjectConfig,

    /// `[app]` identifiers
    #[serde(default)]
    pub app: AppConfig,

    /// `[toolchain]` SDK/NDK levels
    #[serde(default)]
    pub toolchain: ToolchainConfig,

    /// `[signing]` release signing policy
    #[serde(default)]
    pub signing: SigningConfig,
}

/// Where the property files live, relative to the project root
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProjectConfig {
    /// Local build properties (`flutter.versionCode`, `flutter.versionName`)
    #[serde(default = "default_local_properties")]
    pub local_properties: PathBuf,

    /// Signing secrets (`storeFile`, `keyAlias`, ...)
    #[serde(default = "default_key_properties")]
    pub key_properties: PathBuf,

    /// Flutter module source, relative to the Android app module
    #[serde(default = "default_flutter_source")]
    pub flutter_source: PathBuf,
}

impl Default for ProjectConfig {
    fn default() -> Self {
        Self {
            local_properties: default_local_properties(),
            key_properties: default_key_properties(),
            flutter_source: default_flutter_source(),
        }
    }
}

fn default_local_properties() -> PathBuf {
    PathBuf::from("local.properties")
}

fn default_key_properties() -> PathBuf {
    PathBuf::from("android").join("key.properties")
}

fn default_flutter_source() -> PathBuf {
    PathBuf::from("../..")
}

/// Application identifiers
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AppConfig {
    /// Kotlin/Java namespace of the generated R class
    #[serde(default = "default_namespace")]
    pub namespace: String,

    /// Play Store application id
    #[serde(default = "default_application_id")]
    pub application_id: String,

    /// Java source/target compatibility and JVM target
    #[serde(default = "default_java_version")]
    pub java_version: u8,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            namespace: default_namespace(),
            application_id: default_application_id(),
            java_version: default_java_version(),
        }
    }
}

fn default_namespace() -> String {
    "com.example.myapp".to_string()
}

fn default_application_id() -> String {
    "com.example.doacoesapp".to_string()
}

fn default_java_version() -> u8 {
    11
}

/// SDK and NDK levels normally supplied by the Flutter Gradle plugin
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ToolchainConfig {
    /// API level compiled against
    #[serde(default = "default_compile_sdk")]
    pub compile_sdk: u32,

    /// Lowest supported API level
    #[serde(default = "default_min_sdk")]
    pub min_sdk: u32,

    /// API level the app is tested against
    #[serde(default = "default_target_sdk")]
    pub target_sdk: u32,

    /// NDK release, `major.minor.build`
    #[serde(default = "default_ndk_version")]
    pub ndk_version: String,
}

impl Default for ToolchainConfig {
    fn default() -> Self {
        Self {
            compile_sdk: default_compile_sdk(),
            min_sdk: default_min_sdk(),
            target_sdk: default_target_sdk(),
            ndk_version: default_ndk_version(),
        }
    }
}

fn default_compile_sdk() -> u32 {
    35
}

fn default_min_sdk() -> u32 {
    21
}

fn default_target_sdk() -> u32 {
    35
}

fn default_ndk_version() -> String {
    "27.0.12077973".to_string()
}

/// What to do when the release keystore is missing
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FallbackPolicy {
    /// Sign the release build with the debug identity
    #[default]
    Debug,
    /// Refuse to configure the release build
    Fail,
}

/// Release signing configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct SigningConfig {
    /// Behaviour when the release keystore is missing
    #[serde(default)]
    pub fallback: FallbackPolicy,

    /// Override for the toolchain's debug keystore location
    #[serde(default)]
    pub debug_keystore: Option<PathBuf>,
}
