//! Build configuration resolver
//!
//! Combines the property files under a project root with the toolchain
//! context and configured defaults into an [`AndroidBuildConfig`]. Each call
//! re-reads the files; nothing is cached between resolutions.

use crate::signing::{
    choose_release_signing, enforce_policy, resolve_signing, BuildVariantConfig, SigningIdentity,
};
use crate::toolchain::ToolchainContext;
use crate::version::AppVersion;
use droidcfg_core::config::{Config, ConfigSchema, FallbackPolicy};
use droidcfg_core::error::Result;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{debug, info, instrument};

/// Java source/target compatibility and Kotlin JVM target
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JavaCompatibility {
    /// `sourceCompatibility`
    pub source: String,
    /// `targetCompatibility`
    pub target: String,
    /// Kotlin `jvmTarget`
    pub jvm_target: String,
}

impl JavaCompatibility {
    /// All three set to the same Java release
    pub fn uniform(version: u8) -> Self {
        let version = version.to_string();
        Self {
            source: version.clone(),
            target: version.clone(),
            jvm_target: version,
        }
    }
}

/// Debug and release variants
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BuildTypes {
    /// Debug variant, always debug-signed
    pub debug: BuildVariantConfig,
    /// Release variant after the fallback policy
    pub release: BuildVariantConfig,
}

/// Fully resolved Android app module configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AndroidBuildConfig {
    /// Namespace of the generated R class
    pub namespace: String,
    /// Play Store application id
    pub application_id: String,
    /// API level compiled against
    pub compile_sdk: u32,
    /// Lowest supported API level
    pub min_sdk: u32,
    /// API level the app is tested against
    pub target_sdk: u32,
    /// NDK release
    pub ndk_version: String,
    /// Version from local properties
    pub version: AppVersion,
    /// Java/Kotlin compatibility levels
    pub java: JavaCompatibility,
    /// Flutter module source directory
    pub flutter_source: PathBuf,
    /// Signing per build variant
    pub build_types: BuildTypes,
}

/// Resolves build configuration for one project root
#[derive(Debug, Clone)]
pub struct BuildConfigResolver {
    root: PathBuf,
    schema: ConfigSchema,
    toolchain: ToolchainContext,
}

impl BuildConfigResolver {
    /// Resolver with default configuration and an explicit toolchain
    pub fn new(root: impl Into<PathBuf>, toolchain: ToolchainContext) -> Self {
        Self {
            root: root.into(),
            schema: ConfigSchema::default(),
            toolchain,
        }
    }

    /// Resolver driven by a loaded configuration
    pub fn from_config(root: impl Into<PathBuf>, config: &Config) -> Self {
        let toolchain =
            ToolchainContext::from_config(&config.schema.toolchain, &config.schema.signing);
        Self {
            root: root.into(),
            schema: config.schema.clone(),
            toolchain,
        }
    }

    /// Override the fallback policy
    pub fn with_policy(mut self, policy: FallbackPolicy) -> Self {
        self.schema.signing.fallback = policy;
        self
    }

    /// Override the signing properties location (relative to the root)
    pub fn with_key_properties(mut self, path: impl Into<PathBuf>) -> Self {
        self.schema.project.key_properties = path.into();
        self
    }

    /// Project root
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Injected toolchain values
    pub fn toolchain(&self) -> &ToolchainContext {
        &self.toolchain
    }

    /// Active fallback policy
    pub fn policy(&self) -> FallbackPolicy {
        self.schema.signing.fallback
    }

    /// Location of the signing properties file
    pub fn key_properties_path(&self) -> PathBuf {
        self.root.join(&self.schema.project.key_properties)
    }

    /// Location of the local build properties file
    pub fn local_properties_path(&self) -> PathBuf {
        self.root.join(&self.schema.project.local_properties)
    }

    /// Signing identity from the signing properties, without choosing
    pub fn release_identity(&self) -> Result<SigningIdentity> {
        resolve_signing(&self.key_properties_path())
    }

    /// Release signing choice with the fallback policy applied
    pub fn resolve_release(&self) -> Result<BuildVariantConfig> {
        let key_properties = self.key_properties_path();
        let resolved = resolve_signing(&key_properties)?;
        let chosen = choose_release_signing(resolved, self.toolchain.debug_identity());
        enforce_policy(chosen, self.policy(), &key_properties)
    }

    /// Version from the local build properties
    pub fn resolve_version(&self) -> Result<AppVersion> {
        AppVersion::load(&self.local_properties_path())
    }

    /// Resolve the whole module configuration
    #[instrument(skip(self), fields(root = %self.root.display()))]
    pub fn resolve(&self) -> Result<AndroidBuildConfig> {
        let version = self.resolve_version()?;
        debug!(code = version.version_code, name = %version.version_name, "resolved version");

        let release = self.resolve_release()?;
        let debug_variant = BuildVariantConfig::debug(self.toolchain.debug_identity());

        info!(
            release_signing = %release.signing_config,
            application_id = %self.schema.app.application_id,
            "build configuration resolved"
        );

        Ok(AndroidBuildConfig {
            namespace: self.schema.app.namespace.clone(),
            application_id: self.schema.app.application_id.clone(),
            compile_sdk: self.toolchain.compile_sdk,
            min_sdk: self.toolchain.min_sdk,
            target_sdk: self.toolchain.target_sdk,
            ndk_version: self.toolchain.ndk_version.clone(),
            version,
            java: JavaCompatibility::uniform(self.schema.app.java_version),
            flutter_source: self.schema.project.flutter_source.clone(),
            build_types: BuildTypes {
                debug: debug_variant,
                release,
            },
        })
    }
}
