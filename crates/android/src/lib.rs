//! Android build configuration resolution
//!
//! This crate resolves what a Flutter Android app module's Gradle script
//! would configure:
//! - Release signing from `key.properties`, with debug-key fallback
//! - App version from `local.properties`
//! - SDK/NDK levels from an injected toolchain context

#![warn(missing_docs)]

pub mod resolver;
pub mod signing;
pub mod toolchain;
pub mod version;

pub use resolver::{AndroidBuildConfig, BuildConfigResolver};
pub use signing::{
    choose_release_signing, resolve_signing, BuildVariant, BuildVariantConfig, SigningIdentity,
    SigningSource,
};
pub use toolchain::ToolchainContext;
pub use version::AppVersion;
