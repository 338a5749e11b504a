//! Release signing resolution
//!
//! Reads the signing properties file (`storeFile`, `keyAlias`, `keyPassword`,
//! `storePassword`) and decides which identity signs the release variant.
//! A missing file or a missing keystore is never an error here: the release
//! variant degrades to the debug identity so local and CI builds still
//! produce an installable artifact.

use droidcfg_core::config::FallbackPolicy;
use droidcfg_core::error::{Error, Result};
use droidcfg_core::properties::PropertySource;
use serde::{Serialize, Serializer};
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Property key for the keystore path
pub const STORE_FILE: &str = "storeFile";
/// Property key for the key alias
pub const KEY_ALIAS: &str = "keyAlias";
/// Property key for the key password
pub const KEY_PASSWORD: &str = "keyPassword";
/// Property key for the keystore password
pub const STORE_PASSWORD: &str = "storePassword";

/// Alias of the key in the toolchain's debug keystore
pub const DEBUG_KEY_ALIAS: &str = "androiddebugkey";
/// Store and key password of the toolchain's debug keystore
pub const DEBUG_PASSWORD: &str = "android";

const MASK: &str = "********";

/// Credential material used to sign a build artifact.
///
/// `store_file` is only set when the keystore existed at resolution time, so
/// an identity is usable exactly when `store_file` is present.
#[derive(Clone, Default, PartialEq, Eq, Serialize)]
pub struct SigningIdentity {
    /// Keystore path, present only if the keystore exists
    pub store_file: Option<PathBuf>,
    /// Alias of the signing key inside the keystore
    pub key_alias: Option<String>,
    /// Password of the signing key
    #[serde(serialize_with = "mask_secret")]
    pub key_password: Option<String>,
    /// Password of the keystore
    #[serde(serialize_with = "mask_secret")]
    pub store_password: Option<String>,
}

impl SigningIdentity {
    /// The toolchain's debug identity for a given debug keystore
    pub fn debug(keystore: impl Into<PathBuf>) -> Self {
        Self {
            store_file: Some(keystore.into()),
            key_alias: Some(DEBUG_KEY_ALIAS.to_string()),
            key_password: Some(DEBUG_PASSWORD.to_string()),
            store_password: Some(DEBUG_PASSWORD.to_string()),
        }
    }

    /// Whether a keystore was found for this identity
    pub fn is_usable(&self) -> bool {
        self.store_file.is_some()
    }

    /// Whether every field is absent
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

impl fmt::Debug for SigningIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SigningIdentity")
            .field("store_file", &self.store_file)
            .field("key_alias", &self.key_alias)
            .field("key_password", &masked(&self.key_password))
            .field("store_password", &masked(&self.store_password))
            .finish()
    }
}

// An empty secret stays visibly empty; anything else is hidden
fn masked(value: &Option<String>) -> Option<&'static str> {
    value
        .as_deref()
        .map(|secret| if secret.is_empty() { "" } else { MASK })
}

fn mask_secret<S: Serializer>(value: &Option<String>, serializer: S) -> std::result::Result<S::Ok, S::Error> {
    match masked(value) {
        Some(shown) => serializer.serialize_some(shown),
        None => serializer.serialize_none(),
    }
}

/// Build variant names
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BuildVariant {
    /// Development build, always debug-signed
    Debug,
    /// Distribution build
    Release,
}

impl fmt::Display for BuildVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BuildVariant::Debug => write!(f, "debug"),
            BuildVariant::Release => write!(f, "release"),
        }
    }
}

/// Which named signing config a variant ended up with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SigningSource {
    /// The release keystore from the signing properties
    Release,
    /// The toolchain's debug keystore
    Debug,
}

impl fmt::Display for SigningSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SigningSource::Release => write!(f, "release"),
            SigningSource::Debug => write!(f, "debug"),
        }
    }
}

/// Resolved signing choice for one build variant
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BuildVariantConfig {
    /// Variant this choice applies to
    pub variant: BuildVariant,
    /// Named signing config the variant uses
    pub signing_config: SigningSource,
    /// Identity that signs the variant
    pub identity: SigningIdentity,
}

impl BuildVariantConfig {
    /// The debug variant always signs with the debug identity
    pub fn debug(debug_identity: SigningIdentity) -> Self {
        Self {
            variant: BuildVariant::Debug,
            signing_config: SigningSource::Debug,
            identity: debug_identity,
        }
    }

    /// Whether this variant signs with the release keystore
    pub fn uses_release_key(&self) -> bool {
        self.signing_config == SigningSource::Release
    }

    /// Whether a release variant was degraded to the debug identity
    pub fn is_fallback(&self) -> bool {
        self.variant == BuildVariant::Release && self.signing_config == SigningSource::Debug
    }
}

/// Read a signing properties file into a [`SigningIdentity`].
///
/// A missing file yields an empty identity. `storeFile` is resolved against
/// the directory containing the properties file, not the working directory,
/// and is kept only if the keystore exists. Malformed property syntax is the
/// only error.
pub fn resolve_signing(property_file: &Path) -> Result<SigningIdentity> {
    let props = PropertySource::load_optional(property_file)?;
    if props.origin().is_none() {
        return Ok(SigningIdentity::default());
    }

    let store_file = props
        .get_non_blank(STORE_FILE)
        .and_then(|value| resolve_store_file(property_file, value));

    Ok(SigningIdentity {
        store_file,
        key_alias: props.get(KEY_ALIAS).map(String::from),
        key_password: props.get(KEY_PASSWORD).map(String::from),
        store_password: props.get(STORE_PASSWORD).map(String::from),
    })
}

fn resolve_store_file(property_file: &Path, value: &str) -> Option<PathBuf> {
    let base = property_file.parent().unwrap_or_else(|| Path::new(""));
    let resolved = base.join(value);

    if resolved.exists() {
        debug!(keystore = %resolved.display(), "release keystore found");
        Some(resolved)
    } else {
        debug!(keystore = %resolved.display(), "release keystore not present");
        None
    }
}

/// Pick the identity that signs the release variant.
///
/// Selects `resolved` when its keystore was found, otherwise `debug_fallback`.
/// The release variant always ends up with a signing identity.
pub fn choose_release_signing(
    resolved: SigningIdentity,
    debug_fallback: SigningIdentity,
) -> BuildVariantConfig {
    if resolved.store_file.is_some() {
        BuildVariantConfig {
            variant: BuildVariant::Release,
            signing_config: SigningSource::Release,
            identity: resolved,
        }
    } else {
        BuildVariantConfig {
            variant: BuildVariant::Release,
            signing_config: SigningSource::Debug,
            identity: debug_fallback,
        }
    }
}

/// Apply the fallback policy to a chosen release config.
///
/// Under [`FallbackPolicy::Debug`] a fallback is logged and accepted; under
/// [`FallbackPolicy::Fail`] it becomes a `ReleaseKeystoreMissing` error.
pub fn enforce_policy(
    config: BuildVariantConfig,
    policy: FallbackPolicy,
    key_properties: &Path,
) -> Result<BuildVariantConfig> {
    if !config.is_fallback() {
        return Ok(config);
    }

    match policy {
        FallbackPolicy::Debug => {
            warn!(
                key_properties = %key_properties.display(),
                "release keystore missing, signing release build with the debug key"
            );
            Ok(config)
        }
        FallbackPolicy::Fail => Err(Error::release_keystore_missing(key_properties)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use droidcfg_core::error::ErrorCode;
    use proptest::prelude::*;
    use tempfile::TempDir;

    fn write(path: &Path, content: &str) {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        std::fs::write(path, content).unwrap();
    }

    fn debug_identity() -> SigningIdentity {
        SigningIdentity::debug("/home/dev/.android/debug.keystore")
    }

    #[test]
    fn test_missing_file_yields_empty_identity() {
        let temp_dir = TempDir::new().unwrap();
        let identity = resolve_signing(&temp_dir.path().join("android/key.properties")).unwrap();
        assert!(identity.is_empty());
        assert!(!identity.is_usable());
    }

    #[test]
    fn test_store_file_resolved_relative_to_properties_dir() {
        let temp_dir = TempDir::new().unwrap();
        let key_props = temp_dir.path().join("android/key.properties");
        write(&key_props, "storeFile=release.keystore\n");
        write(&temp_dir.path().join("android/release.keystore"), "ks");
        // Same name in the working-directory-like root must not be picked up
        write(&temp_dir.path().join("release.keystore"), "decoy");

        let identity = resolve_signing(&key_props).unwrap();
        assert_eq!(
            identity.store_file,
            Some(temp_dir.path().join("android").join("release.keystore"))
        );
    }

    #[test]
    fn test_missing_keystore_keeps_other_fields() {
        let temp_dir = TempDir::new().unwrap();
        let key_props = temp_dir.path().join("key.properties");
        write(
            &key_props,
            "storeFile=missing.jks\nkeyAlias=upload\nkeyPassword=pw1\nstorePassword=pw2\n",
        );

        let identity = resolve_signing(&key_props).unwrap();
        assert_eq!(identity.store_file, None);
        assert_eq!(identity.key_alias.as_deref(), Some("upload"));
        assert_eq!(identity.key_password.as_deref(), Some("pw1"));
        assert_eq!(identity.store_password.as_deref(), Some("pw2"));
    }

    #[test]
    fn test_blank_store_file_is_absent() {
        let temp_dir = TempDir::new().unwrap();
        let key_props = temp_dir.path().join("key.properties");
        write(&key_props, "storeFile=   \nkeyAlias=\n");

        let identity = resolve_signing(&key_props).unwrap();
        assert_eq!(identity.store_file, None);
        assert_eq!(identity.key_alias.as_deref(), Some(""));
        assert_eq!(identity.key_password, None);
    }

    #[test]
    fn test_parent_relative_keystore_scenario() {
        let temp_dir = TempDir::new().unwrap();
        let key_props = temp_dir.path().join("android/key.properties");
        write(
            &key_props,
            "storeFile=../keys/app.keystore\nkeyAlias=upload\nkeyPassword=pw1\nstorePassword=pw2\n",
        );
        write(&temp_dir.path().join("keys/app.keystore"), "ks");

        let identity = resolve_signing(&key_props).unwrap();
        assert_eq!(
            identity.store_file,
            Some(temp_dir.path().join("android").join("../keys/app.keystore"))
        );
        assert_eq!(identity.key_alias.as_deref(), Some("upload"));
        assert_eq!(identity.key_password.as_deref(), Some("pw1"));
        assert_eq!(identity.store_password.as_deref(), Some("pw2"));

        let release = choose_release_signing(identity.clone(), debug_identity());
        assert_eq!(release.signing_config, SigningSource::Release);
        assert_eq!(release.identity, identity);
    }

    #[test]
    fn test_absolute_store_file_is_kept() {
        let temp_dir = TempDir::new().unwrap();
        let keystore = temp_dir.path().join("elsewhere/upload.jks");
        write(&keystore, "ks");
        let key_props = temp_dir.path().join("android/key.properties");
        write(&key_props, &format!("storeFile={}\n", keystore.display()));

        let identity = resolve_signing(&key_props).unwrap();
        assert_eq!(identity.store_file, Some(keystore));
    }

    #[test]
    fn test_malformed_file_is_fatal() {
        let temp_dir = TempDir::new().unwrap();
        let key_props = temp_dir.path().join("key.properties");
        write(&key_props, "keyPassword=\\u00\n");

        let err = resolve_signing(&key_props).unwrap_err();
        assert_eq!(err.code, ErrorCode::ConfigParseError);
    }

    #[test]
    fn test_choose_release_signing_all_combinations() {
        let store = Some(PathBuf::from("/keys/app.keystore"));
        let fields = |present: bool| present.then(|| "x".to_string());

        for store_present in [true, false] {
            for fields_present in [true, false] {
                let resolved = SigningIdentity {
                    store_file: if store_present { store.clone() } else { None },
                    key_alias: fields(fields_present),
                    key_password: fields(fields_present),
                    store_password: fields(fields_present),
                };

                let config = choose_release_signing(resolved.clone(), debug_identity());
                assert_eq!(config.variant, BuildVariant::Release);
                if store_present {
                    assert_eq!(config.signing_config, SigningSource::Release);
                    assert_eq!(config.identity, resolved);
                    assert!(!config.is_fallback());
                } else {
                    assert_eq!(config.signing_config, SigningSource::Debug);
                    assert_eq!(config.identity, debug_identity());
                    assert!(config.is_fallback());
                }
            }
        }
    }

    #[test]
    fn test_absent_signing_file_selects_debug() {
        let temp_dir = TempDir::new().unwrap();
        let identity = resolve_signing(&temp_dir.path().join("key.properties")).unwrap();
        let config = choose_release_signing(identity, debug_identity());
        assert!(config.is_fallback());
        assert_eq!(config.identity.key_alias.as_deref(), Some(DEBUG_KEY_ALIAS));
    }

    #[test]
    fn test_enforce_policy() {
        let key_props = Path::new("android/key.properties");
        let fallback = choose_release_signing(SigningIdentity::default(), debug_identity());
        let release = choose_release_signing(
            SigningIdentity {
                store_file: Some(PathBuf::from("app.keystore")),
                ..Default::default()
            },
            debug_identity(),
        );

        assert!(enforce_policy(fallback.clone(), FallbackPolicy::Debug, key_props).is_ok());
        let err = enforce_policy(fallback, FallbackPolicy::Fail, key_props).unwrap_err();
        assert_eq!(err.code, ErrorCode::ReleaseKeystoreMissing);
        assert!(enforce_policy(release, FallbackPolicy::Fail, key_props).is_ok());
    }

    #[test]
    fn test_passwords_are_masked() {
        let identity = SigningIdentity::debug("debug.keystore");
        let debug = format!("{:?}", identity);
        let json = serde_json::to_string(&identity).unwrap();

        assert!(!debug.contains(DEBUG_PASSWORD));
        assert!(!json.contains("\"android\""));
        assert!(json.contains(MASK));
        assert!(json.contains(DEBUG_KEY_ALIAS));
    }

    #[test]
    fn test_empty_secrets_render_empty() {
        let identity = SigningIdentity {
            key_alias: Some("upload".to_string()),
            key_password: Some(String::new()),
            store_password: Some("pw".to_string()),
            ..Default::default()
        };

        let json: serde_json::Value = serde_json::to_value(&identity).unwrap();
        assert_eq!(json["key_password"], "");
        assert_eq!(json["store_password"], MASK);
        assert!(json["store_file"].is_null());

        let debug = format!("{:?}", identity);
        assert!(debug.contains("key_password: Some(\"\")"));
        assert!(!debug.contains("\"pw\""));
    }

    #[test]
    fn test_debug_variant_uses_debug_identity() {
        let config = BuildVariantConfig::debug(debug_identity());
        assert_eq!(config.variant, BuildVariant::Debug);
        assert!(!config.uses_release_key());
        assert!(!config.is_fallback());
    }

    proptest! {
        #[test]
        fn prop_resolve_signing_is_idempotent(
            alias in "[a-z]{0,8}",
            password in "[a-zA-Z0-9]{0,12}",
            keystore_exists in any::<bool>(),
        ) {
            let temp_dir = TempDir::new().unwrap();
            let key_props = temp_dir.path().join("key.properties");
            write(
                &key_props,
                &format!("storeFile=upload.jks\nkeyAlias={}\nstorePassword={}\n", alias, password),
            );
            if keystore_exists {
                write(&temp_dir.path().join("upload.jks"), "ks");
            }

            let first = resolve_signing(&key_props).unwrap();
            let second = resolve_signing(&key_props).unwrap();
            prop_assert_eq!(&first, &second);
            prop_assert_eq!(first.is_usable(), keystore_exists);
        }
    }
}
