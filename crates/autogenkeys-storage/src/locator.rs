//! Storage location derivation.

use crate::{KeyKind, RegistryPath, RegistryResult};
use sha2::{Digest, Sha256};

/// Fixed prefix of every key location.
const BASE_COMPONENTS: [&str; 3] = ["software", "mono", "asp.net"];
/// Component following the runtime version.
const AUTOGEN_KEYS_COMPONENT: &str = "autogenkeys";

/// Where keys for one hosting application live.
///
/// Built once from the application identity and runtime version and then
/// shared by every `KeyStore` operation. Without an application name the
/// locator is *unavailable*: it yields no paths at all.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageLocator {
    locations: Option<Locations>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Locations {
    app_hash: String,
    validation: RegistryPath,
    encryption: RegistryPath,
}

impl StorageLocator {
    /// Derive locations as
    /// `software\mono\asp.net\<runtime_version>\autogenkeys\<app-hash>-<ordinal>`.
    ///
    /// Fails only if `runtime_version` is not a valid path component.
    pub fn new(application_name: Option<&str>, runtime_version: &str) -> RegistryResult<Self> {
        let mut components: Vec<String> =
            BASE_COMPONENTS.iter().map(|c| c.to_string()).collect();
        components.push(runtime_version.to_string());
        components.push(AUTOGEN_KEYS_COMPONENT.to_string());
        // Validate the version even when the locator ends up unavailable.
        let base = RegistryPath::new(components)?;

        let Some(name) = application_name else {
            return Ok(Self::unavailable());
        };

        let app_hash = application_hash(name);
        let path_for = |kind: KeyKind| base.join(&format!("{}-{}", app_hash, kind.ordinal()));
        let validation = path_for(KeyKind::Validation)?;
        let encryption = path_for(KeyKind::Encryption)?;

        Ok(Self {
            locations: Some(Locations {
                app_hash,
                validation,
                encryption,
            }),
        })
    }

    /// A locator with no application identity.
    pub fn unavailable() -> Self {
        Self { locations: None }
    }

    pub fn is_available(&self) -> bool {
        self.locations.is_some()
    }

    /// Hash of the application name used in the path, if available.
    pub fn app_hash(&self) -> Option<&str> {
        self.locations.as_ref().map(|l| l.app_hash.as_str())
    }

    /// Location of the record for `kind`, if available.
    pub fn path_for(&self, kind: KeyKind) -> Option<&RegistryPath> {
        self.locations.as_ref().map(|l| match kind {
            KeyKind::Validation => &l.validation,
            KeyKind::Encryption => &l.encryption,
        })
    }
}

/// Stable short hash of an application name: the first four bytes of its
/// SHA-256 digest, as unpadded lowercase hex.
pub fn application_hash(application_name: &str) -> String {
    let digest = Sha256::digest(application_name.as_bytes());
    let prefix = u32::from_be_bytes([digest[0], digest[1], digest[2], digest[3]]);
    format!("{:x}", prefix)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paths_follow_layout() {
        let locator = StorageLocator::new(Some("/shop"), "4.0.30319.42000").unwrap();
        let hash = application_hash("/shop");

        assert_eq!(
            locator.path_for(KeyKind::Validation).unwrap().to_string(),
            format!(r"software\mono\asp.net\4.0.30319.42000\autogenkeys\{hash}-0")
        );
        assert_eq!(
            locator.path_for(KeyKind::Encryption).unwrap().to_string(),
            format!(r"software\mono\asp.net\4.0.30319.42000\autogenkeys\{hash}-1")
        );
        assert_eq!(locator.app_hash(), Some(hash.as_str()));
    }

    #[test]
    fn kinds_never_share_a_location() {
        let locator = StorageLocator::new(Some("app"), "1.0").unwrap();
        assert_ne!(
            locator.path_for(KeyKind::Validation),
            locator.path_for(KeyKind::Encryption)
        );
    }

    #[test]
    fn hash_is_stable_and_distinguishes_apps() {
        assert_eq!(application_hash("/shop"), application_hash("/shop"));
        assert_ne!(application_hash("/shop"), application_hash("/blog"));
        // sha256("abc") = ba7816bf...
        assert_eq!(application_hash("abc"), "ba7816bf");
        assert!(application_hash("x").len() <= 8);
    }

    #[test]
    fn missing_application_name_is_unavailable() {
        let locator = StorageLocator::new(None, "1.0").unwrap();
        assert!(!locator.is_available());
        assert!(locator.path_for(KeyKind::Validation).is_none());
        assert!(locator.app_hash().is_none());
        assert_eq!(locator, StorageLocator::unavailable());
    }

    #[test]
    fn invalid_runtime_version_is_rejected() {
        assert!(StorageLocator::new(Some("app"), "..").is_err());
        assert!(StorageLocator::new(Some("app"), r"4.0\evil").is_err());
        assert!(StorageLocator::new(None, "").is_err());
    }
}
