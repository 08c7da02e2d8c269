//! Machine-key storage.
//!
//! [`KeyStore`] returns the validation and encryption keys of a hosting
//! application, generating and persisting them the first time they are
//! needed. Keys live in a registry-style backend:
//! - **All platforms**: [`FileRegistry`], a directory tree of `values.json` files
//! - **Windows**: `WindowsRegistry`, under `HKEY_CURRENT_USER`
//! - **Tests / embedding**: [`MemoryRegistry`]

mod file;
mod keys;
mod kind;
mod locator;
mod material;
mod memory;
mod path;
mod record;
mod store;
mod traits;

#[cfg(target_os = "windows")]
mod windows;

pub use file::{FileRegistry, VALUES_FILE_NAME};
pub use keys::ValueNames;
pub use kind::{KeyKind, ENCRYPTION_KEY_LENGTH, VALIDATION_KEY_LENGTH};
pub use locator::{application_hash, StorageLocator};
pub use material::KeyMaterial;
pub use memory::MemoryRegistry;
pub use path::{RegistryPath, PATH_SEPARATOR};
pub use record::{from_ticks, to_ticks, KeyRecord, KeyRecordInfo, RegistryValue, KEY_FORMAT_VERSION};
pub use store::KeyStore;
pub use traits::KeyRegistry;

#[cfg(target_os = "windows")]
pub use self::windows::WindowsRegistry;

use autogenkeys_config_and_utils::{Config, Paths, RegistryBackend};
use thiserror::Error;

/// Error type for registry backends.
#[derive(Error, Debug)]
pub enum RegistryError {
    /// Platform-specific registry error
    #[error("Platform registry error: {0}")]
    Platform(String),

    /// Stored data could not be encoded or decoded
    #[error("Encoding error: {0}")]
    Encoding(String),

    /// Path is not usable as a registry key name
    #[error("Invalid registry path: {0}")]
    InvalidPath(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for registry operations.
pub type RegistryResult<T> = Result<T, RegistryError>;

/// Error type for [`KeyStore`] operations.
#[derive(Error, Debug)]
pub enum KeyStoreError {
    /// No hosting application identity, so no storage location exists
    #[error("Machine key storage is unavailable: application identity is unknown")]
    KeyUnavailable,

    /// A key of the wrong size was handed to `store`
    #[error("Invalid {kind} key length: expected {expected} bytes, got {actual}")]
    InvalidKeyLength {
        kind: KeyKind,
        expected: usize,
        actual: usize,
    },

    /// The backend failed while persisting a key
    #[error("Failed to store {kind} key at {path}")]
    StorageWriteFailed {
        kind: KeyKind,
        path: RegistryPath,
        /// Key generated by `retrieve` that could not be persisted.
        generated: Option<KeyMaterial>,
        #[source]
        source: RegistryError,
    },

    /// The operating system random source failed
    #[error("Failed to generate key material: {0}")]
    KeyGenerationFailed(#[from] rand::Error),

    /// Unrecognised key kind
    #[error("Unknown key kind: {0}")]
    UnknownKeyKind(String),

    /// Backend fault on a non fail-open path
    #[error(transparent)]
    Registry(#[from] RegistryError),
}

impl KeyStoreError {
    /// Take the key generated by a `retrieve` whose store step failed.
    pub fn into_generated_key(self) -> Option<KeyMaterial> {
        match self {
            KeyStoreError::StorageWriteFailed { generated, .. } => generated,
            _ => None,
        }
    }
}

/// Result type for key store operations.
pub type KeyStoreResult<T> = Result<T, KeyStoreError>;

/// Create the registry selected by `config`.
pub fn create_registry(config: &Config, paths: &Paths) -> RegistryResult<Box<dyn KeyRegistry>> {
    match config.backend {
        RegistryBackend::File => Ok(Box::new(FileRegistry::new(config.registry_root(paths)))),
        RegistryBackend::WindowsRegistry => create_windows_registry(),
        RegistryBackend::Auto => {
            if cfg!(target_os = "windows") {
                create_windows_registry()
            } else {
                Ok(Box::new(FileRegistry::new(config.registry_root(paths))))
            }
        }
    }
}

fn create_windows_registry() -> RegistryResult<Box<dyn KeyRegistry>> {
    #[cfg(target_os = "windows")]
    {
        Ok(Box::new(WindowsRegistry::new()))
    }

    #[cfg(not(target_os = "windows"))]
    {
        Err(RegistryError::Platform(
            "The Windows registry is not available on this platform".to_string(),
        ))
    }
}

/// Build a [`KeyStore`] from configuration.
pub fn create_key_store(config: &Config, paths: &Paths) -> KeyStoreResult<KeyStore> {
    let registry = create_registry(config, paths)?;
    let locator = StorageLocator::new(
        config.application_name.as_deref(),
        &config.runtime_version,
    )?;
    Ok(KeyStore::new(registry, locator))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    fn file_config(root: &std::path::Path, app: Option<&str>) -> Config {
        Config {
            application_name: app.map(String::from),
            backend: RegistryBackend::File,
            registry_root: Some(root.to_path_buf()),
            ..Config::default()
        }
    }

    #[test]
    fn create_key_store_from_config() {
        let temp = tempfile::tempdir().expect("tempdir");
        let paths = Paths::with_base_dir(temp.path().to_path_buf());
        let config = file_config(&temp.path().join("hive"), Some("/shop"));

        let store = create_key_store(&config, &paths).unwrap();
        let key = store.retrieve(KeyKind::Validation).unwrap();
        assert_eq!(key.len(), VALIDATION_KEY_LENGTH);

        let path = store.locator().path_for(KeyKind::Validation).unwrap();
        assert!(FileRegistry::new(temp.path().join("hive"))
            .values_file(path)
            .is_file());
    }

    #[test]
    fn missing_application_name_yields_unavailable_store() {
        let temp = tempfile::tempdir().expect("tempdir");
        let paths = Paths::with_base_dir(temp.path().to_path_buf());
        let config = file_config(temp.path(), None);

        let store = create_key_store(&config, &paths).unwrap();
        assert!(matches!(
            store.retrieve(KeyKind::Encryption),
            Err(KeyStoreError::KeyUnavailable)
        ));
    }

    #[test]
    fn invalid_runtime_version_fails_construction() {
        let temp = tempfile::tempdir().expect("tempdir");
        let paths = Paths::with_base_dir(temp.path().to_path_buf());
        let config = Config {
            runtime_version: "..".to_string(),
            ..file_config(temp.path(), Some("/shop"))
        };

        assert!(matches!(
            create_key_store(&config, &paths),
            Err(KeyStoreError::Registry(RegistryError::InvalidPath(_)))
        ));
    }

    #[cfg(not(target_os = "windows"))]
    #[test]
    fn windows_backend_is_rejected_elsewhere() {
        let paths = Paths::with_base_dir(std::path::PathBuf::from("/tmp/unused"));
        let config = Config {
            backend: RegistryBackend::WindowsRegistry,
            ..Config::default()
        };
        assert!(matches!(
            create_registry(&config, &paths),
            Err(RegistryError::Platform(_))
        ));
    }

    #[test]
    fn storage_write_failure_keeps_source() {
        let err = KeyStoreError::StorageWriteFailed {
            kind: KeyKind::Validation,
            path: RegistryPath::parse(r"software\x").unwrap(),
            generated: None,
            source: RegistryError::Platform("denied".into()),
        };
        assert_eq!(err.to_string(), r"Failed to store validation key at software\x");
        assert!(err.source().is_some());
    }
}
