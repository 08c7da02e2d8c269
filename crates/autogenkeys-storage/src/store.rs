//! Get-or-generate key store.

use crate::{
    from_ticks, KeyKind, KeyMaterial, KeyRecord, KeyRecordInfo, KeyRegistry, KeyStoreError,
    KeyStoreResult, RegistryValue, StorageLocator, ValueNames,
};
use rand::rngs::OsRng;
use rand::RngCore;
use tracing::{debug, info, warn};
use zeroize::Zeroize;

/// Returns stored machine keys, generating and persisting them on first use.
///
/// No locking is done around the read/generate/store sequence. Two callers
/// racing on an empty location both generate a key and the last write wins;
/// each caller still gets the bytes it generated.
pub struct KeyStore {
    registry: Box<dyn KeyRegistry>,
    locator: StorageLocator,
}

impl KeyStore {
    pub fn new(registry: Box<dyn KeyRegistry>, locator: StorageLocator) -> Self {
        Self { registry, locator }
    }

    pub fn locator(&self) -> &StorageLocator {
        &self.locator
    }

    /// Return the key for `kind`, generating and storing a new one when the
    /// stored value is missing or malformed.
    ///
    /// If storing the new key fails, the error is
    /// [`KeyStoreError::StorageWriteFailed`] and still carries the generated
    /// key (see [`KeyStoreError::into_generated_key`]).
    pub fn retrieve(&self, kind: KeyKind) -> KeyStoreResult<KeyMaterial> {
        if !self.locator.is_available() {
            return Err(KeyStoreError::KeyUnavailable);
        }

        if let Some(key) = self.get_key(kind) {
            return Ok(key);
        }

        let key = Self::generate(kind)?;
        match self.store(key.as_bytes(), kind) {
            Ok(()) => {
                info!(kind = %kind, backend = self.registry.backend_name(), "Generated new machine key");
                Ok(key)
            }
            Err(KeyStoreError::StorageWriteFailed { kind, path, source, .. }) => {
                warn!(
                    kind = %kind,
                    path = %path,
                    error = %source,
                    "Generated machine key could not be persisted; a restart may produce a different key"
                );
                Err(KeyStoreError::StorageWriteFailed {
                    kind,
                    path,
                    generated: Some(key),
                    source,
                })
            }
            Err(err) => Err(err),
        }
    }

    /// Read the stored key for `kind`.
    ///
    /// Fail-open: a missing location, missing value, non-binary value,
    /// wrong length, or any backend fault all read as `None`.
    pub fn get_key(&self, kind: KeyKind) -> Option<KeyMaterial> {
        let path = self.locator.path_for(kind)?;

        let value = match self.registry.get_value(path, ValueNames::AUTO_GEN_KEY) {
            Ok(Some(value)) => value,
            Ok(None) => {
                debug!(kind = %kind, path = %path, "No stored machine key");
                return None;
            }
            Err(err) => {
                warn!(kind = %kind, path = %path, error = %err, "Ignoring unreadable machine key");
                return None;
            }
        };

        match value {
            RegistryValue::Binary(bytes) if bytes.len() == kind.key_length() => {
                Some(KeyMaterial::new(bytes))
            }
            RegistryValue::Binary(mut bytes) => {
                debug!(
                    kind = %kind,
                    path = %path,
                    expected = kind.key_length(),
                    actual = bytes.len(),
                    "Stored machine key has wrong length"
                );
                bytes.zeroize();
                None
            }
            mut other => {
                debug!(kind = %kind, path = %path, value_type = other.type_name(), "Stored machine key is not binary");
                other.zeroize();
                None
            }
        }
    }

    /// Produce `kind.key_length()` bytes from the operating system CSPRNG.
    pub fn generate(kind: KeyKind) -> KeyStoreResult<KeyMaterial> {
        let mut bytes = vec![0u8; kind.key_length()];
        OsRng.try_fill_bytes(&mut bytes)?;
        Ok(KeyMaterial::new(bytes))
    }

    /// Persist `key` for `kind` together with its creation time and format marker.
    ///
    /// With no storage location this fails with [`KeyStoreError::KeyUnavailable`]
    /// rather than silently doing nothing, matching [`KeyStore::retrieve`].
    pub fn store(&self, key: &[u8], kind: KeyKind) -> KeyStoreResult<()> {
        let expected = kind.key_length();
        if key.len() != expected {
            return Err(KeyStoreError::InvalidKeyLength {
                kind,
                expected,
                actual: key.len(),
            });
        }

        let path = self
            .locator
            .path_for(kind)
            .ok_or(KeyStoreError::KeyUnavailable)?;

        let record = KeyRecord::new(KeyMaterial::new(key.to_vec()), chrono::Utc::now());
        let mut values = record.to_values();
        let written = self.registry.set_values(path, &values);
        values.iter_mut().for_each(|(_, value)| value.zeroize());
        written.map_err(|source| KeyStoreError::StorageWriteFailed {
            kind,
            path: path.clone(),
            generated: None,
            source,
        })?;

        debug!(kind = %kind, path = %path, "Stored machine key");
        Ok(())
    }

    /// Describe the stored record for `kind` without returning key bytes.
    ///
    /// Unlike [`KeyStore::get_key`], backend faults are reported.
    pub fn inspect(&self, kind: KeyKind) -> KeyStoreResult<Option<KeyRecordInfo>> {
        let path = self
            .locator
            .path_for(kind)
            .ok_or(KeyStoreError::KeyUnavailable)?;

        let Some(key_value) = self.registry.get_value(path, ValueNames::AUTO_GEN_KEY)? else {
            return Ok(None);
        };

        let key_length = match &key_value {
            RegistryValue::Binary(bytes) => Some(bytes.len()),
            _ => None,
        };
        let created_at = match self.registry.get_value(path, ValueNames::AUTO_GEN_KEY_CREATION_TIME)? {
            Some(RegistryValue::QWord(ticks)) => from_ticks(ticks),
            _ => None,
        };
        let format = match self.registry.get_value(path, ValueNames::AUTO_GEN_KEY_FORMAT)? {
            Some(RegistryValue::DWord(format)) => Some(format),
            _ => None,
        };

        Ok(Some(KeyRecordInfo {
            value_type: key_value.type_name(),
            key_length,
            valid: key_length == Some(kind.key_length()),
            created_at,
            format,
        }))
    }
}
