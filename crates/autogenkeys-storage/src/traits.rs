//! Registry trait definitions.

use crate::{RegistryPath, RegistryResult, RegistryValue};

/// Trait for hierarchical, registry-style storage backends.
///
/// Implementations open and release any handle within a single call.
pub trait KeyRegistry: Send + Sync {
    /// Read a named value. `Ok(None)` when the key or the value does not exist.
    fn get_value(&self, path: &RegistryPath, name: &str) -> RegistryResult<Option<RegistryValue>>;

    /// Create `path` (and any missing parents) and set the named values on it.
    ///
    /// Values not named here are left untouched. The write must be durable
    /// before this returns.
    fn set_values(&self, path: &RegistryPath, values: &[(&str, RegistryValue)]) -> RegistryResult<()>;

    /// Short backend name for logs and diagnostics.
    fn backend_name(&self) -> &'static str;
}

impl<R: KeyRegistry + ?Sized> KeyRegistry for std::sync::Arc<R> {
    fn get_value(&self, path: &RegistryPath, name: &str) -> RegistryResult<Option<RegistryValue>> {
        (**self).get_value(path, name)
    }

    fn set_values(&self, path: &RegistryPath, values: &[(&str, RegistryValue)]) -> RegistryResult<()> {
        (**self).set_values(path, values)
    }

    fn backend_name(&self) -> &'static str {
        (**self).backend_name()
    }
}
