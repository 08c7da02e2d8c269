//! In-memory registry, for tests and embedders that do not want persistence.

use crate::{KeyRegistry, RegistryPath, RegistryResult, RegistryValue};
use std::collections::{BTreeMap, HashMap};
use std::sync::Mutex;

type Values = BTreeMap<String, RegistryValue>;

/// Registry held entirely in process memory.
#[derive(Default)]
pub struct MemoryRegistry {
    keys: Mutex<HashMap<RegistryPath, Values>>,
}

impl MemoryRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of keys that hold at least one value.
    pub fn key_count(&self) -> usize {
        self.lock().len()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<RegistryPath, Values>> {
        // Values are replaced wholesale, so a poisoned map is still consistent.
        self.keys.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl KeyRegistry for MemoryRegistry {
    fn get_value(&self, path: &RegistryPath, name: &str) -> RegistryResult<Option<RegistryValue>> {
        Ok(self
            .lock()
            .get(path)
            .and_then(|values| values.get(name))
            .cloned())
    }

    fn set_values(&self, path: &RegistryPath, values: &[(&str, RegistryValue)]) -> RegistryResult<()> {
        let mut keys = self.lock();
        let entry = keys.entry(path.clone()).or_default();
        for (name, value) in values {
            entry.insert((*name).to_string(), value.clone());
        }
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}
