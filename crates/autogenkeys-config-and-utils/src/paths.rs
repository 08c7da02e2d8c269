//! File system paths used by autogenkeys.

use crate::{CoreError, CoreResult};
use std::path::PathBuf;

/// Directory name created under the home directory.
const BASE_DIR_NAME: &str = ".autogenkeys";
/// Registry hive used for per-user key storage.
const CURRENT_USER_HIVE: &str = "CurrentUser";

/// Manages file system paths for autogenkeys.
#[derive(Debug, Clone)]
pub struct Paths {
    /// Base directory for config and the file registry (~/.autogenkeys)
    base_dir: PathBuf,
}

impl Paths {
    /// Create a new Paths instance rooted at `~/.autogenkeys`.
    pub fn new() -> CoreResult<Self> {
        let home = dirs::home_dir()
            .ok_or_else(|| CoreError::Path("Could not determine home directory".to_string()))?;

        Ok(Self {
            base_dir: home.join(BASE_DIR_NAME),
        })
    }

    /// Create a new Paths instance with a custom base directory.
    pub fn with_base_dir(base_dir: PathBuf) -> Self {
        Self { base_dir }
    }

    /// Get the base directory (~/.autogenkeys).
    pub fn base_dir(&self) -> &PathBuf {
        &self.base_dir
    }

    /// Get the config file path (~/.autogenkeys/config.json).
    pub fn config_file(&self) -> PathBuf {
        self.base_dir.join("config.json")
    }

    /// Get the root of the file-backed registry (~/.autogenkeys/registry).
    pub fn registry_dir(&self) -> PathBuf {
        self.base_dir.join("registry")
    }

    /// Get the per-user registry hive (~/.autogenkeys/registry/CurrentUser).
    pub fn current_user_registry_dir(&self) -> PathBuf {
        self.registry_dir().join(CURRENT_USER_HIVE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paths_with_base_dir() {
        let base = PathBuf::from("/tmp/test-autogenkeys");
        let paths = Paths::with_base_dir(base.clone());

        assert_eq!(paths.base_dir(), &base);
        assert_eq!(paths.config_file(), base.join("config.json"));
        assert_eq!(paths.registry_dir(), base.join("registry"));
        assert_eq!(
            paths.current_user_registry_dir(),
            base.join("registry/CurrentUser")
        );
    }

    #[test]
    fn test_paths_default() {
        let paths = Paths::new().unwrap();
        let home = dirs::home_dir().unwrap();

        assert_eq!(paths.base_dir(), &home.join(".autogenkeys"));
    }
}
