//! Configuration management for autogenkeys.

use crate::{CoreError, CoreResult, Paths};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Default log level.
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Runtime version used in registry paths when none is configured.
pub const DEFAULT_RUNTIME_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Which registry implementation backs the key store.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RegistryBackend {
    /// Native registry on Windows, file registry elsewhere.
    #[default]
    Auto,
    /// Directory tree of `values.json` files.
    File,
    /// `HKEY_CURRENT_USER` (Windows only).
    WindowsRegistry,
}

impl FromStr for RegistryBackend {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "auto" => Ok(Self::Auto),
            "file" => Ok(Self::File),
            "windows_registry" | "windows-registry" | "registry" => Ok(Self::WindowsRegistry),
            other => Err(CoreError::Config(format!("Unknown registry backend: {other}"))),
        }
    }
}

/// Main configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Display name of the hosting application. Keys cannot be located without it.
    #[serde(default)]
    pub application_name: Option<String>,
    /// Runtime version segment of the registry path.
    #[serde(default = "default_runtime_version")]
    pub runtime_version: String,
    /// Registry implementation.
    #[serde(default)]
    pub backend: RegistryBackend,
    /// Root directory for the file registry. Defaults to `Paths::current_user_registry_dir`.
    #[serde(default)]
    pub registry_root: Option<PathBuf>,
}

fn default_log_level() -> String {
    DEFAULT_LOG_LEVEL.to_string()
}

fn default_runtime_version() -> String {
    DEFAULT_RUNTIME_VERSION.to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            application_name: None,
            runtime_version: default_runtime_version(),
            backend: RegistryBackend::default(),
            registry_root: None,
        }
    }
}

impl Config {
    /// Load configuration from `paths.config_file()`, falling back to defaults,
    /// then apply environment overrides.
    pub fn load(paths: &Paths) -> CoreResult<Self> {
        let config_path = paths.config_file();

        let mut config = if config_path.exists() {
            Self::load_from_file(&config_path)?
        } else {
            Self::default()
        };

        config.load_from_env()?;
        Ok(config)
    }

    /// Load configuration from a specific file.
    pub fn load_from_file(path: &Path) -> CoreResult<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&content)?;
        Ok(config)
    }

    /// Resolve the file registry root, using `paths` when none is configured.
    pub fn registry_root(&self, paths: &Paths) -> PathBuf {
        self.registry_root
            .clone()
            .unwrap_or_else(|| paths.current_user_registry_dir())
    }

    fn load_from_env(&mut self) -> CoreResult<()> {
        self.apply_overrides(|name| std::env::var(name).ok())
    }

    /// Apply `AUTOGENKEYS_*` overrides from `lookup`. Empty values are ignored.
    fn apply_overrides<F>(&mut self, lookup: F) -> CoreResult<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| {
            lookup(name)
                .map(|raw| raw.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        if let Some(log_level) = get("AUTOGENKEYS_LOG_LEVEL") {
            self.log_level = log_level;
        }
        if let Some(name) = get("AUTOGENKEYS_APP_NAME") {
            self.application_name = Some(name);
        }
        if let Some(version) = get("AUTOGENKEYS_RUNTIME_VERSION") {
            self.runtime_version = version;
        }
        if let Some(backend) = get("AUTOGENKEYS_BACKEND") {
            self.backend = backend.parse()?;
        }
        if let Some(root) = get("AUTOGENKEYS_REGISTRY_ROOT") {
            self.registry_root = Some(PathBuf::from(root));
        }
        Ok(())
    }
}
