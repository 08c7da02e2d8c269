//! File-backed registry.
//!
//! Each registry key is a directory below the root; the values of a key live
//! in a `values.json` file inside it:
//!
//! ```text
//! <root>/software/mono/asp.net/<version>/autogenkeys/<hash>-<ordinal>/values.json
//! ```
//!
//! Writes go to a temporary sibling file which is synced and renamed over
//! `values.json`, so readers see either the old or the new set of values.

use crate::{KeyRegistry, RegistryError, RegistryPath, RegistryResult, RegistryValue};
use std::collections::BTreeMap;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{debug, warn};
use zeroize::{Zeroize, Zeroizing};

/// File holding the values of one key.
pub const VALUES_FILE_NAME: &str = "values.json";

type Values = BTreeMap<String, RegistryValue>;

static TMP_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Registry stored as a directory tree.
pub struct FileRegistry {
    root: PathBuf,
}

impl FileRegistry {
    /// Create a registry rooted at `root`. The directory is created on first write.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory backing `path`.
    pub fn key_dir(&self, path: &RegistryPath) -> PathBuf {
        let mut dir = self.root.clone();
        for component in path.components() {
            dir.push(component);
        }
        dir
    }

    /// `values.json` file backing `path`.
    pub fn values_file(&self, path: &RegistryPath) -> PathBuf {
        self.key_dir(path).join(VALUES_FILE_NAME)
    }

    fn read_values(&self, file: &Path) -> RegistryResult<Option<Values>> {
        let content = match fs::read(file) {
            Ok(content) => Zeroizing::new(content),
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(err.into()),
        };
        // Any undecodable content, including invalid UTF-8, is an encoding fault
        let values = serde_json::from_slice(&content).map_err(|e| {
            RegistryError::Encoding(format!("{}: {}", file.display(), e))
        })?;
        Ok(Some(values))
    }
}

impl KeyRegistry for FileRegistry {
    fn get_value(&self, path: &RegistryPath, name: &str) -> RegistryResult<Option<RegistryValue>> {
        let file = self.values_file(path);
        debug!(path = %path, name, file = %file.display(), "Reading registry value");

        Ok(self
            .read_values(&file)?
            .and_then(|mut values| values.remove(name)))
    }

    fn set_values(&self, path: &RegistryPath, values: &[(&str, RegistryValue)]) -> RegistryResult<()> {
        let dir = self.key_dir(path);
        let file = dir.join(VALUES_FILE_NAME);
        debug!(path = %path, count = values.len(), file = %file.display(), "Writing registry values");

        create_private_dir_all(&dir)?;

        let mut merged = match self.read_values(&file) {
            Ok(existing) => existing.unwrap_or_default(),
            Err(RegistryError::Encoding(reason)) => {
                warn!(path = %path, %reason, "Discarding unreadable registry values");
                Values::new()
            }
            Err(err) => return Err(err),
        };
        for (name, value) in values {
            merged.insert((*name).to_string(), value.clone());
        }

        let encoded = serde_json::to_vec_pretty(&merged);
        merged.values_mut().for_each(Zeroize::zeroize);
        let content = Zeroizing::new(encoded.map_err(|e| RegistryError::Encoding(e.to_string()))?);
        atomic_write(&file, &content)
    }

    fn backend_name(&self) -> &'static str {
        "file"
    }
}

fn create_private_dir_all(dir: &Path) -> io::Result<()> {
    let mut builder = fs::DirBuilder::new();
    builder.recursive(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::DirBuilderExt;
        builder.mode(0o700);
    }
    builder.create(dir)
}

fn atomic_write(path: &Path, content: &[u8]) -> RegistryResult<()> {
    let dir = path
        .parent()
        .ok_or_else(|| RegistryError::InvalidPath(path.display().to_string()))?;
    let file_name = path
        .file_name()
        .and_then(|name| name.to_str())
        .ok_or_else(|| RegistryError::InvalidPath(path.display().to_string()))?;

    let tmp_path = dir.join(format!(
        ".{}.tmp.{}.{}",
        file_name,
        std::process::id(),
        TMP_COUNTER.fetch_add(1, Ordering::Relaxed)
    ));

    let write_result = (|| -> io::Result<()> {
        let mut options = fs::OpenOptions::new();
        options.write(true).create_new(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            options.mode(0o600);
        }
        let mut file = options.open(&tmp_path)?;
        file.write_all(content)?;
        file.sync_all()?;
        drop(file);

        fs::rename(&tmp_path, path)?;

        if let Ok(parent_dir) = fs::File::open(dir) {
            let _ = parent_dir.sync_all();
        }
        Ok(())
    })();

    if let Err(err) = write_result {
        let _ = fs::remove_file(&tmp_path);
        return Err(err.into());
    }
    Ok(())
}
