//! Key-value storage backed by one JSON file per key.

use std::fs;
use std::path::{Path, PathBuf};

use vault_host::{KeyValueFuture, KeyValueStore};

fn validate_key(key: &str) -> Result<(), String> {
    if key.is_empty() {
        return Err("Key must not be empty".to_string());
    }
    if !key
        .chars()
        .all(|ch| ch.is_ascii_alphanumeric() || matches!(ch, '.' | '_' | '-'))
    {
        return Err(format!("Key `{key}` contains unsupported characters"));
    }
    if key.starts_with('.') {
        return Err(format!("Key `{key}` must not start with `.`"));
    }
    Ok(())
}

fn key_file(root: &Path, key: &str) -> Result<PathBuf, String> {
    validate_key(key)?;
    Ok(root.join(format!("{key}.json")))
}

fn key_from_file_name(path: &Path) -> Option<String> {
    if path.extension().and_then(|ext| ext.to_str()) != Some("json") {
        return None;
    }
    let stem = path.file_stem()?.to_string_lossy().to_string();
    validate_key(&stem).ok().map(|()| stem)
}

#[derive(Debug, Clone)]
/// Key-value store rooted at a native directory, writing `<key>.json` per key.
///
/// Keys are restricted to `[A-Za-z0-9._-]` and may not start with `.`, so every key maps to a
/// plain file directly under the root.
pub struct ScopedKeyValueStore {
    root: PathBuf,
}

impl ScopedKeyValueStore {
    /// Creates a store rooted at `root`, creating the directory if needed.
    ///
    /// # Errors
    ///
    /// Returns an error when the directory cannot be created.
    pub fn from_root(root: impl AsRef<Path>) -> Result<Self, String> {
        let root = root.as_ref();
        fs::create_dir_all(root)
            .map_err(|err| format!("failed to create data dir {}: {err}", root.display()))?;
        Ok(Self {
            root: root.to_path_buf(),
        })
    }

    /// Root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Reads the raw text stored under `key`.
    ///
    /// # Errors
    ///
    /// Returns an error for invalid keys or unreadable files.
    pub fn load_raw(&self, key: &str) -> Result<Option<String>, String> {
        let path = key_file(&self.root, key)?;
        if !path.exists() {
            return Ok(None);
        }
        fs::read_to_string(&path)
            .map(Some)
            .map_err(|err| format!("failed to read {}: {err}", path.display()))
    }

    /// Replaces the raw text stored under `key`.
    ///
    /// The text is written to a sibling temp file first and renamed into place, so readers never
    /// observe a half-written list.
    ///
    /// # Errors
    ///
    /// Returns an error for invalid keys or failed writes.
    pub fn save_raw(&self, key: &str, raw_json: &str) -> Result<(), String> {
        let path = key_file(&self.root, key)?;
        let staging = self.root.join(format!(".{key}.json.tmp"));
        fs::write(&staging, raw_json)
            .map_err(|err| format!("failed to write {}: {err}", staging.display()))?;
        fs::rename(&staging, &path)
            .map_err(|err| format!("failed to replace {}: {err}", path.display()))
    }

    /// Deletes `key`. Missing keys succeed.
    ///
    /// # Errors
    ///
    /// Returns an error for invalid keys or failed removals.
    pub fn delete_raw(&self, key: &str) -> Result<(), String> {
        let path = key_file(&self.root, key)?;
        if !path.exists() {
            return Ok(());
        }
        fs::remove_file(&path).map_err(|err| format!("failed to delete {}: {err}", path.display()))
    }

    /// Lists keys currently present, sorted.
    ///
    /// # Errors
    ///
    /// Returns an error when the root cannot be read.
    pub fn keys(&self) -> Result<Vec<String>, String> {
        let entries = fs::read_dir(&self.root)
            .map_err(|err| format!("failed to read {}: {err}", self.root.display()))?;

        let mut keys = Vec::new();
        for entry in entries {
            let path = entry
                .map_err(|err| format!("failed to read data dir entry: {err}"))?
                .path();
            if let Some(key) = key_from_file_name(&path) {
                keys.push(key);
            }
        }
        keys.sort();
        Ok(keys)
    }
}

impl KeyValueStore for ScopedKeyValueStore {
    fn load<'a>(&'a self, key: &'a str) -> KeyValueFuture<'a, Result<Option<String>, String>> {
        Box::pin(async move { self.load_raw(key) })
    }

    fn save<'a>(
        &'a self,
        key: &'a str,
        raw_json: &'a str,
    ) -> KeyValueFuture<'a, Result<(), String>> {
        Box::pin(async move { self.save_raw(key, raw_json) })
    }

    fn delete<'a>(&'a self, key: &'a str) -> KeyValueFuture<'a, Result<(), String>> {
        Box::pin(async move { self.delete_raw(key) })
    }
}
