//! Upload directory blob store.
//!
//! Bytes land in a flat directory as `{unix_ms}-{sanitized name}` and are referenced from records
//! as `/uploads/{file name}`, the same URL shape the local upload relay served them under.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;
use vault_host::{next_monotonic_timestamp_ms, BlobFuture, BlobStore};

/// Prefix of every reference produced by [`UploadDirBlobStore`].
pub const UPLOAD_REF_PREFIX: &str = "/uploads/";

/// Replaces every character outside `[A-Za-z0-9_.-]` with `_`.
pub fn sanitize_file_name(name: &str) -> String {
    name.chars()
        .map(|ch| {
            if ch.is_ascii_alphanumeric() || matches!(ch, '_' | '.' | '-') {
                ch
            } else {
                '_'
            }
        })
        .collect()
}

fn canonical_root(root: &Path) -> Result<PathBuf, String> {
    fs::canonicalize(root)
        .map_err(|err| format!("failed to canonicalize {}: {err}", root.display()))
}

fn ensure_existing_within_root(root: &Path, native: &Path) -> Result<(), String> {
    let canonical = fs::canonicalize(native)
        .map_err(|err| format!("failed to canonicalize {}: {err}", native.display()))?;
    if canonical.starts_with(root) {
        Ok(())
    } else {
        Err(format!(
            "path `{}` resolves outside the upload directory",
            native.display()
        ))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
/// Snapshot of the upload directory.
pub struct UploadDirHealth {
    /// `true` when the directory could be listed.
    pub ok: bool,
    /// Number of stored files.
    pub uploads: usize,
    /// Stored file names, sorted.
    pub files: Vec<String>,
    /// Listing failure, when `ok` is false.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone)]
/// Blob store writing uploads into a canonical native directory.
///
/// References resolving outside the directory, through `..` or symlinks, are rejected.
pub struct UploadDirBlobStore {
    root: PathBuf,
}

impl UploadDirBlobStore {
    /// Creates the store, creating and canonicalizing `root`.
    ///
    /// # Errors
    ///
    /// Returns an error when the directory cannot be created or resolved.
    pub fn from_root(root: impl AsRef<Path>) -> Result<Self, String> {
        let root = root.as_ref();
        fs::create_dir_all(root)
            .map_err(|err| format!("failed to create upload dir {}: {err}", root.display()))?;
        Ok(Self {
            root: canonical_root(root)?,
        })
    }

    /// Canonical upload directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve(&self, location_ref: &str) -> Result<PathBuf, String> {
        let file_name = location_ref
            .strip_prefix(UPLOAD_REF_PREFIX)
            .ok_or_else(|| format!("`{location_ref}` is not an upload reference"))?;
        if file_name.is_empty()
            || file_name == "."
            || file_name == ".."
            || file_name.contains(['/', '\\'])
        {
            return Err(format!("`{location_ref}` is not a valid upload file name"));
        }
        Ok(self.root.join(file_name))
    }

    /// Writes `bytes` under a fresh stored name and returns its reference.
    ///
    /// # Errors
    ///
    /// Returns an error when the directory cannot be created or written.
    pub fn store_bytes(&self, name: &str, bytes: &[u8]) -> Result<String, String> {
        fs::create_dir_all(&self.root)
            .map_err(|err| format!("failed to create upload dir {}: {err}", self.root.display()))?;
        let file_name = format!("{}-{}", next_monotonic_timestamp_ms(), sanitize_file_name(name));
        let path = self.root.join(&file_name);
        fs::write(&path, bytes)
            .map_err(|err| format!("failed to write {}: {err}", path.display()))?;
        log::debug!("stored {} bytes at {}", bytes.len(), path.display());
        Ok(format!("{UPLOAD_REF_PREFIX}{file_name}"))
    }

    /// Reads the bytes behind `location_ref`; missing files yield `None`.
    ///
    /// # Errors
    ///
    /// Returns an error for foreign or escaping references and unreadable files.
    pub fn read_bytes(&self, location_ref: &str) -> Result<Option<Vec<u8>>, String> {
        let path = self.resolve(location_ref)?;
        if !path.exists() {
            return Ok(None);
        }
        ensure_existing_within_root(&self.root, &path)?;
        fs::read(&path)
            .map(Some)
            .map_err(|err| format!("failed to read {}: {err}", path.display()))
    }

    /// Removes the file behind `location_ref`; missing files succeed.
    ///
    /// # Errors
    ///
    /// Returns an error for foreign or escaping references and failed removals.
    pub fn remove(&self, location_ref: &str) -> Result<(), String> {
        let path = self.resolve(location_ref)?;
        if fs::symlink_metadata(&path).is_err() {
            return Ok(());
        }
        if path.is_dir() {
            return Err(format!("`{location_ref}` is a directory"));
        }
        fs::remove_file(&path).map_err(|err| format!("failed to delete {}: {err}", path.display()))
    }

    /// Lists stored files.
    pub fn health(&self) -> UploadDirHealth {
        let listing = fs::read_dir(&self.root).and_then(|entries| {
            entries
                .map(|entry| entry.map(|entry| entry.file_name().to_string_lossy().to_string()))
                .collect::<Result<Vec<_>, _>>()
        });
        match listing {
            Ok(mut files) => {
                files.sort();
                UploadDirHealth {
                    ok: true,
                    uploads: files.len(),
                    files,
                    error: None,
                }
            }
            Err(err) => UploadDirHealth {
                ok: false,
                uploads: 0,
                files: Vec::new(),
                error: Some(format!("failed to read {}: {err}", self.root.display())),
            },
        }
    }
}

impl BlobStore for UploadDirBlobStore {
    fn put<'a>(
        &'a self,
        _record_id: &'a str,
        name: &'a str,
        bytes: &'a [u8],
    ) -> BlobFuture<'a, Result<String, String>> {
        Box::pin(async move { self.store_bytes(name, bytes) })
    }

    fn get<'a>(&'a self, location_ref: &'a str) -> BlobFuture<'a, Result<Option<Vec<u8>>, String>> {
        Box::pin(async move { self.read_bytes(location_ref) })
    }

    fn delete<'a>(&'a self, location_ref: &'a str) -> BlobFuture<'a, Result<(), String>> {
        Box::pin(async move { self.remove(location_ref) })
    }
}
