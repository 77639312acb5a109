//! Device filesystem adapters for `vault_host`.
//!
//! Record lists, accounts and the session are stored as one JSON file per key under the configured
//! data directory; uploaded bytes go to a flat upload directory.

#![warn(missing_docs, rustdoc::broken_intra_doc_links)]

pub mod kv_files;
pub mod uploads;

use std::rc::Rc;

pub use kv_files::ScopedKeyValueStore;
pub use uploads::{sanitize_file_name, UploadDirBlobStore, UploadDirHealth, UPLOAD_REF_PREFIX};
use vault_host::{HostServices, HostStrategy, StorageBackend, VaultConfig};

/// Builds host services for `config.storage.backend`.
///
/// # Errors
///
/// Returns an error when the directories cannot be prepared, or for the browser backend, which
/// only exists in the web build.
pub fn native_host_services(config: &VaultConfig) -> Result<HostServices, String> {
    match config.storage.backend {
        StorageBackend::Device => {
            let records = ScopedKeyValueStore::from_root(&config.storage.data_dir)?;
            let blobs = UploadDirBlobStore::from_root(&config.storage.upload_dir)?;
            log::debug!(
                "device storage: data={} uploads={}",
                records.root().display(),
                blobs.root().display()
            );
            Ok(HostServices::new(
                Rc::new(records),
                Rc::new(blobs),
                HostStrategy::Device,
            ))
        }
        StorageBackend::Memory => Ok(HostServices::memory()),
        StorageBackend::Browser => Err(
            "storage backend `browser` is only available in the web build; use `device` or `memory`"
                .to_string(),
        ),
    }
}
