//! Host service bundle handed to front-ends.

use std::rc::Rc;

use crate::accounts::AccountService;
use crate::blob::{BlobStore, MemoryBlobStore, NoopBlobStore};
use crate::config::VaultConfig;
use crate::records::FileCatalog;
use crate::storage::{KeyValueStore, MemoryKeyValueStore, NoopKeyValueStore};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
/// Which persistence variant backs a [`HostServices`] bundle.
pub enum HostStrategy {
    /// Device filesystem.
    Device,
    /// Browser `localStorage`.
    Browser,
    /// Process memory.
    #[default]
    Memory,
}

impl HostStrategy {
    /// Stable lowercase label.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Device => "device",
            Self::Browser => "browser",
            Self::Memory => "memory",
        }
    }
}

#[derive(Clone)]
/// Metadata store, blob store and the strategy that produced them.
pub struct HostServices {
    /// Record lists, accounts and session.
    pub records: Rc<dyn KeyValueStore>,
    /// Uploaded bytes.
    pub blobs: Rc<dyn BlobStore>,
    /// Variant label.
    pub strategy: HostStrategy,
}

impl HostServices {
    /// Bundles explicit adapters.
    pub fn new(
        records: Rc<dyn KeyValueStore>,
        blobs: Rc<dyn BlobStore>,
        strategy: HostStrategy,
    ) -> Self {
        Self {
            records,
            blobs,
            strategy,
        }
    }

    /// Fresh in-memory stores.
    pub fn memory() -> Self {
        Self::new(
            Rc::new(MemoryKeyValueStore::default()),
            Rc::new(MemoryBlobStore::default()),
            HostStrategy::Memory,
        )
    }

    /// Stores that keep nothing; writes of bytes fail.
    pub fn noop() -> Self {
        Self::new(
            Rc::new(NoopKeyValueStore),
            Rc::new(NoopBlobStore),
            HostStrategy::Memory,
        )
    }

    /// Catalog for the single-user variant, keyed by `storage.metadata_key`.
    pub fn catalog(&self, config: &VaultConfig) -> FileCatalog {
        FileCatalog::new(
            Rc::clone(&self.records),
            Rc::clone(&self.blobs),
            config.storage.metadata_key.clone(),
        )
        .with_serial_policy(config.serial.clone())
    }

    /// Account service over these stores.
    pub fn accounts(&self, config: &VaultConfig) -> AccountService {
        AccountService::new(Rc::clone(&self.records), Rc::clone(&self.blobs))
            .with_serial_policy(config.serial.clone())
            .with_welcome_record(config.accounts.seed_welcome_record)
    }
}

#[cfg(test)]
mod tests {
    use futures::executor::block_on;

    use super::*;
    use crate::records::NewRecord;

    #[test]
    fn memory_services_share_stores_between_catalog_and_accounts() {
        let services = HostServices::memory();
        let config = VaultConfig::default();
        assert_eq!(services.strategy.as_str(), "memory");

        let catalog = services.catalog(&config);
        block_on(catalog.add_record(NewRecord::from_bytes("a.txt", b"a".to_vec()))).expect("add");
        assert_eq!(block_on(services.catalog(&config).list_records()).expect("list").len(), 1);

        let accounts = services.accounts(&config);
        block_on(accounts.sign_up("ana", "pw")).expect("sign up");
        assert_eq!(
            block_on(accounts.catalog_for("ana").list_records())
                .expect("list")
                .len(),
            1
        );
    }

    #[test]
    fn noop_services_reject_uploads_with_bytes() {
        let services = HostServices::noop();
        let catalog = services.catalog(&VaultConfig::default());
        assert!(block_on(catalog.add_record(NewRecord::from_bytes("a", vec![1]))).is_err());
    }
}
