//! Typed contracts and shared models for the grvault file manager.
//!
//! This crate owns everything that does not depend on where bytes live: the file record model and
//! GR serial allocation, the catalog operations over a key-value store, listing queries, preview
//! dispatch, local accounts and configuration. Concrete adapters live in `vault_host_native`
//! (device filesystem) and `vault_host_web` (browser `localStorage`).

#![warn(missing_docs, rustdoc::broken_intra_doc_links)]

pub mod accounts;
pub mod blob;
pub mod config;
pub mod format;
pub mod host;
pub mod preview;
pub mod records;
pub mod storage;
pub mod time;

pub use accounts::{
    records_key_for, Account, AccountError, AccountService, SESSION_KEY, USERS_KEY,
    WELCOME_RECORD_NAME, WELCOME_RECORD_SIZE,
};
pub use blob::{
    decode_data_url, encode_data_url, BlobFuture, BlobStore, DecodedDataUrl, KeyValueBlobStore,
    MemoryBlobStore, NoopBlobStore, BLOB_KEY_PREFIX,
};
pub use config::{
    AccountsConfig, ConfigError, ConfigLoader, StorageBackend, StorageConfig, VaultConfig,
    ViewConfig, CONFIG_ENV_VAR, DEFAULT_CONFIG_FILE,
};
pub use format::{format_date, format_file_size, format_timestamp};
pub use host::{HostServices, HostStrategy};
pub use preview::{extension_of, mime_for_name, MediaKind, PreviewAction};
pub use records::{
    filter_and_sort, CatalogError, FieldFilter, FileCatalog, FileKind, FileRecord, FilterField,
    ListingSummary, NewRecord, RecordQuery, SerialNumber, SerialPolicy, SortOrder, UploadSource,
    DEFAULT_RECORDS_KEY, RECORDS_SCHEMA_VERSION,
};
pub use storage::{
    load_json_with, save_json_with, KeyValueFuture, KeyValueStore, MemoryKeyValueStore,
    NoopKeyValueStore, StoreEnvelope,
};
pub use time::{next_monotonic_timestamp_ms, unix_time_ms_now};
