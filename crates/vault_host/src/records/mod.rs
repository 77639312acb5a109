//! File records: model, persistence and listing queries.

pub mod catalog;
mod legacy;
pub mod query;
pub mod types;

pub use catalog::{CatalogError, FileCatalog, DEFAULT_RECORDS_KEY, RECORDS_SCHEMA_VERSION};
pub use query::{
    filter_and_sort, upload_day, FieldFilter, FilterField, ListingSummary, RecordQuery, SortOrder,
};
pub use types::{
    new_record_id, next_serial_ordinal, reserve_serial_ordinals, FileKind, FileRecord, NewRecord,
    SerialNumber, SerialPolicy, UploadSource,
};
