//! Record catalog: metadata CRUD over a key-value store plus blob bytes.

use std::{collections::HashSet, rc::Rc};

use serde_json::Value;
use thiserror::Error;

use super::legacy::migrate_legacy_items;
use super::types::{reserve_serial_ordinals, FileRecord, NewRecord, SerialPolicy, UploadSource};
use crate::blob::{decode_data_url, BlobStore};
use crate::storage::{
    build_envelope, decode_envelope_payload, load_json_with, save_json_with, KeyValueStore,
    StoreEnvelope,
};
use crate::time::next_monotonic_timestamp_ms;

/// Schema version of the persisted record list payload.
pub const RECORDS_SCHEMA_VERSION: u32 = 1;
/// Storage key used by the single-user device variant.
pub const DEFAULT_RECORDS_KEY: &str = "uploaded_files_metadata";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
/// Catalog operation failures.
pub enum CatalogError {
    /// No record with the given id exists.
    #[error("record not found: {0}")]
    NotFound(String),
    /// Uploads need a non-blank display name.
    #[error("display name must not be empty")]
    EmptyName,
    /// The metadata store failed or holds unreadable data.
    #[error("metadata store failed: {0}")]
    Store(String),
    /// The blob store failed.
    #[error("blob store failed: {0}")]
    Blob(String),
    /// Every serial ordinal up to `u32::MAX` is taken.
    #[error("serial numbers are exhausted")]
    SerialExhausted,
}

/// Record list for one storage key, with bytes kept in a [`BlobStore`].
///
/// Every mutation is a read-modify-write of the whole list. There is no locking: two writers on
/// the same key can lose each other's updates.
#[derive(Clone)]
pub struct FileCatalog {
    records: Rc<dyn KeyValueStore>,
    blobs: Rc<dyn BlobStore>,
    key: String,
    serials: SerialPolicy,
}

impl FileCatalog {
    /// Creates a catalog persisting its list under `key`.
    pub fn new(
        records: Rc<dyn KeyValueStore>,
        blobs: Rc<dyn BlobStore>,
        key: impl Into<String>,
    ) -> Self {
        Self {
            records,
            blobs,
            key: key.into(),
            serials: SerialPolicy::default(),
        }
    }

    /// Replaces the serial formatting policy.
    pub fn with_serial_policy(mut self, serials: SerialPolicy) -> Self {
        self.serials = serials;
        self
    }

    /// Storage key of this catalog.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Returns every record in insertion order.
    ///
    /// Lists written by earlier front-ends (bare camelCase arrays) are converted on the fly and
    /// rewritten as an envelope by the next mutation. Duplicate ids keep their first occurrence.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::Store`] when the store fails or the payload is unreadable.
    pub async fn list_records(&self) -> Result<Vec<FileRecord>, CatalogError> {
        let Some(value) = load_json_with::<_, Value>(&*self.records, &self.key)
            .await
            .map_err(CatalogError::Store)?
        else {
            return Ok(Vec::new());
        };

        let records = if value.is_array() {
            log::warn!("reading legacy record list under `{}`", self.key);
            migrate_legacy_items(value, &self.serials).map_err(CatalogError::Store)?
        } else {
            let envelope: StoreEnvelope = serde_json::from_value(value).map_err(|err| {
                CatalogError::Store(format!("failed to parse `{}`: {err}", self.key))
            })?;
            decode_envelope_payload(&envelope, RECORDS_SCHEMA_VERSION)
                .map_err(CatalogError::Store)?
        };

        Ok(dedupe_by_id(records))
    }

    /// Returns one record by id.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::NotFound`] for unknown ids.
    pub async fn get_record(&self, id: &str) -> Result<FileRecord, CatalogError> {
        self.list_records()
            .await?
            .into_iter()
            .find(|record| record.id == id)
            .ok_or_else(|| CatalogError::NotFound(id.to_string()))
    }

    /// Appends one upload, allocating the next serial ordinal.
    ///
    /// # Errors
    ///
    /// See [`FileCatalog::add_records`].
    pub async fn add_record(&self, upload: NewRecord) -> Result<FileRecord, CatalogError> {
        let mut added = self.add_records(vec![upload]).await?;
        added
            .pop()
            .ok_or_else(|| CatalogError::Store("upload produced no record".to_string()))
    }

    /// Appends several uploads with consecutive serial ordinals and a single list write.
    ///
    /// Bytes are written to the blob store before the list is saved. When the save fails the
    /// freshly written blobs are removed again on a best-effort basis.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::EmptyName`] before touching storage when any name is blank,
    /// [`CatalogError::SerialExhausted`] before touching storage when the batch would run past the
    /// last serial ordinal, and store/blob errors otherwise.
    pub async fn add_records(
        &self,
        uploads: Vec<NewRecord>,
    ) -> Result<Vec<FileRecord>, CatalogError> {
        if uploads
            .iter()
            .any(|upload| upload.display_name.trim().is_empty())
        {
            return Err(CatalogError::EmptyName);
        }

        let mut records = self.list_records().await?;
        let ordinals = reserve_serial_ordinals(&records, uploads.len())
            .ok_or(CatalogError::SerialExhausted)?;
        let mut added = Vec::with_capacity(uploads.len());
        let mut written_blobs = Vec::new();

        for (upload, ordinal) in uploads.into_iter().zip(ordinals) {
            let created_at = next_monotonic_timestamp_ms();
            let size_bytes = upload.size_bytes();
            let serial = self.serials.format(ordinal, created_at);
            let name = upload.display_name.trim().to_string();
            let mut record = FileRecord::new_file(name, size_bytes, serial, created_at, None);

            record.location_ref = match upload.source {
                UploadSource::Bytes(bytes) => {
                    let put = self
                        .blobs
                        .put(&record.id, &record.display_name, &bytes)
                        .await;
                    match put {
                        Ok(location_ref) => {
                            written_blobs.push(location_ref.clone());
                            Some(location_ref)
                        }
                        Err(err) => {
                            self.discard_blobs(&written_blobs).await;
                            return Err(CatalogError::Blob(err));
                        }
                    }
                }
                UploadSource::Existing { location_ref, .. } => Some(location_ref),
                UploadSource::Empty { .. } => None,
            };

            added.push(record);
        }

        records.extend(added.iter().cloned());
        if let Err(err) = self.save_records(&records).await {
            self.discard_blobs(&written_blobs).await;
            return Err(err);
        }

        for record in &added {
            log::info!(
                "added {} `{}` ({} bytes) under `{}`",
                record.serial_number,
                record.display_name,
                record.size_bytes,
                self.key
            );
        }
        Ok(added)
    }

    /// Removes a record, then best-effort deletes its bytes.
    ///
    /// A blob deletion failure is logged and does not restore the record.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::NotFound`] for unknown ids; storage is left untouched.
    pub async fn delete_record(&self, id: &str) -> Result<FileRecord, CatalogError> {
        let mut records = self.list_records().await?;
        let position = records
            .iter()
            .position(|record| record.id == id)
            .ok_or_else(|| CatalogError::NotFound(id.to_string()))?;
        let removed = records.remove(position);
        self.save_records(&records).await?;

        if let Some(location_ref) = removed.location_ref.as_deref() {
            self.delete_blob(location_ref).await;
        }
        log::info!(
            "deleted {} `{}` from `{}`",
            removed.serial_number,
            removed.display_name,
            self.key
        );
        Ok(removed)
    }

    /// Reads the bytes behind a record.
    ///
    /// Inline `data:` references are decoded directly; everything else goes through the blob
    /// store. Records without a reference yield `None`.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::NotFound`] for unknown ids and blob errors otherwise.
    pub async fn read_bytes(&self, id: &str) -> Result<Option<Vec<u8>>, CatalogError> {
        let record = self.get_record(id).await?;
        let Some(location_ref) = record.location_ref.as_deref() else {
            return Ok(None);
        };
        if location_ref.starts_with("data:") {
            return decode_data_url(location_ref)
                .map(|decoded| Some(decoded.bytes))
                .map_err(CatalogError::Blob);
        }
        self.blobs
            .get(location_ref)
            .await
            .map_err(CatalogError::Blob)
    }

    /// Removes the whole list and every blob it references. Returns the number of records.
    ///
    /// # Errors
    ///
    /// Returns store errors from loading or deleting the list.
    pub async fn clear(&self) -> Result<usize, CatalogError> {
        let records = self.list_records().await?;
        self.records
            .delete(&self.key)
            .await
            .map_err(CatalogError::Store)?;
        for location_ref in records
            .iter()
            .filter_map(|record| record.location_ref.as_deref())
        {
            self.delete_blob(location_ref).await;
        }
        Ok(records.len())
    }

    async fn save_records(&self, records: &[FileRecord]) -> Result<(), CatalogError> {
        let envelope = build_envelope(&self.key, RECORDS_SCHEMA_VERSION, &records)
            .map_err(CatalogError::Store)?;
        save_json_with(&*self.records, &self.key, &envelope)
            .await
            .map_err(CatalogError::Store)
    }

    async fn delete_blob(&self, location_ref: &str) {
        if location_ref.starts_with("data:") {
            return;
        }
        if let Err(err) = self.blobs.delete(location_ref).await {
            log::warn!("failed to delete blob `{location_ref}`: {err}");
        }
    }

    async fn discard_blobs(&self, location_refs: &[String]) {
        for location_ref in location_refs {
            self.delete_blob(location_ref).await;
        }
    }
}

fn dedupe_by_id(records: Vec<FileRecord>) -> Vec<FileRecord> {
    let mut seen = HashSet::with_capacity(records.len());
    let before = records.len();
    let deduped: Vec<FileRecord> = records
        .into_iter()
        .filter(|record| seen.insert(record.id.clone()))
        .collect();
    if deduped.len() != before {
        log::debug!("dropped {} duplicate record(s)", before - deduped.len());
    }
    deduped
}
