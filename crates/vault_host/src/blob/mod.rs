//! Blob storage contracts: the bytes behind each record.

mod data_url;

use std::{cell::RefCell, collections::HashMap, future::Future, pin::Pin, rc::Rc};

pub use data_url::{decode_data_url, encode_data_url, DecodedDataUrl};

use crate::preview::mime_for_name;
use crate::storage::KeyValueStore;

/// Object-safe boxed future used by [`BlobStore`] async methods.
pub type BlobFuture<'a, T> = Pin<Box<dyn Future<Output = T> + 'a>>;

/// Host service holding uploaded bytes.
pub trait BlobStore {
    /// Stores bytes for a record and returns the reference to persist as `location_ref`.
    fn put<'a>(
        &'a self,
        record_id: &'a str,
        name: &'a str,
        bytes: &'a [u8],
    ) -> BlobFuture<'a, Result<String, String>>;

    /// Reads bytes by reference. Unknown references yield `None`.
    fn get<'a>(&'a self, location_ref: &'a str) -> BlobFuture<'a, Result<Option<Vec<u8>>, String>>;

    /// Deletes bytes by reference. Unknown references succeed.
    fn delete<'a>(&'a self, location_ref: &'a str) -> BlobFuture<'a, Result<(), String>>;
}

#[derive(Debug, Clone, Copy, Default)]
/// Blob store that refuses to keep bytes.
pub struct NoopBlobStore;

impl BlobStore for NoopBlobStore {
    fn put<'a>(
        &'a self,
        _record_id: &'a str,
        _name: &'a str,
        _bytes: &'a [u8],
    ) -> BlobFuture<'a, Result<String, String>> {
        Box::pin(async { Err("blob storage unavailable: put".to_string()) })
    }

    fn get<'a>(
        &'a self,
        _location_ref: &'a str,
    ) -> BlobFuture<'a, Result<Option<Vec<u8>>, String>> {
        Box::pin(async { Ok(None) })
    }

    fn delete<'a>(&'a self, _location_ref: &'a str) -> BlobFuture<'a, Result<(), String>> {
        Box::pin(async { Ok(()) })
    }
}

#[derive(Debug, Clone, Default)]
/// In-memory blob store keyed by `mem:{record_id}`.
pub struct MemoryBlobStore {
    inner: Rc<RefCell<HashMap<String, Vec<u8>>>>,
}

impl MemoryBlobStore {
    /// Number of stored blobs.
    pub fn len(&self) -> usize {
        self.inner.borrow().len()
    }

    /// Returns `true` when nothing is stored.
    pub fn is_empty(&self) -> bool {
        self.inner.borrow().is_empty()
    }
}

impl BlobStore for MemoryBlobStore {
    fn put<'a>(
        &'a self,
        record_id: &'a str,
        _name: &'a str,
        bytes: &'a [u8],
    ) -> BlobFuture<'a, Result<String, String>> {
        Box::pin(async move {
            let location_ref = format!("mem:{record_id}");
            self.inner
                .borrow_mut()
                .insert(location_ref.clone(), bytes.to_vec());
            Ok(location_ref)
        })
    }

    fn get<'a>(&'a self, location_ref: &'a str) -> BlobFuture<'a, Result<Option<Vec<u8>>, String>> {
        Box::pin(async move { Ok(self.inner.borrow().get(location_ref).cloned()) })
    }

    fn delete<'a>(&'a self, location_ref: &'a str) -> BlobFuture<'a, Result<(), String>> {
        Box::pin(async move {
            self.inner.borrow_mut().remove(location_ref);
            Ok(())
        })
    }
}

/// Key prefix used by [`KeyValueBlobStore`].
pub const BLOB_KEY_PREFIX: &str = "blob.";

#[derive(Clone)]
/// Blob store persisting each upload as a base64 data URL inside a [`KeyValueStore`].
///
/// This is the browser variant's byte storage: `localStorage` only holds strings, so uploads are
/// kept as `data:` URLs that can be handed straight to an `<img>` or `<video>` element.
pub struct KeyValueBlobStore {
    store: Rc<dyn KeyValueStore>,
}

impl KeyValueBlobStore {
    /// Wraps a key-value store.
    pub fn new(store: Rc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    fn key_for(location_ref: &str) -> Result<&str, String> {
        if location_ref.starts_with(BLOB_KEY_PREFIX) && location_ref.len() > BLOB_KEY_PREFIX.len()
        {
            Ok(location_ref)
        } else {
            Err(format!("`{location_ref}` is not a key-value blob reference"))
        }
    }

    /// Reads the stored data URL without decoding it.
    ///
    /// # Errors
    ///
    /// Returns an error for foreign references or store failures.
    pub async fn get_data_url(&self, location_ref: &str) -> Result<Option<String>, String> {
        let key = Self::key_for(location_ref)?;
        self.store.load(key).await
    }
}

impl BlobStore for KeyValueBlobStore {
    fn put<'a>(
        &'a self,
        record_id: &'a str,
        name: &'a str,
        bytes: &'a [u8],
    ) -> BlobFuture<'a, Result<String, String>> {
        Box::pin(async move {
            let location_ref = format!("{BLOB_KEY_PREFIX}{record_id}");
            let data_url = encode_data_url(mime_for_name(name), bytes);
            self.store.save(&location_ref, &data_url).await?;
            Ok(location_ref)
        })
    }

    fn get<'a>(&'a self, location_ref: &'a str) -> BlobFuture<'a, Result<Option<Vec<u8>>, String>> {
        Box::pin(async move {
            let Some(data_url) = self.get_data_url(location_ref).await? else {
                return Ok(None);
            };
            Ok(Some(decode_data_url(&data_url)?.bytes))
        })
    }

    fn delete<'a>(&'a self, location_ref: &'a str) -> BlobFuture<'a, Result<(), String>> {
        Box::pin(async move {
            let key = Self::key_for(location_ref)?;
            self.store.delete(key).await
        })
    }
}
