//! `localStorage`-backed key-value store.
//!
//! Synchronous at the browser API boundary; the [`KeyValueStore`] impl wraps each call in a ready
//! future. Outside wasm32 every key reads as missing and writes succeed without effect.

use vault_host::{KeyValueFuture, KeyValueStore};

#[derive(Debug, Clone, Copy, Default)]
/// Key-value store backed by `window.localStorage`.
pub struct WebKeyValueStore;

impl WebKeyValueStore {
    /// Loads the raw string stored under `key`.
    ///
    /// # Errors
    ///
    /// Returns an error when `localStorage` is unavailable or the read throws.
    pub fn load_raw(self, key: &str) -> Result<Option<String>, String> {
        #[cfg(target_arch = "wasm32")]
        {
            local_storage()?
                .get_item(key)
                .map_err(|e| format!("localStorage get_item failed: {e:?}"))
        }

        #[cfg(not(target_arch = "wasm32"))]
        {
            let _ = key;
            Ok(None)
        }
    }

    /// Replaces the raw string stored under `key`.
    ///
    /// # Errors
    ///
    /// Returns an error when `localStorage` is unavailable or the write fails, typically because
    /// the origin quota is exhausted by base64 uploads.
    pub fn save_raw(self, key: &str, raw_json: &str) -> Result<(), String> {
        #[cfg(target_arch = "wasm32")]
        {
            local_storage()?
                .set_item(key, raw_json)
                .map_err(|e| format!("localStorage set_item failed for `{key}`: {e:?}"))
        }

        #[cfg(not(target_arch = "wasm32"))]
        {
            let _ = (key, raw_json);
            Ok(())
        }
    }

    /// Deletes `key`.
    ///
    /// # Errors
    ///
    /// Returns an error when `localStorage` is unavailable or the delete fails.
    pub fn delete_raw(self, key: &str) -> Result<(), String> {
        #[cfg(target_arch = "wasm32")]
        {
            local_storage()?
                .remove_item(key)
                .map_err(|e| format!("localStorage remove_item failed: {e:?}"))
        }

        #[cfg(not(target_arch = "wasm32"))]
        {
            let _ = key;
            Ok(())
        }
    }
}

#[cfg(target_arch = "wasm32")]
fn local_storage() -> Result<web_sys::Storage, String> {
    web_sys::window()
        .and_then(|w| w.local_storage().ok().flatten())
        .ok_or_else(|| "localStorage unavailable".to_string())
}

impl KeyValueStore for WebKeyValueStore {
    fn load<'a>(&'a self, key: &'a str) -> KeyValueFuture<'a, Result<Option<String>, String>> {
        let store = *self;
        Box::pin(async move { store.load_raw(key) })
    }

    fn save<'a>(
        &'a self,
        key: &'a str,
        raw_json: &'a str,
    ) -> KeyValueFuture<'a, Result<(), String>> {
        let store = *self;
        Box::pin(async move { store.save_raw(key, raw_json) })
    }

    fn delete<'a>(&'a self, key: &'a str) -> KeyValueFuture<'a, Result<(), String>> {
        let store = *self;
        Box::pin(async move { store.delete_raw(key) })
    }
}
