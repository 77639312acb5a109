//! Key-value storage contracts and in-process adapters.

use std::{cell::RefCell, collections::BTreeMap, future::Future, pin::Pin, rc::Rc};

use serde::{de::DeserializeOwned, Serialize};

/// Object-safe boxed future used by [`KeyValueStore`] async methods.
pub type KeyValueFuture<'a, T> = Pin<Box<dyn Future<Output = T> + 'a>>;

/// Host service persisting raw JSON text per key.
///
/// Metadata lists, account maps, the persisted session and (in the browser variant) base64 blobs
/// all go through this contract.
pub trait KeyValueStore {
    /// Loads the raw JSON text stored under `key`.
    fn load<'a>(&'a self, key: &'a str) -> KeyValueFuture<'a, Result<Option<String>, String>>;

    /// Replaces the raw JSON text stored under `key`.
    fn save<'a>(
        &'a self,
        key: &'a str,
        raw_json: &'a str,
    ) -> KeyValueFuture<'a, Result<(), String>>;

    /// Deletes `key`. Deleting a missing key succeeds.
    fn delete<'a>(&'a self, key: &'a str) -> KeyValueFuture<'a, Result<(), String>>;
}

#[derive(Debug, Clone, Copy, Default)]
/// Key-value store that keeps nothing.
pub struct NoopKeyValueStore;

impl KeyValueStore for NoopKeyValueStore {
    fn load<'a>(&'a self, _key: &'a str) -> KeyValueFuture<'a, Result<Option<String>, String>> {
        Box::pin(async { Ok(None) })
    }

    fn save<'a>(
        &'a self,
        _key: &'a str,
        _raw_json: &'a str,
    ) -> KeyValueFuture<'a, Result<(), String>> {
        Box::pin(async { Ok(()) })
    }

    fn delete<'a>(&'a self, _key: &'a str) -> KeyValueFuture<'a, Result<(), String>> {
        Box::pin(async { Ok(()) })
    }
}

#[derive(Debug, Clone, Default)]
/// In-memory key-value store. Clones share the same map.
pub struct MemoryKeyValueStore {
    inner: Rc<RefCell<BTreeMap<String, String>>>,
}

impl MemoryKeyValueStore {
    /// Returns the stored keys in sorted order.
    pub fn keys(&self) -> Vec<String> {
        self.inner.borrow().keys().cloned().collect()
    }
}

impl KeyValueStore for MemoryKeyValueStore {
    fn load<'a>(&'a self, key: &'a str) -> KeyValueFuture<'a, Result<Option<String>, String>> {
        Box::pin(async move { Ok(self.inner.borrow().get(key).cloned()) })
    }

    fn save<'a>(
        &'a self,
        key: &'a str,
        raw_json: &'a str,
    ) -> KeyValueFuture<'a, Result<(), String>> {
        Box::pin(async move {
            self.inner
                .borrow_mut()
                .insert(key.to_string(), raw_json.to_string());
            Ok(())
        })
    }

    fn delete<'a>(&'a self, key: &'a str) -> KeyValueFuture<'a, Result<(), String>> {
        Box::pin(async move {
            self.inner.borrow_mut().remove(key);
            Ok(())
        })
    }
}

/// Loads and deserializes a typed value through a [`KeyValueStore`].
///
/// # Errors
///
/// Returns an error when the store fails or the stored text is not valid JSON for `T`.
pub async fn load_json_with<S: KeyValueStore + ?Sized, T: DeserializeOwned>(
    store: &S,
    key: &str,
) -> Result<Option<T>, String> {
    let Some(raw) = store.load(key).await? else {
        return Ok(None);
    };
    if raw.trim().is_empty() {
        return Ok(None);
    }
    let value = serde_json::from_str(&raw).map_err(|e| format!("failed to parse `{key}`: {e}"))?;
    Ok(Some(value))
}

/// Serializes and saves a typed value through a [`KeyValueStore`].
///
/// # Errors
///
/// Returns an error when serialization or the store write fails.
pub async fn save_json_with<S: KeyValueStore + ?Sized, T: Serialize>(
    store: &S,
    key: &str,
    value: &T,
) -> Result<(), String> {
    let raw = serde_json::to_string(value).map_err(|e| e.to_string())?;
    store.save(key, &raw).await
}

#[cfg(test)]
mod tests {
    use futures::executor::block_on;
    use serde::{Deserialize, Serialize};

    use super::*;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Session {
        username: String,
    }

    #[test]
    fn memory_store_round_trip_overwrite_and_delete() {
        let store = MemoryKeyValueStore::default();
        let store_obj: &dyn KeyValueStore = &store;

        block_on(store_obj.save("sessionUser", "\"ana\"")).expect("save");
        block_on(store_obj.save("sessionUser", "\"bo\"")).expect("overwrite");
        assert_eq!(
            block_on(store_obj.load("sessionUser")).expect("load"),
            Some("\"bo\"".to_string())
        );
        assert_eq!(store.keys(), vec!["sessionUser".to_string()]);

        block_on(store_obj.delete("sessionUser")).expect("delete");
        block_on(store_obj.delete("sessionUser")).expect("delete missing key");
        assert_eq!(block_on(store_obj.load("sessionUser")).expect("load"), None);
    }

    #[test]
    fn clones_share_state() {
        let store = MemoryKeyValueStore::default();
        let other = store.clone();
        block_on(store.save("k", "1")).expect("save");
        assert_eq!(block_on(other.load("k")).expect("load"), Some("1".into()));
    }

    #[test]
    fn typed_helpers_round_trip_and_treat_blank_as_missing() {
        let store = MemoryKeyValueStore::default();
        block_on(save_json_with(
            &store,
            "session",
            &Session {
                username: "ana".to_string(),
            },
        ))
        .expect("save typed");
        let loaded: Option<Session> = block_on(load_json_with(&store, "session")).expect("load");
        assert_eq!(
            loaded,
            Some(Session {
                username: "ana".to_string()
            })
        );

        block_on(store.save("blank", "  ")).expect("save blank");
        let blank: Option<Session> = block_on(load_json_with(&store, "blank")).expect("load");
        assert_eq!(blank, None);
    }

    #[test]
    fn typed_load_reports_key_on_parse_failure() {
        let store = MemoryKeyValueStore::default();
        block_on(store.save("USERS", "{\"bad\":")).expect("save");
        let err = block_on(load_json_with::<_, Session>(&store, "USERS"))
            .expect_err("malformed json should fail");
        assert!(err.starts_with("failed to parse `USERS`:"), "{err}");
    }

    #[test]
    fn noop_store_is_empty_and_successful() {
        let store = NoopKeyValueStore;
        let store_obj: &dyn KeyValueStore = &store;
        block_on(store_obj.save("k", "{}")).expect("save");
        assert_eq!(block_on(store_obj.load("k")).expect("load"), None);
        block_on(store_obj.delete("k")).expect("delete");
    }
}
