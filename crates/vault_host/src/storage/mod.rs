//! Persistence contracts shared by the device, browser and in-memory variants.

pub mod envelope;
pub mod kv;

pub use envelope::{build_envelope, decode_envelope_payload, StoreEnvelope, STORE_ENVELOPE_VERSION};
pub use kv::{
    load_json_with, save_json_with, KeyValueFuture, KeyValueStore, MemoryKeyValueStore,
    NoopKeyValueStore,
};
