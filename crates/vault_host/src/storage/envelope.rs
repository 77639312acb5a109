//! Versioned envelope wrapping persisted payloads.

use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::Value;

/// Version for [`StoreEnvelope`] metadata serialization.
pub const STORE_ENVELOPE_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
/// Versioned envelope for a persisted payload (record lists, account maps).
pub struct StoreEnvelope {
    /// Envelope schema version.
    pub envelope_version: u32,
    /// Storage key the envelope was written under.
    pub namespace: String,
    /// Payload schema version.
    pub schema_version: u32,
    /// Last update time in unix milliseconds.
    pub updated_at_unix_ms: u64,
    /// Serialized payload.
    pub payload: Value,
}

impl StoreEnvelope {
    /// Creates a new envelope stamped with a monotonic timestamp.
    pub fn new(namespace: impl Into<String>, schema_version: u32, payload: Value) -> Self {
        Self {
            envelope_version: STORE_ENVELOPE_VERSION,
            namespace: namespace.into(),
            schema_version,
            updated_at_unix_ms: crate::time::next_monotonic_timestamp_ms(),
            payload,
        }
    }
}

/// Builds a [`StoreEnvelope`] from a serializable payload.
///
/// # Errors
///
/// Returns an error when `payload` cannot be converted to JSON.
pub fn build_envelope<T: Serialize>(
    namespace: &str,
    schema_version: u32,
    payload: &T,
) -> Result<StoreEnvelope, String> {
    let payload = serde_json::to_value(payload).map_err(|e| e.to_string())?;
    Ok(StoreEnvelope::new(namespace, schema_version, payload))
}

/// Deserializes an envelope payload into a target type.
///
/// # Errors
///
/// Returns an error when the envelope schema is newer than `max_schema_version` or the payload
/// does not match `T`.
pub fn decode_envelope_payload<T: DeserializeOwned>(
    envelope: &StoreEnvelope,
    max_schema_version: u32,
) -> Result<T, String> {
    if envelope.schema_version > max_schema_version {
        return Err(format!(
            "`{}` uses schema version {} but this build supports up to {}",
            envelope.namespace, envelope.schema_version, max_schema_version
        ));
    }
    serde_json::from_value(envelope.payload.clone()).map_err(|e| e.to_string())
}
