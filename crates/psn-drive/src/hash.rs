use std::collections::BTreeMap;

use psn_core::errors::{ErrorInfo, PsnError};
use serde::Serialize;
use serde_json::{Map, Value};
use sha2::{Digest, Sha256};

fn canonicalize(value: Value) -> Value {
    match value {
        Value::Object(map) => {
            let ordered: BTreeMap<String, Value> = map
                .into_iter()
                .map(|(key, val)| (key, canonicalize(val)))
                .collect();
            Value::Object(Map::from_iter(ordered))
        }
        Value::Array(values) => Value::Array(values.into_iter().map(canonicalize).collect()),
        other => other,
    }
}

/// Serializes a value into JSON bytes with keys sorted at every level.
pub fn to_canonical_json_bytes<T: Serialize>(value: &T) -> Result<Vec<u8>, PsnError> {
    let value = serde_json::to_value(value)
        .map_err(|err| PsnError::Config(ErrorInfo::new("json-encode", err.to_string())))?;
    let mut bytes = Vec::new();
    serde_json::to_writer_pretty(&mut bytes, &canonicalize(value))
        .map_err(|err| PsnError::Config(ErrorInfo::new("json-write", err.to_string())))?;
    Ok(bytes)
}

/// Stable hexadecimal SHA-256 of the canonical JSON encoding of `value`.
pub fn stable_hash_string<T: Serialize>(value: &T) -> Result<String, PsnError> {
    let digest = Sha256::digest(to_canonical_json_bytes(value)?);
    Ok(format!("{:x}", digest))
}
