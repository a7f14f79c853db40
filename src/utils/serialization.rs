// JSON export helpers - blocks and chains leave the process as plain serde_json records
use crate::error::Result;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs;
use std::path::Path;

/// Serialize data as pretty-printed JSON
pub fn to_json<T: Serialize + ?Sized>(data: &T) -> Result<String> {
    Ok(serde_json::to_string_pretty(data)?)
}

/// Deserialize data from JSON text
pub fn from_json<T: DeserializeOwned>(text: &str) -> Result<T> {
    Ok(serde_json::from_str(text)?)
}

pub fn write_json_file<T: Serialize + ?Sized>(path: &Path, data: &T) -> Result<()> {
    fs::write(path, to_json(data)?)?;
    Ok(())
}

pub fn read_json_file<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let text = fs::read_to_string(path)?;
    from_json(&text)
}

/// Serde adapter for opaque payload bytes.
///
/// Valid UTF-8 payloads are written as JSON strings so consumers see the
/// original text; anything else falls back to an array of bytes.
pub mod payload {
    use serde::{Deserialize, Deserializer, Serializer};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum PayloadRepr {
        Text(String),
        Bytes(Vec<u8>),
    }

    pub fn serialize<S: Serializer>(payload: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        match std::str::from_utf8(payload) {
            Ok(text) => serializer.serialize_str(text),
            Err(_) => serializer.collect_seq(payload.iter()),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        Ok(match PayloadRepr::deserialize(deserializer)? {
            PayloadRepr::Text(text) => text.into_bytes(),
            PayloadRepr::Bytes(bytes) => bytes,
        })
    }
}
