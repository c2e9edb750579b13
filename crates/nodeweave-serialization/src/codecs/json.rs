// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

use crate::chunk::SerializedChunk;
use crate::codecs::{ChunkCodec, CodecKind};
use nodeweave_structures::ModelError;
use serde::Deserialize;
use serde_json::Value;

/// The textual codec.
///
/// Writing always produces the current key names with explicit nulls. Reading is schema-free and
/// goes through the serde derives of the chunk types, which accept the legacy key names and the
/// missing optional entries. The top-level keys and the per-node `properties`, `containments` and
/// `references` arrays are required.
///
/// # Example
/// ```
/// use nodeweave_serialization::chunk::SerializedChunk;
/// use nodeweave_serialization::codecs::JsonCodec;
///
/// let codec = JsonCodec::new();
/// let text = codec.to_json_string(&SerializedChunk::default()).unwrap();
/// assert_eq!(text, r#"{"serializationFormatVersion":"2023.1","languages":[],"nodes":[]}"#);
/// assert_eq!(codec.from_json_str(&text).unwrap(), SerializedChunk::default());
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct JsonCodec {
    pretty: bool,
}

impl JsonCodec {
    pub fn new() -> Self {
        Self { pretty: false }
    }

    /// A codec that writes indented JSON
    pub fn pretty() -> Self {
        Self { pretty: true }
    }

    pub fn is_pretty(&self) -> bool {
        self.pretty
    }

    //region Writing

    pub fn to_json_value(&self, chunk: &SerializedChunk) -> Result<Value, ModelError> {
        serde_json::to_value(chunk).map_err(|e| ModelError::MalformedJson(e.to_string()))
    }

    pub fn to_json_string(&self, chunk: &SerializedChunk) -> Result<String, ModelError> {
        let result = if self.pretty {
            serde_json::to_string_pretty(chunk)
        } else {
            serde_json::to_string(chunk)
        };
        result.map_err(|e| ModelError::MalformedJson(e.to_string()))
    }

    //endregion

    //region Reading

    pub fn from_json_str(&self, text: &str) -> Result<SerializedChunk, ModelError> {
        serde_json::from_str(text).map_err(read_error)
    }

    pub fn from_json_value(&self, value: &Value) -> Result<SerializedChunk, ModelError> {
        SerializedChunk::deserialize(value).map_err(read_error)
    }

    //endregion
}

impl ChunkCodec for JsonCodec {
    fn kind(&self) -> CodecKind {
        CodecKind::Json
    }

    fn encode(&self, chunk: &SerializedChunk) -> Result<Vec<u8>, ModelError> {
        Ok(self.to_json_string(chunk)?.into_bytes())
    }

    fn decode(&self, bytes: &[u8]) -> Result<SerializedChunk, ModelError> {
        serde_json::from_slice(bytes).map_err(read_error)
    }
}

/// A missing required key becomes [`ModelError::MissingKey`], anything else is malformed JSON
fn read_error(error: serde_json::Error) -> ModelError {
    let message = error.to_string();
    match message
        .strip_prefix("missing field `")
        .and_then(|rest| rest.split('`').next())
    {
        Some(key) => ModelError::MissingKey(key.to_string()),
        None => ModelError::MalformedJson(message),
    }
}
