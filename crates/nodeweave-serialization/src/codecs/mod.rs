// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Physical encodings of a [`SerializedChunk`].

mod binary;
mod json;

pub use binary::BinaryCodec;
pub use json::JsonCodec;

use crate::chunk::SerializedChunk;
use nodeweave_structures::ModelError;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

/// Common trait for the encodings a chunk can be written to and read from
pub trait ChunkCodec {
    fn kind(&self) -> CodecKind;

    fn encode(&self, chunk: &SerializedChunk) -> Result<Vec<u8>, ModelError>;

    fn decode(&self, bytes: &[u8]) -> Result<SerializedChunk, ModelError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CodecKind {
    Json,
    Binary,
}

impl CodecKind {
    pub fn create_codec(&self, pretty_json: bool) -> Box<dyn ChunkCodec> {
        match self {
            CodecKind::Json => {
                if pretty_json {
                    Box::new(JsonCodec::pretty())
                } else {
                    Box::new(JsonCodec::new())
                }
            }
            CodecKind::Binary => Box::new(BinaryCodec::new()),
        }
    }
}

impl Display for CodecKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            CodecKind::Json => write!(f, "json"),
            CodecKind::Binary => write!(f, "binary"),
        }
    }
}

impl FromStr for CodecKind {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "json" => Ok(CodecKind::Json),
            "binary" => Ok(CodecKind::Binary),
            other => Err(ModelError::BadParameters(format!(
                "Unknown codec '{}', expected json or binary",
                other
            ))),
        }
    }
}
