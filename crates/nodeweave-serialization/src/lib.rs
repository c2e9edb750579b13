// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! # Nodeweave Serialization
//!
//! Converts nodes of a [`NodeGraph`](nodeweave_structures::model::NodeGraph) to and from the
//! format-neutral [`SerializedChunk`](chunk::SerializedChunk), and chunks to and from bytes.
//!
//! ## Core Components
//!
//! - **[`Serialization`]** - The engine: language registry, policies, serialize and deserialize
//! - **[`chunk`]** - The intermediate representation every codec reads and writes
//! - **[`codecs`]** - [`JsonCodec`] (textual tree) and [`BinaryCodec`] (deduplicated tables)
//! - **[`ClassifierResolver`]** - Maps meta-pointers found in data to live classifiers
//! - **[`Instantiator`]** - Builds instances, through registered constructors or dynamically
//!
//! ## Basic Usage
//!
//! ```rust
//! use nodeweave_serialization::{CodecKind, Serialization};
//!
//! let engine = Serialization::standard();
//! let text = br#"{"serializationFormatVersion":"2023.1","languages":[],"nodes":[]}"#;
//! let (graph, deserialized) = engine.deserialize(text, CodecKind::Json).unwrap();
//! assert!(graph.is_empty());
//! assert!(deserialized.is_empty());
//! ```

pub mod chunk;
mod classifier_resolver;
pub mod codecs;
mod instance_resolver;
mod instantiator;
mod primitive_values;
mod reconstruction;
mod serialization;

pub use classifier_resolver::ClassifierResolver;
pub use codecs::{BinaryCodec, ChunkCodec, CodecKind, JsonCodec};
pub use instance_resolver::{CompositeResolver, InstanceResolver, MapBasedResolver};
pub use instantiator::{Constructor, InstantiationContext, Instantiator};
pub use primitive_values::{PrimitiveDeserializer, PrimitiveSerializer, PrimitiveValuesSerialization};
pub use reconstruction::Deserialized;
pub use serialization::Serialization;
