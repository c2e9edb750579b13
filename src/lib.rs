// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! # nodeweave - schema-aware model interchange
//!
//! nodeweave moves node graphs (trees of classifier instances with cross-references and
//! annotations) between memory and the LionWeb serialization chunk, written either as JSON or as
//! a compact binary table format. Deserialization rebuilds the graph against registered
//! languages, with configurable handling of parents, children and reference targets that are not
//! part of the data being read.
//!
//! ## Quick Start
//!
//! ```rust
//! use nodeweave::prelude::*;
//!
//! let config = NodeweaveConfig::default();
//! let engine = nodeweave::engine_from_config(&config)?;
//!
//! let text = r#"{"serializationFormatVersion":"2023.1","languages":[],"nodes":[]}"#;
//! let (graph, deserialized) = engine.deserialize(text.as_bytes(), CodecKind::Json)?;
//! assert!(deserialized.is_empty());
//! assert!(graph.is_empty());
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │  Foundation: nodeweave-structures                       │
//! │  (Language, Classifier, Feature, NodeGraph, ModelError) │
//! └─────────────────────────────────────────────────────────┘
//!                         ↓
//! ┌─────────────────────────────────────────────────────────┐
//! │  Data Processing: nodeweave-serialization               │
//! │  (Chunk, JSON and binary codecs, Serialization engine)  │
//! └─────────────────────────────────────────────────────────┘
//!                         ↓
//! ┌─────────────────────────────────────────────────────────┐
//! │  Ambient: nodeweave-config, nodeweave-observability     │
//! │  (TOML settings, tracing subscriber)                    │
//! └─────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Feature Flags
//!
//! - **`file-logging`**: JSON log files in timestamped run folders
//!
//! ## License
//!
//! Apache-2.0

pub use nodeweave_config as config;
pub use nodeweave_observability as observability;
pub use nodeweave_serialization as serialization;
pub use nodeweave_structures as structures;

use nodeweave_config::{ConfigResult, NodeweaveConfig};
use nodeweave_serialization::Serialization;
use tracing::debug;

/// Prelude - commonly used types and traits
pub mod prelude {
    pub use crate::structures::language::{
        builtins, validate_language, Classifier, DataType, EnumerationLiteral, Feature, Language, LanguageRef,
        MetaPointer,
    };
    pub use crate::structures::model::{
        ClassifierInstance, NodeGraph, NodeHandle, PropertyValue, ReferenceTarget, ReferenceValue,
    };
    pub use crate::structures::{ErrorCategory, ModelError, ModelResult, UnavailableNodePolicy};

    pub use crate::serialization::chunk::SerializedChunk;
    pub use crate::serialization::{ChunkCodec, CodecKind, Deserialized, InstantiationContext, Serialization};

    pub use crate::config::{load_config, validate_config, NodeweaveConfig};
    pub use crate::observability::{init_logging, parse_debug_flags, CrateDebugFlags};
}

/// Builds a standard engine (built-in language and primitive serializers registered) with the
/// policies, dynamic instantiation switch and JSON layout from `config`.
///
/// Languages still have to be registered on the returned engine.
pub fn engine_from_config(config: &NodeweaveConfig) -> ConfigResult<Serialization> {
    let deserialization = &config.deserialization;
    let mut engine = Serialization::standard();
    engine.set_unavailable_parent_policy(deserialization.parent_policy()?);
    engine.set_unavailable_children_policy(deserialization.children_policy()?);
    engine.set_unavailable_reference_target_policy(deserialization.reference_target_policy()?);
    engine
        .instantiator_mut()
        .set_dynamic_instantiation(deserialization.dynamic_instantiation);
    engine.set_pretty_json(config.serialization.pretty_json);
    debug!(
        "Engine configured: parent={}, children={}, reference={}, dynamic={}",
        engine.unavailable_parent_policy(),
        engine.unavailable_children_policy(),
        engine.unavailable_reference_target_policy(),
        deserialization.dynamic_instantiation
    );
    Ok(engine)
}
