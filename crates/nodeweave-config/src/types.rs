// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Configuration type definitions
//!
//! This module defines all configuration structs that map to sections in `nodeweave.toml`.
//! Enumerated settings are kept as strings so that a bad value in one field does not hide the
//! others; `validate_config` and the typed accessors below interpret them.

use crate::{ConfigError, ConfigResult};
use nodeweave_serialization::chunk::SERIALIZATION_FORMAT_VERSION;
use nodeweave_serialization::CodecKind;
use nodeweave_structures::UnavailableNodePolicy;
use serde::{Deserialize, Serialize};

/// Root configuration structure
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct NodeweaveConfig {
    pub deserialization: DeserializationConfig,
    pub serialization: SerializationConfig,
    pub logging: LoggingConfig,
}

/// How chunks are turned back into node graphs
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct DeserializationConfig {
    pub unavailable_parent_policy: String,
    pub unavailable_children_policy: String,
    pub unavailable_reference_target_policy: String,
    /// Build instances of registered classifiers without a custom constructor
    pub dynamic_instantiation: bool,
}

impl Default for DeserializationConfig {
    fn default() -> Self {
        let throw = UnavailableNodePolicy::ThrowError.to_string();
        Self {
            unavailable_parent_policy: throw.clone(),
            unavailable_children_policy: throw.clone(),
            unavailable_reference_target_policy: throw,
            dynamic_instantiation: true,
        }
    }
}

impl DeserializationConfig {
    pub fn parent_policy(&self) -> ConfigResult<UnavailableNodePolicy> {
        parse_policy("deserialization.unavailable_parent_policy", &self.unavailable_parent_policy)
    }

    pub fn children_policy(&self) -> ConfigResult<UnavailableNodePolicy> {
        parse_policy("deserialization.unavailable_children_policy", &self.unavailable_children_policy)
    }

    pub fn reference_target_policy(&self) -> ConfigResult<UnavailableNodePolicy> {
        parse_policy(
            "deserialization.unavailable_reference_target_policy",
            &self.unavailable_reference_target_policy,
        )
    }

    /// (field name, raw value) of every policy setting
    pub fn all_policies(&self) -> Vec<(&str, &str)> {
        vec![
            ("unavailable_parent_policy", self.unavailable_parent_policy.as_str()),
            ("unavailable_children_policy", self.unavailable_children_policy.as_str()),
            (
                "unavailable_reference_target_policy",
                self.unavailable_reference_target_policy.as_str(),
            ),
        ]
    }
}

fn parse_policy(field: &str, value: &str) -> ConfigResult<UnavailableNodePolicy> {
    value
        .parse::<UnavailableNodePolicy>()
        .map_err(|reason| ConfigError::InvalidValue(format!("{}: {}", field, reason)))
}

/// How node graphs are written out
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct SerializationConfig {
    /// `json` or `binary`
    pub default_codec: String,
    pub pretty_json: bool,
    pub format_version: String,
}

impl Default for SerializationConfig {
    fn default() -> Self {
        Self {
            default_codec: CodecKind::Json.to_string(),
            pretty_json: false,
            format_version: SERIALIZATION_FORMAT_VERSION.to_string(),
        }
    }
}

impl SerializationConfig {
    pub fn codec(&self) -> ConfigResult<CodecKind> {
        self.default_codec
            .parse::<CodecKind>()
            .map_err(|e| ConfigError::InvalidValue(format!("serialization.default_codec: {}", e)))
    }
}

/// Log output settings
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// One of `trace`, `debug`, `info`, `warn`, `error`
    pub level: String,
    /// `text` or `json`
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "text".to_string(),
        }
    }
}

impl LoggingConfig {
    pub const LEVELS: [&'static str; 5] = ["trace", "debug", "info", "warn", "error"];
    pub const FORMATS: [&'static str; 2] = ["text", "json"];

    pub fn is_json(&self) -> bool {
        self.format.eq_ignore_ascii_case("json")
    }
}
