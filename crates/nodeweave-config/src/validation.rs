// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Configuration validation
//!
//! Checks every enumerated setting against the values the engine understands, collecting all
//! problems before failing.

use crate::{ConfigError, ConfigResult, LoggingConfig, NodeweaveConfig};
use nodeweave_serialization::chunk::SERIALIZATION_FORMAT_VERSION;
use nodeweave_serialization::CodecKind;
use nodeweave_structures::UnavailableNodePolicy;

/// Validation errors that can occur during config validation
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigValidationError {
    UnknownPolicy { field: String, value: String },
    UnknownCodec { value: String },
    UnsupportedFormatVersion { value: String },
    InvalidValue { field: String, reason: String },
}

impl std::fmt::Display for ConfigValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnknownPolicy { field, value } => write!(
                f,
                "Unknown policy '{}' for {} (expected throw_error, null_references or proxy_nodes)",
                value, field
            ),
            Self::UnknownCodec { value } => {
                write!(f, "Unknown codec '{}' for serialization.default_codec (expected json or binary)", value)
            }
            Self::UnsupportedFormatVersion { value } => write!(
                f,
                "Unsupported serialization.format_version '{}' (only {} is supported)",
                value, SERIALIZATION_FORMAT_VERSION
            ),
            Self::InvalidValue { field, reason } => {
                write!(f, "Invalid configuration value for {}: {}", field, reason)
            }
        }
    }
}

/// Validate the complete configuration
///
/// # Errors
///
/// Returns `ConfigError::ValidationError` listing every problem found
pub fn validate_config(config: &NodeweaveConfig) -> ConfigResult<()> {
    let mut errors = Vec::new();

    validate_policies(config, &mut errors);
    validate_serialization(config, &mut errors);
    validate_logging(&config.logging, &mut errors);

    if !errors.is_empty() {
        let error_messages = errors
            .iter()
            .map(|e| format!("  - {}", e))
            .collect::<Vec<_>>()
            .join("\n");
        return Err(ConfigError::ValidationError(format!(
            "Configuration validation failed:\n{}",
            error_messages
        )));
    }
    Ok(())
}

fn validate_policies(config: &NodeweaveConfig, errors: &mut Vec<ConfigValidationError>) {
    for (field, value) in config.deserialization.all_policies() {
        if value.parse::<UnavailableNodePolicy>().is_err() {
            errors.push(ConfigValidationError::UnknownPolicy {
                field: format!("deserialization.{}", field),
                value: value.to_string(),
            });
        }
    }
}

fn validate_serialization(config: &NodeweaveConfig, errors: &mut Vec<ConfigValidationError>) {
    let serialization = &config.serialization;
    if serialization.default_codec.parse::<CodecKind>().is_err() {
        errors.push(ConfigValidationError::UnknownCodec {
            value: serialization.default_codec.clone(),
        });
    }
    if serialization.format_version != SERIALIZATION_FORMAT_VERSION {
        errors.push(ConfigValidationError::UnsupportedFormatVersion {
            value: serialization.format_version.clone(),
        });
    }
}

fn validate_logging(logging: &LoggingConfig, errors: &mut Vec<ConfigValidationError>) {
    let level = logging.level.to_lowercase();
    if !LoggingConfig::LEVELS.contains(&level.as_str()) {
        errors.push(ConfigValidationError::InvalidValue {
            field: "logging.level".to_string(),
            reason: format!("'{}' must be one of {}", logging.level, LoggingConfig::LEVELS.join(", ")),
        });
    }
    let format = logging.format.to_lowercase();
    if !LoggingConfig::FORMATS.contains(&format.as_str()) {
        errors.push(ConfigValidationError::InvalidValue {
            field: "logging.format".to_string(),
            reason: format!("'{}' must be text or json", logging.format),
        });
    }
}
