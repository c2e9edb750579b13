// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use std::str::FromStr;

/// What to do when a parent, child or reference target named in serialized data is not part of
/// the data being read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnavailableNodePolicy {
    /// Abort the whole call
    #[default]
    ThrowError,
    /// Drop the edge: no parent, no child, or a reference value without a target
    NullReferences,
    /// Substitute a proxy node carrying the missing id
    ProxyNodes,
}

impl Display for UnavailableNodePolicy {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            UnavailableNodePolicy::ThrowError => "throw_error",
            UnavailableNodePolicy::NullReferences => "null_references",
            UnavailableNodePolicy::ProxyNodes => "proxy_nodes",
        };
        write!(f, "{}", name)
    }
}

impl FromStr for UnavailableNodePolicy {
    type Err = String;

    /// Accepts the snake_case names as well as the upper-case constants
    /// (`THROW_ERROR`, `NULL_REFERENCES`, `PROXY_NODES`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "throw_error" => Ok(UnavailableNodePolicy::ThrowError),
            "null_references" => Ok(UnavailableNodePolicy::NullReferences),
            "proxy_nodes" => Ok(UnavailableNodePolicy::ProxyNodes),
            other => Err(format!(
                "Unknown unavailable node policy '{}', expected throw_error, null_references or proxy_nodes",
                other
            )),
        }
    }
}
