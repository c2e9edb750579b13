// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

use crate::ModelError;

/// Placeholder for a node that could not be resolved while deserializing.
///
/// A proxy only knows its id. Every structural access through the graph fails with
/// [`ModelError::ProxyAccess`], and serializers refuse graphs that would emit one.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ProxyNode {
    id: String,
}

impl ProxyNode {
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into() }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// The error returned for any access other than the id
    pub fn unsupported(&self, operation: &'static str) -> ModelError {
        ModelError::ProxyAccess {
            id: self.id.clone(),
            operation,
        }
    }
}
