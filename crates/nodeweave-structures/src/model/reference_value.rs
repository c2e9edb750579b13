// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

use crate::model::NodeHandle;

/// What a reference value points at.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ReferenceTarget {
    /// A node (or proxy) present in the same graph
    Node(NodeHandle),
    /// An id that could not be resolved to any node
    Unresolved(String),
    /// No target at all, only the resolve info is meaningful
    None,
}

/// One entry of a reference: the referred node plus a free-text resolve info label.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ReferenceValue {
    pub target: ReferenceTarget,
    pub resolve_info: Option<String>,
}

impl ReferenceValue {
    pub fn to_node(node: NodeHandle, resolve_info: Option<String>) -> Self {
        Self {
            target: ReferenceTarget::Node(node),
            resolve_info,
        }
    }

    pub fn dangling(id: impl Into<String>, resolve_info: Option<String>) -> Self {
        Self {
            target: ReferenceTarget::Unresolved(id.into()),
            resolve_info,
        }
    }

    pub fn resolve_info_only(resolve_info: impl Into<String>) -> Self {
        Self {
            target: ReferenceTarget::None,
            resolve_info: Some(resolve_info.into()),
        }
    }

    pub fn referred(&self) -> Option<NodeHandle> {
        match self.target {
            ReferenceTarget::Node(handle) => Some(handle),
            _ => None,
        }
    }

    pub fn is_resolved(&self) -> bool {
        matches!(self.target, ReferenceTarget::Node(_))
    }
}
