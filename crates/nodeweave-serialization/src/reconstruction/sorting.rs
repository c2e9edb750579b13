// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

use crate::chunk::SerializedClassifierInstance;
use ahash::{AHashMap, AHashSet};
use nodeweave_structures::{ModelError, UnavailableNodePolicy};

/// The nodes of a chunk ordered so that every parent comes before its children
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct SortedInstances {
    /// Indexes into the chunk's node list
    pub(crate) root_first: Vec<usize>,
    /// Parent ids found neither in the chunk nor among the already known nodes, in first-seen order
    pub(crate) unavailable_parents: Vec<String>,
}

impl SortedInstances {
    /// Children come before their parents
    pub(crate) fn leaves_first(&self) -> impl Iterator<Item = usize> + '_ {
        self.root_first.iter().rev().copied()
    }
}

/// Orders the nodes of a chunk by containment.
///
/// A node is a root when it has no parent or when its parent is not part of the chunk. A parent
/// that is neither in the chunk nor reported by `is_known` is unavailable: with
/// [`UnavailableNodePolicy::ThrowError`] that fails the whole sort, otherwise the node is kept as
/// a root and the parent id is recorded.
pub(crate) fn sort_root_first(
    nodes: &[SerializedClassifierInstance],
    is_known: &dyn Fn(&str) -> bool,
    parent_policy: UnavailableNodePolicy,
) -> Result<SortedInstances, ModelError> {
    let in_chunk: AHashSet<&str> = nodes.iter().filter_map(|n| n.id.as_deref()).collect();

    let mut unavailable_parents: Vec<String> = Vec::new();
    for node in nodes {
        let Some(parent) = node.parent.as_deref() else {
            continue;
        };
        if in_chunk.contains(parent) || is_known(parent) {
            continue;
        }
        if parent_policy == UnavailableNodePolicy::ThrowError {
            return Err(ModelError::UnavailableParent {
                child_id: node.id.clone(),
                parent_id: parent.to_string(),
            });
        }
        if !unavailable_parents.iter().any(|p| p == parent) {
            unavailable_parents.push(parent.to_string());
        }
    }

    let mut root_first: Vec<usize> = Vec::with_capacity(nodes.len());
    let mut children_by_parent: AHashMap<&str, Vec<usize>> = AHashMap::new();
    for (index, node) in nodes.iter().enumerate() {
        match node.parent.as_deref() {
            Some(parent) if in_chunk.contains(parent) => {
                children_by_parent.entry(parent).or_default().push(index)
            }
            _ => root_first.push(index),
        }
    }

    if root_first.is_empty() && !nodes.is_empty() {
        return Err(ModelError::NoRootFound {
            unplaced: nodes.iter().map(|n| n.id.clone()).collect(),
        });
    }

    let mut cursor = 0;
    while cursor < root_first.len() {
        if let Some(id) = nodes[root_first[cursor]].id.as_deref() {
            if let Some(children) = children_by_parent.remove(id) {
                root_first.extend(children);
            }
        }
        cursor += 1;
    }

    if root_first.len() < nodes.len() {
        let placed: AHashSet<usize> = root_first.iter().copied().collect();
        return Err(ModelError::ContainmentCycle {
            unplaced: (0..nodes.len())
                .filter(|i| !placed.contains(i))
                .map(|i| nodes[i].id.clone())
                .collect(),
        });
    }

    Ok(SortedInstances {
        root_first,
        unavailable_parents,
    })
}
