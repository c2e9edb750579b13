// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Turning a [`SerializedChunk`](crate::chunk::SerializedChunk) back into nodes of a
//! [`NodeGraph`](nodeweave_structures::model::NodeGraph).
//!
//! Reconstruction runs in three steps: the nodes are sorted so parents precede children, instances
//! are created leaves first, and then properties, children, references and annotations are wired
//! in the order the nodes appear in the chunk.

mod populator;
mod sorting;

pub(crate) use populator::Reconstruction;

use nodeweave_structures::model::NodeHandle;

/// Handles of the nodes created by one deserialization call
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Deserialized {
    /// One handle per node of the chunk, in chunk order
    pub instances: Vec<NodeHandle>,
    /// Placeholders created for ids that could not be resolved, in creation order
    pub proxies: Vec<NodeHandle>,
}

impl Deserialized {
    /// Instances followed by proxies
    pub fn all(&self) -> Vec<NodeHandle> {
        self.instances.iter().chain(self.proxies.iter()).copied().collect()
    }

    pub fn len(&self) -> usize {
        self.instances.len() + self.proxies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instances.is_empty() && self.proxies.is_empty()
    }
}
