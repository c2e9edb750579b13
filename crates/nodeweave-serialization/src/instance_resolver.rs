// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

use ahash::AHashMap;
use nodeweave_structures::model::{NodeGraph, NodeHandle};

/// Looks up nodes by id while a chunk is being turned back into a graph
pub trait InstanceResolver {
    fn resolve(&self, id: &str) -> Option<NodeHandle>;
}

#[derive(Debug, Clone, Default)]
pub struct MapBasedResolver {
    by_id: AHashMap<String, NodeHandle>,
}

impl MapBasedResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of every node (and proxy) of a graph that has an id
    pub fn from_graph(graph: &NodeGraph) -> Self {
        let by_id = graph
            .handles()
            .filter_map(|handle| graph.id(handle).map(|id| (id.to_string(), handle)))
            .collect();
        Self { by_id }
    }

    pub fn add(&mut self, id: impl Into<String>, handle: NodeHandle) {
        self.by_id.insert(id.into(), handle);
    }

    pub fn contains(&self, id: &str) -> bool {
        self.by_id.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }
}

impl InstanceResolver for MapBasedResolver {
    fn resolve(&self, id: &str) -> Option<NodeHandle> {
        self.by_id.get(id).copied()
    }
}

/// Tries each resolver in turn and returns the first hit
pub struct CompositeResolver<'a> {
    resolvers: Vec<&'a dyn InstanceResolver>,
}

impl<'a> CompositeResolver<'a> {
    pub fn new(resolvers: Vec<&'a dyn InstanceResolver>) -> Self {
        Self { resolvers }
    }
}

impl InstanceResolver for CompositeResolver<'_> {
    fn resolve(&self, id: &str) -> Option<NodeHandle> {
        self.resolvers.iter().find_map(|resolver| resolver.resolve(id))
    }
}
