// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

use crate::language::{Classifier, Feature};
use crate::model::{ClassifierInstance, PropertyValue, ProxyNode, ReferenceTarget, ReferenceValue};
use crate::ModelError;
use ahash::AHashMap;
use std::fmt::{Display, Formatter};
use std::sync::Arc;

/// Index of an entry in a [`NodeGraph`]. Handles are only meaningful for the graph (or a clone of
/// the graph) that produced them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeHandle(usize);

impl NodeHandle {
    pub fn index(&self) -> usize {
        self.0
    }
}

impl Display for NodeHandle {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A slot of the graph: either a real instance or a placeholder for an unavailable node.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeEntry {
    Instance(ClassifierInstance),
    Proxy(ProxyNode),
}

impl NodeEntry {
    pub fn id(&self) -> Option<&str> {
        match self {
            NodeEntry::Instance(instance) => instance.id(),
            NodeEntry::Proxy(proxy) => Some(proxy.id()),
        }
    }

    pub fn is_proxy(&self) -> bool {
        matches!(self, NodeEntry::Proxy(_))
    }
}

/// Arena owning every node of a model.
///
/// Nodes refer to each other through [`NodeHandle`]s. Containment is the only ownership relation:
/// a child appears in exactly one containment of its parent and records that parent. The only
/// parent-only edges are those set through [`NodeGraph::set_parent`]: a node hung under a proxy, or
/// a deserialized node whose parent offers no single containment for it. Detached nodes stay in the
/// arena as roots.
///
/// # Example
/// ```
/// use nodeweave_structures::language::{builtins, Classifier, Feature, LanguageRef};
/// use nodeweave_structures::model::{NodeGraph, PropertyValue};
///
/// let language = LanguageRef::new("todo", "1");
/// let task = Classifier::concept("todo-Task", "Task", "Task", &language)
///     .feature(Feature::property("todo-Task-done", "done", "done", &builtins::boolean()))
///     .build();
///
/// let mut graph = NodeGraph::new();
/// let node = graph.create_node("t1", &task).unwrap();
/// let done = &task.features()[0];
/// graph.instance_mut(node).unwrap().set_property_value(done, Some(true.into())).unwrap();
/// assert_eq!(graph.property_value(node, done).unwrap(), Some(&PropertyValue::Boolean(true)));
/// assert_eq!(graph.roots(), vec![node]);
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NodeGraph {
    entries: Vec<NodeEntry>,
    by_id: AHashMap<String, NodeHandle>,
}

impl NodeGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn handles(&self) -> impl Iterator<Item = NodeHandle> + '_ {
        (0..self.entries.len()).map(NodeHandle)
    }

    //region Creation

    /// Adds an instance built elsewhere. Fails if its id is already taken.
    pub fn insert(&mut self, instance: ClassifierInstance) -> Result<NodeHandle, ModelError> {
        let id = instance.id().map(str::to_string);
        self.push(id, NodeEntry::Instance(instance))
    }

    pub fn create_node(
        &mut self,
        id: impl Into<String>,
        classifier: &Arc<Classifier>,
    ) -> Result<NodeHandle, ModelError> {
        self.insert(ClassifierInstance::new(Some(id.into()), classifier))
    }

    /// Adds a placeholder for a node that is known only by id
    pub fn create_proxy(&mut self, id: impl Into<String>) -> Result<NodeHandle, ModelError> {
        let id = id.into();
        self.push(Some(id.clone()), NodeEntry::Proxy(ProxyNode::new(id)))
    }

    fn push(&mut self, id: Option<String>, entry: NodeEntry) -> Result<NodeHandle, ModelError> {
        let handle = NodeHandle(self.entries.len());
        if let Some(id) = id {
            if self.by_id.contains_key(&id) {
                return Err(ModelError::DuplicateId(id));
            }
            self.by_id.insert(id, handle);
        }
        self.entries.push(entry);
        Ok(handle)
    }

    //endregion

    //region Lookup

    pub fn entry(&self, handle: NodeHandle) -> Result<&NodeEntry, ModelError> {
        self.entries
            .get(handle.0)
            .ok_or_else(|| ModelError::BadParameters(format!("Unknown node handle {}", handle)))
    }

    pub fn find(&self, id: &str) -> Option<NodeHandle> {
        self.by_id.get(id).copied()
    }

    pub fn id(&self, handle: NodeHandle) -> Option<&str> {
        self.entries.get(handle.0).and_then(NodeEntry::id)
    }

    pub fn is_proxy(&self, handle: NodeHandle) -> bool {
        matches!(self.entries.get(handle.0), Some(NodeEntry::Proxy(_)))
    }

    pub fn proxies(&self) -> impl Iterator<Item = NodeHandle> + '_ {
        self.handles().filter(|handle| self.is_proxy(*handle))
    }

    /// The real instance behind a handle. Proxies fail with [`ModelError::ProxyAccess`].
    pub fn instance(&self, handle: NodeHandle) -> Result<&ClassifierInstance, ModelError> {
        self.instance_for(handle, "access the instance")
    }

    pub fn instance_mut(&mut self, handle: NodeHandle) -> Result<&mut ClassifierInstance, ModelError> {
        match self.entries.get_mut(handle.0) {
            Some(NodeEntry::Instance(instance)) => Ok(instance),
            Some(NodeEntry::Proxy(proxy)) => Err(proxy.unsupported("modify the instance")),
            None => Err(ModelError::BadParameters(format!("Unknown node handle {}", handle))),
        }
    }

    fn instance_for(&self, handle: NodeHandle, operation: &'static str) -> Result<&ClassifierInstance, ModelError> {
        match self.entry(handle)? {
            NodeEntry::Instance(instance) => Ok(instance),
            NodeEntry::Proxy(proxy) => Err(proxy.unsupported(operation)),
        }
    }

    pub fn classifier(&self, handle: NodeHandle) -> Result<&Arc<Classifier>, ModelError> {
        Ok(self.instance_for(handle, "get the classifier")?.classifier())
    }

    pub fn parent(&self, handle: NodeHandle) -> Result<Option<NodeHandle>, ModelError> {
        Ok(self.instance_for(handle, "get the parent")?.parent())
    }

    pub fn property_value(
        &self,
        handle: NodeHandle,
        property: &Feature,
    ) -> Result<Option<&PropertyValue>, ModelError> {
        self.instance_for(handle, "read properties")?.property_value(property)
    }

    /// Real instances without a parent, in creation order
    pub fn roots(&self) -> Vec<NodeHandle> {
        self.handles()
            .filter(|handle| match &self.entries[handle.0] {
                NodeEntry::Instance(instance) => instance.parent().is_none(),
                NodeEntry::Proxy(_) => false,
            })
            .collect()
    }

    //endregion

    //region Containment

    /// All children across every containment, in the order the classifier lists its containments
    pub fn children(&self, handle: NodeHandle) -> Result<Vec<NodeHandle>, ModelError> {
        let instance = self.instance_for(handle, "read children")?;
        let mut seen = Vec::new();
        let mut result = Vec::new();
        for containment in instance.classifier().all_containments() {
            let meta_pointer = containment.meta_pointer();
            if seen.contains(&meta_pointer) {
                continue;
            }
            if let Some(children) = instance.containments.get(&meta_pointer) {
                result.extend(children.iter().copied());
            }
            seen.push(meta_pointer);
        }
        Ok(result)
    }

    pub fn children_in(&self, handle: NodeHandle, containment: &Feature) -> Result<&[NodeHandle], ModelError> {
        self.instance_for(handle, "read children")?.children_in(containment)
    }

    /// Appends a child to a containment of `parent` and makes `parent` its parent.
    ///
    /// Adding a child that is already in that containment does nothing. A child held elsewhere is
    /// moved. Single-valued containments accept one child only.
    pub fn add_child(
        &mut self,
        parent: NodeHandle,
        containment: &Feature,
        child: NodeHandle,
    ) -> Result<(), ModelError> {
        self.entry(child)?;
        let parent_instance = self.instance_for(parent, "add children")?;
        parent_instance.check_feature(containment, "containment")?;
        if containment.is_derived() {
            return Err(ModelError::DerivedFeature(containment.meta_pointer().to_string()));
        }
        let meta_pointer = containment.meta_pointer();
        let existing = parent_instance.containments.get(&meta_pointer);
        if existing.is_some_and(|children| children.contains(&child)) {
            return Ok(());
        }
        if !containment.is_multiple() && existing.is_some_and(|children| !children.is_empty()) {
            return Err(ModelError::CardinalityExceeded(meta_pointer.to_string()));
        }
        if self.is_ancestor_or_self(child, parent) {
            return Err(ModelError::BadParameters(format!(
                "Adding {:?} under {:?} would create a containment loop",
                self.id(child),
                self.id(parent)
            )));
        }

        if let NodeEntry::Instance(child_instance) = &self.entries[child.0] {
            if let Some(previous) = child_instance.parent() {
                if let Some(NodeEntry::Instance(previous_parent)) = self.entries.get_mut(previous.0) {
                    previous_parent.detach(child);
                }
            }
        }
        if let NodeEntry::Instance(parent_instance) = &mut self.entries[parent.0] {
            parent_instance.containments.entry(meta_pointer).or_default().push(child);
        }
        if let NodeEntry::Instance(child_instance) = &mut self.entries[child.0] {
            child_instance.parent = Some(parent);
        }
        Ok(())
    }

    /// Removes a child from whichever containment of `parent` holds it. The child becomes a root.
    pub fn remove_child(&mut self, parent: NodeHandle, child: NodeHandle) -> Result<(), ModelError> {
        let parent_instance = self.instance_for(parent, "remove children")?;
        if parent_instance.containment_of(child).is_none() {
            return Err(ModelError::NotAChild {
                parent: self.id(parent).map(str::to_string),
                child: self.id(child).map(str::to_string),
            });
        }
        if let NodeEntry::Instance(parent_instance) = &mut self.entries[parent.0] {
            parent_instance.detach(child);
        }
        if let Some(NodeEntry::Instance(child_instance)) = self.entries.get_mut(child.0) {
            child_instance.parent = None;
        }
        Ok(())
    }

    /// Sets the parent edge only, leaving containment lists alone. Used to hang a node under a
    /// proxy, which has no containments to record it in.
    pub fn set_parent(&mut self, handle: NodeHandle, parent: Option<NodeHandle>) -> Result<(), ModelError> {
        if let Some(parent) = parent {
            self.entry(parent)?;
        }
        match self.entries.get_mut(handle.0) {
            Some(NodeEntry::Instance(instance)) => {
                instance.parent = parent;
                Ok(())
            }
            Some(NodeEntry::Proxy(proxy)) => Err(proxy.unsupported("set the parent")),
            None => Err(ModelError::BadParameters(format!("Unknown node handle {}", handle))),
        }
    }

    fn is_ancestor_or_self(&self, candidate: NodeHandle, handle: NodeHandle) -> bool {
        let mut current = Some(handle);
        let mut steps = 0;
        while let Some(node) = current {
            if node == candidate {
                return true;
            }
            steps += 1;
            if steps > self.entries.len() {
                return false;
            }
            current = match self.entries.get(node.0) {
                Some(NodeEntry::Instance(instance)) => instance.parent(),
                _ => None,
            };
        }
        false
    }

    //endregion

    //region References

    pub fn reference_values(
        &self,
        handle: NodeHandle,
        reference: &Feature,
    ) -> Result<&[ReferenceValue], ModelError> {
        self.instance_for(handle, "read references")?.reference_values(reference)
    }

    /// The nodes referred by a reference, skipping entries without a resolved target
    pub fn referred_nodes(&self, handle: NodeHandle, reference: &Feature) -> Result<Vec<NodeHandle>, ModelError> {
        Ok(self
            .reference_values(handle, reference)?
            .iter()
            .filter_map(ReferenceValue::referred)
            .collect())
    }

    /// Appends a value to a multiple reference, or replaces the value of a single one
    pub fn add_reference_value(
        &mut self,
        handle: NodeHandle,
        reference: &Feature,
        value: ReferenceValue,
    ) -> Result<(), ModelError> {
        if let ReferenceTarget::Node(target) = value.target {
            self.entry(target)?;
        }
        if reference.is_derived() {
            return Err(ModelError::DerivedFeature(reference.meta_pointer().to_string()));
        }
        let instance = match self.entries.get_mut(handle.0) {
            Some(NodeEntry::Instance(instance)) => instance,
            Some(NodeEntry::Proxy(proxy)) => return Err(proxy.unsupported("add references")),
            None => return Err(ModelError::BadParameters(format!("Unknown node handle {}", handle))),
        };
        instance.check_feature(reference, "reference")?;
        let values = instance.references.entry(reference.meta_pointer()).or_default();
        if !reference.is_multiple() {
            values.clear();
        }
        values.push(value);
        Ok(())
    }

    //endregion

    //region Annotations

    pub fn annotations(&self, handle: NodeHandle) -> Result<&[NodeHandle], ModelError> {
        Ok(self.instance_for(handle, "read annotations")?.annotations())
    }

    /// Attaches an annotation instance to `owner` and makes `owner` its parent. Attaching an
    /// annotation that is already there does nothing.
    pub fn add_annotation(&mut self, owner: NodeHandle, annotation: NodeHandle) -> Result<(), ModelError> {
        let owner_instance = self.instance_for(owner, "add annotations")?;
        if owner_instance.annotations.contains(&annotation) {
            return Ok(());
        }
        let annotation_instance = self.instance_for(annotation, "annotate")?;
        if !annotation_instance.classifier().is_annotation() {
            return Err(ModelError::BadParameters(format!(
                "{} is not an annotation and cannot be attached to {:?}",
                annotation_instance.classifier(),
                self.id(owner)
            )));
        }
        if let Some(previous) = annotation_instance.parent() {
            if let Some(NodeEntry::Instance(previous_owner)) = self.entries.get_mut(previous.0) {
                previous_owner.detach(annotation);
            }
        }
        if let NodeEntry::Instance(owner_instance) = &mut self.entries[owner.0] {
            owner_instance.annotations.push(annotation);
        }
        if let NodeEntry::Instance(annotation_instance) = &mut self.entries[annotation.0] {
            annotation_instance.parent = Some(owner);
        }
        Ok(())
    }

    pub fn remove_annotation(&mut self, owner: NodeHandle, annotation: NodeHandle) -> Result<(), ModelError> {
        if !self.annotations(owner)?.contains(&annotation) {
            return Err(ModelError::NotAChild {
                parent: self.id(owner).map(str::to_string),
                child: self.id(annotation).map(str::to_string),
            });
        }
        if let NodeEntry::Instance(owner_instance) = &mut self.entries[owner.0] {
            owner_instance.detach(annotation);
        }
        if let Some(NodeEntry::Instance(annotation_instance)) = self.entries.get_mut(annotation.0) {
            annotation_instance.parent = None;
        }
        Ok(())
    }

    //endregion

    /// The node followed by all its descendants, depth first in containment order. Proxies are
    /// included as leaves. Annotations are not part of the tree.
    pub fn this_and_all_descendants(&self, handle: NodeHandle) -> Result<Vec<NodeHandle>, ModelError> {
        let mut result = Vec::new();
        let mut pending = vec![handle];
        while let Some(next) = pending.pop() {
            result.push(next);
            if let NodeEntry::Instance(_) = self.entry(next)? {
                let mut children = self.children(next)?;
                children.reverse();
                pending.extend(children);
            }
        }
        Ok(result)
    }
}
