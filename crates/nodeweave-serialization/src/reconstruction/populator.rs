// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

use super::sorting::sort_root_first;
use super::Deserialized;
use crate::chunk::{SerializedChunk, SerializedClassifierInstance, SerializedReferenceTarget};
use crate::classifier_resolver::ClassifierResolver;
use crate::instance_resolver::{CompositeResolver, InstanceResolver, MapBasedResolver};
use crate::instantiator::{InstantiationContext, Instantiator};
use crate::primitive_values::PrimitiveValuesSerialization;
use ahash::{AHashMap, AHashSet};
use nodeweave_structures::language::{Classifier, Feature};
use nodeweave_structures::model::{ClassifierInstance, NodeGraph, NodeHandle, PropertyValue, ReferenceTarget, ReferenceValue};
use nodeweave_structures::{ModelError, UnavailableNodePolicy};
use std::sync::Arc;
use tracing::{debug, trace, warn};

/// One reconstruction run, borrowing the registries and policies of the engine
pub(crate) struct Reconstruction<'e> {
    pub(crate) classifiers: &'e ClassifierResolver,
    pub(crate) primitives: &'e PrimitiveValuesSerialization,
    pub(crate) instantiator: &'e Instantiator,
    pub(crate) parent_policy: UnavailableNodePolicy,
    pub(crate) children_policy: UnavailableNodePolicy,
    pub(crate) reference_policy: UnavailableNodePolicy,
}

/// Id lookups available while a chunk is being reconstructed
struct Lookup {
    /// Nodes created by this run
    local: MapBasedResolver,
    /// Nodes the target graph held before this run
    previously_known: MapBasedResolver,
    proxies: AHashMap<String, NodeHandle>,
    created_proxies: Vec<NodeHandle>,
}

impl Lookup {
    /// Real nodes only. Proxies are handed out by [`Lookup::proxy_for`] under the policy that asks
    /// for them.
    fn resolve(&self, id: &str) -> Option<NodeHandle> {
        CompositeResolver::new(vec![&self.local as &dyn InstanceResolver, &self.previously_known]).resolve(id)
    }

    fn proxy_for(&mut self, id: &str, graph: &mut NodeGraph) -> Result<NodeHandle, ModelError> {
        if let Some(handle) = self.proxies.get(id) {
            return Ok(*handle);
        }
        let handle = graph.create_proxy(id)?;
        debug!("Created proxy node {} for unavailable id {}", handle, id);
        self.proxies.insert(id.to_string(), handle);
        self.created_proxies.push(handle);
        Ok(handle)
    }
}

impl Reconstruction<'_> {
    /// Adds the nodes of `chunk` to `graph`. On error the graph may hold a partial result, callers
    /// are expected to run this against a scratch copy.
    pub(crate) fn run(&self, chunk: &SerializedChunk, graph: &mut NodeGraph) -> Result<Deserialized, ModelError> {
        let previously_known = MapBasedResolver::from_graph(graph);
        let sorted = sort_root_first(
            &chunk.nodes,
            &|id: &str| previously_known.contains(id),
            self.parent_policy,
        )?;
        check_unique_ids(&chunk.nodes)?;

        let classifiers = chunk
            .nodes
            .iter()
            .map(|node| self.classifier_of(node))
            .collect::<Result<Vec<_>, _>>()?;

        let mut lookup = Lookup {
            local: MapBasedResolver::new(),
            previously_known,
            proxies: AHashMap::new(),
            created_proxies: Vec::new(),
        };

        //region Instantiate, leaves first
        let mut handles: Vec<Option<NodeHandle>> = vec![None; chunk.nodes.len()];
        for index in sorted.leaves_first() {
            let node = &chunk.nodes[index];
            let instance = self.instantiate(node, &classifiers[index], graph, &lookup)?;
            let handle = graph.insert(instance)?;
            trace!("Instantiated {:?} as {}", node.id, handle);
            if let Some(id) = &node.id {
                lookup.local.add(id.clone(), handle);
            }
            handles[index] = Some(handle);
        }
        let handles: Vec<NodeHandle> = handles.into_iter().flatten().collect();
        //endregion

        if self.parent_policy == UnavailableNodePolicy::ProxyNodes {
            for parent_id in &sorted.unavailable_parents {
                lookup.proxy_for(parent_id, graph)?;
            }
        }

        //region Populate, in chunk order
        for (index, node) in chunk.nodes.iter().enumerate() {
            let classifier = &classifiers[index];
            self.populate_containments(node, classifier, handles[index], graph, &mut lookup)?;
            self.populate_references(node, classifier, handles[index], graph, &mut lookup)?;
            self.populate_annotations(node, handles[index], graph, &lookup)?;
        }
        for (index, node) in chunk.nodes.iter().enumerate() {
            self.attach_to_parent(node, &classifiers[index], handles[index], graph, &lookup)?;
        }
        //endregion

        debug!(
            "Reconstructed {} nodes and {} proxies",
            handles.len(),
            lookup.created_proxies.len()
        );
        Ok(Deserialized {
            instances: handles,
            proxies: lookup.created_proxies,
        })
    }

    fn classifier_of(&self, node: &SerializedClassifierInstance) -> Result<Arc<Classifier>, ModelError> {
        match &node.classifier {
            Some(meta_pointer) => self.classifiers.resolve_classifier(meta_pointer),
            None => Err(ModelError::Instantiation(format!(
                "node {:?} has no classifier",
                node.id
            ))),
        }
    }

    fn property_values<'c>(
        &self,
        node: &SerializedClassifierInstance,
        classifier: &'c Classifier,
    ) -> Result<Vec<(&'c Feature, Option<PropertyValue>)>, ModelError> {
        let mut values = Vec::with_capacity(node.properties.len());
        for serialized in &node.properties {
            let property = ClassifierResolver::resolve_feature(classifier, &serialized.property, "property")?;
            let Some(data_type) = property.data_type() else {
                continue;
            };
            let value = self
                .primitives
                .deserialize(data_type, serialized.value.as_deref(), property.is_required())
                .map_err(|e| match e {
                    ModelError::MissingRequiredValue(_) => {
                        ModelError::MissingRequiredValue(property.meta_pointer().to_string())
                    }
                    other => other,
                })?;
            values.push((property, value));
        }
        Ok(values)
    }

    fn instantiate(
        &self,
        node: &SerializedClassifierInstance,
        classifier: &Arc<Classifier>,
        graph: &NodeGraph,
        lookup: &Lookup,
    ) -> Result<ClassifierInstance, ModelError> {
        let property_values = self.property_values(node, classifier)?;
        let resolver = CompositeResolver::new(vec![&lookup.local as &dyn InstanceResolver, &lookup.previously_known]);
        let context = InstantiationContext {
            classifier,
            serialized: node,
            property_values: &property_values,
            graph,
            resolver: &resolver,
        };
        let mut instance = self.instantiator.instantiate(&context)?;

        for (property, value) in property_values {
            if instance.property_value(property)? == value.as_ref() {
                continue;
            }
            instance.restore_property_value(property, value)?;
        }
        Ok(instance)
    }

    fn populate_containments(
        &self,
        node: &SerializedClassifierInstance,
        classifier: &Classifier,
        handle: NodeHandle,
        graph: &mut NodeGraph,
        lookup: &mut Lookup,
    ) -> Result<(), ModelError> {
        for containment_value in &node.containments {
            let containment =
                ClassifierResolver::resolve_feature(classifier, &containment_value.containment, "containment")?;
            for child_id in &containment_value.children {
                let child = match lookup.resolve(child_id) {
                    Some(child) => child,
                    None => match self.children_policy {
                        UnavailableNodePolicy::ThrowError => {
                            return Err(ModelError::UnavailableChild {
                                parent_id: node.id.clone(),
                                child_id: child_id.clone(),
                            })
                        }
                        UnavailableNodePolicy::NullReferences => {
                            warn!("Dropping unavailable child {} of {:?}", child_id, node.id);
                            continue;
                        }
                        UnavailableNodePolicy::ProxyNodes => lookup.proxy_for(child_id, graph)?,
                    },
                };
                graph.add_child(handle, containment, child)?;
            }
        }
        Ok(())
    }

    fn populate_references(
        &self,
        node: &SerializedClassifierInstance,
        classifier: &Classifier,
        handle: NodeHandle,
        graph: &mut NodeGraph,
        lookup: &mut Lookup,
    ) -> Result<(), ModelError> {
        for reference_value in &node.references {
            let reference = ClassifierResolver::resolve_feature(classifier, &reference_value.reference, "reference")?;
            for target in &reference_value.targets {
                let value = self.reference_value(node, target, graph, lookup)?;
                graph.add_reference_value(handle, reference, value)?;
            }
        }
        Ok(())
    }

    fn reference_value(
        &self,
        node: &SerializedClassifierInstance,
        target: &SerializedReferenceTarget,
        graph: &mut NodeGraph,
        lookup: &mut Lookup,
    ) -> Result<ReferenceValue, ModelError> {
        let resolve_info = target.resolve_info.clone();
        let Some(referred_id) = target.reference.as_deref() else {
            return Ok(ReferenceValue {
                target: ReferenceTarget::None,
                resolve_info,
            });
        };
        if let Some(referred) = lookup.resolve(referred_id) {
            return Ok(ReferenceValue::to_node(referred, resolve_info));
        }
        match self.reference_policy {
            UnavailableNodePolicy::ThrowError => Err(ModelError::UnavailableReferenceTarget {
                source_id: node.id.clone(),
                target_id: referred_id.to_string(),
            }),
            UnavailableNodePolicy::NullReferences => {
                warn!(
                    "Dropping unavailable reference target {} of {:?}",
                    referred_id, node.id
                );
                Ok(ReferenceValue {
                    target: ReferenceTarget::None,
                    resolve_info,
                })
            }
            UnavailableNodePolicy::ProxyNodes => Ok(ReferenceValue::to_node(
                lookup.proxy_for(referred_id, graph)?,
                resolve_info,
            )),
        }
    }

    /// Attaches the annotation instances a node lists. A proxy cannot stand in for an annotation,
    /// so unresolvable ids are dropped under both lenient policies.
    fn populate_annotations(
        &self,
        node: &SerializedClassifierInstance,
        handle: NodeHandle,
        graph: &mut NodeGraph,
        lookup: &Lookup,
    ) -> Result<(), ModelError> {
        for annotation_id in &node.annotations {
            match lookup.resolve(annotation_id) {
                Some(annotation) if !graph.is_proxy(annotation) => graph.add_annotation(handle, annotation)?,
                _ => {
                    if self.children_policy == UnavailableNodePolicy::ThrowError {
                        return Err(ModelError::UnavailableChild {
                            parent_id: node.id.clone(),
                            child_id: annotation_id.clone(),
                        });
                    }
                    warn!("Dropping unavailable annotation {} of {:?}", annotation_id, node.id);
                }
            }
        }
        Ok(())
    }

    /// Completes the parent edge of nodes that no containment or annotation list of the chunk
    /// claimed: nodes under a previously known node, under a proxy, or annotations whose owner did
    /// not list them.
    fn attach_to_parent(
        &self,
        node: &SerializedClassifierInstance,
        classifier: &Classifier,
        handle: NodeHandle,
        graph: &mut NodeGraph,
        lookup: &Lookup,
    ) -> Result<(), ModelError> {
        let parent = node.parent.as_deref().and_then(|id| {
            lookup.resolve(id).or_else(|| match self.parent_policy {
                UnavailableNodePolicy::ProxyNodes => lookup.proxies.get(id).copied(),
                _ => None,
            })
        });
        if classifier.is_annotation() {
            return match parent {
                Some(owner) if graph.is_proxy(owner) => graph.set_parent(handle, Some(owner)),
                Some(owner) => graph.add_annotation(owner, handle),
                None => Err(ModelError::DanglingAnnotation(node.id.clone())),
            };
        }
        let Some(parent) = parent else {
            return Ok(());
        };
        if graph.parent(handle)?.is_some() {
            return Ok(());
        }
        if graph.is_proxy(parent) {
            return graph.set_parent(handle, Some(parent));
        }
        let containment = fitting_containment(graph.classifier(parent)?, classifier, graph.instance(parent)?)?.cloned();
        match containment {
            Some(containment) => graph.add_child(parent, &containment, handle),
            None => {
                warn!(
                    "No single containment of {:?} can take {:?}, recording the parent edge only",
                    node.parent, node.id
                );
                graph.set_parent(handle, Some(parent))
            }
        }
    }
}

/// The one containment of `parent` that accepts a child of type `child`, if exactly one does.
/// Single-valued containments that already hold a child are not candidates.
fn fitting_containment<'c>(
    parent: &'c Classifier,
    child: &Classifier,
    instance: &ClassifierInstance,
) -> Result<Option<&'c Feature>, ModelError> {
    let mut fitting = None;
    for containment in parent.all_containments() {
        if containment.is_derived() || !containment.link_target().is_some_and(|target| child.is_subtype_of(target)) {
            continue;
        }
        if !containment.is_multiple() && !instance.children_in(containment)?.is_empty() {
            continue;
        }
        if fitting.is_some() {
            return Ok(None);
        }
        fitting = Some(containment);
    }
    Ok(fitting)
}

fn check_unique_ids(nodes: &[SerializedClassifierInstance]) -> Result<(), ModelError> {
    let mut seen: AHashSet<&str> = AHashSet::with_capacity(nodes.len());
    for id in nodes.iter().filter_map(|n| n.id.as_deref()) {
        if !seen.insert(id) {
            return Err(ModelError::DuplicateId(id.to_string()));
        }
    }
    Ok(())
}
