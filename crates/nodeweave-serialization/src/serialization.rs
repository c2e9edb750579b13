// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

use crate::chunk::{
    SerializedChunk, SerializedClassifierInstance, SerializedReferenceTarget, UsedLanguage,
    SERIALIZATION_FORMAT_VERSION,
};
use crate::classifier_resolver::ClassifierResolver;
use crate::codecs::CodecKind;
use crate::instantiator::Instantiator;
use crate::primitive_values::PrimitiveValuesSerialization;
use crate::reconstruction::{Deserialized, Reconstruction};
use ahash::AHashSet;
use nodeweave_structures::language::{builtins, FeatureKind, Language, MetaPointer};
use nodeweave_structures::model::{NodeGraph, NodeHandle, ReferenceTarget};
use nodeweave_structures::{ModelError, UnavailableNodePolicy};
use tracing::debug;

/// Converts nodes of a [`NodeGraph`] to and from [`SerializedChunk`]s and encoded bytes.
///
/// An engine is configured once (languages, primitive serializers, constructors, policies) and
/// then used for any number of calls. Every call either completes or fails as a whole: a failed
/// deserialization never hands back a partial graph.
///
/// The registries are plain owned values. Sharing an engine between threads is fine for
/// serialize/deserialize calls, which only read them. Registering anything while a call is in
/// flight needs external synchronisation.
///
/// # Example
/// ```
/// use nodeweave_serialization::{CodecKind, Serialization};
/// use nodeweave_structures::language::{builtins, Classifier, Feature, Language};
/// use nodeweave_structures::model::NodeGraph;
///
/// let mut language = Language::new("todo-id", "todo", "Todo", "1");
/// let task = Classifier::concept("todo-Task", "Task", "Task", &language.language_ref())
///     .feature(Feature::property("todo-Task-done", "done", "done", &builtins::boolean()))
///     .build();
/// language.add_classifier(&task).unwrap();
///
/// let mut engine = Serialization::standard();
/// engine.register_language(&language);
/// engine.enable_dynamic_instantiation();
///
/// let mut graph = NodeGraph::new();
/// let node = graph.create_node("t1", &task).unwrap();
/// let bytes = engine.serialize(&graph, &[node], CodecKind::Binary).unwrap();
/// let (copy, deserialized) = engine.deserialize(&bytes, CodecKind::Binary).unwrap();
/// assert_eq!(copy.id(deserialized.instances[0]), Some("t1"));
/// ```
#[derive(Debug, Default)]
pub struct Serialization {
    classifier_resolver: ClassifierResolver,
    primitive_values: PrimitiveValuesSerialization,
    instantiator: Instantiator,
    unavailable_parent_policy: UnavailableNodePolicy,
    unavailable_children_policy: UnavailableNodePolicy,
    unavailable_reference_target_policy: UnavailableNodePolicy,
    pretty_json: bool,
}

impl Serialization {
    //region Constructors

    /// An engine that knows no language and no primitive type
    pub fn basic() -> Self {
        Self::default()
    }

    /// An engine that knows the built-in language and the string forms of its primitive types
    pub fn standard() -> Self {
        let mut serialization = Self::basic();
        serialization.primitive_values.register_builtins();
        serialization.register_language(&builtins::language());
        serialization
    }

    //endregion

    //region Configuration

    /// Makes the classifiers and enumerations of a language resolvable
    pub fn register_language(&mut self, language: &Language) {
        self.classifier_resolver.register_language(language);
        self.primitive_values.register_language(language);
    }

    pub fn enable_dynamic_instantiation(&mut self) {
        self.instantiator.enable_dynamic_instantiation();
    }

    pub fn set_unavailable_parent_policy(&mut self, policy: UnavailableNodePolicy) {
        self.unavailable_parent_policy = policy;
    }

    pub fn set_unavailable_children_policy(&mut self, policy: UnavailableNodePolicy) {
        self.unavailable_children_policy = policy;
    }

    pub fn set_unavailable_reference_target_policy(&mut self, policy: UnavailableNodePolicy) {
        self.unavailable_reference_target_policy = policy;
    }

    /// Sets all three unavailable-node policies at once
    pub fn set_all_unavailability_policies(&mut self, policy: UnavailableNodePolicy) {
        self.unavailable_parent_policy = policy;
        self.unavailable_children_policy = policy;
        self.unavailable_reference_target_policy = policy;
    }

    pub fn unavailable_parent_policy(&self) -> UnavailableNodePolicy {
        self.unavailable_parent_policy
    }

    pub fn unavailable_children_policy(&self) -> UnavailableNodePolicy {
        self.unavailable_children_policy
    }

    pub fn unavailable_reference_target_policy(&self) -> UnavailableNodePolicy {
        self.unavailable_reference_target_policy
    }

    /// Whether the JSON codec picked by [`Serialization::serialize`] indents its output
    pub fn set_pretty_json(&mut self, pretty: bool) {
        self.pretty_json = pretty;
    }

    pub fn classifier_resolver(&self) -> &ClassifierResolver {
        &self.classifier_resolver
    }

    pub fn classifier_resolver_mut(&mut self) -> &mut ClassifierResolver {
        &mut self.classifier_resolver
    }

    pub fn instantiator(&self) -> &Instantiator {
        &self.instantiator
    }

    pub fn instantiator_mut(&mut self) -> &mut Instantiator {
        &mut self.instantiator
    }

    pub fn primitive_values(&self) -> &PrimitiveValuesSerialization {
        &self.primitive_values
    }

    pub fn primitive_values_mut(&mut self) -> &mut PrimitiveValuesSerialization {
        &mut self.primitive_values
    }

    //endregion

    //region Serialization

    /// Serializes exactly the given nodes, each followed by its annotations. Any proxy among them
    /// fails the call.
    pub fn serialize_nodes(&self, graph: &NodeGraph, handles: &[NodeHandle]) -> Result<SerializedChunk, ModelError> {
        let mut ordered = Vec::with_capacity(handles.len());
        let mut emitted = AHashSet::new();
        for handle in handles {
            self.collect_with_annotations(graph, *handle, &mut ordered, &mut emitted)?;
        }
        self.serialize_ordered(graph, &ordered)
    }

    /// Serializes a node, its annotations and all its descendants. Proxy descendants are skipped.
    pub fn serialize_tree(&self, graph: &NodeGraph, root: NodeHandle) -> Result<SerializedChunk, ModelError> {
        if graph.is_proxy(root) {
            return Err(ModelError::ProxySerialization(
                graph.id(root).unwrap_or_default().to_string(),
            ));
        }
        let mut ordered = Vec::new();
        let mut emitted = AHashSet::new();
        collect_tree(graph, root, &mut ordered, &mut emitted)?;
        self.serialize_ordered(graph, &ordered)
    }

    /// Serializes several trees into one chunk. A node reachable from more than one root, or two
    /// nodes sharing an id, are written once.
    pub fn serialize_trees(&self, graph: &NodeGraph, roots: &[NodeHandle]) -> Result<SerializedChunk, ModelError> {
        let mut collected = Vec::new();
        let mut emitted = AHashSet::new();
        for root in roots {
            if graph.is_proxy(*root) {
                continue;
            }
            collect_tree(graph, *root, &mut collected, &mut emitted)?;
        }
        let mut seen_ids = AHashSet::new();
        let ordered: Vec<NodeHandle> = collected
            .into_iter()
            .filter(|handle| match graph.id(*handle) {
                Some(id) => seen_ids.insert(id),
                None => true,
            })
            .collect();
        self.serialize_ordered(graph, &ordered)
    }

    /// Serializes the given nodes and encodes the chunk
    pub fn serialize(&self, graph: &NodeGraph, handles: &[NodeHandle], codec: CodecKind) -> Result<Vec<u8>, ModelError> {
        let chunk = self.serialize_nodes(graph, handles)?;
        codec.create_codec(self.pretty_json).encode(&chunk)
    }

    fn collect_with_annotations(
        &self,
        graph: &NodeGraph,
        handle: NodeHandle,
        ordered: &mut Vec<NodeHandle>,
        emitted: &mut AHashSet<NodeHandle>,
    ) -> Result<(), ModelError> {
        if graph.is_proxy(handle) {
            return Err(ModelError::ProxySerialization(
                graph.id(handle).unwrap_or_default().to_string(),
            ));
        }
        if !emitted.insert(handle) {
            return Ok(());
        }
        ordered.push(handle);
        for annotation in graph.annotations(handle)? {
            self.collect_with_annotations(graph, *annotation, ordered, emitted)?;
        }
        Ok(())
    }

    fn serialize_ordered(&self, graph: &NodeGraph, ordered: &[NodeHandle]) -> Result<SerializedChunk, ModelError> {
        let mut chunk = SerializedChunk::default();
        for handle in ordered {
            let instance = self.serialize_instance(graph, *handle, &mut chunk)?;
            chunk.add_instance(instance);
        }
        debug!(
            "Serialized {} instances using {} languages",
            chunk.nodes.len(),
            chunk.languages.len()
        );
        Ok(chunk)
    }

    fn serialize_instance(
        &self,
        graph: &NodeGraph,
        handle: NodeHandle,
        chunk: &mut SerializedChunk,
    ) -> Result<SerializedClassifierInstance, ModelError> {
        let instance = graph.instance(handle)?;
        let classifier = instance.classifier();
        chunk.add_language(UsedLanguage::from(classifier.language()));

        let mut serialized =
            SerializedClassifierInstance::new(instance.id().map(str::to_string), classifier.meta_pointer());
        serialized.parent = match instance.parent() {
            Some(parent) => graph.id(parent).map(str::to_string),
            None => None,
        };

        let mut seen_features: Vec<MetaPointer> = Vec::new();
        for feature in classifier.all_features() {
            let meta_pointer = feature.meta_pointer();
            if seen_features.contains(&meta_pointer) {
                continue;
            }
            seen_features.push(meta_pointer.clone());
            chunk.add_language(UsedLanguage::from(feature.declaring_language()));

            match feature.kind() {
                FeatureKind::Property { data_type } => {
                    chunk.add_language(UsedLanguage::from(data_type.language()));
                    let value = instance
                        .property_value(feature)?
                        .map(|value| self.primitive_values.serialize(data_type, value))
                        .transpose()?;
                    serialized.add_property_value(meta_pointer, value);
                }
                FeatureKind::Containment { target, .. } => {
                    chunk.add_language(UsedLanguage::from(&target.language_ref()));
                    let children = instance
                        .children_in(feature)?
                        .iter()
                        .map(|child| required_id(graph, *child, "child"))
                        .collect::<Result<Vec<_>, _>>()?;
                    serialized.add_containment_value(meta_pointer, children);
                }
                FeatureKind::Reference { target, .. } => {
                    chunk.add_language(UsedLanguage::from(&target.language_ref()));
                    let targets = instance
                        .reference_values(feature)?
                        .iter()
                        .map(|value| SerializedReferenceTarget {
                            reference: match &value.target {
                                ReferenceTarget::Node(referred) => graph.id(*referred).map(str::to_string),
                                ReferenceTarget::Unresolved(id) => Some(id.clone()),
                                ReferenceTarget::None => None,
                            },
                            resolve_info: value.resolve_info.clone(),
                        })
                        .collect();
                    serialized.add_reference_value(meta_pointer, targets);
                }
            }
        }

        serialized.annotations = instance
            .annotations()
            .iter()
            .map(|annotation| required_id(graph, *annotation, "annotation"))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(serialized)
    }

    //endregion

    //region Deserialization

    /// Decodes bytes and rebuilds the nodes in a fresh graph
    pub fn deserialize(&self, bytes: &[u8], codec: CodecKind) -> Result<(NodeGraph, Deserialized), ModelError> {
        let chunk = codec.create_codec(false).decode(bytes)?;
        self.deserialize_chunk(&chunk)
    }

    /// Rebuilds the nodes of a chunk in a fresh graph
    pub fn deserialize_chunk(&self, chunk: &SerializedChunk) -> Result<(NodeGraph, Deserialized), ModelError> {
        let mut graph = NodeGraph::new();
        let deserialized = self.deserialize_into(chunk, &mut graph)?;
        Ok((graph, deserialized))
    }

    /// Adds the nodes of a chunk to an existing graph. Ids the chunk mentions are resolved first
    /// among the nodes of the chunk and then among the nodes already in `graph`.
    ///
    /// The graph is only modified if the whole chunk is reconstructed successfully.
    pub fn deserialize_into(&self, chunk: &SerializedChunk, graph: &mut NodeGraph) -> Result<Deserialized, ModelError> {
        self.check_format_version(chunk)?;
        let mut staging = graph.clone();
        let deserialized = self.reconstruction().run(chunk, &mut staging)?;
        *graph = staging;
        debug!(
            "Deserialized {} instances ({} proxies)",
            deserialized.instances.len(),
            deserialized.proxies.len()
        );
        Ok(deserialized)
    }

    fn check_format_version(&self, chunk: &SerializedChunk) -> Result<(), ModelError> {
        if chunk.serialization_format_version != SERIALIZATION_FORMAT_VERSION {
            return Err(ModelError::UnsupportedFormatVersion {
                found: chunk.serialization_format_version.clone(),
                expected: SERIALIZATION_FORMAT_VERSION.to_string(),
            });
        }
        Ok(())
    }

    fn reconstruction(&self) -> Reconstruction<'_> {
        Reconstruction {
            classifiers: &self.classifier_resolver,
            primitives: &self.primitive_values,
            instantiator: &self.instantiator,
            parent_policy: self.unavailable_parent_policy,
            children_policy: self.unavailable_children_policy,
            reference_policy: self.unavailable_reference_target_policy,
        }
    }

    //endregion
}

/// Self, then each annotation with its subtree, then each child subtree. Proxies are left out.
fn collect_tree(
    graph: &NodeGraph,
    handle: NodeHandle,
    ordered: &mut Vec<NodeHandle>,
    emitted: &mut AHashSet<NodeHandle>,
) -> Result<(), ModelError> {
    if graph.is_proxy(handle) || !emitted.insert(handle) {
        return Ok(());
    }
    ordered.push(handle);
    for annotation in graph.annotations(handle)? {
        collect_tree(graph, *annotation, ordered, emitted)?;
    }
    for child in graph.children(handle)? {
        collect_tree(graph, child, ordered, emitted)?;
    }
    Ok(())
}

fn required_id(graph: &NodeGraph, handle: NodeHandle, role: &str) -> Result<String, ModelError> {
    graph.id(handle).map(str::to_string).ok_or_else(|| {
        ModelError::BadParameters(format!("Cannot serialize a {} without an id ({})", role, handle))
    })
}
