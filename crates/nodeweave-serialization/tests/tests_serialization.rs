//! Tests for serializing node graphs
//!
//! Covers the exact shape of serialized properties, round trips through both codecs and the
//! hooks an engine offers for building instances.

mod common;

use common::{chunk, mp, node, LibraryLanguage};
use nodeweave_serialization::chunk::SerializedChunk;
use nodeweave_serialization::{BinaryCodec, ChunkCodec, CodecKind, InstantiationContext, JsonCodec, Serialization};
use nodeweave_structures::language::{builtins, Classifier, Feature, Language, MetaPointer};
use nodeweave_structures::model::{ClassifierInstance, NodeGraph, NodeHandle, PropertyValue, ReferenceValue};
use nodeweave_structures::ModelError;
use serde_json::json;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

fn my_language() -> (Language, Arc<Classifier>) {
    let mut language = Language::new("mylanguage-id", "mylanguage", "MyLanguage", "1");
    let concept = Classifier::concept(
        "concept-MyNodeWithProperties",
        "concept-MyNodeWithProperties",
        "MyNodeWithProperties",
        &language.language_ref(),
    )
    .feature(Feature::property("p1", "p1", "p1", &builtins::boolean()))
    .feature(Feature::property("p2", "p2", "p2", &builtins::integer()).optional())
    .feature(Feature::property("p3", "p3", "p3", &builtins::string()).optional())
    .feature(Feature::property("p4", "p4", "p4", &builtins::json()).optional())
    .build();
    language.add_classifier(&concept).unwrap();
    (language, concept)
}

#[test]
fn test_unset_optional_properties_are_written_as_null() {
    let (language, concept) = my_language();
    let mut engine = Serialization::standard();
    engine.register_language(&language);
    engine.enable_dynamic_instantiation();

    let mut graph = NodeGraph::new();
    let node = graph.create_node("n1", &concept).unwrap();
    let p1 = concept.get_feature_by_name("p1").unwrap();
    graph.instance_mut(node).unwrap().set_property_value(p1, Some(true.into())).unwrap();

    let chunk = engine.serialize_nodes(&graph, &[node]).unwrap();
    let value = JsonCodec::new().to_json_value(&chunk).unwrap();
    let properties = value["nodes"][0]["properties"].as_array().unwrap();
    assert_eq!(properties.len(), 4);
    assert_eq!(
        properties[0],
        json!({
            "property": {"language": "mylanguage", "version": "1", "key": "p1"},
            "value": "true"
        })
    );
    for property in &properties[1..] {
        assert_eq!(property["value"], serde_json::Value::Null);
    }
    assert_eq!(
        value["nodes"][0]["classifier"],
        json!({"language": "mylanguage", "version": "1", "key": "concept-MyNodeWithProperties"})
    );

    let text = JsonCodec::new().to_json_string(&chunk).unwrap();
    let (copy, deserialized) = engine.deserialize(text.as_bytes(), CodecKind::Json).unwrap();
    let restored = deserialized.instances[0];
    assert_eq!(copy.property_value(restored, p1).unwrap(), Some(&PropertyValue::Boolean(true)));
    for name in ["p2", "p3", "p4"] {
        let property = concept.get_feature_by_name(name).unwrap();
        assert_eq!(copy.property_value(restored, property).unwrap(), None);
    }
}

/// lib [b1 -> w1, b2 (+ review)], w1
fn library_graph(fixture: &LibraryLanguage) -> (NodeGraph, NodeHandle, NodeHandle) {
    let books = fixture.feature(&fixture.library, "books");
    let title = fixture.feature(&fixture.book, "title");
    let genre = fixture.feature(&fixture.book, "genre");
    let author = fixture.feature(&fixture.book, "author");
    let name = fixture.feature(&fixture.writer, "name");
    let library_name = fixture.feature(&fixture.library, "name");
    let stars = fixture.feature(&fixture.review, "stars");

    let mut graph = NodeGraph::new();
    let lib = graph.create_node("lib", &fixture.library).unwrap();
    let b1 = graph.create_node("b1", &fixture.book).unwrap();
    let b2 = graph.create_node("b2", &fixture.book).unwrap();
    let w1 = graph.create_node("w1", &fixture.writer).unwrap();
    let review = graph.create_node("r1", &fixture.review).unwrap();

    graph.add_child(lib, &books, b1).unwrap();
    graph.add_child(lib, &books, b2).unwrap();
    graph.add_annotation(b2, review).unwrap();

    graph.instance_mut(lib).unwrap().set_property_value(&library_name, Some("City".into())).unwrap();
    graph.instance_mut(b1).unwrap().set_property_value(&title, Some("Leaves of Grass".into())).unwrap();
    graph
        .instance_mut(b1)
        .unwrap()
        .set_property_value(&genre, Some(PropertyValue::EnumerationLiteral("poetry".into())))
        .unwrap();
    graph.instance_mut(b2).unwrap().set_property_value(&title, Some("".into())).unwrap();
    graph.instance_mut(w1).unwrap().set_property_value(&name, Some("Walt".into())).unwrap();
    graph.instance_mut(review).unwrap().set_property_value(&stars, Some(5i64.into())).unwrap();
    graph
        .add_reference_value(b1, &author, ReferenceValue::to_node(w1, Some("Whitman".into())))
        .unwrap();
    (graph, lib, w1)
}

#[test]
fn test_round_trip_through_both_codecs() {
    let fixture = LibraryLanguage::new();
    let engine = fixture.engine();
    let (graph, lib, w1) = library_graph(&fixture);

    let chunk = engine.serialize_trees(&graph, &[lib, w1]).unwrap();
    let ids: Vec<_> = chunk.nodes.iter().map(|n| n.id.as_deref().unwrap()).collect();
    assert_eq!(ids, vec!["lib", "b1", "b2", "r1", "w1"]);

    let from_json = JsonCodec::new().decode(&JsonCodec::new().encode(&chunk).unwrap()).unwrap();
    let from_binary = BinaryCodec::new().decode(&BinaryCodec::new().encode(&chunk).unwrap()).unwrap();
    assert_eq!(from_json, chunk);
    assert_eq!(from_binary, from_json);

    let (copy, deserialized) = engine.deserialize_chunk(&from_binary).unwrap();
    assert!(deserialized.proxies.is_empty());
    let handle = |id: &str| copy.find(id).unwrap();

    let books = fixture.feature(&fixture.library, "books");
    let title = fixture.feature(&fixture.book, "title");
    let genre = fixture.feature(&fixture.book, "genre");
    let author = fixture.feature(&fixture.book, "author");
    let stars = fixture.feature(&fixture.review, "stars");

    assert_eq!(copy.children_in(handle("lib"), &books).unwrap(), &[handle("b1"), handle("b2")]);
    assert_eq!(copy.parent(handle("b2")).unwrap(), Some(handle("lib")));
    assert_eq!(
        copy.property_value(handle("b1"), &title).unwrap(),
        Some(&PropertyValue::String("Leaves of Grass".into()))
    );
    assert_eq!(
        copy.property_value(handle("b2"), &title).unwrap(),
        Some(&PropertyValue::String(String::new()))
    );
    assert_eq!(
        copy.property_value(handle("b1"), &genre).unwrap(),
        Some(&PropertyValue::EnumerationLiteral("poetry".into()))
    );
    assert_eq!(
        copy.reference_values(handle("b1"), &author).unwrap(),
        &[ReferenceValue::to_node(handle("w1"), Some("Whitman".into()))]
    );
    assert_eq!(copy.annotations(handle("b2")).unwrap(), &[handle("r1")]);
    assert_eq!(copy.parent(handle("r1")).unwrap(), Some(handle("b2")));
    assert_eq!(
        copy.property_value(handle("r1"), &stars).unwrap(),
        Some(&PropertyValue::Integer(5))
    );
    let roots = copy.roots();
    assert_eq!(roots.len(), 2);
    assert!(roots.contains(&handle("lib")) && roots.contains(&handle("w1")));

    // serializing the copy gives back the same chunk
    let again = engine
        .serialize_trees(&copy, &[handle("lib"), handle("w1")])
        .unwrap();
    assert_eq!(again, chunk);
}

#[test]
fn test_serialize_trees_writes_shared_nodes_once() {
    let fixture = LibraryLanguage::new();
    let engine = fixture.engine();
    let (graph, lib, _) = library_graph(&fixture);
    let b1 = graph.find("b1").unwrap();

    let chunk = engine.serialize_trees(&graph, &[lib, b1, lib]).unwrap();
    assert_eq!(chunk.nodes.len(), 4);
    assert_eq!(chunk.instance_by_id("b1").unwrap().parent.as_deref(), Some("lib"));
}

#[test]
fn test_serialize_picks_the_codec() {
    let fixture = LibraryLanguage::new();
    let mut engine = fixture.engine();
    let (graph, lib, _) = library_graph(&fixture);

    let binary = engine.serialize(&graph, &[lib], CodecKind::Binary).unwrap();
    assert_eq!(binary[0], BinaryCodec::CURRENT_LAYOUT_VERSION);

    engine.set_pretty_json(true);
    let text = String::from_utf8(engine.serialize(&graph, &[lib], CodecKind::Json).unwrap()).unwrap();
    assert!(text.contains('\n'));
    let decoded: SerializedChunk = JsonCodec::new().from_json_str(&text).unwrap();
    assert_eq!(decoded, BinaryCodec::new().decode(&binary).unwrap());
}

#[test]
fn test_value_errors_abort_serialization() {
    let fixture = LibraryLanguage::new();
    let mut graph = NodeGraph::new();
    let b1 = graph.create_node("b1", &fixture.book).unwrap();
    let genre = fixture.feature(&fixture.book, "genre");
    graph
        .instance_mut(b1)
        .unwrap()
        .set_property_value(&genre, Some(PropertyValue::EnumerationLiteral("poetry".into())))
        .unwrap();

    // the enumeration is unknown until the language is registered
    let engine = Serialization::standard();
    assert!(matches!(
        engine.serialize_nodes(&graph, &[b1]),
        Err(ModelError::PrimitiveValue(_))
    ));
    assert!(fixture.engine().serialize_nodes(&graph, &[b1]).is_ok());
}

//region Instantiation

#[test]
fn test_dynamic_instantiation_is_off_by_default() {
    let fixture = LibraryLanguage::new();
    let mut engine = Serialization::standard();
    engine.register_language(&fixture.language);
    assert!(!engine.instantiator().is_dynamic_instantiation_enabled());

    let err = engine
        .deserialize_chunk(&chunk(vec![node("w1", "Writer", None)]))
        .unwrap_err();
    assert!(matches!(err, ModelError::Instantiation(_)));
}

#[test]
fn test_custom_constructor_sees_property_values() {
    let fixture = LibraryLanguage::new();
    let mut engine = Serialization::standard();
    engine.register_language(&fixture.language);

    let calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&calls);
    let name = fixture.feature(&fixture.writer, "name");
    engine.instantiator_mut().register_custom_deserializer(
        "library-Writer",
        Box::new(move |context: &InstantiationContext<'_>| {
            counter.fetch_add(1, Ordering::SeqCst);
            let mut instance = ClassifierInstance::new(context.id(), context.classifier);
            let shouted = context.property_value("name").and_then(|v| v.as_str()).map(str::to_uppercase);
            instance.set_property_value(&name, shouted.map(PropertyValue::from))?;
            Ok(instance)
        }),
    );

    let mut writer = node("w1", "Writer", None);
    writer.add_property_value(mp("Writer-name"), Some("walt".into()));
    let (graph, deserialized) = engine.deserialize_chunk(&chunk(vec![writer])).unwrap();

    assert_eq!(calls.load(Ordering::SeqCst), 1);
    let name = fixture.feature(&fixture.writer, "name");
    // the serialized value is applied after construction
    assert_eq!(
        graph.property_value(deserialized.instances[0], &name).unwrap(),
        Some(&PropertyValue::String("walt".into()))
    );
}

#[test]
fn test_constructor_must_keep_the_id() {
    let fixture = LibraryLanguage::new();
    let mut engine = fixture.engine();
    engine.instantiator_mut().register_custom_deserializer(
        "library-Writer",
        Box::new(|context: &InstantiationContext<'_>| Ok(ClassifierInstance::new(Some("other".into()), context.classifier))),
    );
    let err = engine
        .deserialize_chunk(&chunk(vec![node("w1", "Writer", None)]))
        .unwrap_err();
    assert!(matches!(err, ModelError::Instantiation(_)));
}

//endregion

#[test]
fn test_unknown_schema_elements() {
    let fixture = LibraryLanguage::new();
    let engine = fixture.engine();

    let err = engine
        .deserialize_chunk(&chunk(vec![node("x", "Magazine", None)]))
        .unwrap_err();
    assert_eq!(err, ModelError::ClassifierNotFound(mp("Magazine")));

    let mut writer = node("w1", "Writer", None);
    writer.add_property_value(mp("Writer-age"), Some("40".into()));
    let err = engine.deserialize_chunk(&chunk(vec![writer])).unwrap_err();
    assert!(matches!(err, ModelError::FeatureNotFound { .. }));

    let mut book = node("b1", "Book", None);
    book.add_property_value(MetaPointer::new("library", "1", "Book-author"), Some("w1".into()));
    let err = engine.deserialize_chunk(&chunk(vec![book])).unwrap_err();
    assert!(matches!(err, ModelError::FeatureKindMismatch { .. }));
}

#[test]
fn test_required_property_read_as_null() {
    let fixture = LibraryLanguage::new();
    let engine = fixture.engine();

    let mut writer = node("w1", "Writer", None);
    writer.add_property_value(mp("Writer-name"), None);
    let err = engine.deserialize_chunk(&chunk(vec![writer])).unwrap_err();
    assert_eq!(err, ModelError::MissingRequiredValue("library@1/Writer-name".into()));

    let mut book = node("b1", "Book", None);
    book.add_property_value(mp("Book-pages"), None);
    book.add_property_value(mp("Book-genre"), Some("drama".into()));
    let err = engine.deserialize_chunk(&chunk(vec![book])).unwrap_err();
    assert!(matches!(err, ModelError::PrimitiveValue(_)));
}
