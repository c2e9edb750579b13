//! Shared fixtures: a small library language and helpers to write chunks by hand.

#![allow(dead_code)]

use nodeweave_serialization::chunk::{SerializedChunk, SerializedClassifierInstance, UsedLanguage};
use nodeweave_serialization::Serialization;
use nodeweave_structures::language::{
    builtins, Classifier, DataType, EnumerationLiteral, Feature, Language, LanguageRef, MetaPointer,
};
use std::sync::Arc;

pub const LANGUAGE_KEY: &str = "library";
pub const LANGUAGE_VERSION: &str = "1";

pub fn mp(key: &str) -> MetaPointer {
    MetaPointer::new(LANGUAGE_KEY, LANGUAGE_VERSION, key)
}

/// Library (partition) contains Books, Books refer to a Writer and may carry Review annotations.
pub struct LibraryLanguage {
    pub language: Language,
    pub library: Arc<Classifier>,
    pub book: Arc<Classifier>,
    pub writer: Arc<Classifier>,
    pub review: Arc<Classifier>,
    pub genre: Arc<DataType>,
}

impl LibraryLanguage {
    pub fn new() -> Self {
        let language_ref = LanguageRef::new(LANGUAGE_KEY, LANGUAGE_VERSION);
        let mut language = Language::new("library-id", LANGUAGE_KEY, "Library", LANGUAGE_VERSION);

        let genre = Arc::new(
            DataType::enumeration("library-Genre", "Genre", "Genre", &language_ref)
                .with_literal(EnumerationLiteral::new("library-Genre-poetry", "poetry", "Poetry"))
                .with_literal(EnumerationLiteral::new("library-Genre-novel", "novel", "Novel")),
        );
        let writer = Classifier::concept("library-Writer", "Writer", "Writer", &language_ref)
            .feature(Feature::property("library-Writer-name", "Writer-name", "name", &builtins::string()))
            .build();
        let book = Classifier::concept("library-Book", "Book", "Book", &language_ref)
            .feature(Feature::property("library-Book-title", "Book-title", "title", &builtins::string()))
            .feature(Feature::property("library-Book-pages", "Book-pages", "pages", &builtins::integer()).optional())
            .feature(Feature::property("library-Book-genre", "Book-genre", "genre", &genre).optional())
            .feature(Feature::reference("library-Book-author", "Book-author", "author", mp("Writer")).optional())
            .build();
        let library = Classifier::concept("library-Library", "Library", "Library", &language_ref)
            .set_partition()
            .feature(Feature::property("library-Library-name", "Library-name", "name", &builtins::string()))
            .feature(
                Feature::containment("library-Library-books", "Library-books", "books", mp("Book"))
                    .optional()
                    .multiple(),
            )
            .build();
        let review = Classifier::annotation("library-Review", "Review", "Review", &language_ref)
            .annotates(mp("Book"))
            .feature(Feature::property("library-Review-stars", "Review-stars", "stars", &builtins::integer()).optional())
            .build();

        for classifier in [&library, &book, &writer, &review] {
            language.add_classifier(classifier).unwrap();
        }
        language.add_data_type(&genre).unwrap();

        Self {
            language,
            library,
            book,
            writer,
            review,
            genre,
        }
    }

    /// A standard engine knowing this language, with dynamic instantiation enabled
    pub fn engine(&self) -> Serialization {
        let mut engine = Serialization::standard();
        engine.register_language(&self.language);
        engine.enable_dynamic_instantiation();
        engine
    }

    pub fn feature(&self, classifier: &Classifier, name: &str) -> Feature {
        classifier.get_feature_by_name(name).unwrap().clone()
    }
}

pub fn node(id: &str, classifier_key: &str, parent: Option<&str>) -> SerializedClassifierInstance {
    let mut node = SerializedClassifierInstance::new(Some(id.to_string()), mp(classifier_key));
    node.parent = parent.map(str::to_string);
    node
}

pub fn chunk(nodes: Vec<SerializedClassifierInstance>) -> SerializedChunk {
    let mut chunk = SerializedChunk::default();
    chunk.add_language(UsedLanguage::new(LANGUAGE_KEY, LANGUAGE_VERSION));
    for node in nodes {
        chunk.add_instance(node);
    }
    chunk
}
