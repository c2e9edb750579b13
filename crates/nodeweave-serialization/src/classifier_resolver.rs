// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

use ahash::AHashMap;
use nodeweave_structures::language::{Classifier, Feature, Language, LanguageRef, MetaPointer};
use nodeweave_structures::ModelError;
use std::sync::Arc;
use tracing::debug;

/// Maps classifier meta-pointers to live classifiers.
///
/// Resolution is by exact (language key, version, key) triple. Registering a language indexes its
/// own classifiers only; languages it depends on must be registered separately.
///
/// # Example
/// ```
/// use nodeweave_serialization::ClassifierResolver;
/// use nodeweave_structures::language::{Classifier, Language, MetaPointer};
///
/// let mut language = Language::new("lib-id", "library", "Library", "1");
/// let book = Classifier::concept("lib-Book", "Book", "Book", &language.language_ref()).build();
/// language.add_classifier(&book).unwrap();
///
/// let mut resolver = ClassifierResolver::new();
/// resolver.register_language(&language);
/// assert!(resolver.resolve_classifier(&MetaPointer::new("library", "1", "Book")).is_ok());
/// assert!(resolver.resolve_classifier(&MetaPointer::new("library", "2", "Book")).is_err());
/// ```
#[derive(Debug, Clone, Default)]
pub struct ClassifierResolver {
    classifiers: AHashMap<MetaPointer, Arc<Classifier>>,
    languages: Vec<LanguageRef>,
}

impl ClassifierResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_language(&mut self, language: &Language) {
        for classifier in language.classifiers() {
            self.register_classifier(classifier);
        }
        let language_ref = language.language_ref();
        if !self.languages.contains(&language_ref) {
            self.languages.push(language_ref);
        }
        debug!(
            "Registered language {}@{} with {} classifiers",
            language.key(),
            language.version(),
            language.classifiers().len()
        );
    }

    pub fn register_classifier(&mut self, classifier: &Arc<Classifier>) {
        self.classifiers
            .insert(classifier.meta_pointer(), Arc::clone(classifier));
    }

    pub fn registered_languages(&self) -> &[LanguageRef] {
        &self.languages
    }

    pub fn resolve_classifier(&self, meta_pointer: &MetaPointer) -> Result<Arc<Classifier>, ModelError> {
        self.classifiers
            .get(meta_pointer)
            .cloned()
            .ok_or_else(|| ModelError::ClassifierNotFound(meta_pointer.clone()))
    }

    /// Finds a feature of the expected kind (`"property"`, `"containment"` or `"reference"`)
    /// among all the features of a classifier.
    pub fn resolve_feature<'c>(
        classifier: &'c Classifier,
        meta_pointer: &MetaPointer,
        expected_kind: &'static str,
    ) -> Result<&'c Feature, ModelError> {
        let feature = classifier.require_feature(meta_pointer)?;
        if feature.kind_name() != expected_kind {
            return Err(ModelError::FeatureKindMismatch {
                feature: meta_pointer.to_string(),
                expected: expected_kind,
                actual: feature.kind_name(),
            });
        }
        Ok(feature)
    }
}
