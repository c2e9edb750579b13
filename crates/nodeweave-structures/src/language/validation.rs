// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Language validation
//!
//! Checks a language for problems that would make instances of it impossible to serialize or to
//! resolve: missing or clashing keys, annotations without a target, and links or properties whose
//! types cannot be found.

use crate::language::{builtins, Classifier, Feature, FeatureKind, Language, MetaPointer};
use std::collections::HashSet;
use std::fmt::{Display, Formatter};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IssueSeverity {
    Error,
    Warning,
}

/// One problem found while validating, with the key or meta-pointer of the element concerned
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Issue {
    pub severity: IssueSeverity,
    pub message: String,
    pub subject: String,
}

impl Issue {
    fn error(message: impl Into<String>, subject: impl Into<String>) -> Self {
        Self {
            severity: IssueSeverity::Error,
            message: message.into(),
            subject: subject.into(),
        }
    }

    fn warning(message: impl Into<String>, subject: impl Into<String>) -> Self {
        Self {
            severity: IssueSeverity::Warning,
            message: message.into(),
            subject: subject.into(),
        }
    }

    pub fn is_error(&self) -> bool {
        self.severity == IssueSeverity::Error
    }
}

impl Display for Issue {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{:?}] {} ({})", self.severity, self.message, self.subject)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationResult {
    issues: Vec<Issue>,
}

impl ValidationResult {
    pub fn issues(&self) -> &[Issue] {
        &self.issues
    }

    /// A language is successful if no issue is an error; warnings are allowed
    pub fn is_successful(&self) -> bool {
        !self.issues.iter().any(Issue::is_error)
    }

    pub fn errors(&self) -> impl Iterator<Item = &Issue> {
        self.issues.iter().filter(|issue| issue.is_error())
    }
}

/// Validate a language against itself and the other languages it may point into.
///
/// The built-in language is always considered known.
pub fn validate_language(language: &Language, known_languages: &[&Language]) -> ValidationResult {
    let mut issues = Vec::new();

    validate_keys(language, &mut issues);
    validate_names(language, &mut issues);
    for classifier in language.classifiers() {
        validate_classifier(language, classifier, known_languages, &mut issues);
    }

    ValidationResult { issues }
}

fn validate_keys(language: &Language, issues: &mut Vec<Issue>) {
    if language.key().is_empty() {
        issues.push(Issue::error("Language key is empty", language.id()));
    }
    if language.version().is_empty() {
        issues.push(Issue::error("Language version is empty", language.id()));
    }

    let mut classifier_keys = HashSet::new();
    for classifier in language.classifiers() {
        if classifier.key().is_empty() {
            issues.push(Issue::error("Classifier key is empty", classifier.id()));
        } else if !classifier_keys.insert(classifier.key()) {
            issues.push(Issue::error(
                format!("Duplicate classifier key {}", classifier.key()),
                classifier.id(),
            ));
        }

        let mut feature_keys = HashSet::new();
        for feature in classifier.features() {
            if feature.key().is_empty() {
                issues.push(Issue::error("Feature key is empty", feature.id()));
            } else if !feature_keys.insert((feature.kind_name(), feature.key())) {
                issues.push(Issue::error(
                    format!(
                        "Duplicate {} key {} in classifier {}",
                        feature.kind_name(),
                        feature.key(),
                        classifier.key()
                    ),
                    feature.id(),
                ));
            }
        }
    }

    let mut data_type_keys = HashSet::new();
    for data_type in language.data_types() {
        if data_type.key().is_empty() {
            issues.push(Issue::error("Data type key is empty", data_type.id()));
        } else if !data_type_keys.insert(data_type.key()) {
            issues.push(Issue::error(
                format!("Duplicate data type key {}", data_type.key()),
                data_type.id(),
            ));
        }
        let mut literal_keys = HashSet::new();
        for literal in data_type.literals() {
            if !literal_keys.insert(literal.key.as_str()) {
                issues.push(Issue::error(
                    format!("Duplicate literal key {} in {}", literal.key, data_type.key()),
                    literal.id.as_str(),
                ));
            }
        }
    }
}

fn validate_names(language: &Language, issues: &mut Vec<Issue>) {
    if language.name().is_empty() {
        issues.push(Issue::warning("Language name is empty", language.id()));
    }
    for classifier in language.classifiers() {
        if classifier.name().is_empty() {
            issues.push(Issue::warning("Classifier name is empty", classifier.id()));
        }
    }
}

fn validate_classifier(
    language: &Language,
    classifier: &Classifier,
    known_languages: &[&Language],
    issues: &mut Vec<Issue>,
) {
    if classifier.is_annotation() && classifier.annotates().is_none() {
        issues.push(Issue::error(
            format!("Annotation {} does not specify what it annotates", classifier.key()),
            classifier.id(),
        ));
    }
    if let Some(target) = classifier.annotates() {
        check_classifier_target(language, target, classifier.id(), known_languages, issues);
    }

    for feature in classifier.features() {
        validate_feature(language, feature, known_languages, issues);
    }
}

fn validate_feature(
    language: &Language,
    feature: &Feature,
    known_languages: &[&Language],
    issues: &mut Vec<Issue>,
) {
    match feature.kind() {
        FeatureKind::Property { data_type } => {
            let data_type_language = data_type.language();
            if data_type_language.key == builtins::LANGUAGE_KEY {
                return;
            }
            let owner = find_language(language, known_languages, &data_type.meta_pointer());
            match owner {
                Some(owner) if owner.get_data_type_by_key(data_type.key()).is_some() => {}
                _ => issues.push(Issue::error(
                    format!(
                        "Type {} of property {} cannot be resolved",
                        data_type.meta_pointer(),
                        feature.key()
                    ),
                    feature.id(),
                )),
            }
            warn_on_undeclared_dependency(language, &data_type.meta_pointer(), feature.id(), issues);
        }
        FeatureKind::Containment { target, .. } | FeatureKind::Reference { target, .. } => {
            check_classifier_target(language, target, feature.id(), known_languages, issues);
        }
    }
}

fn check_classifier_target(
    language: &Language,
    target: &MetaPointer,
    subject: &str,
    known_languages: &[&Language],
    issues: &mut Vec<Issue>,
) {
    let resolved = find_language(language, known_languages, target)
        .and_then(|owner| owner.get_classifier_by_key(&target.key))
        .is_some();
    if !resolved {
        issues.push(Issue::error(
            format!("Classifier {} cannot be resolved", target),
            subject,
        ));
    }
    warn_on_undeclared_dependency(language, target, subject, issues);
}

fn find_language<'a>(
    language: &'a Language,
    known_languages: &[&'a Language],
    meta_pointer: &MetaPointer,
) -> Option<&'a Language> {
    if meta_pointer.language == language.key() && meta_pointer.version == language.version() {
        return Some(language);
    }
    known_languages
        .iter()
        .copied()
        .find(|known| known.key() == meta_pointer.language && known.version() == meta_pointer.version)
}

fn warn_on_undeclared_dependency(
    language: &Language,
    meta_pointer: &MetaPointer,
    subject: &str,
    issues: &mut Vec<Issue>,
) {
    if meta_pointer.language == language.key() || meta_pointer.language == builtins::LANGUAGE_KEY {
        return;
    }
    let declared = language
        .dependencies()
        .iter()
        .any(|dependency| dependency.key == meta_pointer.language && dependency.version == meta_pointer.version);
    if !declared {
        issues.push(Issue::warning(
            format!(
                "Language {}@{} is used but not declared as a dependency",
                meta_pointer.language, meta_pointer.version
            ),
            subject,
        ));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::language::{Classifier, DataType, EnumerationLiteral, LanguageRef};
    use std::sync::Arc;

    fn shapes() -> (Language, LanguageRef) {
        let language = Language::new("shapes-id", "shapes", "Shapes", "1");
        let language_ref = language.language_ref();
        (language, language_ref)
    }

    #[test]
    fn test_valid_language_has_no_issues() {
        let (mut language, lr) = shapes();
        let shape = Classifier::concept("shapes-Shape", "Shape", "Shape", &lr)
            .feature(Feature::property("shapes-Shape-name", "name", "name", &builtins::string()))
            .feature(
                Feature::containment(
                    "shapes-Shape-parts",
                    "parts",
                    "parts",
                    MetaPointer::new("shapes", "1", "Shape"),
                )
                .multiple()
                .optional(),
            )
            .build();
        language.add_classifier(&shape).unwrap();

        let result = validate_language(&language, &[]);
        assert!(result.is_successful());
        assert!(result.issues().is_empty());
    }

    #[test]
    fn test_duplicate_keys_and_unresolved_targets_are_errors() {
        let (mut language, lr) = shapes();
        let first = Classifier::concept("a", "Dup", "A", &lr).build();
        let second = Classifier::concept("b", "Dup", "B", &lr)
            .feature(Feature::reference(
                "b-ref",
                "target",
                "target",
                MetaPointer::new("shapes", "1", "Missing"),
            ))
            .build();
        language.add_classifier(&first).unwrap();
        language.add_classifier(&second).unwrap();

        let result = validate_language(&language, &[]);
        assert!(!result.is_successful());
        assert_eq!(result.errors().count(), 2);
    }

    #[test]
    fn test_annotation_without_target_is_an_error() {
        let (mut language, lr) = shapes();
        let note = Classifier::annotation("note", "Note", "Note", &lr).build();
        language.add_classifier(&note).unwrap();

        let result = validate_language(&language, &[]);
        assert_eq!(result.errors().count(), 1);
        assert_eq!(result.issues()[0].subject, "note");
    }

    #[test]
    fn test_cross_language_target_without_dependency_warns() {
        let (mut base, base_ref) = shapes();
        let shape = Classifier::concept("shape", "Shape", "Shape", &base_ref).build();
        base.add_classifier(&shape).unwrap();

        let mut drawing = Language::new("drawing-id", "drawing", "Drawing", "1");
        let drawing_ref = drawing.language_ref();
        let canvas = Classifier::concept("canvas", "Canvas", "Canvas", &drawing_ref)
            .feature(Feature::containment("canvas-shapes", "shapes", "shapes", shape.meta_pointer()).multiple())
            .build();
        drawing.add_classifier(&canvas).unwrap();

        let result = validate_language(&drawing, &[&base]);
        assert!(result.is_successful());
        assert_eq!(result.issues().len(), 1);
        assert_eq!(result.issues()[0].severity, IssueSeverity::Warning);

        drawing.add_dependency(base_ref);
        assert!(validate_language(&drawing, &[&base]).issues().is_empty());
    }

    #[test]
    fn test_duplicate_enumeration_literals() {
        let (mut language, lr) = shapes();
        let color = DataType::enumeration("color", "Color", "Color", &lr)
            .with_literal(EnumerationLiteral::new("red-1", "red", "Red"))
            .with_literal(EnumerationLiteral::new("red-2", "red", "Red"));
        language.add_data_type(&Arc::new(color)).unwrap();

        let result = validate_language(&language, &[]);
        assert_eq!(result.errors().count(), 1);
    }
}
