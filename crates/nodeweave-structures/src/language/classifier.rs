// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

use crate::language::{Feature, LanguageRef, MetaPointer};
use crate::ModelError;
use std::fmt::{Display, Formatter};
use std::sync::Arc;

/// The variant-specific part of a classifier, including its direct ancestors.
///
/// Ancestors are held as `Arc<Classifier>` and can only be attached to a classifier that is still
/// being built, so the extends/implements graph is acyclic by construction.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ClassifierKind {
    Concept {
        extends: Option<Arc<Classifier>>,
        implements: Vec<Arc<Classifier>>,
        is_abstract: bool,
        is_partition: bool,
    },
    Interface {
        extends: Vec<Arc<Classifier>>,
    },
    Annotation {
        extends: Option<Arc<Classifier>>,
        implements: Vec<Arc<Classifier>>,
        annotates: Option<MetaPointer>,
    },
}

impl ClassifierKind {
    pub fn name(&self) -> &'static str {
        match self {
            ClassifierKind::Concept { .. } => "concept",
            ClassifierKind::Interface { .. } => "interface",
            ClassifierKind::Annotation { .. } => "annotation",
        }
    }
}

/// A named schema type: concept, interface or annotation.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Classifier {
    id: String,
    key: String,
    name: String,
    language: LanguageRef,
    kind: ClassifierKind,
    features: Vec<Feature>,
}

impl Classifier {
    //region Constructors

    pub fn concept(
        id: impl Into<String>,
        key: impl Into<String>,
        name: impl Into<String>,
        language: &LanguageRef,
    ) -> ClassifierBuilder {
        ClassifierBuilder::new(
            id,
            key,
            name,
            language,
            ClassifierKind::Concept {
                extends: None,
                implements: Vec::new(),
                is_abstract: false,
                is_partition: false,
            },
        )
    }

    pub fn interface(
        id: impl Into<String>,
        key: impl Into<String>,
        name: impl Into<String>,
        language: &LanguageRef,
    ) -> ClassifierBuilder {
        ClassifierBuilder::new(
            id,
            key,
            name,
            language,
            ClassifierKind::Interface {
                extends: Vec::new(),
            },
        )
    }

    pub fn annotation(
        id: impl Into<String>,
        key: impl Into<String>,
        name: impl Into<String>,
        language: &LanguageRef,
    ) -> ClassifierBuilder {
        ClassifierBuilder::new(
            id,
            key,
            name,
            language,
            ClassifierKind::Annotation {
                extends: None,
                implements: Vec::new(),
                annotates: None,
            },
        )
    }

    //endregion

    //region Properties

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn language(&self) -> &LanguageRef {
        &self.language
    }

    pub fn kind(&self) -> &ClassifierKind {
        &self.kind
    }

    pub fn meta_pointer(&self) -> MetaPointer {
        MetaPointer::from_language(&self.language, self.key.clone())
    }

    pub fn is_concept(&self) -> bool {
        matches!(self.kind, ClassifierKind::Concept { .. })
    }

    pub fn is_interface(&self) -> bool {
        matches!(self.kind, ClassifierKind::Interface { .. })
    }

    pub fn is_annotation(&self) -> bool {
        matches!(self.kind, ClassifierKind::Annotation { .. })
    }

    pub fn is_abstract(&self) -> bool {
        matches!(
            self.kind,
            ClassifierKind::Concept {
                is_abstract: true,
                ..
            }
        )
    }

    pub fn is_partition(&self) -> bool {
        matches!(
            self.kind,
            ClassifierKind::Concept {
                is_partition: true,
                ..
            }
        )
    }

    /// The classifier an annotation may be attached to
    pub fn annotates(&self) -> Option<&MetaPointer> {
        match &self.kind {
            ClassifierKind::Annotation { annotates, .. } => annotates.as_ref(),
            _ => None,
        }
    }

    //endregion

    //region Features

    /// Features declared directly on this classifier
    pub fn features(&self) -> &[Feature] {
        &self.features
    }

    /// Own features followed by the features of every ancestor, walked depth first: the extended
    /// concept (or annotation) first, then each implemented or extended interface in declaration
    /// order. A feature reachable through two paths of a diamond is listed twice.
    pub fn all_features(&self) -> Vec<&Feature> {
        let mut result: Vec<&Feature> = self.features.iter().collect();
        for ancestor in self.direct_ancestors() {
            result.extend(ancestor.all_features());
        }
        result
    }

    pub fn all_properties(&self) -> Vec<&Feature> {
        self.all_features()
            .into_iter()
            .filter(|feature| feature.is_property())
            .collect()
    }

    pub fn all_containments(&self) -> Vec<&Feature> {
        self.all_features()
            .into_iter()
            .filter(|feature| feature.is_containment())
            .collect()
    }

    pub fn all_references(&self) -> Vec<&Feature> {
        self.all_features()
            .into_iter()
            .filter(|feature| feature.is_reference())
            .collect()
    }

    pub fn get_feature_by_meta_pointer(&self, meta_pointer: &MetaPointer) -> Option<&Feature> {
        self.all_features()
            .into_iter()
            .find(|feature| feature.meta_pointer() == *meta_pointer)
    }

    pub fn get_feature_by_name(&self, name: &str) -> Option<&Feature> {
        self.all_features()
            .into_iter()
            .find(|feature| feature.name() == name)
    }

    /// Like [`Classifier::get_feature_by_meta_pointer`], failing with a schema error when the
    /// feature is missing.
    pub fn require_feature(&self, meta_pointer: &MetaPointer) -> Result<&Feature, ModelError> {
        self.get_feature_by_meta_pointer(meta_pointer)
            .ok_or_else(|| ModelError::FeatureNotFound {
                feature: meta_pointer.to_string(),
                classifier: self.meta_pointer().to_string(),
            })
    }

    /// True if the feature is declared by this classifier or one of its ancestors
    pub fn has_feature(&self, feature: &Feature) -> bool {
        let meta_pointer = feature.meta_pointer();
        self.all_features()
            .into_iter()
            .any(|candidate| candidate.meta_pointer() == meta_pointer && candidate.kind() == feature.kind())
    }

    //endregion

    //region Ancestors

    pub fn direct_ancestors(&self) -> Vec<&Arc<Classifier>> {
        match &self.kind {
            ClassifierKind::Concept {
                extends,
                implements,
                ..
            }
            | ClassifierKind::Annotation {
                extends,
                implements,
                ..
            } => extends.iter().chain(implements.iter()).collect(),
            ClassifierKind::Interface { extends } => extends.iter().collect(),
        }
    }

    /// Every ancestor once, in depth-first discovery order
    pub fn all_ancestors(&self) -> Vec<&Arc<Classifier>> {
        let mut result: Vec<&Arc<Classifier>> = Vec::new();
        let mut pending: Vec<&Arc<Classifier>> = self.direct_ancestors();
        pending.reverse();
        while let Some(next) = pending.pop() {
            if result.iter().any(|seen| Arc::ptr_eq(seen, next)) {
                continue;
            }
            result.push(next);
            let mut parents = next.direct_ancestors();
            parents.reverse();
            pending.extend(parents);
        }
        result
    }

    /// True if this classifier is the given one or inherits from it
    pub fn is_subtype_of(&self, meta_pointer: &MetaPointer) -> bool {
        if self.meta_pointer() == *meta_pointer {
            return true;
        }
        self.all_ancestors()
            .into_iter()
            .any(|ancestor| ancestor.meta_pointer() == *meta_pointer)
    }

    //endregion
}

impl Display for Classifier {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}({})", self.kind.name(), self.meta_pointer())
    }
}

/// Assembles a [`Classifier`]. Ancestors must already be built, which is what keeps inheritance
/// acyclic.
///
/// # Example
/// ```
/// use nodeweave_structures::language::{Classifier, LanguageRef};
///
/// let language = LanguageRef::new("shapes", "1");
/// let named = Classifier::interface("shapes-Named", "Named", "Named", &language).build();
/// let circle = Classifier::concept("shapes-Circle", "Circle", "Circle", &language)
///     .implements(&named)
///     .unwrap()
///     .build();
/// assert!(circle.is_subtype_of(&named.meta_pointer()));
/// ```
#[derive(Debug, Clone)]
pub struct ClassifierBuilder {
    classifier: Classifier,
}

impl ClassifierBuilder {
    fn new(
        id: impl Into<String>,
        key: impl Into<String>,
        name: impl Into<String>,
        language: &LanguageRef,
        kind: ClassifierKind,
    ) -> Self {
        Self {
            classifier: Classifier {
                id: id.into(),
                key: key.into(),
                name: name.into(),
                language: language.clone(),
                kind,
                features: Vec::new(),
            },
        }
    }

    pub fn meta_pointer(&self) -> MetaPointer {
        self.classifier.meta_pointer()
    }

    /// Sets the extended concept of a concept, the extended annotation of an annotation, or adds
    /// an extended interface to an interface.
    pub fn extends(mut self, ancestor: &Arc<Classifier>) -> Result<Self, ModelError> {
        let own_kind = self.classifier.kind.name();
        match &mut self.classifier.kind {
            ClassifierKind::Concept { extends, .. } if ancestor.is_concept() => {
                *extends = Some(Arc::clone(ancestor))
            }
            ClassifierKind::Annotation { extends, .. } if ancestor.is_annotation() => {
                *extends = Some(Arc::clone(ancestor))
            }
            ClassifierKind::Interface { extends } if ancestor.is_interface() => {
                extends.push(Arc::clone(ancestor))
            }
            _ => {
                return Err(ModelError::InvalidLanguage(format!(
                    "{} {} cannot extend {}",
                    own_kind, self.classifier.key, ancestor
                )))
            }
        }
        Ok(self)
    }

    /// Adds an implemented interface to a concept or an annotation
    pub fn implements(mut self, interface: &Arc<Classifier>) -> Result<Self, ModelError> {
        if !interface.is_interface() {
            return Err(ModelError::InvalidLanguage(format!(
                "{} can only implement interfaces, {} is not one",
                self.classifier.key, interface
            )));
        }
        match &mut self.classifier.kind {
            ClassifierKind::Concept { implements, .. }
            | ClassifierKind::Annotation { implements, .. } => {
                implements.push(Arc::clone(interface))
            }
            ClassifierKind::Interface { .. } => {
                return Err(ModelError::InvalidLanguage(format!(
                    "interface {} extends other interfaces, it does not implement them",
                    self.classifier.key
                )))
            }
        }
        Ok(self)
    }

    /// Sets the target classifier of an annotation. Ignored for other kinds.
    pub fn annotates(mut self, target: MetaPointer) -> Self {
        if let ClassifierKind::Annotation { annotates, .. } = &mut self.classifier.kind {
            *annotates = Some(target);
        }
        self
    }

    pub fn set_abstract(mut self) -> Self {
        if let ClassifierKind::Concept { is_abstract, .. } = &mut self.classifier.kind {
            *is_abstract = true;
        }
        self
    }

    pub fn set_partition(mut self) -> Self {
        if let ClassifierKind::Concept { is_partition, .. } = &mut self.classifier.kind {
            *is_partition = true;
        }
        self
    }

    pub fn feature(mut self, mut feature: Feature) -> Self {
        feature.language = self.classifier.language.clone();
        self.classifier.features.push(feature);
        self
    }

    pub fn build(self) -> Arc<Classifier> {
        Arc::new(self.classifier)
    }
}
