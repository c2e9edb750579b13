// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

use crate::language::{DataType, LanguageRef, MetaPointer};
use std::fmt::{Display, Formatter};
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum FeatureKind {
    /// Holds a value of a data type. Properties are always single-valued.
    Property { data_type: Arc<DataType> },
    /// Owning edge to child nodes.
    Containment { target: MetaPointer, multiple: bool },
    /// Non-owning edge to other nodes.
    Reference { target: MetaPointer, multiple: bool },
}

/// A property, containment or reference declared by a classifier.
///
/// The declaring language is filled in when the feature is added to a classifier, so the
/// meta-pointer of a feature is only meaningful once it belongs to one.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Feature {
    id: String,
    key: String,
    name: String,
    pub(crate) language: LanguageRef,
    optional: bool,
    derived: bool,
    kind: FeatureKind,
}

impl Feature {
    fn new(
        id: impl Into<String>,
        key: impl Into<String>,
        name: impl Into<String>,
        kind: FeatureKind,
    ) -> Self {
        Self {
            id: id.into(),
            key: key.into(),
            name: name.into(),
            language: LanguageRef::new("", ""),
            optional: false,
            derived: false,
            kind,
        }
    }

    pub fn property(
        id: impl Into<String>,
        key: impl Into<String>,
        name: impl Into<String>,
        data_type: &Arc<DataType>,
    ) -> Self {
        Self::new(
            id,
            key,
            name,
            FeatureKind::Property {
                data_type: Arc::clone(data_type),
            },
        )
    }

    pub fn containment(
        id: impl Into<String>,
        key: impl Into<String>,
        name: impl Into<String>,
        target: MetaPointer,
    ) -> Self {
        Self::new(
            id,
            key,
            name,
            FeatureKind::Containment {
                target,
                multiple: false,
            },
        )
    }

    pub fn reference(
        id: impl Into<String>,
        key: impl Into<String>,
        name: impl Into<String>,
        target: MetaPointer,
    ) -> Self {
        Self::new(
            id,
            key,
            name,
            FeatureKind::Reference {
                target,
                multiple: false,
            },
        )
    }

    //region Builder flags

    pub fn optional(mut self) -> Self {
        self.optional = true;
        self
    }

    pub fn derived(mut self) -> Self {
        self.derived = true;
        self
    }

    /// Marks a link as multi-valued. Has no effect on properties.
    pub fn multiple(mut self) -> Self {
        match &mut self.kind {
            FeatureKind::Containment { multiple, .. } | FeatureKind::Reference { multiple, .. } => {
                *multiple = true
            }
            FeatureKind::Property { .. } => {}
        }
        self
    }

    //endregion

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn declaring_language(&self) -> &LanguageRef {
        &self.language
    }

    pub fn kind(&self) -> &FeatureKind {
        &self.kind
    }

    pub fn meta_pointer(&self) -> MetaPointer {
        MetaPointer::from_language(&self.language, self.key.clone())
    }

    pub fn is_optional(&self) -> bool {
        self.optional
    }

    pub fn is_required(&self) -> bool {
        !self.optional
    }

    pub fn is_derived(&self) -> bool {
        self.derived
    }

    pub fn is_multiple(&self) -> bool {
        match self.kind {
            FeatureKind::Containment { multiple, .. } | FeatureKind::Reference { multiple, .. } => {
                multiple
            }
            FeatureKind::Property { .. } => false,
        }
    }

    pub fn is_property(&self) -> bool {
        matches!(self.kind, FeatureKind::Property { .. })
    }

    pub fn is_containment(&self) -> bool {
        matches!(self.kind, FeatureKind::Containment { .. })
    }

    pub fn is_reference(&self) -> bool {
        matches!(self.kind, FeatureKind::Reference { .. })
    }

    pub fn kind_name(&self) -> &'static str {
        match self.kind {
            FeatureKind::Property { .. } => "property",
            FeatureKind::Containment { .. } => "containment",
            FeatureKind::Reference { .. } => "reference",
        }
    }

    pub fn data_type(&self) -> Option<&Arc<DataType>> {
        match &self.kind {
            FeatureKind::Property { data_type } => Some(data_type),
            _ => None,
        }
    }

    /// Meta-pointer of the classifier a link points to
    pub fn link_target(&self) -> Option<&MetaPointer> {
        match &self.kind {
            FeatureKind::Containment { target, .. } | FeatureKind::Reference { target, .. } => {
                Some(target)
            }
            FeatureKind::Property { .. } => None,
        }
    }
}

impl Display for Feature {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}({})", self.kind_name(), self.meta_pointer())
    }
}
