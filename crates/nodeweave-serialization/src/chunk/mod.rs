// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! The format-neutral serialized form of a set of nodes.
//!
//! Every codec reads and writes a [`SerializedChunk`]. A chunk refers to schema elements only
//! through [`MetaPointer`]s and to nodes only through their ids, so it can be produced and consumed
//! without any live schema.

use nodeweave_structures::language::{LanguageRef, MetaPointer};
use serde::{Deserialize, Deserializer, Serialize};

/// The only serialization format version understood by this crate
pub const SERIALIZATION_FORMAT_VERSION: &str = "2023.1";

/// A (language key, language version) pair declared as used by a chunk
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct UsedLanguage {
    pub key: String,
    pub version: String,
}

impl UsedLanguage {
    pub fn new(key: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            version: version.into(),
        }
    }
}

impl From<&LanguageRef> for UsedLanguage {
    fn from(language: &LanguageRef) -> Self {
        Self::new(language.key.clone(), language.version.clone())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SerializedPropertyValue {
    pub property: MetaPointer,
    #[serde(default, deserialize_with = "scalar_as_string")]
    pub value: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SerializedContainmentValue {
    pub containment: MetaPointer,
    pub children: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SerializedReferenceTarget {
    #[serde(default)]
    pub reference: Option<String>,
    #[serde(rename = "resolveInfo", default)]
    pub resolve_info: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SerializedReferenceValue {
    pub reference: MetaPointer,
    pub targets: Vec<SerializedReferenceTarget>,
}

/// One node (or annotation instance) of a chunk.
///
/// Reading accepts the legacy `concept` key for `classifier` and `children` for `containments`. A
/// missing or null `annotations` array reads as empty, a missing `id`, `classifier` or `parent` as
/// null.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SerializedClassifierInstance {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default, alias = "concept")]
    pub classifier: Option<MetaPointer>,
    pub properties: Vec<SerializedPropertyValue>,
    #[serde(alias = "children")]
    pub containments: Vec<SerializedContainmentValue>,
    pub references: Vec<SerializedReferenceValue>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub annotations: Vec<String>,
    #[serde(default)]
    pub parent: Option<String>,
}

impl SerializedClassifierInstance {
    pub fn new(id: Option<String>, classifier: MetaPointer) -> Self {
        Self {
            id,
            classifier: Some(classifier),
            ..Default::default()
        }
    }

    pub fn with_parent(mut self, parent: impl Into<String>) -> Self {
        self.parent = Some(parent.into());
        self
    }

    pub fn add_property_value(&mut self, property: MetaPointer, value: Option<String>) {
        self.properties.push(SerializedPropertyValue { property, value });
    }

    pub fn add_containment_value(&mut self, containment: MetaPointer, children: Vec<String>) {
        self.containments.push(SerializedContainmentValue {
            containment,
            children,
        });
    }

    pub fn add_reference_value(&mut self, reference: MetaPointer, targets: Vec<SerializedReferenceTarget>) {
        self.references.push(SerializedReferenceValue { reference, targets });
    }

    /// The serialized value of a property, `None` if the property is not listed at all
    pub fn property_value(&self, property: &MetaPointer) -> Option<Option<&str>> {
        self.properties
            .iter()
            .find(|p| p.property == *property)
            .map(|p| p.value.as_deref())
    }

    pub fn children(&self, containment: &MetaPointer) -> Option<&[String]> {
        self.containments
            .iter()
            .find(|c| c.containment == *containment)
            .map(|c| c.children.as_slice())
    }

    pub fn reference_targets(&self, reference: &MetaPointer) -> Option<&[SerializedReferenceTarget]> {
        self.references
            .iter()
            .find(|r| r.reference == *reference)
            .map(|r| r.targets.as_slice())
    }
}

//region Lenient readers

/// Property values written without quotes
#[derive(Deserialize)]
#[serde(untagged)]
enum Scalar {
    Text(String),
    Flag(bool),
    Number(serde_json::Number),
}

fn scalar_as_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    Ok(Option::<Scalar>::deserialize(deserializer)?.map(|scalar| match scalar {
        Scalar::Text(text) => text,
        Scalar::Flag(flag) => flag.to_string(),
        Scalar::Number(number) => number.to_string(),
    }))
}

fn null_as_empty<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<String>, D::Error> {
    Ok(Option::<Vec<String>>::deserialize(deserializer)?.unwrap_or_default())
}

//endregion

/// A batch of serialized nodes together with the format version and the languages they use.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SerializedChunk {
    pub serialization_format_version: String,
    pub languages: Vec<UsedLanguage>,
    pub nodes: Vec<SerializedClassifierInstance>,
}

impl Default for SerializedChunk {
    fn default() -> Self {
        Self::new(SERIALIZATION_FORMAT_VERSION)
    }
}

impl SerializedChunk {
    pub fn new(serialization_format_version: impl Into<String>) -> Self {
        Self {
            serialization_format_version: serialization_format_version.into(),
            languages: Vec::new(),
            nodes: Vec::new(),
        }
    }

    /// Records a used language once, keeping first-seen order
    pub fn add_language(&mut self, language: UsedLanguage) {
        if !self.languages.contains(&language) {
            self.languages.push(language);
        }
    }

    pub fn add_instance(&mut self, instance: SerializedClassifierInstance) {
        self.nodes.push(instance);
    }

    pub fn instance_by_id(&self, id: &str) -> Option<&SerializedClassifierInstance> {
        self.nodes.iter().find(|n| n.id.as_deref() == Some(id))
    }
}
