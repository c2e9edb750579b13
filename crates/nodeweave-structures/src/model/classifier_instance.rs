// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

use crate::language::{Classifier, Feature, MetaPointer};
use crate::model::{NodeHandle, PropertyValue, ReferenceValue};
use crate::ModelError;
use ahash::AHashMap;
use std::sync::Arc;

/// The data of a real node (or annotation instance): its classifier and its feature values.
///
/// Values are keyed by the meta-pointer of the feature, so an instance can hold values for any
/// feature its classifier declares or inherits. Containment lists, annotations and the parent
/// edge are owned by the [`NodeGraph`](crate::model::NodeGraph), which keeps both ends of those
/// edges consistent; they can be read here but only changed through the graph.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassifierInstance {
    id: Option<String>,
    classifier: Arc<Classifier>,
    pub(crate) parent: Option<NodeHandle>,
    properties: AHashMap<MetaPointer, PropertyValue>,
    pub(crate) containments: AHashMap<MetaPointer, Vec<NodeHandle>>,
    pub(crate) references: AHashMap<MetaPointer, Vec<ReferenceValue>>,
    pub(crate) annotations: Vec<NodeHandle>,
}

impl ClassifierInstance {
    pub fn new(id: Option<String>, classifier: &Arc<Classifier>) -> Self {
        Self {
            id,
            classifier: Arc::clone(classifier),
            parent: None,
            properties: AHashMap::new(),
            containments: AHashMap::new(),
            references: AHashMap::new(),
            annotations: Vec::new(),
        }
    }

    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    pub fn classifier(&self) -> &Arc<Classifier> {
        &self.classifier
    }

    pub fn parent(&self) -> Option<NodeHandle> {
        self.parent
    }

    pub fn annotations(&self) -> &[NodeHandle] {
        &self.annotations
    }

    //region Properties

    pub fn property_value(&self, property: &Feature) -> Result<Option<&PropertyValue>, ModelError> {
        self.check_feature(property, "property")?;
        Ok(self.properties.get(&property.meta_pointer()))
    }

    /// Sets or clears (with `None`) a property value after checking that the property belongs to
    /// the classifier, is not derived and accepts the value.
    pub fn set_property_value(
        &mut self,
        property: &Feature,
        value: Option<PropertyValue>,
    ) -> Result<(), ModelError> {
        if property.is_derived() {
            return Err(ModelError::DerivedFeature(property.meta_pointer().to_string()));
        }
        self.restore_property_value(property, value)
    }

    /// Sets a property value read back from a serialized form. Derived properties are accepted
    /// here because their serialized value is a snapshot of what the model computed.
    pub fn restore_property_value(
        &mut self,
        property: &Feature,
        value: Option<PropertyValue>,
    ) -> Result<(), ModelError> {
        self.check_feature(property, "property")?;
        let meta_pointer = property.meta_pointer();
        match value {
            None => {
                self.properties.remove(&meta_pointer);
            }
            Some(value) => {
                if let Some(data_type) = property.data_type() {
                    if !data_type.accepts(&value) {
                        return Err(ModelError::IncompatibleValue {
                            property: meta_pointer.to_string(),
                            data_type: data_type.meta_pointer().to_string(),
                            value: value.to_string(),
                        });
                    }
                }
                self.properties.insert(meta_pointer, value);
            }
        }
        Ok(())
    }

    //endregion

    //region Links

    pub fn children_in(&self, containment: &Feature) -> Result<&[NodeHandle], ModelError> {
        self.check_feature(containment, "containment")?;
        Ok(self
            .containments
            .get(&containment.meta_pointer())
            .map(Vec::as_slice)
            .unwrap_or(&[]))
    }

    pub fn reference_values(&self, reference: &Feature) -> Result<&[ReferenceValue], ModelError> {
        self.check_feature(reference, "reference")?;
        Ok(self
            .references
            .get(&reference.meta_pointer())
            .map(Vec::as_slice)
            .unwrap_or(&[]))
    }

    /// The containment holding the given child, if any
    pub(crate) fn containment_of(&self, child: NodeHandle) -> Option<&MetaPointer> {
        self.containments
            .iter()
            .find(|(_, children)| children.contains(&child))
            .map(|(meta_pointer, _)| meta_pointer)
    }

    pub(crate) fn detach(&mut self, child: NodeHandle) -> bool {
        let mut found = false;
        for children in self.containments.values_mut() {
            if let Some(position) = children.iter().position(|c| *c == child) {
                children.remove(position);
                found = true;
            }
        }
        if let Some(position) = self.annotations.iter().position(|a| *a == child) {
            self.annotations.remove(position);
            found = true;
        }
        found
    }

    //endregion

    /// Fails unless the feature is declared by (or inherited into) this instance's classifier and
    /// has the expected kind.
    pub(crate) fn check_feature(&self, feature: &Feature, expected: &'static str) -> Result<(), ModelError> {
        if !self.classifier.has_feature(feature) {
            return Err(ModelError::FeatureNotFound {
                feature: feature.meta_pointer().to_string(),
                classifier: self.classifier.meta_pointer().to_string(),
            });
        }
        if feature.kind_name() != expected {
            return Err(ModelError::FeatureKindMismatch {
                feature: feature.meta_pointer().to_string(),
                expected,
                actual: feature.kind_name(),
            });
        }
        Ok(())
    }
}
