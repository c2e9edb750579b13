// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

use crate::chunk::SerializedClassifierInstance;
use crate::instance_resolver::InstanceResolver;
use ahash::AHashMap;
use nodeweave_structures::language::{Classifier, Feature};
use nodeweave_structures::model::{ClassifierInstance, NodeGraph, PropertyValue};
use nodeweave_structures::ModelError;
use std::fmt::{Debug, Formatter};
use std::sync::Arc;

/// Everything a constructor may look at while building one instance.
///
/// Instances are built leaves first, so the nodes named as children of the serialized instance
/// are already present in `graph` and resolvable through `resolver`.
pub struct InstantiationContext<'a> {
    pub classifier: &'a Arc<Classifier>,
    pub serialized: &'a SerializedClassifierInstance,
    pub property_values: &'a [(&'a Feature, Option<PropertyValue>)],
    pub graph: &'a NodeGraph,
    pub resolver: &'a dyn InstanceResolver,
}

impl<'a> InstantiationContext<'a> {
    pub fn id(&self) -> Option<String> {
        self.serialized.id.clone()
    }

    /// The already deserialized value of a property, looked up by property name
    pub fn property_value(&self, name: &str) -> Option<&PropertyValue> {
        self.property_values
            .iter()
            .find(|(feature, _)| feature.name() == name)
            .and_then(|(_, value)| value.as_ref())
    }
}

pub type Constructor =
    Box<dyn Fn(&InstantiationContext<'_>) -> Result<ClassifierInstance, ModelError> + Send + Sync>;

/// Builds instances for deserialized nodes, keyed by classifier id.
///
/// A constructor registered for a classifier id takes precedence. Otherwise the instantiator falls
/// back to a plain dynamic instance of the classifier if dynamic instantiation is enabled, and
/// fails if it is not.
#[derive(Default)]
pub struct Instantiator {
    custom: AHashMap<String, Constructor>,
    dynamic: bool,
}

impl Debug for Instantiator {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Instantiator")
            .field("custom", &self.custom.keys().collect::<Vec<_>>())
            .field("dynamic", &self.dynamic)
            .finish()
    }
}

impl Instantiator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_custom_deserializer(&mut self, classifier_id: impl Into<String>, constructor: Constructor) {
        self.custom.insert(classifier_id.into(), constructor);
    }

    pub fn enable_dynamic_instantiation(&mut self) {
        self.dynamic = true;
    }

    pub fn set_dynamic_instantiation(&mut self, enabled: bool) {
        self.dynamic = enabled;
    }

    pub fn is_dynamic_instantiation_enabled(&self) -> bool {
        self.dynamic
    }

    pub fn instantiate(&self, context: &InstantiationContext<'_>) -> Result<ClassifierInstance, ModelError> {
        let instance = if let Some(constructor) = self.custom.get(context.classifier.id()) {
            constructor(context)?
        } else if self.dynamic {
            ClassifierInstance::new(context.id(), context.classifier)
        } else {
            return Err(ModelError::Instantiation(format!(
                "{}: no constructor registered for classifier id {} and dynamic instantiation is disabled",
                context.classifier.meta_pointer(),
                context.classifier.id()
            )));
        };
        if instance.id() != context.serialized.id.as_deref() {
            return Err(ModelError::Instantiation(format!(
                "{}: constructor returned id {:?} for serialized id {:?}",
                context.classifier.meta_pointer(),
                instance.id(),
                context.serialized.id
            )));
        }
        Ok(instance)
    }
}
