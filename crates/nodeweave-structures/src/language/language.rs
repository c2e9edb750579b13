// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

use crate::language::{Classifier, DataType, LanguageRef};
use crate::ModelError;
use std::sync::Arc;

/// A versioned collection of classifiers and data types.
///
/// Dependencies are recorded by (key, version) only. Registering a language with a resolver does
/// not register its dependencies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Language {
    id: String,
    key: String,
    name: String,
    version: String,
    dependencies: Vec<LanguageRef>,
    classifiers: Vec<Arc<Classifier>>,
    data_types: Vec<Arc<DataType>>,
}

impl Language {
    pub fn new(
        id: impl Into<String>,
        key: impl Into<String>,
        name: impl Into<String>,
        version: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            key: key.into(),
            name: name.into(),
            version: version.into(),
            dependencies: Vec::new(),
            classifiers: Vec::new(),
            data_types: Vec::new(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn language_ref(&self) -> LanguageRef {
        LanguageRef::new(self.key.clone(), self.version.clone())
    }

    pub fn dependencies(&self) -> &[LanguageRef] {
        &self.dependencies
    }

    pub fn classifiers(&self) -> &[Arc<Classifier>] {
        &self.classifiers
    }

    pub fn data_types(&self) -> &[Arc<DataType>] {
        &self.data_types
    }

    pub fn add_dependency(&mut self, dependency: LanguageRef) {
        if !self.dependencies.contains(&dependency) {
            self.dependencies.push(dependency);
        }
    }

    /// Adds a classifier built against this language's (key, version).
    pub fn add_classifier(&mut self, classifier: &Arc<Classifier>) -> Result<(), ModelError> {
        self.verify_owned(classifier.language(), classifier.key())?;
        self.classifiers.push(Arc::clone(classifier));
        Ok(())
    }

    pub fn add_data_type(&mut self, data_type: &Arc<DataType>) -> Result<(), ModelError> {
        self.verify_owned(data_type.language(), data_type.key())?;
        self.data_types.push(Arc::clone(data_type));
        Ok(())
    }

    pub fn get_classifier_by_key(&self, key: &str) -> Option<&Arc<Classifier>> {
        self.classifiers.iter().find(|c| c.key() == key)
    }

    pub fn get_classifier_by_name(&self, name: &str) -> Option<&Arc<Classifier>> {
        self.classifiers.iter().find(|c| c.name() == name)
    }

    pub fn get_data_type_by_key(&self, key: &str) -> Option<&Arc<DataType>> {
        self.data_types.iter().find(|d| d.key() == key)
    }

    pub fn enumerations(&self) -> impl Iterator<Item = &Arc<DataType>> {
        self.data_types.iter().filter(|d| d.is_enumeration())
    }

    fn verify_owned(&self, element_language: &LanguageRef, element_key: &str) -> Result<(), ModelError> {
        if element_language.key != self.key || element_language.version != self.version {
            return Err(ModelError::InvalidLanguage(format!(
                "element {} belongs to {}, it cannot be added to {}@{}",
                element_key, element_language, self.key, self.version
            )));
        }
        Ok(())
    }
}
