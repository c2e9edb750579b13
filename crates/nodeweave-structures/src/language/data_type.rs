// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

use crate::language::builtins;
use crate::language::{LanguageRef, MetaPointer};
use crate::model::PropertyValue;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EnumerationLiteral {
    pub id: String,
    pub key: String,
    pub name: String,
}

impl EnumerationLiteral {
    pub fn new(id: impl Into<String>, key: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            key: key.into(),
            name: name.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum DataTypeKind {
    Primitive,
    Enumeration { literals: Vec<EnumerationLiteral> },
}

/// The type of a property: either an opaque primitive type or an enumeration.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DataType {
    id: String,
    key: String,
    name: String,
    language: LanguageRef,
    kind: DataTypeKind,
}

impl DataType {
    pub fn primitive(
        id: impl Into<String>,
        key: impl Into<String>,
        name: impl Into<String>,
        language: &LanguageRef,
    ) -> Self {
        Self {
            id: id.into(),
            key: key.into(),
            name: name.into(),
            language: language.clone(),
            kind: DataTypeKind::Primitive,
        }
    }

    pub fn enumeration(
        id: impl Into<String>,
        key: impl Into<String>,
        name: impl Into<String>,
        language: &LanguageRef,
    ) -> Self {
        Self {
            id: id.into(),
            key: key.into(),
            name: name.into(),
            language: language.clone(),
            kind: DataTypeKind::Enumeration {
                literals: Vec::new(),
            },
        }
    }

    /// Adds a literal. Has no effect on primitive types.
    pub fn with_literal(mut self, literal: EnumerationLiteral) -> Self {
        if let DataTypeKind::Enumeration { literals } = &mut self.kind {
            literals.push(literal);
        }
        self
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

    pub fn language(&self) -> &LanguageRef {
        &self.language
    }

    pub fn kind(&self) -> &DataTypeKind {
        &self.kind
    }

    pub fn meta_pointer(&self) -> MetaPointer {
        MetaPointer::from_language(&self.language, self.key.clone())
    }

    pub fn is_enumeration(&self) -> bool {
        matches!(self.kind, DataTypeKind::Enumeration { .. })
    }

    pub fn literals(&self) -> &[EnumerationLiteral] {
        match &self.kind {
            DataTypeKind::Enumeration { literals } => literals,
            DataTypeKind::Primitive => &[],
        }
    }

    pub fn literal_by_key(&self, key: &str) -> Option<&EnumerationLiteral> {
        self.literals().iter().find(|literal| literal.key == key)
    }

    /// Checks that a value may be stored in a property of this type. Built-in primitive types
    /// demand the matching variant, enumerations demand one of their literal keys, and any other
    /// primitive type is opaque and accepts every non-literal value.
    pub fn accepts(&self, value: &PropertyValue) -> bool {
        match &self.kind {
            DataTypeKind::Enumeration { .. } => match value {
                PropertyValue::EnumerationLiteral(key) => self.literal_by_key(key).is_some(),
                _ => false,
            },
            DataTypeKind::Primitive => match self.id.as_str() {
                builtins::BOOLEAN_ID => matches!(value, PropertyValue::Boolean(_)),
                builtins::INTEGER_ID => matches!(value, PropertyValue::Integer(_)),
                builtins::STRING_ID => matches!(value, PropertyValue::String(_)),
                builtins::JSON_ID => matches!(value, PropertyValue::Json(_)),
                _ => !matches!(value, PropertyValue::EnumerationLiteral(_)),
            },
        }
    }
}
