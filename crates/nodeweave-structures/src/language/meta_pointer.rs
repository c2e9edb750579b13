// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

/// Identifies a specific version of a language: the pair (language key, language version).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LanguageRef {
    pub key: String,
    pub version: String,
}

impl LanguageRef {
    pub fn new(key: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            version: version.into(),
        }
    }
}

impl Display for LanguageRef {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}@{}", self.key, self.version)
    }
}

/// The (language key, language version, element key) triple that identifies a classifier or a
/// feature independently of any in-memory object. This is the only way schema elements are
/// written to the wire.
///
/// # Example
/// ```
/// use nodeweave_structures::language::{LanguageRef, MetaPointer};
///
/// let language = LanguageRef::new("mylanguage", "1");
/// let pointer = MetaPointer::from_language(&language, "concept-MyNode");
/// assert_eq!(pointer.language, "mylanguage");
/// assert_eq!(pointer.to_string(), "mylanguage@1/concept-MyNode");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MetaPointer {
    pub language: String,
    pub version: String,
    pub key: String,
}

impl MetaPointer {
    pub fn new(
        language: impl Into<String>,
        version: impl Into<String>,
        key: impl Into<String>,
    ) -> Self {
        Self {
            language: language.into(),
            version: version.into(),
            key: key.into(),
        }
    }

    pub fn from_language(language: &LanguageRef, key: impl Into<String>) -> Self {
        Self::new(language.key.clone(), language.version.clone(), key)
    }

    pub fn language_ref(&self) -> LanguageRef {
        LanguageRef::new(self.language.clone(), self.version.clone())
    }
}

impl Display for MetaPointer {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}@{}/{}", self.language, self.version, self.key)
    }
}
