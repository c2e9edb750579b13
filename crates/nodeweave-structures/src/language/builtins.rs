// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! The built-in language shipping the primitive types every other language can use.

use crate::language::{DataType, Language};
use std::sync::Arc;

pub const LANGUAGE_ID: &str = "LionCore-builtins";
pub const LANGUAGE_KEY: &str = "LionCore-builtins";
pub const LANGUAGE_VERSION: &str = "2023.1";

pub const BOOLEAN_ID: &str = "LionCore-builtins-Boolean";
pub const INTEGER_ID: &str = "LionCore-builtins-Integer";
pub const STRING_ID: &str = "LionCore-builtins-String";
pub const JSON_ID: &str = "LionCore-builtins-JSON";

/// Builds the built-in language with its four primitive types.
///
/// # Example
/// ```
/// use nodeweave_structures::language::builtins;
///
/// let language = builtins::language();
/// assert_eq!(language.data_types().len(), 4);
/// assert!(language.get_data_type_by_key(builtins::BOOLEAN_ID).is_some());
/// ```
pub fn language() -> Language {
    let mut language = Language::new(LANGUAGE_ID, LANGUAGE_KEY, "LionCore.builtins", LANGUAGE_VERSION);
    for data_type in [boolean(), integer(), string(), json()] {
        // keys and versions match by construction
        let _ = language.add_data_type(&data_type);
    }
    language
}

fn primitive(id: &str, name: &str) -> Arc<DataType> {
    let language = crate::language::LanguageRef::new(LANGUAGE_KEY, LANGUAGE_VERSION);
    Arc::new(DataType::primitive(id, id, name, &language))
}

pub fn boolean() -> Arc<DataType> {
    primitive(BOOLEAN_ID, "Boolean")
}

pub fn integer() -> Arc<DataType> {
    primitive(INTEGER_ID, "Integer")
}

pub fn string() -> Arc<DataType> {
    primitive(STRING_ID, "String")
}

pub fn json() -> Arc<DataType> {
    primitive(JSON_ID, "JSON")
}
