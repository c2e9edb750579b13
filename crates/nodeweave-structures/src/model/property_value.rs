// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

use std::fmt::{Display, Formatter};

/// A typed value held by a property.
///
/// Built-in primitive types map onto the first four variants. Values of enumerations are stored as
/// the key of the chosen literal.
#[derive(Debug, Clone, PartialEq)]
pub enum PropertyValue {
    Boolean(bool),
    Integer(i64),
    String(String),
    Json(serde_json::Value),
    EnumerationLiteral(String),
}

impl PropertyValue {
    pub fn variant_name(&self) -> &'static str {
        match self {
            PropertyValue::Boolean(_) => "Boolean",
            PropertyValue::Integer(_) => "Integer",
            PropertyValue::String(_) => "String",
            PropertyValue::Json(_) => "JSON",
            PropertyValue::EnumerationLiteral(_) => "EnumerationLiteral",
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            PropertyValue::Boolean(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            PropertyValue::Integer(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            PropertyValue::String(value) | PropertyValue::EnumerationLiteral(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_json(&self) -> Option<&serde_json::Value> {
        match self {
            PropertyValue::Json(value) => Some(value),
            _ => None,
        }
    }
}

impl Display for PropertyValue {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            PropertyValue::Boolean(value) => write!(f, "{}", value),
            PropertyValue::Integer(value) => write!(f, "{}", value),
            PropertyValue::String(value) => write!(f, "\"{}\"", value),
            PropertyValue::Json(value) => write!(f, "{}", value),
            PropertyValue::EnumerationLiteral(key) => write!(f, "#{}", key),
        }
    }
}

impl From<bool> for PropertyValue {
    fn from(value: bool) -> Self {
        PropertyValue::Boolean(value)
    }
}

impl From<i64> for PropertyValue {
    fn from(value: i64) -> Self {
        PropertyValue::Integer(value)
    }
}

impl From<i32> for PropertyValue {
    fn from(value: i32) -> Self {
        PropertyValue::Integer(value as i64)
    }
}

impl From<&str> for PropertyValue {
    fn from(value: &str) -> Self {
        PropertyValue::String(value.to_string())
    }
}

impl From<String> for PropertyValue {
    fn from(value: String) -> Self {
        PropertyValue::String(value)
    }
}

impl From<serde_json::Value> for PropertyValue {
    fn from(value: serde_json::Value) -> Self {
        PropertyValue::Json(value)
    }
}
