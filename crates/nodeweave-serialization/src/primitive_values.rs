// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

use ahash::AHashMap;
use nodeweave_structures::language::{builtins, DataType, Language};
use nodeweave_structures::model::PropertyValue;
use nodeweave_structures::ModelError;
use std::fmt::{Debug, Formatter};
use std::sync::Arc;

pub type PrimitiveSerializer = Box<dyn Fn(&PropertyValue) -> Result<String, ModelError> + Send + Sync>;
pub type PrimitiveDeserializer = Box<dyn Fn(&str) -> Result<PropertyValue, ModelError> + Send + Sync>;

/// Converts property values to and from their string form on the wire, keyed by data type id.
///
/// Enumerations registered through [`PrimitiveValuesSerialization::register_language`] are handled
/// without custom functions: the wire value is the key of the literal.
#[derive(Default)]
pub struct PrimitiveValuesSerialization {
    serializers: AHashMap<String, PrimitiveSerializer>,
    deserializers: AHashMap<String, PrimitiveDeserializer>,
    enumerations: AHashMap<String, Arc<DataType>>,
}

impl Debug for PrimitiveValuesSerialization {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PrimitiveValuesSerialization")
            .field("serializers", &self.serializers.keys().collect::<Vec<_>>())
            .field("deserializers", &self.deserializers.keys().collect::<Vec<_>>())
            .field("enumerations", &self.enumerations.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl PrimitiveValuesSerialization {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_serializer(&mut self, data_type_id: impl Into<String>, serializer: PrimitiveSerializer) {
        self.serializers.insert(data_type_id.into(), serializer);
    }

    pub fn register_deserializer(&mut self, data_type_id: impl Into<String>, deserializer: PrimitiveDeserializer) {
        self.deserializers.insert(data_type_id.into(), deserializer);
    }

    /// Registers the string forms of the built-in types: `true`/`false`, decimal integers,
    /// verbatim strings and compact JSON text.
    pub fn register_builtins(&mut self) {
        self.register_serializer(
            builtins::BOOLEAN_ID,
            Box::new(|value| match value {
                PropertyValue::Boolean(b) => Ok(b.to_string()),
                other => Err(unexpected_variant("Boolean", other)),
            }),
        );
        self.register_deserializer(
            builtins::BOOLEAN_ID,
            Box::new(|text| match text {
                "true" => Ok(PropertyValue::Boolean(true)),
                "false" => Ok(PropertyValue::Boolean(false)),
                other => Err(ModelError::PrimitiveValue(format!(
                    "'{}' is not a valid Boolean, expected true or false",
                    other
                ))),
            }),
        );

        self.register_serializer(
            builtins::INTEGER_ID,
            Box::new(|value| match value {
                PropertyValue::Integer(i) => Ok(i.to_string()),
                other => Err(unexpected_variant("Integer", other)),
            }),
        );
        self.register_deserializer(
            builtins::INTEGER_ID,
            Box::new(|text| {
                text.parse::<i64>()
                    .map(PropertyValue::Integer)
                    .map_err(|e| ModelError::PrimitiveValue(format!("'{}' is not a valid Integer: {}", text, e)))
            }),
        );

        self.register_serializer(
            builtins::STRING_ID,
            Box::new(|value| match value {
                PropertyValue::String(s) => Ok(s.clone()),
                other => Err(unexpected_variant("String", other)),
            }),
        );
        self.register_deserializer(
            builtins::STRING_ID,
            Box::new(|text| Ok(PropertyValue::String(text.to_string()))),
        );

        self.register_serializer(
            builtins::JSON_ID,
            Box::new(|value| match value {
                PropertyValue::Json(json) => serde_json::to_string(json)
                    .map_err(|e| ModelError::PrimitiveValue(format!("Unable to write JSON value: {}", e))),
                other => Err(unexpected_variant("JSON", other)),
            }),
        );
        self.register_deserializer(
            builtins::JSON_ID,
            Box::new(|text| {
                serde_json::from_str(text)
                    .map(PropertyValue::Json)
                    .map_err(|e| ModelError::PrimitiveValue(format!("'{}' is not valid JSON: {}", text, e)))
            }),
        );
    }

    /// Makes every enumeration of the language serializable
    pub fn register_language(&mut self, language: &Language) {
        for enumeration in language.enumerations() {
            self.enumerations
                .insert(enumeration.id().to_string(), Arc::clone(enumeration));
        }
    }

    pub fn serialize(&self, data_type: &DataType, value: &PropertyValue) -> Result<String, ModelError> {
        if let Some(serializer) = self.serializers.get(data_type.id()) {
            return serializer(value);
        }
        if let Some(enumeration) = self.enumerations.get(data_type.id()) {
            return match value {
                PropertyValue::EnumerationLiteral(key) if enumeration.literal_by_key(key).is_some() => {
                    Ok(key.clone())
                }
                other => Err(ModelError::PrimitiveValue(format!(
                    "{} is not a literal of enumeration {}",
                    other,
                    enumeration.meta_pointer()
                ))),
            };
        }
        Err(ModelError::PrimitiveValue(format!(
            "No serializer registered for data type {}",
            data_type.id()
        )))
    }

    /// Reads a value back. A `None` input is an unset property, which is only allowed when the
    /// property is optional.
    pub fn deserialize(
        &self,
        data_type: &DataType,
        serialized: Option<&str>,
        is_required: bool,
    ) -> Result<Option<PropertyValue>, ModelError> {
        let text = match serialized {
            Some(text) => text,
            None if is_required => {
                return Err(ModelError::MissingRequiredValue(data_type.id().to_string()))
            }
            None => return Ok(None),
        };
        if let Some(deserializer) = self.deserializers.get(data_type.id()) {
            return deserializer(text).map(Some);
        }
        if let Some(enumeration) = self.enumerations.get(data_type.id()) {
            if enumeration.literal_by_key(text).is_none() {
                return Err(ModelError::PrimitiveValue(format!(
                    "'{}' is not a literal of enumeration {}",
                    text,
                    enumeration.meta_pointer()
                )));
            }
            return Ok(Some(PropertyValue::EnumerationLiteral(text.to_string())));
        }
        Err(ModelError::PrimitiveValue(format!(
            "No deserializer registered for data type {}",
            data_type.id()
        )))
    }
}

fn unexpected_variant(expected: &str, value: &PropertyValue) -> ModelError {
    ModelError::PrimitiveValue(format!(
        "Expected a {} value, found {} ({})",
        expected,
        value.variant_name(),
        value
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use nodeweave_structures::language::{EnumerationLiteral, LanguageRef};
    use serde_json::json;

    fn standard() -> PrimitiveValuesSerialization {
        let mut values = PrimitiveValuesSerialization::new();
        values.register_builtins();
        values
    }

    #[test]
    fn test_builtin_string_forms() {
        let values = standard();
        assert_eq!(values.serialize(&builtins::boolean(), &true.into()).unwrap(), "true");
        assert_eq!(values.serialize(&builtins::integer(), &(-42i64).into()).unwrap(), "-42");
        assert_eq!(
            values.serialize(&builtins::json(), &json!({"a": [1, 2]}).into()).unwrap(),
            "{\"a\":[1,2]}"
        );
        assert_eq!(
            values.deserialize(&builtins::integer(), Some("17"), true).unwrap(),
            Some(PropertyValue::Integer(17))
        );
        assert!(values.deserialize(&builtins::boolean(), Some("yes"), true).is_err());
        assert!(values.serialize(&builtins::string(), &true.into()).is_err());
    }

    #[test]
    fn test_null_values() {
        let values = standard();
        assert_eq!(values.deserialize(&builtins::string(), None, false).unwrap(), None);
        assert!(matches!(
            values.deserialize(&builtins::string(), None, true),
            Err(ModelError::MissingRequiredValue(_))
        ));
        // an empty string is a value, not an absence
        assert_eq!(
            values.deserialize(&builtins::string(), Some(""), true).unwrap(),
            Some(PropertyValue::String(String::new()))
        );
    }

    #[test]
    fn test_enumerations_use_literal_keys() {
        let mut language = Language::new("lib-id", "library", "Library", "1");
        let genre = Arc::new(
            DataType::enumeration("lib-Genre", "Genre", "Genre", &LanguageRef::new("library", "1"))
                .with_literal(EnumerationLiteral::new("lib-Genre-poetry", "poetry", "Poetry")),
        );
        language.add_data_type(&genre).unwrap();

        let mut values = PrimitiveValuesSerialization::new();
        assert!(values.deserialize(&genre, Some("poetry"), true).is_err());

        values.register_language(&language);
        let literal = PropertyValue::EnumerationLiteral("poetry".into());
        assert_eq!(values.serialize(&genre, &literal).unwrap(), "poetry");
        assert_eq!(values.deserialize(&genre, Some("poetry"), true).unwrap(), Some(literal));
        assert!(values.deserialize(&genre, Some("drama"), true).is_err());
    }
}
