// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

use crate::language::MetaPointer;

/// Broad class of a [`ModelError`], used by callers that only care about what went wrong at a
/// high level (bad schema, bad graph shape, bad value, proxy misuse or bad wire data).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    Schema,
    Structural,
    Value,
    Proxy,
    Format,
    Configuration,
}

/// Common error type for nodeweave model operations.
///
/// Every serialize/deserialize call aborts on the first error it produces. The unavailable-node
/// policies are the only place where a problem is recovered from instead of being reported.
///
/// # Examples
/// ```
/// use nodeweave_structures::{ErrorCategory, ModelError};
///
/// let err = ModelError::DuplicateId("n1".into());
/// assert_eq!(err.category(), ErrorCategory::Structural);
/// assert_eq!(err.to_string(), "Duplicate id found: n1");
/// ```
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ModelError {
    //region Schema
    #[error("Classifier not found for meta-pointer {0}")]
    ClassifierNotFound(MetaPointer),

    #[error("Feature {feature} not found in classifier {classifier}")]
    FeatureNotFound { feature: String, classifier: String },

    #[error("Feature {feature} is a {actual}, expected a {expected}")]
    FeatureKindMismatch {
        feature: String,
        expected: &'static str,
        actual: &'static str,
    },

    #[error("Invalid language: {0}")]
    InvalidLanguage(String),
    //endregion

    //region Structural
    #[error("Duplicate id found: {0}")]
    DuplicateId(String),

    #[error("Unable to complete sorting the instances, a containment loop is suspected. Unplaced ids: {unplaced:?}")]
    ContainmentCycle { unplaced: Vec<Option<String>> },

    #[error("No root found, the instances cannot be deserialized. Ids: {unplaced:?}")]
    NoRootFound { unplaced: Vec<Option<String>> },

    #[error("Parent {parent_id} of instance {child_id:?} is not available")]
    UnavailableParent {
        child_id: Option<String>,
        parent_id: String,
    },

    #[error("Child {child_id} of instance {parent_id:?} is not available")]
    UnavailableChild {
        parent_id: Option<String>,
        child_id: String,
    },

    #[error("Reference target {target_id} of instance {source_id:?} is not available")]
    UnavailableReferenceTarget {
        source_id: Option<String>,
        target_id: String,
    },

    #[error("Node {child:?} is not a child of node {parent:?}")]
    NotAChild {
        parent: Option<String>,
        child: Option<String>,
    },

    #[error("Dangling annotation instance {0:?}: the annotated node cannot be resolved")]
    DanglingAnnotation(Option<String>),
    //endregion

    //region Value
    #[error("Value {value} is not compatible with the type {data_type} of property {property}")]
    IncompatibleValue {
        property: String,
        data_type: String,
        value: String,
    },

    #[error("Feature {0} is derived and cannot be modified directly")]
    DerivedFeature(String),

    #[error("Feature {0} is single-valued and already holds a value")]
    CardinalityExceeded(String),

    #[error("Required property {0} has no value")]
    MissingRequiredValue(String),

    #[error("Primitive value error: {0}")]
    PrimitiveValue(String),

    #[error("Unable to instantiate classifier {0}")]
    Instantiation(String),
    //endregion

    //region Proxy
    #[error("Cannot {operation} on proxy node {id}: replace the proxy node with a real node to perform this operation")]
    ProxyAccess { id: String, operation: &'static str },

    #[error("Proxy nodes cannot be serialized (proxy {0})")]
    ProxySerialization(String),
    //endregion

    //region Format
    #[error("Only serializationFormatVersion = '{expected}' is supported, found '{found}'")]
    UnsupportedFormatVersion { found: String, expected: String },

    #[error("{table} index {index} out of range (table holds {len} entries)")]
    IndexOutOfRange {
        table: &'static str,
        index: i64,
        len: usize,
    },

    #[error("Malformed JSON chunk: {0}")]
    MalformedJson(String),

    #[error("Malformed binary chunk: {0}")]
    MalformedBinary(String),

    #[error("Required key {0} is missing")]
    MissingKey(String),
    //endregion

    #[error("Bad Parameters: {0}")]
    BadParameters(String),
}

impl ModelError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            ModelError::ClassifierNotFound(_)
            | ModelError::FeatureNotFound { .. }
            | ModelError::FeatureKindMismatch { .. }
            | ModelError::InvalidLanguage(_) => ErrorCategory::Schema,
            ModelError::DuplicateId(_)
            | ModelError::ContainmentCycle { .. }
            | ModelError::NoRootFound { .. }
            | ModelError::UnavailableParent { .. }
            | ModelError::UnavailableChild { .. }
            | ModelError::UnavailableReferenceTarget { .. }
            | ModelError::NotAChild { .. }
            | ModelError::DanglingAnnotation(_) => ErrorCategory::Structural,
            ModelError::IncompatibleValue { .. }
            | ModelError::DerivedFeature(_)
            | ModelError::CardinalityExceeded(_)
            | ModelError::MissingRequiredValue(_)
            | ModelError::PrimitiveValue(_)
            | ModelError::Instantiation(_) => ErrorCategory::Value,
            ModelError::ProxyAccess { .. } | ModelError::ProxySerialization(_) => {
                ErrorCategory::Proxy
            }
            ModelError::UnsupportedFormatVersion { .. }
            | ModelError::IndexOutOfRange { .. }
            | ModelError::MalformedJson(_)
            | ModelError::MalformedBinary(_)
            | ModelError::MissingKey(_) => ErrorCategory::Format,
            ModelError::BadParameters(_) => ErrorCategory::Configuration,
        }
    }

    /// True for the two outcomes of a sort that can make no progress. A set of instances whose
    /// parents form a closed loop never yields a root, so both variants signal a cycle.
    pub fn is_cycle_class(&self) -> bool {
        matches!(
            self,
            ModelError::ContainmentCycle { .. } | ModelError::NoRootFound { .. }
        )
    }
}

/// Result type for model operations
pub type ModelResult<T> = Result<T, ModelError>;
