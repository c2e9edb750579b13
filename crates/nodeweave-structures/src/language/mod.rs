// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Schema model: languages, classifiers, features and data types, all addressable on the wire
//! through [`MetaPointer`]s.

pub mod builtins;
mod classifier;
mod data_type;
mod feature;
#[allow(clippy::module_inception)]
mod language;
mod meta_pointer;
mod validation;

pub use classifier::{Classifier, ClassifierBuilder, ClassifierKind};
pub use data_type::{DataType, DataTypeKind, EnumerationLiteral};
pub use feature::{Feature, FeatureKind};
pub use language::Language;
pub use meta_pointer::{LanguageRef, MetaPointer};
pub use validation::{validate_language, Issue, IssueSeverity, ValidationResult};
