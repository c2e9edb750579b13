// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! The core crate for nodeweave. Defines the schema model (languages, classifiers, features),
//! the runtime node graph, and the error type shared by every other crate.

mod error;
pub mod language;
pub mod model;
mod policy;

pub use error::{ErrorCategory, ModelError, ModelResult};
pub use policy::UnavailableNodePolicy;
