// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! The runtime node graph: instances of classifiers, their property and reference values, and
//! proxies standing in for nodes that could not be resolved.

mod classifier_instance;
mod node_graph;
mod property_value;
mod proxy;
mod reference_value;

pub use classifier_instance::ClassifierInstance;
pub use node_graph::{NodeEntry, NodeGraph, NodeHandle};
pub use property_value::PropertyValue;
pub use proxy::ProxyNode;
pub use reference_value::{ReferenceTarget, ReferenceValue};
