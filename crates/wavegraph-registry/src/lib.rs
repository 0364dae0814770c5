//! Wavegraph Registry - node-type descriptor catalog
//!
//! A thin layer over [`wavegraph_core::builtins`]'s factory functions: a
//! registry that names every built-in node kind, gives it a human-readable
//! description and category, and can hand back the factory itself for a
//! host that wants to register it against a `wavegraph_core::GraphStore`
//! without hardcoding the built-in type name strings.
//!
//! # Example
//!
//! ```rust
//! use wavegraph_registry::NodeRegistry;
//!
//! let registry = NodeRegistry::new();
//! for descriptor in registry.all_node_types() {
//!     println!("{}: {}", descriptor.type_name, descriptor.description);
//! }
//!
//! assert!(registry.get("root").is_some());
//! ```

use wavegraph_core::node::NodeFactory;

/// Category of built-in node, for organization and filtering in host UIs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeCategory {
    /// Graph entry points with their own activate/deactivate lifecycle.
    Root,
    /// Feedback-tap read/write pair (§4.5).
    Tap,
    /// Everything else a graph can exercise end to end without a DSP
    /// node library of its own.
    Generator,
}

impl NodeCategory {
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            NodeCategory::Root => "Root",
            NodeCategory::Tap => "Tap",
            NodeCategory::Generator => "Generator",
        }
    }
}

/// Describes a built-in node kind in the registry.
#[derive(Debug, Clone, Copy)]
pub struct NodeDescriptor {
    /// The type name instructions pass to `CreateNode` to construct one.
    pub type_name: &'static str,
    /// Human-readable name.
    pub name: &'static str,
    /// Brief description of the node's role in the graph.
    pub description: &'static str,
    /// Category for organization.
    pub category: NodeCategory,
}

struct RegistryEntry {
    descriptor: NodeDescriptor,
    factory: NodeFactory,
}

/// Catalog of every node kind `wavegraph_core::Runtime` registers by
/// default.
pub struct NodeRegistry {
    entries: Vec<RegistryEntry>,
}

impl Default for NodeRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl NodeRegistry {
    /// Creates a registry with every built-in node kind registered.
    #[must_use]
    pub fn new() -> Self {
        let mut registry = Self {
            entries: Vec::with_capacity(5),
        };
        registry.register_builtins();
        registry
    }

    fn register_builtins(&mut self) {
        use wavegraph_core::builtins::{ConstNode, MultiplyNode, RootNode, TapInNode, TapOutNode};

        self.register(
            NodeDescriptor {
                type_name: "root",
                name: "Root",
                description: "Graph entry point with activate/deactivate gain ramp",
                category: NodeCategory::Root,
            },
            RootNode::construct,
        );
        self.register(
            NodeDescriptor {
                type_name: "tap_in",
                name: "Tap In",
                description: "Reads from a named shared feedback buffer",
                category: NodeCategory::Tap,
            },
            TapInNode::construct,
        );
        self.register(
            NodeDescriptor {
                type_name: "tap_out",
                name: "Tap Out",
                description: "Writes a one-block-delayed feedback buffer",
                category: NodeCategory::Tap,
            },
            TapOutNode::construct,
        );
        self.register(
            NodeDescriptor {
                type_name: "const",
                name: "Constant",
                description: "Emits a fixed value every sample",
                category: NodeCategory::Generator,
            },
            ConstNode::construct,
        );
        self.register(
            NodeDescriptor {
                type_name: "multiply",
                name: "Multiply",
                description: "Elementwise product of its inputs",
                category: NodeCategory::Generator,
            },
            MultiplyNode::construct,
        );
    }

    fn register(&mut self, descriptor: NodeDescriptor, factory: NodeFactory) {
        self.entries.push(RegistryEntry { descriptor, factory });
    }

    /// Returns descriptors for every registered node kind.
    #[must_use]
    pub fn all_node_types(&self) -> Vec<&NodeDescriptor> {
        self.entries.iter().map(|e| &e.descriptor).collect()
    }

    /// Returns descriptors for node kinds in a specific category.
    #[must_use]
    pub fn node_types_in_category(&self, category: NodeCategory) -> Vec<&NodeDescriptor> {
        self.entries
            .iter()
            .filter(|e| e.descriptor.category == category)
            .map(|e| &e.descriptor)
            .collect()
    }

    /// Looks up a descriptor by type name.
    #[must_use]
    pub fn get(&self, type_name: &str) -> Option<&NodeDescriptor> {
        self.entries
            .iter()
            .find(|e| e.descriptor.type_name == type_name)
            .map(|e| &e.descriptor)
    }

    /// Looks up the factory function for a type name, for a host building
    /// its own `GraphStore` without depending on `wavegraph_core::builtins`
    /// directly.
    #[must_use]
    pub fn factory(&self, type_name: &str) -> Option<NodeFactory> {
        self.entries
            .iter()
            .find(|e| e.descriptor.type_name == type_name)
            .map(|e| e.factory)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
