//! Node type registry: the set of node type names a scene may use.
//!
//! The scene graph does not interpret node types beyond checking that they
//! exist and filling in each type's default components. Hosts register
//! their own types on top of the built-ins.

use std::collections::HashMap;

use engine_component::ComponentKind;

/// A registered node type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeTypeInfo {
    pub name: String,
    /// Parent type, whose default components are inherited.
    pub base: Option<String>,
    /// Components every node of this type starts with.
    pub default_components: Vec<ComponentKind>,
}

impl NodeTypeInfo {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            base: None,
            default_components: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_base(mut self, base: impl Into<String>) -> Self {
        self.base = Some(base.into());
        self
    }

    #[must_use]
    pub fn with_default(mut self, kind: ComponentKind) -> Self {
        self.default_components.push(kind);
        self
    }
}

/// Registry of known node types, keyed by name.
#[derive(Debug, Clone)]
pub struct NodeTypeRegistry {
    types: HashMap<String, NodeTypeInfo>,
}

impl NodeTypeRegistry {
    /// An empty registry.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            types: HashMap::new(),
        }
    }

    /// A registry holding the engine's built-in node types.
    #[must_use]
    pub fn with_builtin_types() -> Self {
        let mut registry = Self::empty();
        registry.register(NodeTypeInfo::new("Node"));
        registry.register(
            NodeTypeInfo::new("Node2D")
                .with_base("Node")
                .with_default(ComponentKind::Transform2D),
        );
        for (name, kind) in [
            ("Sprite", Some(ComponentKind::Sprite)),
            ("AnimatedSprite", Some(ComponentKind::AnimatedSprite)),
            ("TextLabel", Some(ComponentKind::TextLabel)),
            ("Collider2D", Some(ComponentKind::Collider2D)),
            ("ColorRect", Some(ComponentKind::ColorRect)),
            ("Parallax", Some(ComponentKind::Parallax)),
            ("Particles2D", None),
        ] {
            let mut info = NodeTypeInfo::new(name).with_base("Node2D");
            if let Some(kind) = kind {
                info = info.with_default(kind);
            }
            registry.register(info);
        }
        registry
    }

    /// Register a node type, replacing any type with the same name.
    ///
    /// Returns `true` if the name was new.
    pub fn register(&mut self, info: NodeTypeInfo) -> bool {
        self.types.insert(info.name.clone(), info).is_none()
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&NodeTypeInfo> {
        self.types.get(name)
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.types.contains_key(name)
    }

    /// Returns `true` if `name` is `base` or inherits from it.
    #[must_use]
    pub fn is_a(&self, name: &str, base: &str) -> bool {
        self.lineage(name).iter().any(|info| info.name == base)
    }

    /// Default components of `name` and all its bases, base-most first,
    /// without duplicates.
    #[must_use]
    pub fn default_components(&self, name: &str) -> Vec<ComponentKind> {
        let mut kinds = Vec::new();
        for info in self.lineage(name).iter().rev() {
            for &kind in &info.default_components {
                if !kinds.contains(&kind) {
                    kinds.push(kind);
                }
            }
        }
        kinds
    }

    /// `name` followed by its bases. Stops at an unknown base or a
    /// repeated name.
    fn lineage(&self, name: &str) -> Vec<&NodeTypeInfo> {
        let mut chain: Vec<&NodeTypeInfo> = Vec::new();
        let mut current = self.types.get(name);
        while let Some(info) = current {
            if chain.iter().any(|seen| seen.name == info.name) {
                break;
            }
            chain.push(info);
            current = info.base.as_deref().and_then(|b| self.types.get(b));
        }
        chain
    }

    pub fn iter(&self) -> impl Iterator<Item = &NodeTypeInfo> {
        self.types.values()
    }

    #[must_use]
    pub fn type_count(&self) -> usize {
        self.types.len()
    }
}

impl Default for NodeTypeRegistry {
    fn default() -> Self {
        Self::with_builtin_types()
    }
}
