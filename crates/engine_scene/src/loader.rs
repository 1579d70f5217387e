//! Scene loader: turns a [`StageNode`] description into entity table rows
//! and tree edges.
//!
//! Loading is two-phase. [`SceneLoader::validate`] checks the whole
//! description first; [`SceneLoader::build`] only runs on a description
//! that passed, so a malformed scene never leaves half a tree behind.

use engine_component::{ComponentError, ComponentSet, Entity};
use tracing::debug;

use crate::error::SceneError;
use crate::registry::NodeTypeRegistry;
use crate::stage::StageNode;
use crate::table::{EntityRecord, EntityTable};
use crate::tree::NodeTree;

/// Validates and builds scene descriptions against a node type registry.
#[derive(Debug, Clone, Copy)]
pub struct SceneLoader<'a> {
    registry: &'a NodeTypeRegistry,
    max_depth: usize,
}

impl<'a> SceneLoader<'a> {
    #[must_use]
    pub fn new(registry: &'a NodeTypeRegistry, max_depth: usize) -> Self {
        Self {
            registry,
            max_depth,
        }
    }

    /// Check every node of `description` when it is to be attached at
    /// `attach_depth` (the number of nodes above it).
    ///
    /// Returns the number of nodes the description will create.
    pub fn validate(&self, description: &StageNode, attach_depth: usize) -> Result<usize, SceneError> {
        if attach_depth + description.height() > self.max_depth {
            return Err(SceneError::MalformedScene(format!(
                "'{}' would nest deeper than the maximum depth of {}",
                description.name, self.max_depth
            )));
        }
        let mut count = 0;
        let mut stack = vec![description];
        while let Some(node) = stack.pop() {
            self.validate_node(node)?;
            count += 1;
            stack.extend(node.children.iter());
        }
        Ok(count)
    }

    fn validate_node(&self, node: &StageNode) -> Result<(), SceneError> {
        if !self.registry.contains(&node.node_type) {
            return Err(SceneError::UnknownNodeType(node.node_type.clone()));
        }
        self.component_set(node).map(|_| ())
    }

    fn component_set(&self, node: &StageNode) -> Result<ComponentSet, SceneError> {
        ComponentSet::try_from_components(node.components.iter().cloned()).map_err(|err| match err {
            ComponentError::DuplicateComponent(kind) => SceneError::DuplicateComponent {
                node: node.name.clone(),
                kind,
            },
            other => SceneError::MalformedScene(format!("node '{}': {other}", node.name)),
        })
    }

    /// Build the row for one node: declared components plus the node type's
    /// defaults for any kind not declared.
    pub(crate) fn record_for(&self, node: &StageNode) -> Result<EntityRecord, SceneError> {
        let mut components = self.component_set(node)?;
        for kind in self.registry.default_components(&node.node_type) {
            components.ensure(kind);
        }
        let mut record = EntityRecord::new(node.name.clone(), node.node_type.clone());
        record.tags = node.tags.clone().unwrap_or_default();
        record.components = components;
        Ok(record)
    }

    /// Create every node of a validated description, depth-first pre-order,
    /// attaching the top node under `parent` when given.
    ///
    /// Returns the entity created for the top node.
    pub(crate) fn build(
        &self,
        table: &mut EntityTable,
        tree: &mut NodeTree,
        parent: Option<Entity>,
        description: &StageNode,
    ) -> Result<Entity, SceneError> {
        let top = self.build_node(table, tree, parent, description)?;
        // Explicit stack keeps declared child order without recursion.
        let mut stack: Vec<(Entity, &StageNode)> = description
            .children
            .iter()
            .rev()
            .map(|child| (top, child))
            .collect();
        while let Some((parent, node)) = stack.pop() {
            let entity = self.build_node(table, tree, Some(parent), node)?;
            stack.extend(node.children.iter().rev().map(|child| (entity, child)));
        }
        debug!(root = %top, nodes = description.node_count(), "built scene subtree");
        Ok(top)
    }

    fn build_node(
        &self,
        table: &mut EntityTable,
        tree: &mut NodeTree,
        parent: Option<Entity>,
        node: &StageNode,
    ) -> Result<Entity, SceneError> {
        let record = self.record_for(node)?;
        let entity = table.insert(record);
        tree.insert(entity);
        if let Some(parent) = parent {
            tree.link(parent, entity);
        }
        Ok(entity)
    }
}

#[cfg(test)]
mod tests {
    use engine_component::{ComponentKind, TextLabel, Transform2D};
    use engine_math::Vec2;

    use super::*;

    fn stage() -> StageNode {
        StageNode::new("Main", "Node2D")
            .with_component(Transform2D::from_position(Vec2::new(10.0, 0.0)))
            .with_child(StageNode::new("A", "Node"))
            .with_child(StageNode::new("B", "Sprite").with_child(StageNode::new("B1", "Node")))
            .with_child(StageNode::new("C", "TextLabel"))
    }

    #[test]
    fn test_validate_counts_nodes() {
        let registry = NodeTypeRegistry::default();
        let loader = SceneLoader::new(&registry, 16);
        assert_eq!(loader.validate(&stage(), 0).unwrap(), 5);
    }

    #[test]
    fn test_validate_rejects_unknown_type_deep_in_tree() {
        let registry = NodeTypeRegistry::default();
        let loader = SceneLoader::new(&registry, 16);
        let bad = stage().with_child(StageNode::new("Camera", "Camera3D"));
        let err = loader.validate(&bad, 0).unwrap_err();
        assert!(matches!(err, SceneError::UnknownNodeType(ref t) if t == "Camera3D"));
    }

    #[test]
    fn test_validate_rejects_duplicate_component() {
        let registry = NodeTypeRegistry::default();
        let loader = SceneLoader::new(&registry, 16);
        let bad = StageNode::new("Label", "TextLabel")
            .with_component(TextLabel::default())
            .with_component(TextLabel::default());
        let err = loader.validate(&bad, 0).unwrap_err();
        assert!(matches!(
            err,
            SceneError::DuplicateComponent { ref node, kind: ComponentKind::TextLabel } if node == "Label"
        ));
    }

    #[test]
    fn test_validate_rejects_excess_depth() {
        let registry = NodeTypeRegistry::default();
        let loader = SceneLoader::new(&registry, 3);
        assert!(loader.validate(&stage(), 0).is_ok());
        let err = loader.validate(&stage(), 1).unwrap_err();
        assert!(matches!(err, SceneError::MalformedScene(_)));
    }

    #[test]
    fn test_build_preserves_order_and_defaults() {
        let registry = NodeTypeRegistry::default();
        let loader = SceneLoader::new(&registry, 16);
        let mut table = EntityTable::new();
        let mut tree = NodeTree::new();
        let root = loader.build(&mut table, &mut tree, None, &stage()).unwrap();

        let names: Vec<&str> = tree
            .children(root)
            .iter()
            .map(|&c| table.get(c).unwrap().name.as_str())
            .collect();
        assert_eq!(names, vec!["A", "B", "C"]);

        // Declared transform wins over the type default.
        assert_eq!(
            table.get_component::<Transform2D>(root).unwrap().position,
            Vec2::new(10.0, 0.0)
        );
        // Sprite type fills in Transform2D and Sprite.
        let b = tree.children(root)[1];
        let kinds = table.get(b).unwrap().components.kinds();
        assert_eq!(kinds, vec![ComponentKind::Transform2D, ComponentKind::Sprite]);
        assert_eq!(tree.children(b).len(), 1);
        assert_eq!(table.len(), 5);
    }
}
