//! Node tree: parent/child edges over entities.
//!
//! The tree only stores structure. Names and components live in the
//! [`EntityTable`](crate::EntityTable); lookups that need them take a
//! predicate instead.
//!
//! Invariants:
//! - no entity is its own ancestor;
//! - a child appears in exactly one parent's child list, exactly once;
//! - the root never has a parent.

use std::collections::HashMap;

use engine_component::Entity;

use crate::error::SceneError;

#[derive(Debug, Clone, Default)]
struct NodeLinks {
    parent: Option<Entity>,
    /// Insertion order is preserved.
    children: Vec<Entity>,
}

/// Parent/child relationships of every entity registered with the tree.
#[derive(Debug, Default)]
pub struct NodeTree {
    links: HashMap<Entity, NodeLinks>,
    root: Option<Entity>,
}

impl NodeTree {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a detached node.
    pub(crate) fn insert(&mut self, entity: Entity) {
        self.links.entry(entity).or_default();
    }

    #[must_use]
    pub fn contains(&self, entity: Entity) -> bool {
        self.links.contains_key(&entity)
    }

    // -- Root --

    #[must_use]
    pub fn root(&self) -> Option<Entity> {
        self.root
    }

    pub(crate) fn set_root(&mut self, entity: Entity) -> Result<(), SceneError> {
        if let Some(root) = self.root {
            return Err(SceneError::RootAlreadySet(root));
        }
        self.root = Some(entity);
        Ok(())
    }

    pub(crate) fn clear_root(&mut self) {
        self.root = None;
    }

    // -- Structure --

    /// Make `child` the last child of `parent`.
    ///
    /// A child that already has a parent is detached from it first, so it
    /// never appears twice. Fails without touching the tree if the move
    /// would create a cycle.
    pub fn add_child(&mut self, parent: Entity, child: Entity) -> Result<(), SceneError> {
        self.check_add_child(parent, child)?;
        self.detach(child);
        self.link(parent, child);
        Ok(())
    }

    /// Validate an `add_child` without applying it.
    pub fn check_add_child(&self, parent: Entity, child: Entity) -> Result<(), SceneError> {
        if !self.contains(parent) {
            return Err(SceneError::StaleHandle(parent));
        }
        if !self.contains(child) {
            return Err(SceneError::StaleHandle(child));
        }
        if parent == child || self.is_ancestor_of(child, parent) {
            return Err(SceneError::Cycle { parent, child });
        }
        if self.root == Some(child) {
            return Err(SceneError::RootReparent(child));
        }
        Ok(())
    }

    /// Append a detached child without validation.
    pub(crate) fn link(&mut self, parent: Entity, child: Entity) {
        if let Some(links) = self.links.get_mut(&child) {
            links.parent = Some(parent);
        }
        if let Some(links) = self.links.get_mut(&parent) {
            links.children.push(child);
        }
    }

    /// Remove `child` from its parent's child list.
    ///
    /// Returns the former parent.
    pub(crate) fn detach(&mut self, child: Entity) -> Option<Entity> {
        let parent = self.links.get_mut(&child)?.parent.take()?;
        if let Some(links) = self.links.get_mut(&parent) {
            links.children.retain(|&c| c != child);
        }
        Some(parent)
    }

    /// Drop a node's links entirely. Its children, if any, are left without
    /// a parent; callers remove subtrees bottom-up.
    pub(crate) fn remove(&mut self, entity: Entity) {
        self.detach(entity);
        if let Some(links) = self.links.remove(&entity) {
            for child in links.children {
                if let Some(child_links) = self.links.get_mut(&child) {
                    child_links.parent = None;
                }
            }
        }
        if self.root == Some(entity) {
            self.root = None;
        }
    }

    // -- Queries --

    #[must_use]
    pub fn get_parent(&self, entity: Entity) -> Option<Entity> {
        self.links.get(&entity)?.parent
    }

    /// Borrowed view of the child list; empty for unknown entities.
    #[must_use]
    pub fn children(&self, entity: Entity) -> &[Entity] {
        self.links
            .get(&entity)
            .map(|l| l.children.as_slice())
            .unwrap_or(&[])
    }

    /// Snapshot copy of the child list.
    #[must_use]
    pub fn get_children(&self, entity: Entity) -> Vec<Entity> {
        self.children(entity).to_vec()
    }

    /// First direct child matching `predicate`.
    pub fn find_child(
        &self,
        parent: Entity,
        mut predicate: impl FnMut(Entity) -> bool,
    ) -> Option<Entity> {
        self.children(parent).iter().copied().find(|&c| predicate(c))
    }

    /// Returns `true` if `ancestor` is a strict ancestor of `entity`.
    #[must_use]
    pub fn is_ancestor_of(&self, ancestor: Entity, entity: Entity) -> bool {
        let mut current = self.get_parent(entity);
        while let Some(node) = current {
            if node == ancestor {
                return true;
            }
            current = self.get_parent(node);
        }
        false
    }

    /// Strict ancestors, nearest first.
    #[must_use]
    pub fn ancestors(&self, entity: Entity) -> Vec<Entity> {
        let mut out = Vec::new();
        let mut current = self.get_parent(entity);
        while let Some(node) = current {
            out.push(node);
            current = self.get_parent(node);
        }
        out
    }

    /// Number of strict ancestors.
    #[must_use]
    pub fn depth(&self, entity: Entity) -> usize {
        self.ancestors(entity).len()
    }

    /// Number of nodes on the longest downward path from `entity`, itself
    /// included. Zero for unknown entities.
    #[must_use]
    pub fn height(&self, entity: Entity) -> usize {
        if !self.contains(entity) {
            return 0;
        }
        1 + self
            .children(entity)
            .iter()
            .map(|&c| self.height(c))
            .max()
            .unwrap_or(0)
    }

    /// Strict descendants in depth-first pre-order, children in insertion
    /// order.
    #[must_use]
    pub fn descendants(&self, entity: Entity) -> Vec<Entity> {
        let mut out = Vec::new();
        let mut stack: Vec<Entity> = self.children(entity).iter().rev().copied().collect();
        while let Some(node) = stack.pop() {
            out.push(node);
            stack.extend(self.children(node).iter().rev().copied());
        }
        out
    }

    /// `entity` and its descendants, every child before its parent.
    #[must_use]
    pub fn post_order(&self, entity: Entity) -> Vec<Entity> {
        if !self.contains(entity) {
            return Vec::new();
        }
        let mut out = Vec::new();
        let mut stack = vec![(entity, false)];
        while let Some((node, expanded)) = stack.pop() {
            if expanded {
                out.push(node);
                continue;
            }
            stack.push((node, true));
            stack.extend(self.children(node).iter().rev().map(|&c| (c, false)));
        }
        out
    }

    /// Number of nodes registered with the tree.
    #[must_use]
    pub fn len(&self) -> usize {
        self.links.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }
}
