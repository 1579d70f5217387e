//! Scene graph: the context scripts query and mutate.
//!
//! A [`SceneGraph`] owns one scene: the entity table, the node tree, the
//! mutation queue and the event channels. Nothing is global, so several
//! graphs can coexist (one per test, one per loaded scene).
//!
//! ## Frame model
//!
//! 1. Scripts read the graph and request structural changes
//!    ([`queue_create`](SceneGraph::queue_create),
//!    [`queue_deletion`](SceneGraph::queue_deletion), ...).
//! 2. The host calls [`process_queued_mutations`](SceneGraph::process_queued_mutations)
//!    exactly once per frame. Creations are applied first, then deletions,
//!    then a queued scene change.
//! 3. The next frame sees the new structure.

use std::collections::HashSet;

use engine_component::{Component, ComponentData, ComponentKind, Entity};
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::config::{ReparentPolicy, SceneConfig};
use crate::error::SceneError;
use crate::events::EventHub;
use crate::loader::SceneLoader;
use crate::propagation;
use crate::queue::{CreateRequest, CreateTicket, FrameChanges, MutationQueue, PendingMutation};
use crate::registry::NodeTypeRegistry;
use crate::stage::StageNode;
use crate::table::{EntityRecord, EntityTable};
use crate::tree::NodeTree;

/// One scene's complete state.
#[derive(Debug)]
pub struct SceneGraph {
    config: SceneConfig,
    registry: NodeTypeRegistry,
    table: EntityTable,
    tree: NodeTree,
    queue: MutationQueue,
    events: EventHub,
    /// Number of frame barriers processed.
    frame: u64,
}

impl SceneGraph {
    /// Create an empty graph with the built-in node types.
    #[must_use]
    pub fn new(config: SceneConfig) -> Self {
        Self::with_registry(config, NodeTypeRegistry::with_builtin_types())
    }

    #[must_use]
    pub fn with_registry(config: SceneConfig, registry: NodeTypeRegistry) -> Self {
        Self {
            config,
            registry,
            table: EntityTable::new(),
            tree: NodeTree::new(),
            queue: MutationQueue::new(),
            events: EventHub::new(),
            frame: 0,
        }
    }

    #[must_use]
    pub fn config(&self) -> &SceneConfig {
        &self.config
    }

    #[must_use]
    pub fn registry(&self) -> &NodeTypeRegistry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut NodeTypeRegistry {
        &mut self.registry
    }

    #[must_use]
    pub fn table(&self) -> &EntityTable {
        &self.table
    }

    #[must_use]
    pub fn tree(&self) -> &NodeTree {
        &self.tree
    }

    #[must_use]
    pub fn queue(&self) -> &MutationQueue {
        &self.queue
    }

    #[must_use]
    pub fn frame(&self) -> u64 {
        self.frame
    }

    #[must_use]
    pub fn root(&self) -> Option<Entity> {
        self.tree.root()
    }

    #[must_use]
    pub fn is_alive(&self, entity: Entity) -> bool {
        self.table.contains(entity)
    }

    #[must_use]
    pub fn entity_count(&self) -> usize {
        self.table.len()
    }

    fn ensure_alive(&self, entity: Entity) -> Result<(), SceneError> {
        if self.table.contains(entity) {
            Ok(())
        } else {
            Err(SceneError::StaleHandle(entity))
        }
    }

    // -- Scene loading --

    /// Load a scene description and make its top node the root.
    ///
    /// Fails without creating anything if the description is malformed or a
    /// root is already set.
    pub fn load(&mut self, description: &StageNode) -> Result<Entity, SceneError> {
        if let Some(root) = self.tree.root() {
            return Err(SceneError::RootAlreadySet(root));
        }
        let loader = SceneLoader::new(&self.registry, self.config.max_depth);
        let nodes = loader.validate(description, 0)?;
        let root = loader.build(&mut self.table, &mut self.tree, None, description)?;
        self.tree.set_root(root)?;
        info!(root = %root, nodes, scene = %description.name, "scene loaded");
        Ok(root)
    }

    // -- Entities and components --

    /// Create a detached entity with its type's default components.
    ///
    /// The entity is not part of the tree until passed to
    /// [`add_child`](Self::add_child).
    pub fn create(&mut self, name: &str, node_type: &str) -> Result<Entity, SceneError> {
        let description = StageNode::new(name, node_type);
        let loader = SceneLoader::new(&self.registry, self.config.max_depth);
        loader.validate(&description, 0)?;
        let record = loader.record_for(&description)?;
        let entity = self.table.insert(record);
        self.tree.insert(entity);
        debug!(entity = %entity, node = name, node_type, "created detached entity");
        Ok(entity)
    }

    #[must_use]
    pub fn get_component<T: Component>(&self, entity: Entity) -> Option<&T> {
        self.table.get_component::<T>(entity)
    }

    pub fn get_component_mut<T: Component>(&mut self, entity: Entity) -> Option<&mut T> {
        self.table.get_component_mut::<T>(entity)
    }

    pub fn set_component(
        &mut self,
        entity: Entity,
        data: impl Into<ComponentData>,
    ) -> Result<Option<ComponentData>, SceneError> {
        self.table.set_component(entity, data)
    }

    pub fn remove_component(
        &mut self,
        entity: Entity,
        kind: ComponentKind,
    ) -> Result<Option<ComponentData>, SceneError> {
        self.table.remove_component(entity, kind)
    }

    #[must_use]
    pub fn has_component(&self, entity: Entity, kind: ComponentKind) -> bool {
        self.table.get_component_kind(entity, kind).is_some()
    }

    #[must_use]
    pub fn get_name(&self, entity: Entity) -> Option<&str> {
        self.table.get(entity).map(|r| r.name.as_str())
    }

    #[must_use]
    pub fn get_node_type(&self, entity: Entity) -> Option<&str> {
        self.table.get(entity).map(|r| r.node_type.as_str())
    }

    #[must_use]
    pub fn get_tags(&self, entity: Entity) -> &[String] {
        self.table
            .get(entity)
            .map(|r| r.tags.as_slice())
            .unwrap_or(&[])
    }

    #[must_use]
    pub fn has_tag(&self, entity: Entity, tag: &str) -> bool {
        self.get_tags(entity).iter().any(|t| t == tag)
    }

    // -- Tree --

    /// Make `child` the last child of `parent`, detaching it from its
    /// current parent first.
    ///
    /// Errors leave the tree exactly as it was.
    pub fn add_child(&mut self, parent: Entity, child: Entity) -> Result<(), SceneError> {
        self.ensure_alive(parent)?;
        self.ensure_alive(child)?;
        self.tree.check_add_child(parent, child)?;

        let path = self.tree.depth(parent) + 1 + self.tree.height(child);
        if path > self.config.max_depth {
            return Err(SceneError::MalformedScene(format!(
                "adding {child} under {parent} would nest {path} levels deep (max {})",
                self.config.max_depth
            )));
        }

        let child_pending = self.table.is_queued_for_deletion(child);
        if self.config.reparent_policy == ReparentPolicy::Reject {
            if child_pending {
                return Err(SceneError::PendingDeletion(child));
            }
            let doomed_parent = std::iter::once(parent)
                .chain(self.tree.ancestors(parent))
                .find(|&e| self.table.is_queued_for_deletion(e));
            if let Some(doomed) = doomed_parent {
                return Err(SceneError::PendingDeletion(doomed));
            }
        }

        self.tree.add_child(parent, child)?;

        if child_pending && self.config.reparent_policy == ReparentPolicy::Cancel {
            self.table.clear_queued_for_deletion(child);
            self.queue.cancel_delete(child);
            debug!(entity = %child, "re-parenting cancelled pending deletion");
        }
        Ok(())
    }

    /// First direct child of `parent` named `name`.
    #[must_use]
    pub fn get_child(&self, parent: Entity, name: &str) -> Option<Entity> {
        self.tree.find_child(parent, |child| {
            self.table.get(child).is_some_and(|r| r.name == name)
        })
    }

    /// Snapshot of `parent`'s children. Safe to hold across mutations.
    #[must_use]
    pub fn get_children(&self, parent: Entity) -> Vec<Entity> {
        self.tree.get_children(parent)
    }

    #[must_use]
    pub fn get_parent(&self, entity: Entity) -> Option<Entity> {
        self.tree.get_parent(entity)
    }

    #[must_use]
    pub fn descendants(&self, entity: Entity) -> Vec<Entity> {
        self.tree.descendants(entity)
    }

    #[must_use]
    pub fn ancestors(&self, entity: Entity) -> Vec<Entity> {
        self.tree.ancestors(entity)
    }

    #[must_use]
    pub fn is_ancestor_of(&self, ancestor: Entity, entity: Entity) -> bool {
        self.tree.is_ancestor_of(ancestor, entity)
    }

    /// The root followed by every node under it, depth-first pre-order.
    #[must_use]
    pub fn traverse(&self) -> Vec<Entity> {
        match self.tree.root() {
            Some(root) => std::iter::once(root)
                .chain(self.tree.descendants(root))
                .collect(),
            None => Vec::new(),
        }
    }

    // -- Time dilation and other derived values --

    /// Local time dilation; 1.0 for a stale handle.
    #[must_use]
    pub fn get_time_dilation(&self, entity: Entity) -> f64 {
        self.table.get_time_dilation(entity).unwrap_or(1.0)
    }

    pub fn set_time_dilation(&mut self, entity: Entity, value: f64) -> Result<(), SceneError> {
        self.table.set_time_dilation(entity, value)
    }

    /// Product of local dilations from `entity` up to the root, inclusive;
    /// 1.0 for a stale handle.
    #[must_use]
    pub fn get_total_time_dilation(&self, entity: Entity) -> f64 {
        propagation::total_time_dilation(&self.table, &self.tree, entity).unwrap_or(1.0)
    }

    #[must_use]
    pub fn world_time_dilation(&self) -> f64 {
        self.config.world_time_dilation
    }

    pub fn set_world_time_dilation(&mut self, value: f64) {
        self.config.world_time_dilation = value;
    }

    /// World dilation times the node's total dilation.
    #[must_use]
    pub fn get_effective_time_dilation(&self, entity: Entity) -> f64 {
        self.config.world_time_dilation * self.get_total_time_dilation(entity)
    }

    /// `dt` as experienced by `entity`.
    #[must_use]
    pub fn scaled_delta(&self, entity: Entity, dt: f64) -> f64 {
        dt * self.get_effective_time_dilation(entity)
    }

    /// Effective z-index; 0 for a stale handle.
    #[must_use]
    pub fn get_total_z_index(&self, entity: Entity) -> i32 {
        propagation::total_z_index(&self.table, &self.tree, entity).unwrap_or(0)
    }

    // -- Deferred mutations --

    /// Request a new node under `parent`, applied at the next barrier.
    ///
    /// The node type and component list are validated now; the parent is
    /// checked again at the barrier.
    pub fn queue_create(
        &mut self,
        parent: Entity,
        name: &str,
        node_type: &str,
        components: Vec<ComponentData>,
    ) -> Result<CreateTicket, SceneError> {
        self.ensure_alive(parent)?;
        let description = StageNode {
            components,
            ..StageNode::new(name, node_type)
        };
        let loader = SceneLoader::new(&self.registry, self.config.max_depth);
        loader.validate(&description, self.tree.depth(parent) + 1)?;
        let record = loader.record_for(&description)?;
        let ticket = self.queue.enqueue_create(CreateRequest {
            parent,
            name: record.name,
            node_type: record.node_type,
            tags: record.tags,
            components: record.components,
        });
        debug!(ticket = %ticket, parent = %parent, node = name, "queued creation");
        Ok(ticket)
    }

    /// Request a whole scene description be built under `parent` at the
    /// next barrier.
    pub fn queue_instance(
        &mut self,
        parent: Entity,
        description: StageNode,
    ) -> Result<CreateTicket, SceneError> {
        self.ensure_alive(parent)?;
        let loader = SceneLoader::new(&self.registry, self.config.max_depth);
        loader.validate(&description, self.tree.depth(parent) + 1)?;
        let ticket = self.queue.enqueue_instance(parent, description);
        debug!(ticket = %ticket, parent = %parent, "queued instance");
        Ok(ticket)
    }

    /// Flag `entity` for deletion at the next barrier. It stays fully
    /// readable until then. A repeated request is ignored.
    pub fn queue_deletion(&mut self, entity: Entity) -> Result<(), SceneError> {
        if !self.table.mark_queued_for_deletion(entity)? {
            warn!(entity = %entity, "entity already queued for deletion");
            return Ok(());
        }
        self.queue.enqueue_delete(entity);
        Ok(())
    }

    /// `false` for stale handles.
    #[must_use]
    pub fn is_queued_for_deletion(&self, entity: Entity) -> bool {
        self.table.is_queued_for_deletion(entity)
    }

    /// Replace the whole scene at the next barrier.
    ///
    /// Returns `Ok(false)` if a scene change is already queued this frame.
    pub fn queue_scene_change(&mut self, description: StageNode) -> Result<bool, SceneError> {
        let loader = SceneLoader::new(&self.registry, self.config.max_depth);
        loader.validate(&description, 0)?;
        let name = description.name.clone();
        if !self.queue.queue_scene_change(description) {
            warn!(scene = %name, "scene change already queued, ignoring");
            return Ok(false);
        }
        Ok(true)
    }

    #[must_use]
    pub fn pending_mutations(&self) -> usize {
        self.queue.len()
    }

    // -- Frame barrier --

    /// Apply every queued mutation: creations, then deletions, then a
    /// queued scene change. Call exactly once per frame, after all update
    /// callbacks have run.
    pub fn process_queued_mutations(&mut self) -> FrameChanges {
        self.frame += 1;
        let (creations, deletions, scene_change) = self.queue.take();
        let mut changes = FrameChanges::default();

        for mutation in creations {
            self.apply_creation(mutation, &mut changes);
        }
        for target in deletions {
            self.apply_deletion(target, &mut changes);
        }
        if let Some(description) = scene_change {
            self.apply_scene_change(&description, &mut changes);
        }

        if !changes.is_empty() {
            debug!(
                frame = self.frame,
                created = changes.created.len(),
                deleted = changes.deleted.len(),
                rejected = changes.rejected.len(),
                scene_changed = changes.scene_changed.is_some(),
                "applied queued mutations"
            );
        }
        changes
    }

    fn apply_creation(&mut self, mutation: PendingMutation, changes: &mut FrameChanges) {
        match mutation {
            PendingMutation::Create { ticket, request } => {
                if !self.table.contains(request.parent) {
                    warn!(ticket = %ticket, parent = %request.parent, "parent gone, dropping creation");
                    changes.rejected.push(ticket);
                    return;
                }
                if self.tree.depth(request.parent) + 2 > self.config.max_depth {
                    warn!(ticket = %ticket, parent = %request.parent, "creation exceeds max depth, dropping");
                    changes.rejected.push(ticket);
                    return;
                }
                let mut record = EntityRecord::new(request.name, request.node_type);
                record.tags = request.tags;
                record.components = request.components;
                let entity = self.table.insert(record);
                self.tree.insert(entity);
                self.tree.link(request.parent, entity);
                changes.created.push((ticket, entity));
            }
            PendingMutation::Instance {
                ticket,
                parent,
                description,
            } => {
                if !self.table.contains(parent) {
                    warn!(ticket = %ticket, parent = %parent, "parent gone, dropping instance");
                    changes.rejected.push(ticket);
                    return;
                }
                let loader = SceneLoader::new(&self.registry, self.config.max_depth);
                let built = loader
                    .validate(&description, self.tree.depth(parent) + 1)
                    .and_then(|_| loader.build(&mut self.table, &mut self.tree, Some(parent), &description));
                match built {
                    Ok(top) => changes.created.push((ticket, top)),
                    Err(err) => {
                        warn!(ticket = %ticket, error = %err, "dropping instance");
                        changes.rejected.push(ticket);
                    }
                }
            }
            PendingMutation::Delete { target } => self.apply_deletion(target, changes),
        }
    }

    /// Remove `target` and its subtree: tree edges bottom-up, then rows.
    fn apply_deletion(&mut self, target: Entity, changes: &mut FrameChanges) {
        if !self.table.contains(target) {
            debug!(entity = %target, "deletion target already destroyed");
            return;
        }
        let doomed = self.tree.post_order(target);
        for &entity in &doomed {
            self.tree.remove(entity);
            self.events.remove_entity(entity);
        }
        for &entity in &doomed {
            self.table.destroy(entity);
        }
        debug!(entity = %target, subtree = doomed.len(), "deleted subtree");
        changes.deleted.extend(doomed);
    }

    fn apply_scene_change(&mut self, description: &StageNode, changes: &mut FrameChanges) {
        let loader = SceneLoader::new(&self.registry, self.config.max_depth);
        if let Err(err) = loader.validate(description, 0) {
            warn!(scene = %description.name, error = %err, "queued scene is no longer valid, keeping current scene");
            return;
        }

        // Old tree bottom-up first, then any detached leftovers.
        let mut doomed = self.tree.root().map_or_else(Vec::new, |r| self.tree.post_order(r));
        let mut seen: HashSet<Entity> = doomed.iter().copied().collect();
        let leftovers: Vec<Entity> = self.table.iter().map(|(e, _)| e).collect();
        for entity in leftovers {
            if seen.insert(entity) {
                doomed.push(entity);
            }
        }
        for &entity in &doomed {
            self.tree.remove(entity);
        }
        for &entity in &doomed {
            self.table.destroy(entity);
        }
        self.events.clear();
        self.tree.clear_root();
        changes.deleted.extend(doomed);

        match loader
            .build(&mut self.table, &mut self.tree, None, description)
            .and_then(|root| self.tree.set_root(root).map(|()| root))
        {
            Ok(root) => {
                info!(root = %root, scene = %description.name, "scene changed");
                changes.scene_changed = Some(root);
            }
            Err(err) => warn!(scene = %description.name, error = %err, "scene change failed"),
        }
    }

    // -- Events --

    /// Create a named event channel on `owner`. Creating an existing
    /// channel is a no-op.
    pub fn create_event(&mut self, owner: Entity, name: &str) -> Result<(), SceneError> {
        self.ensure_alive(owner)?;
        self.events.create_event(owner, name);
        Ok(())
    }

    pub fn subscribe(
        &mut self,
        owner: Entity,
        name: &str,
        subscriber: Entity,
        callback: impl FnMut(Entity, &[Value]) + 'static,
    ) -> Result<(), SceneError> {
        self.ensure_alive(owner)?;
        self.ensure_alive(subscriber)?;
        self.events.subscribe(owner, name, subscriber, callback)
    }

    pub fn unsubscribe(&mut self, owner: Entity, name: &str, subscriber: Entity) -> usize {
        self.events.unsubscribe(owner, name, subscriber)
    }

    /// Run every subscriber of `owner`'s `name` channel before returning.
    ///
    /// Returns how many callbacks ran.
    pub fn broadcast(&mut self, owner: Entity, name: &str, args: &[Value]) -> Result<usize, SceneError> {
        self.ensure_alive(owner)?;
        self.events.broadcast(owner, name, args)
    }

    #[must_use]
    pub fn events(&self) -> &EventHub {
        &self.events
    }
}

impl Default for SceneGraph {
    fn default() -> Self {
        Self::new(SceneConfig::default())
    }
}
