//! Entity table: owns every live entity's name, type, components and
//! deletion flag.
//!
//! Rows are stored densely by slot index. The generation check done by the
//! [`EntityAllocator`] is what turns a dangling handle into `None` instead of
//! a read of whatever entity reused the slot.

use engine_component::{
    Component, ComponentData, ComponentKind, ComponentSet, Entity, EntityAllocator,
};

use crate::error::SceneError;

/// One entity's data.
#[derive(Debug, Clone, PartialEq)]
pub struct EntityRecord {
    pub name: String,
    pub node_type: String,
    pub tags: Vec<String>,
    /// Local time dilation multiplier.
    pub time_dilation: f64,
    pub components: ComponentSet,
    /// Set by `queue_deletion`; storage is only freed at the frame barrier.
    pub queued_for_deletion: bool,
}

impl EntityRecord {
    #[must_use]
    pub fn new(name: impl Into<String>, node_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            node_type: node_type.into(),
            tags: Vec::new(),
            time_dilation: 1.0,
            components: ComponentSet::new(),
            queued_for_deletion: false,
        }
    }
}

#[derive(Debug)]
struct Row {
    entity: Entity,
    record: EntityRecord,
}

/// Storage for every live entity's data.
#[derive(Debug, Default)]
pub struct EntityTable {
    allocator: EntityAllocator,
    rows: Vec<Option<Row>>,
}

impl EntityTable {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    // -- Entity lifecycle --

    /// Allocate a fresh entity with an empty component set.
    pub fn create(&mut self, name: impl Into<String>, node_type: impl Into<String>) -> Entity {
        self.insert(EntityRecord::new(name, node_type))
    }

    /// Allocate a fresh entity holding `record`.
    pub fn insert(&mut self, record: EntityRecord) -> Entity {
        let entity = self.allocator.allocate();
        let slot = entity.index() as usize;
        if slot >= self.rows.len() {
            self.rows.resize_with(slot + 1, || None);
        }
        self.rows[slot] = Some(Row { entity, record });
        entity
    }

    /// Free an entity's storage.
    ///
    /// Only the frame barrier calls this; scripts request deletion through
    /// the mutation queue.
    pub(crate) fn destroy(&mut self, entity: Entity) -> Option<EntityRecord> {
        if !self.allocator.free(entity) {
            return None;
        }
        self.rows[entity.index() as usize]
            .take()
            .map(|row| row.record)
    }

    #[must_use]
    pub fn contains(&self, entity: Entity) -> bool {
        self.allocator.is_alive(entity)
    }

    /// Number of live entities.
    #[must_use]
    pub fn len(&self) -> usize {
        self.allocator.count()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// All live entities in slot order.
    pub fn iter(&self) -> impl Iterator<Item = (Entity, &EntityRecord)> {
        self.rows
            .iter()
            .flatten()
            .map(|row| (row.entity, &row.record))
    }

    // -- Record access --

    #[must_use]
    pub fn get(&self, entity: Entity) -> Option<&EntityRecord> {
        if !self.contains(entity) {
            return None;
        }
        self.rows[entity.index() as usize]
            .as_ref()
            .map(|row| &row.record)
    }

    pub fn get_mut(&mut self, entity: Entity) -> Option<&mut EntityRecord> {
        if !self.contains(entity) {
            return None;
        }
        self.rows[entity.index() as usize]
            .as_mut()
            .map(|row| &mut row.record)
    }

    fn get_or_stale(&mut self, entity: Entity) -> Result<&mut EntityRecord, SceneError> {
        self.get_mut(entity).ok_or(SceneError::StaleHandle(entity))
    }

    // -- Components --

    /// Typed component lookup. `None` if the entity is stale or lacks it.
    #[must_use]
    pub fn get_component<T: Component>(&self, entity: Entity) -> Option<&T> {
        self.get(entity)?.components.get::<T>()
    }

    pub fn get_component_mut<T: Component>(&mut self, entity: Entity) -> Option<&mut T> {
        self.get_mut(entity)?.components.get_mut::<T>()
    }

    /// Untyped component lookup by kind.
    #[must_use]
    pub fn get_component_kind(&self, entity: Entity, kind: ComponentKind) -> Option<&ComponentData> {
        self.get(entity)?.components.get_kind(kind)
    }

    /// Attach or replace a component, returning the one replaced.
    pub fn set_component(
        &mut self,
        entity: Entity,
        data: impl Into<ComponentData>,
    ) -> Result<Option<ComponentData>, SceneError> {
        Ok(self.get_or_stale(entity)?.components.insert(data))
    }

    pub fn remove_component(
        &mut self,
        entity: Entity,
        kind: ComponentKind,
    ) -> Result<Option<ComponentData>, SceneError> {
        Ok(self.get_or_stale(entity)?.components.remove(kind))
    }

    // -- Time dilation --

    pub fn set_time_dilation(&mut self, entity: Entity, value: f64) -> Result<(), SceneError> {
        self.get_or_stale(entity)?.time_dilation = value;
        Ok(())
    }

    /// Local multiplier only; `None` for a stale handle.
    #[must_use]
    pub fn get_time_dilation(&self, entity: Entity) -> Option<f64> {
        self.get(entity).map(|r| r.time_dilation)
    }

    // -- Deletion flag --

    /// Flag an entity for deletion without freeing it.
    ///
    /// Returns `Ok(false)` if it was already flagged.
    pub fn mark_queued_for_deletion(&mut self, entity: Entity) -> Result<bool, SceneError> {
        let record = self.get_or_stale(entity)?;
        let newly_marked = !record.queued_for_deletion;
        record.queued_for_deletion = true;
        Ok(newly_marked)
    }

    pub(crate) fn clear_queued_for_deletion(&mut self, entity: Entity) {
        if let Some(record) = self.get_mut(entity) {
            record.queued_for_deletion = false;
        }
    }

    /// `false` for stale handles.
    #[must_use]
    pub fn is_queued_for_deletion(&self, entity: Entity) -> bool {
        self.get(entity).is_some_and(|r| r.queued_for_deletion)
    }
}
