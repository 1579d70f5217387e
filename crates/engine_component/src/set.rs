//! Per-entity component storage.

use crate::component::{Component, ComponentData, ComponentError, ComponentKind};

/// The components attached to one entity: at most one per [`ComponentKind`].
///
/// Storage is a dense array indexed by kind, so lookups never hash.
#[derive(Debug, Clone, PartialEq)]
pub struct ComponentSet {
    slots: [Option<ComponentData>; ComponentKind::COUNT],
}

impl Default for ComponentSet {
    fn default() -> Self {
        Self {
            slots: std::array::from_fn(|_| None),
        }
    }
}

impl ComponentSet {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a set from a list, rejecting duplicate kinds.
    pub fn try_from_components(
        components: impl IntoIterator<Item = ComponentData>,
    ) -> Result<Self, ComponentError> {
        let mut set = Self::new();
        for data in components {
            set.try_insert(data)?;
        }
        Ok(set)
    }

    /// Insert a component, replacing any existing one of the same kind.
    ///
    /// Returns the replaced component.
    pub fn insert(&mut self, data: impl Into<ComponentData>) -> Option<ComponentData> {
        let data = data.into();
        self.slots[data.kind().index()].replace(data)
    }

    /// Insert a component, failing if one of the same kind is present.
    pub fn try_insert(&mut self, data: impl Into<ComponentData>) -> Result<(), ComponentError> {
        let data = data.into();
        let slot = &mut self.slots[data.kind().index()];
        if slot.is_some() {
            return Err(ComponentError::DuplicateComponent(data.kind()));
        }
        *slot = Some(data);
        Ok(())
    }

    /// Insert the default payload for `kind` unless one is already present.
    pub fn ensure(&mut self, kind: ComponentKind) {
        let slot = &mut self.slots[kind.index()];
        if slot.is_none() {
            *slot = Some(ComponentData::default_for(kind));
        }
    }

    #[must_use]
    pub fn get<T: Component>(&self) -> Option<&T> {
        self.slots[T::KIND.index()].as_ref().and_then(T::from_data)
    }

    #[must_use]
    pub fn get_mut<T: Component>(&mut self) -> Option<&mut T> {
        self.slots[T::KIND.index()]
            .as_mut()
            .and_then(T::from_data_mut)
    }

    #[must_use]
    pub fn get_kind(&self, kind: ComponentKind) -> Option<&ComponentData> {
        self.slots[kind.index()].as_ref()
    }

    pub fn remove(&mut self, kind: ComponentKind) -> Option<ComponentData> {
        self.slots[kind.index()].take()
    }

    #[must_use]
    pub fn contains(&self, kind: ComponentKind) -> bool {
        self.slots[kind.index()].is_some()
    }

    /// Kinds present, in storage order.
    #[must_use]
    pub fn kinds(&self) -> Vec<ComponentKind> {
        self.iter().map(ComponentData::kind).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ComponentData> {
        self.slots.iter().flatten()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.iter().filter(|s| s.is_some()).count()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slots.iter().all(Option::is_none)
    }
}
