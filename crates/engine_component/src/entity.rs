//! Entity type and allocation utilities.
//!
//! An [`Entity`] is a lightweight handle with no inherent data. It pairs a
//! slot index with a generation counter: when a slot is freed its generation
//! is bumped, so any handle still pointing at the old generation is detected
//! as stale instead of silently aliasing the slot's next occupant.

use serde::{Deserialize, Serialize};

/// A generational entity handle.
///
/// Entities are pure identifiers. Components and tree edges are stored
/// elsewhere, keyed by this handle. The packed 64-bit value returned by
/// [`Entity::to_bits`] is never handed out twice within a process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Entity {
    index: u32,
    generation: u32,
}

impl Entity {
    /// The null / invalid entity sentinel.
    pub const INVALID: Entity = Entity {
        index: u32::MAX,
        generation: u32::MAX,
    };

    #[must_use]
    pub const fn new(index: u32, generation: u32) -> Self {
        Self { index, generation }
    }

    /// Slot index inside the owning table.
    #[must_use]
    pub const fn index(self) -> u32 {
        self.index
    }

    #[must_use]
    pub const fn generation(self) -> u32 {
        self.generation
    }

    /// Pack into a single opaque integer, suitable for handing to scripts.
    #[must_use]
    pub const fn to_bits(self) -> u64 {
        ((self.generation as u64) << 32) | self.index as u64
    }

    /// Inverse of [`Entity::to_bits`].
    #[must_use]
    pub const fn from_bits(bits: u64) -> Self {
        Self {
            index: bits as u32,
            generation: (bits >> 32) as u32,
        }
    }

    /// Returns `true` unless this is [`Entity::INVALID`].
    #[must_use]
    pub const fn is_valid(self) -> bool {
        self.index != u32::MAX
    }
}

impl std::fmt::Display for Entity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Entity({}v{})", self.index, self.generation)
    }
}

/// Allocates generational entity handles.
///
/// Freed slots are recycled, but only after their generation has been
/// bumped, so a recycled slot never produces a handle equal to one issued
/// before. A slot whose generation is exhausted is retired for good.
#[derive(Debug, Default)]
pub struct EntityAllocator {
    /// Current generation of every slot ever allocated.
    generations: Vec<u32>,
    /// Liveness of every slot.
    alive: Vec<bool>,
    /// Freed slot indices available for reuse.
    free: Vec<u32>,
    live_count: usize,
}

impl EntityAllocator {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocates a fresh entity handle.
    pub fn allocate(&mut self) -> Entity {
        self.live_count += 1;
        if let Some(index) = self.free.pop() {
            let slot = index as usize;
            self.alive[slot] = true;
            return Entity::new(index, self.generations[slot]);
        }
        let index = self.generations.len() as u32;
        self.generations.push(0);
        self.alive.push(true);
        Entity::new(index, 0)
    }

    /// Frees a handle, bumping its slot's generation.
    ///
    /// Returns `false` if the handle was already stale.
    pub fn free(&mut self, entity: Entity) -> bool {
        if !self.is_alive(entity) {
            return false;
        }
        let slot = entity.index() as usize;
        self.alive[slot] = false;
        self.live_count -= 1;
        // An exhausted slot is never pushed back, so no handle is reissued.
        if let Some(next) = self.generations[slot].checked_add(1) {
            self.generations[slot] = next;
            self.free.push(entity.index());
        }
        true
    }

    /// Returns `true` if `entity` refers to the current occupant of its slot.
    #[must_use]
    pub fn is_alive(&self, entity: Entity) -> bool {
        let slot = entity.index() as usize;
        slot < self.alive.len() && self.alive[slot] && self.generations[slot] == entity.generation()
    }

    /// Number of live entities.
    #[must_use]
    pub fn count(&self) -> usize {
        self.live_count
    }

    /// Number of slots ever allocated, live or free.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.generations.len()
    }
}
