//! # engine_component
//!
//! The "C" of the scene graph: defines what an entity handle is and which
//! components a node can carry.
//!
//! This crate provides:
//!
//! - [`Entity`]: an opaque, generational handle. Stale handles are detectable.
//! - [`EntityAllocator`]: slot allocator that bumps a generation on free.
//! - [`ComponentKind`] / [`ComponentData`]: the closed set of component kinds
//!   and their value payloads.
//! - [`ComponentSet`]: at most one component of each kind per entity.
//! - [`Component`] trait: typed access to a single payload.

pub mod collider;
pub mod color_rect;
pub mod component;
pub mod entity;
pub mod parallax;
pub mod script;
pub mod set;
pub mod sprite;
pub mod text_label;
pub mod transform;

pub use collider::Collider2D;
pub use color_rect::ColorRect;
pub use component::{Component, ComponentData, ComponentError, ComponentKind};
pub use entity::{Entity, EntityAllocator};
pub use parallax::Parallax;
pub use script::Script;
pub use set::ComponentSet;
pub use sprite::{AnimatedSprite, Animation, AnimationFrame, Sprite};
pub use text_label::TextLabel;
pub use transform::Transform2D;
