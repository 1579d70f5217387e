//! # engine_math
//!
//! Math types for the 2D scene graph engine. Re-exports [`glam`]'s `Vec2` and
//! defines the small value types scene descriptions are written in:
//! [`Rect2`], [`Size2D`] and [`Color`].

pub mod color;
pub mod geometry;

pub use glam::Vec2;

pub use color::Color;
pub use geometry::{Rect2, Size2D};
