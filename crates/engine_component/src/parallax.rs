//! Parallax scrolling component.

use engine_math::Vec2;
use serde::{Deserialize, Serialize};

/// Scroll factor relative to the camera; `(1, 1)` moves with the world.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Parallax {
    pub scroll_speed: Vec2,
}
