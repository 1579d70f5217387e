//! Axis-aligned 2D collider.

use engine_math::{Color, Size2D};
use serde::{Deserialize, Serialize};

/// An axis-aligned box collider anchored at the node's position.
///
/// `color` is only used when debug drawing colliders.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Collider2D {
    pub extents: Size2D,
    pub color: Color,
}

impl Default for Collider2D {
    fn default() -> Self {
        Self {
            extents: Size2D::default(),
            color: Color::rgba(95.0, 205.0, 228.0, 255.0),
        }
    }
}
