//! Solid color rectangle component.

use engine_math::{Color, Size2D};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ColorRect {
    pub size: Size2D,
    pub color: Color,
}

impl Default for ColorRect {
    fn default() -> Self {
        Self {
            size: Size2D::new(32.0, 32.0),
            color: Color::WHITE,
        }
    }
}
