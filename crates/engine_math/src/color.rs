//! RGBA color in the 0-255 range scene descriptions use.

use serde::{Deserialize, Serialize};

/// An RGBA color. Channels are stored as `f32` in `0.0..=255.0`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    #[serde(default = "Color::opaque_alpha")]
    pub a: f32,
}

impl Color {
    pub const WHITE: Self = Self::rgb(255.0, 255.0, 255.0);
    pub const BLACK: Self = Self::rgb(0.0, 0.0, 0.0);

    /// Opaque color from three channels.
    #[must_use]
    pub const fn rgb(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b, a: 255.0 }
    }

    #[must_use]
    pub const fn rgba(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    fn opaque_alpha() -> f32 {
        255.0
    }
}

impl Default for Color {
    fn default() -> Self {
        Self::WHITE
    }
}
