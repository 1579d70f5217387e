//! Axis-aligned rectangles and sizes.

use serde::{Deserialize, Serialize};

/// A width/height pair, used for collider extents and color rects.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct Size2D {
    pub w: f32,
    pub h: f32,
}

impl Size2D {
    #[must_use]
    pub const fn new(w: f32, h: f32) -> Self {
        Self { w, h }
    }
}

/// An axis-aligned rectangle with its origin at the top-left corner.
///
/// Used as the draw source of a sprite frame inside a texture sheet.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct Rect2 {
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
}

impl Rect2 {
    #[must_use]
    pub const fn new(x: f32, y: f32, w: f32, h: f32) -> Self {
        Self { x, y, w, h }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rect_from_json() {
        let r: Rect2 = serde_json::from_str(r#"{"x": 0, "y": 0, "w": 126, "h": 53}"#).unwrap();
        assert_eq!(r, Rect2::new(0.0, 0.0, 126.0, 53.0));
    }

    #[test]
    fn test_size_msgpack_roundtrip() {
        let s = Size2D::new(16.0, 17.0);
        let bytes = rmp_serde::to_vec_named(&s).unwrap();
        let restored: Size2D = rmp_serde::from_slice(&bytes).unwrap();
        assert_eq!(s, restored);
    }
}
