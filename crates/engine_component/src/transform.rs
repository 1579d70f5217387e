//! 2D transform component.
//!
//! [`Transform2D`] holds a node's local position, scale and rotation, plus
//! the draw-ordering flags scene descriptions attach to it.

use engine_math::Vec2;
use serde::{Deserialize, Serialize};

/// A local 2D transform.
///
/// `rotation` is in degrees. When `z_index_relative_to_parent` is set the
/// effective z-index adds the parent's.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Transform2D {
    pub position: Vec2,
    pub scale: Vec2,
    pub rotation: f32,
    pub z_index: i32,
    pub z_index_relative_to_parent: bool,
    pub ignore_camera: bool,
}

impl Transform2D {
    /// Origin, unit scale, no rotation, z-index relative to parent.
    pub const IDENTITY: Self = Self {
        position: Vec2::ZERO,
        scale: Vec2::ONE,
        rotation: 0.0,
        z_index: 0,
        z_index_relative_to_parent: true,
        ignore_camera: false,
    };

    #[must_use]
    pub fn from_position(position: Vec2) -> Self {
        Self {
            position,
            ..Self::IDENTITY
        }
    }

    #[must_use]
    pub fn with_z_index(mut self, z_index: i32, relative_to_parent: bool) -> Self {
        self.z_index = z_index;
        self.z_index_relative_to_parent = relative_to_parent;
        self
    }
}

impl Default for Transform2D {
    fn default() -> Self {
        Self::IDENTITY
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_transform() {
        let t = Transform2D::IDENTITY;
        assert_eq!(t.position, Vec2::ZERO);
        assert_eq!(t.scale, Vec2::ONE);
        assert!(t.z_index_relative_to_parent);
        assert_eq!(t, Transform2D::default());
    }

    #[test]
    fn test_with_z_index() {
        let t = Transform2D::from_position(Vec2::new(200.0, 368.0)).with_z_index(-3, false);
        assert_eq!(t.position, Vec2::new(200.0, 368.0));
        assert_eq!(t.z_index, -3);
        assert!(!t.z_index_relative_to_parent);
    }

    #[test]
    fn test_missing_fields_use_defaults() {
        let t: Transform2D =
            serde_json::from_value(serde_json::json!({ "position": [250.0, 200.0], "ignore_camera": true }))
                .unwrap();
        assert_eq!(t.position, Vec2::new(250.0, 200.0));
        assert_eq!(t.scale, Vec2::ONE);
        assert!(t.ignore_camera);
        assert!(t.z_index_relative_to_parent);
    }
}
