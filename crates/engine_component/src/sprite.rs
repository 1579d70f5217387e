//! Sprite and animated sprite components.

use engine_math::{Color, Rect2, Vec2};
use serde::{Deserialize, Serialize};

/// A static textured quad.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Sprite {
    pub texture_path: String,
    pub draw_source: Rect2,
    pub origin: Vec2,
    pub modulate: Color,
    pub flip_x: bool,
    pub flip_y: bool,
}

impl Default for Sprite {
    fn default() -> Self {
        Self {
            texture_path: String::new(),
            draw_source: Rect2::default(),
            origin: Vec2::ZERO,
            modulate: Color::WHITE,
            flip_x: false,
            flip_y: false,
        }
    }
}

/// One frame of an [`Animation`]: a region of a texture sheet.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct AnimationFrame {
    pub frame: u32,
    pub texture_path: String,
    pub draw_source: Rect2,
}

/// A named, ordered sequence of frames.
///
/// `speed` is the time each frame is shown, in milliseconds.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Animation {
    pub name: String,
    pub speed: u32,
    pub loops: bool,
    pub frames: Vec<AnimationFrame>,
}

impl Default for Animation {
    fn default() -> Self {
        Self {
            name: String::new(),
            speed: 100,
            loops: true,
            frames: Vec::new(),
        }
    }
}

/// A sprite driven by a set of named animations.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AnimatedSprite {
    pub current_animation: String,
    pub is_playing: bool,
    pub origin: Vec2,
    pub modulate: Color,
    pub flip_x: bool,
    pub flip_y: bool,
    pub animations: Vec<Animation>,
}

impl Default for AnimatedSprite {
    fn default() -> Self {
        Self {
            current_animation: String::new(),
            is_playing: false,
            origin: Vec2::ZERO,
            modulate: Color::WHITE,
            flip_x: false,
            flip_y: false,
            animations: Vec::new(),
        }
    }
}
