//! Text label component.

use engine_math::Color;
use serde::{Deserialize, Serialize};

/// A line of text drawn with the font registered under `uid`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct TextLabel {
    pub uid: String,
    pub text: String,
    pub color: Color,
}

impl Default for TextLabel {
    fn default() -> Self {
        Self {
            uid: "default".to_string(),
            text: String::new(),
            color: Color::WHITE,
        }
    }
}
