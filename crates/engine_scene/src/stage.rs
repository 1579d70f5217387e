//! Declarative scene descriptions.
//!
//! A [`StageNode`] tree is read-only input: the loader turns it into entity
//! table rows and tree edges and never mutates it. On disk a stage is JSON
//! or MessagePack with the same shape:
//!
//! ```json
//! {
//!   "name": "Main",
//!   "type": "Node2D",
//!   "components": [{ "type": "Transform2D", "position": [0.0, 0.0] }],
//!   "children": [{ "name": "Sprite", "type": "Sprite" }]
//! }
//! ```

use engine_component::ComponentData;
use serde::{Deserialize, Serialize};

use crate::error::SceneError;

/// One node of a scene description.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageNode {
    pub name: String,
    /// Node type name, validated against the node type registry.
    #[serde(rename = "type")]
    pub node_type: String,
    #[serde(default)]
    pub tags: Option<Vec<String>>,
    /// Path of the stage file this node was instanced from, if any. Kept as
    /// metadata; the loader does not resolve it.
    #[serde(default, alias = "external_node_source")]
    pub external_source: Option<String>,
    #[serde(default)]
    pub components: Vec<ComponentData>,
    /// Declared order becomes child order.
    #[serde(default)]
    pub children: Vec<StageNode>,
}

impl StageNode {
    #[must_use]
    pub fn new(name: impl Into<String>, node_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            node_type: node_type.into(),
            tags: None,
            external_source: None,
            components: Vec::new(),
            children: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_component(mut self, component: impl Into<ComponentData>) -> Self {
        self.components.push(component.into());
        self
    }

    #[must_use]
    pub fn with_child(mut self, child: StageNode) -> Self {
        self.children.push(child);
        self
    }

    #[must_use]
    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.get_or_insert_with(Vec::new).push(tag.into());
        self
    }

    /// Total number of nodes in this description, itself included.
    #[must_use]
    pub fn node_count(&self) -> usize {
        1 + self.children.iter().map(StageNode::node_count).sum::<usize>()
    }

    /// Number of nodes on the longest path down from this node.
    #[must_use]
    pub fn height(&self) -> usize {
        1 + self.children.iter().map(StageNode::height).max().unwrap_or(0)
    }

    // -- Encoding --

    pub fn from_json_str(source: &str) -> Result<Self, SceneError> {
        Ok(serde_json::from_str(source)?)
    }

    pub fn from_json_slice(bytes: &[u8]) -> Result<Self, SceneError> {
        Ok(serde_json::from_slice(bytes)?)
    }

    pub fn from_msgpack_slice(bytes: &[u8]) -> Result<Self, SceneError> {
        Ok(rmp_serde::from_slice(bytes)?)
    }

    pub fn to_json_string(&self) -> Result<String, SceneError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Encode as MessagePack with named fields, which tagged components need.
    pub fn to_msgpack(&self) -> Result<Vec<u8>, SceneError> {
        Ok(rmp_serde::to_vec_named(self)?)
    }
}

#[cfg(test)]
mod tests {
    use engine_component::{Collider2D, TextLabel, Transform2D};
    use engine_math::{Size2D, Vec2};

    use super::*;

    const FIGHTER_STAGE: &str = r#"{
        "name": "Main",
        "type": "Node2D",
        "tags": null,
        "external_node_source": null,
        "components": [
            { "type": "Transform2D", "position": [0.0, 0.0], "scale": [1.0, 1.0],
              "rotation": 0.0, "z_index": 0, "z_index_relative_to_parent": true,
              "ignore_camera": false },
            { "type": "Script", "class_path": "src.main", "class_name": "Main" }
        ],
        "children": [
            {
                "name": "PlayerOne",
                "type": "AnimatedSprite",
                "components": [
                    { "type": "Transform2D", "position": [200.0, 368.0], "scale": [4.0, 4.0] },
                    { "type": "AnimatedSprite", "current_animation": "idle", "is_playing": true,
                      "origin": [62, 27],
                      "animations": [{ "name": "idle", "speed": 100, "loops": true, "frames": [
                          { "frame": 0, "texture_path": "assets/images/mor_idle_sheet.png",
                            "draw_source": { "x": 0, "y": 0, "w": 126, "h": 53 } }
                      ]}] }
                ],
                "children": [
                    { "name": "Collider", "type": "Collider2D", "components": [
                        { "type": "Collider2D", "extents": { "w": 16, "h": 17 },
                          "color": { "r": 200, "g": 200, "b": 255, "a": 200 } }
                    ]}
                ]
            },
            { "name": "TimeDisplay", "type": "TextLabel", "components": [
                { "type": "TextLabel", "uid": "fight-64", "text": "60", "color": { "r": 255, "g": 255, "b": 255 } }
            ]}
        ]
    }"#;

    #[test]
    fn test_parse_nested_stage() {
        let stage = StageNode::from_json_str(FIGHTER_STAGE).unwrap();
        assert_eq!(stage.name, "Main");
        assert_eq!(stage.node_type, "Node2D");
        assert_eq!(stage.components.len(), 2);
        assert_eq!(stage.children.len(), 2);
        assert_eq!(stage.children[0].children[0].name, "Collider");
        assert_eq!(stage.node_count(), 4);
        assert_eq!(stage.height(), 3);
    }

    #[test]
    fn test_minimal_node_defaults() {
        let stage = StageNode::from_json_str(r#"{ "name": "Root", "type": "Node" }"#).unwrap();
        assert_eq!(stage, StageNode::new("Root", "Node"));
    }

    #[test]
    fn test_unknown_component_is_decode_error() {
        let err = StageNode::from_json_str(
            r#"{ "name": "Root", "type": "Node", "components": [{ "type": "Rigidbody" }] }"#,
        )
        .unwrap_err();
        assert!(err.is_malformed_scene());
    }

    #[test]
    fn test_builder() {
        let stage = StageNode::new("Main", "Node2D")
            .with_tag("level")
            .with_component(Transform2D::from_position(Vec2::new(1.0, 1.0)))
            .with_child(StageNode::new("Label", "TextLabel").with_component(TextLabel::default()));
        assert_eq!(stage.tags, Some(vec!["level".to_string()]));
        assert_eq!(stage.node_count(), 2);
    }

    #[test]
    fn test_msgpack_roundtrip() {
        let stage = StageNode::new("Main", "Node2D").with_child(
            StageNode::new("Collider", "Collider2D").with_component(Collider2D {
                extents: Size2D::new(16.0, 17.0),
                ..Collider2D::default()
            }),
        );
        let bytes = stage.to_msgpack().unwrap();
        assert_eq!(StageNode::from_msgpack_slice(&bytes).unwrap(), stage);
    }
}
