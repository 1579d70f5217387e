//! Script binding component.

use serde::{Deserialize, Serialize};

/// Names the script class the host should instantiate for this node.
///
/// The scene graph never interprets these strings; they are handed to the
/// host's script bridge as-is.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Script {
    pub class_path: String,
    pub class_name: String,
}
