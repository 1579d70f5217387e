//! Scene graph error types.

use engine_component::{ComponentKind, Entity};

/// Errors returned by scene graph mutations and scene loading.
///
/// Queries never return these: a stale handle on a query degrades to an
/// empty or default result instead.
#[derive(Debug, thiserror::Error)]
pub enum SceneError {
    /// The handle refers to an entity that was destroyed or never created.
    #[error("stale entity handle {0}")]
    StaleHandle(Entity),

    /// Re-parenting `child` under `parent` would make a node its own ancestor.
    #[error("adding {child} under {parent} would create a cycle")]
    Cycle { parent: Entity, child: Entity },

    /// The scene root has no parent and cannot be re-parented.
    #[error("scene root {0} cannot be given a parent")]
    RootReparent(Entity),

    /// A structural limit of the scene description or tree was violated.
    #[error("malformed scene: {0}")]
    MalformedScene(String),

    /// The node type is not known to the node type registry.
    #[error("unknown node type '{0}'")]
    UnknownNodeType(String),

    /// A node declares the same component kind twice.
    #[error("node '{node}' declares component '{kind}' more than once")]
    DuplicateComponent { node: String, kind: ComponentKind },

    /// A scene is already loaded; the root is set once.
    #[error("scene root already set to {0}")]
    RootAlreadySet(Entity),

    /// The entity does not own an event channel with this name.
    #[error("{owner} has no event named '{name}'")]
    UnknownEvent { owner: Entity, name: String },

    /// The operation is refused because an entity is queued for deletion.
    #[error("{0} is queued for deletion")]
    PendingDeletion(Entity),

    /// Failed to parse a JSON scene description.
    #[error("failed to decode JSON scene: {0}")]
    Json(#[from] serde_json::Error),

    /// Failed to decode a MessagePack scene description.
    #[error("failed to decode MessagePack scene: {0}")]
    MsgPackDecode(#[from] rmp_serde::decode::Error),

    /// Failed to encode a scene description to MessagePack.
    #[error("failed to encode MessagePack scene: {0}")]
    MsgPackEncode(#[from] rmp_serde::encode::Error),
}

impl SceneError {
    /// Returns `true` for every error that means "this scene description is
    /// unusable".
    #[must_use]
    pub fn is_malformed_scene(&self) -> bool {
        matches!(
            self,
            SceneError::MalformedScene(_)
                | SceneError::UnknownNodeType(_)
                | SceneError::DuplicateComponent { .. }
                | SceneError::Json(_)
                | SceneError::MsgPackDecode(_)
        )
    }
}
