//! Script host callbacks.
//!
//! A [`ScriptHost`] is the bridge between the frame loop and whatever runs
//! node behaviour. Every callback gets the scene graph so it can read state
//! and queue structural changes; queued changes land at the frame barrier.

use std::collections::HashMap;

use engine_component::{Entity, Script};
use engine_scene::SceneGraph;
use tracing::{debug, info};

/// Lifecycle callbacks invoked by the [`FrameLoop`](crate::tick::FrameLoop).
///
/// `dt` is already scaled by the node's effective time dilation.
pub trait ScriptHost {
    /// The node entered the running scene.
    fn on_start(&mut self, _graph: &mut SceneGraph, _entity: Entity) {}

    /// Once per frame for every node in the tree.
    fn on_update(&mut self, _graph: &mut SceneGraph, _entity: Entity, _dt: f64) {}

    /// Once per fixed physics step for every node in the tree.
    fn on_physics_update(&mut self, _graph: &mut SceneGraph, _entity: Entity, _dt: f64) {}

    /// The node is about to be freed by the frame barrier. It is still
    /// readable.
    fn on_end(&mut self, _graph: &mut SceneGraph, _entity: Entity) {}
}

/// Host that only traces lifecycle events and tracks per-node lifetime.
///
/// Nodes carrying a [`Script`] component are logged with their class.
#[derive(Debug, Default)]
pub struct LoggingHost {
    /// Scaled seconds each live node has experienced.
    lifetimes: HashMap<Entity, f64>,
    started: u64,
    ended: u64,
}

impl LoggingHost {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Scaled time `entity` has lived, if it is running.
    #[must_use]
    pub fn lifetime(&self, entity: Entity) -> Option<f64> {
        self.lifetimes.get(&entity).copied()
    }

    #[must_use]
    pub fn started(&self) -> u64 {
        self.started
    }

    #[must_use]
    pub fn ended(&self) -> u64 {
        self.ended
    }
}

impl ScriptHost for LoggingHost {
    fn on_start(&mut self, graph: &mut SceneGraph, entity: Entity) {
        self.started += 1;
        self.lifetimes.insert(entity, 0.0);
        let name = graph.get_name(entity).unwrap_or_default();
        match graph.get_component::<Script>(entity) {
            Some(script) => info!(
                entity = %entity,
                node = name,
                class = %script.class_name,
                path = %script.class_path,
                "script node started"
            ),
            None => debug!(entity = %entity, node = name, "node started"),
        }
    }

    fn on_update(&mut self, _graph: &mut SceneGraph, entity: Entity, dt: f64) {
        if let Some(lifetime) = self.lifetimes.get_mut(&entity) {
            *lifetime += dt;
        }
    }

    fn on_end(&mut self, graph: &mut SceneGraph, entity: Entity) {
        self.ended += 1;
        let lived = self.lifetimes.remove(&entity).unwrap_or_default();
        debug!(
            entity = %entity,
            node = graph.get_name(entity).unwrap_or_default(),
            lived,
            "node ended"
        );
    }
}
