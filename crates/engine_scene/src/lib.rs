//! # engine_scene
//!
//! The scene graph core. A [`SceneGraph`] owns one scene:
//!
//! - [`EntityTable`]: per-entity name, type, components, time dilation and
//!   deletion flag, addressed by generational [`Entity`] handles.
//! - [`NodeTree`]: parent/child edges with a single root.
//! - [`MutationQueue`]: structural changes requested during a frame and
//!   applied together at the frame barrier.
//! - [`propagation`]: hierarchical values (time dilation, z-index)
//!   recomputed on every query.
//! - [`SceneLoader`]: builds a tree from a [`StageNode`] description.
//! - [`EventHub`]: synchronous named events owned by entities.
//!
//! ```
//! use engine_scene::{SceneGraph, StageNode};
//!
//! let mut graph = SceneGraph::default();
//! let root = graph
//!     .load(&StageNode::new("Main", "Node2D").with_child(StageNode::new("Sprite", "Sprite")))
//!     .unwrap();
//! let sprite = graph.get_child(root, "Sprite").unwrap();
//!
//! graph.queue_deletion(sprite).unwrap();
//! assert_eq!(graph.get_children(root), vec![sprite]);
//!
//! graph.process_queued_mutations();
//! assert!(graph.get_children(root).is_empty());
//! ```

pub mod config;
pub mod error;
pub mod events;
pub mod graph;
pub mod loader;
pub mod propagation;
pub mod queue;
pub mod registry;
pub mod stage;
pub mod table;
pub mod tree;

pub use config::{ReparentPolicy, SceneConfig};
pub use engine_component::Entity;
pub use error::SceneError;
pub use events::{EventCallback, EventHub};
pub use graph::SceneGraph;
pub use loader::SceneLoader;
pub use queue::{CreateRequest, CreateTicket, FrameChanges, MutationQueue, PendingMutation};
pub use registry::{NodeTypeInfo, NodeTypeRegistry};
pub use stage::StageNode;
pub use table::{EntityRecord, EntityTable};
pub use tree::NodeTree;
