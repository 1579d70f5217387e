//! Hierarchical attribute propagation.
//!
//! Derived values are recomputed on every query by walking up the tree.
//! Nothing is cached, so an edit to any ancestor is visible immediately.

use engine_component::{Entity, Transform2D};

use crate::table::EntityTable;
use crate::tree::NodeTree;

/// Product of local time dilations from `entity` up to the top of its
/// tree, inclusive. `None` if `entity` is stale.
#[must_use]
pub fn total_time_dilation(table: &EntityTable, tree: &NodeTree, entity: Entity) -> Option<f64> {
    let mut total = table.get_time_dilation(entity)?;
    let mut current = tree.get_parent(entity);
    while let Some(node) = current {
        total *= table.get_time_dilation(node).unwrap_or(1.0);
        current = tree.get_parent(node);
    }
    Some(total)
}

/// Effective draw order of `entity`.
///
/// Starts from the entity's own `z_index` and keeps adding ancestors'
/// values while each node on the way is relative to its parent. Nodes
/// without a transform count as z-index 0 and relative. `None` if
/// `entity` is stale.
#[must_use]
pub fn total_z_index(table: &EntityTable, tree: &NodeTree, entity: Entity) -> Option<i32> {
    let record = table.get(entity)?;
    let (mut total, mut relative) = z_of(record.components.get::<Transform2D>());
    let mut current = tree.get_parent(entity);
    while relative {
        let Some(node) = current else { break };
        let (z, node_relative) = z_of(table.get_component::<Transform2D>(node));
        total = total.saturating_add(z);
        relative = node_relative;
        current = tree.get_parent(node);
    }
    Some(total)
}

fn z_of(transform: Option<&Transform2D>) -> (i32, bool) {
    transform.map_or((0, true), |t| (t.z_index, t.z_index_relative_to_parent))
}
