//! Scene graph configuration.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// What `add_child` does when the moved node, or its new parent, is queued
/// for deletion.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReparentPolicy {
    /// Leave pending deletions untouched. A node moved under a subtree that
    /// is queued for deletion is deleted with it at the next barrier.
    #[default]
    Preserve,
    /// Moving a node that is itself queued for deletion cancels its pending
    /// deletion.
    Cancel,
    /// Refuse the move with `SceneError::PendingDeletion`.
    Reject,
}

impl FromStr for ReparentPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "preserve" => Ok(ReparentPolicy::Preserve),
            "cancel" => Ok(ReparentPolicy::Cancel),
            "reject" => Ok(ReparentPolicy::Reject),
            other => Err(format!(
                "unknown re-parent policy '{other}' (expected preserve, cancel or reject)"
            )),
        }
    }
}

/// Configuration for a [`SceneGraph`](crate::SceneGraph).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneConfig {
    /// Handling of re-parenting across pending deletions.
    pub reparent_policy: ReparentPolicy,
    /// Global multiplier applied on top of every node's total time dilation.
    pub world_time_dilation: f64,
    /// Maximum number of nodes on any root-to-leaf path.
    pub max_depth: usize,
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            reparent_policy: ReparentPolicy::Preserve,
            world_time_dilation: 1.0,
            max_depth: 1024,
        }
    }
}

impl SceneConfig {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_reparent_policy(mut self, policy: ReparentPolicy) -> Self {
        self.reparent_policy = policy;
        self
    }

    #[must_use]
    pub fn with_world_time_dilation(mut self, dilation: f64) -> Self {
        self.world_time_dilation = dilation;
        self
    }

    #[must_use]
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }
}
