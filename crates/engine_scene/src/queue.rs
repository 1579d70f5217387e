//! Mutation queue: structural changes requested during a frame.
//!
//! Scripts never create or free entities directly while a frame is running.
//! Requests are buffered here in FIFO order and applied together at the
//! frame barrier, so a traversal in progress never sees the tree change
//! under it and new entities become visible to the next frame only.

use engine_component::{ComponentSet, Entity};

use crate::stage::StageNode;

/// Identifies a queued creation until the barrier assigns it an entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CreateTicket(pub u64);

impl std::fmt::Display for CreateTicket {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "CreateTicket({})", self.0)
    }
}

/// A single node to create under an existing parent.
#[derive(Debug, Clone, PartialEq)]
pub struct CreateRequest {
    pub parent: Entity,
    pub name: String,
    pub node_type: String,
    pub tags: Vec<String>,
    pub components: ComponentSet,
}

/// A buffered structural change.
#[derive(Debug, Clone, PartialEq)]
pub enum PendingMutation {
    /// Create one node.
    Create {
        ticket: CreateTicket,
        request: CreateRequest,
    },
    /// Build a whole validated scene description under `parent`.
    Instance {
        ticket: CreateTicket,
        parent: Entity,
        description: StageNode,
    },
    /// Delete `target` and its subtree.
    Delete { target: Entity },
}

impl PendingMutation {
    #[must_use]
    pub fn is_creation(&self) -> bool {
        !matches!(self, PendingMutation::Delete { .. })
    }
}

/// What a frame barrier applied.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FrameChanges {
    /// Created entities with the ticket that requested them, in FIFO order.
    /// For an instance this is the top node of the subtree.
    pub created: Vec<(CreateTicket, Entity)>,
    /// Every destroyed entity, children before parents.
    pub deleted: Vec<Entity>,
    /// Creations dropped because their parent no longer existed or the new
    /// node would exceed the maximum tree depth.
    pub rejected: Vec<CreateTicket>,
    /// The new root, if a queued scene change was applied.
    pub scene_changed: Option<Entity>,
}

impl FrameChanges {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.created.is_empty()
            && self.deleted.is_empty()
            && self.rejected.is_empty()
            && self.scene_changed.is_none()
    }

    /// The entity a ticket produced, if it was applied.
    #[must_use]
    pub fn entity_for(&self, ticket: CreateTicket) -> Option<Entity> {
        self.created
            .iter()
            .find(|(t, _)| *t == ticket)
            .map(|&(_, e)| e)
    }
}

/// FIFO buffer of pending mutations plus at most one queued scene change.
#[derive(Debug, Default)]
pub struct MutationQueue {
    pending: Vec<PendingMutation>,
    next_ticket: u64,
    scene_change: Option<StageNode>,
}

impl MutationQueue {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn ticket(&mut self) -> CreateTicket {
        let ticket = CreateTicket(self.next_ticket);
        self.next_ticket += 1;
        ticket
    }

    pub fn enqueue_create(&mut self, request: CreateRequest) -> CreateTicket {
        let ticket = self.ticket();
        self.pending.push(PendingMutation::Create { ticket, request });
        ticket
    }

    pub fn enqueue_instance(&mut self, parent: Entity, description: StageNode) -> CreateTicket {
        let ticket = self.ticket();
        self.pending.push(PendingMutation::Instance {
            ticket,
            parent,
            description,
        });
        ticket
    }

    /// Queue `target` for deletion. Returns `false` if it already was.
    pub fn enqueue_delete(&mut self, target: Entity) -> bool {
        if self.is_delete_queued(target) {
            return false;
        }
        self.pending.push(PendingMutation::Delete { target });
        true
    }

    /// Withdraw a pending deletion. Returns `true` if one was removed.
    pub fn cancel_delete(&mut self, target: Entity) -> bool {
        let before = self.pending.len();
        self.pending
            .retain(|m| !matches!(m, PendingMutation::Delete { target: t } if *t == target));
        self.pending.len() != before
    }

    #[must_use]
    pub fn is_delete_queued(&self, target: Entity) -> bool {
        self.pending
            .iter()
            .any(|m| matches!(m, PendingMutation::Delete { target: t } if *t == target))
    }

    /// Queue a scene change. Only the first request per frame is kept;
    /// returns `false` if one is already queued.
    pub fn queue_scene_change(&mut self, description: StageNode) -> bool {
        if self.scene_change.is_some() {
            return false;
        }
        self.scene_change = Some(description);
        true
    }

    #[must_use]
    pub fn has_scene_change(&self) -> bool {
        self.scene_change.is_some()
    }

    /// Take everything queued, split into creations and deletions, each in
    /// FIFO order, plus the scene change if any. The queue is left empty.
    pub fn take(&mut self) -> (Vec<PendingMutation>, Vec<Entity>, Option<StageNode>) {
        let (creations, deletions): (Vec<_>, Vec<_>) = std::mem::take(&mut self.pending)
            .into_iter()
            .partition(PendingMutation::is_creation);
        let deletions = deletions
            .into_iter()
            .filter_map(|m| match m {
                PendingMutation::Delete { target } => Some(target),
                _ => None,
            })
            .collect();
        (creations, deletions, self.scene_change.take())
    }

    /// Pending mutations, in FIFO order.
    pub fn iter(&self) -> impl Iterator<Item = &PendingMutation> {
        self.pending.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty() && self.scene_change.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(parent: Entity, name: &str) -> CreateRequest {
        CreateRequest {
            parent,
            name: name.to_string(),
            node_type: "Node".to_string(),
            tags: Vec::new(),
            components: ComponentSet::new(),
        }
    }

    #[test]
    fn test_tickets_are_sequential() {
        let mut queue = MutationQueue::new();
        let root = Entity::new(0, 0);
        let a = queue.enqueue_create(request(root, "A"));
        let b = queue.enqueue_instance(root, StageNode::new("B", "Node"));
        assert_eq!(a, CreateTicket(0));
        assert_eq!(b, CreateTicket(1));
        assert_eq!(queue.len(), 2);
    }

    #[test]
    fn test_duplicate_delete_ignored() {
        let mut queue = MutationQueue::new();
        let e = Entity::new(3, 0);
        assert!(queue.enqueue_delete(e));
        assert!(!queue.enqueue_delete(e));
        assert_eq!(queue.len(), 1);
        assert!(queue.cancel_delete(e));
        assert!(!queue.is_delete_queued(e));
        assert!(!queue.cancel_delete(e));
    }

    #[test]
    fn test_take_splits_and_keeps_fifo() {
        let mut queue = MutationQueue::new();
        let root = Entity::new(0, 0);
        queue.enqueue_delete(Entity::new(5, 0));
        queue.enqueue_create(request(root, "A"));
        queue.enqueue_delete(Entity::new(6, 0));
        queue.enqueue_create(request(root, "B"));

        let (creations, deletions, scene) = queue.take();
        let names: Vec<&str> = creations
            .iter()
            .map(|m| match m {
                PendingMutation::Create { request, .. } => request.name.as_str(),
                _ => "",
            })
            .collect();
        assert_eq!(names, vec!["A", "B"]);
        assert_eq!(deletions, vec![Entity::new(5, 0), Entity::new(6, 0)]);
        assert!(scene.is_none());
        assert!(queue.is_empty());
    }

    #[test]
    fn test_only_first_scene_change_kept() {
        let mut queue = MutationQueue::new();
        assert!(queue.queue_scene_change(StageNode::new("Level1", "Node")));
        assert!(!queue.queue_scene_change(StageNode::new("Level2", "Node")));
        let (_, _, scene) = queue.take();
        assert_eq!(scene.unwrap().name, "Level1");
        assert!(!queue.has_scene_change());
    }

    #[test]
    fn test_frame_changes_lookup() {
        let changes = FrameChanges {
            created: vec![(CreateTicket(4), Entity::new(9, 1))],
            ..FrameChanges::default()
        };
        assert_eq!(changes.entity_for(CreateTicket(4)), Some(Entity::new(9, 1)));
        assert_eq!(changes.entity_for(CreateTicket(5)), None);
        assert!(!changes.is_empty());
        assert!(FrameChanges::default().is_empty());
    }
}
