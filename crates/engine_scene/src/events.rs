//! Per-entity named event channels.
//!
//! Dispatch is synchronous: `broadcast` runs every subscribed callback, in
//! subscription order, before it returns. Channels belong to their owning
//! entity and are dropped with it, as are the subscriptions the entity made.

use std::collections::HashMap;

use engine_component::Entity;
use serde_json::Value;

use crate::error::SceneError;

/// Subscriber callback. Receives the subscribing entity and the broadcast
/// arguments.
pub type EventCallback = Box<dyn FnMut(Entity, &[Value])>;

struct Subscription {
    subscriber: Entity,
    callback: EventCallback,
}

/// All event channels of a scene.
#[derive(Default)]
pub struct EventHub {
    channels: HashMap<Entity, HashMap<String, Vec<Subscription>>>,
}

impl std::fmt::Debug for EventHub {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventHub")
            .field("owners", &self.channels.len())
            .field("channels", &self.channel_count())
            .finish()
    }
}

impl EventHub {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a channel on `owner`. Returns `false` if it already existed;
    /// existing subscriptions are kept.
    pub fn create_event(&mut self, owner: Entity, name: &str) -> bool {
        let channels = self.channels.entry(owner).or_default();
        if channels.contains_key(name) {
            return false;
        }
        channels.insert(name.to_string(), Vec::new());
        true
    }

    #[must_use]
    pub fn has_event(&self, owner: Entity, name: &str) -> bool {
        self.channels
            .get(&owner)
            .is_some_and(|c| c.contains_key(name))
    }

    fn channel_mut(
        &mut self,
        owner: Entity,
        name: &str,
    ) -> Result<&mut Vec<Subscription>, SceneError> {
        self.channels
            .get_mut(&owner)
            .and_then(|c| c.get_mut(name))
            .ok_or_else(|| SceneError::UnknownEvent {
                owner,
                name: name.to_string(),
            })
    }

    pub fn subscribe(
        &mut self,
        owner: Entity,
        name: &str,
        subscriber: Entity,
        callback: impl FnMut(Entity, &[Value]) + 'static,
    ) -> Result<(), SceneError> {
        self.channel_mut(owner, name)?.push(Subscription {
            subscriber,
            callback: Box::new(callback),
        });
        Ok(())
    }

    /// Remove every subscription `subscriber` holds on the channel.
    ///
    /// Returns how many were removed.
    pub fn unsubscribe(&mut self, owner: Entity, name: &str, subscriber: Entity) -> usize {
        let Ok(subs) = self.channel_mut(owner, name) else {
            return 0;
        };
        let before = subs.len();
        subs.retain(|s| s.subscriber != subscriber);
        before - subs.len()
    }

    /// Run every callback subscribed to the channel. Returns how many ran.
    pub fn broadcast(&mut self, owner: Entity, name: &str, args: &[Value]) -> Result<usize, SceneError> {
        let subs = self.channel_mut(owner, name)?;
        for sub in subs.iter_mut() {
            (sub.callback)(sub.subscriber, args);
        }
        Ok(subs.len())
    }

    /// Drop the channels `entity` owns and the subscriptions it made.
    pub fn remove_entity(&mut self, entity: Entity) {
        self.channels.remove(&entity);
        for channels in self.channels.values_mut() {
            for subs in channels.values_mut() {
                subs.retain(|s| s.subscriber != entity);
            }
        }
    }

    pub fn clear(&mut self) {
        self.channels.clear();
    }

    #[must_use]
    pub fn subscriber_count(&self, owner: Entity, name: &str) -> usize {
        self.channels
            .get(&owner)
            .and_then(|c| c.get(name))
            .map_or(0, Vec::len)
    }

    #[must_use]
    pub fn channel_count(&self) -> usize {
        self.channels.values().map(HashMap::len).sum()
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use serde_json::json;

    use super::*;

    fn recorder(log: &Rc<RefCell<Vec<String>>>, label: &'static str) -> EventCallback {
        let log = Rc::clone(log);
        Box::new(move |subscriber: Entity, args: &[Value]| {
            log.borrow_mut()
                .push(format!("{label}:{}:{}", subscriber.index(), args.len()));
        })
    }

    #[test]
    fn test_broadcast_runs_in_subscription_order() {
        let mut hub = EventHub::new();
        let owner = Entity::new(0, 0);
        let log = Rc::new(RefCell::new(Vec::new()));
        assert!(hub.create_event(owner, "hit"));
        hub.subscribe(owner, "hit", Entity::new(1, 0), recorder(&log, "a"))
            .unwrap();
        hub.subscribe(owner, "hit", Entity::new(2, 0), recorder(&log, "b"))
            .unwrap();

        let ran = hub.broadcast(owner, "hit", &[json!(10), json!("left")]).unwrap();
        assert_eq!(ran, 2);
        assert_eq!(*log.borrow(), vec!["a:1:2", "b:2:2"]);
    }

    #[test]
    fn test_unknown_event_errors() {
        let mut hub = EventHub::new();
        let owner = Entity::new(0, 0);
        let err = hub.broadcast(owner, "missing", &[]).unwrap_err();
        assert!(matches!(err, SceneError::UnknownEvent { .. }));
        let err = hub
            .subscribe(owner, "missing", owner, |_, _| {})
            .unwrap_err();
        assert!(matches!(err, SceneError::UnknownEvent { .. }));
    }

    #[test]
    fn test_recreate_keeps_subscribers() {
        let mut hub = EventHub::new();
        let owner = Entity::new(0, 0);
        hub.create_event(owner, "tick");
        hub.subscribe(owner, "tick", owner, |_, _| {}).unwrap();
        assert!(!hub.create_event(owner, "tick"));
        assert_eq!(hub.subscriber_count(owner, "tick"), 1);
    }

    #[test]
    fn test_remove_entity_drops_channels_and_subscriptions() {
        let mut hub = EventHub::new();
        let owner = Entity::new(0, 0);
        let other = Entity::new(1, 0);
        hub.create_event(owner, "hit");
        hub.create_event(other, "died");
        hub.subscribe(owner, "hit", other, |_, _| {}).unwrap();
        hub.subscribe(owner, "hit", owner, |_, _| {}).unwrap();

        hub.remove_entity(other);
        assert!(!hub.has_event(other, "died"));
        assert_eq!(hub.subscriber_count(owner, "hit"), 1);

        hub.remove_entity(owner);
        assert_eq!(hub.channel_count(), 0);
    }

    #[test]
    fn test_unsubscribe() {
        let mut hub = EventHub::new();
        let owner = Entity::new(0, 0);
        hub.create_event(owner, "hit");
        hub.subscribe(owner, "hit", owner, |_, _| {}).unwrap();
        assert_eq!(hub.unsubscribe(owner, "hit", owner), 1);
        assert_eq!(hub.unsubscribe(owner, "nope", owner), 0);
        assert_eq!(hub.broadcast(owner, "hit", &[]).unwrap(), 0);
    }
}
