//! Delete notifications: the weak-reference safety net of the scene graph.
//!
//! Reference variables never own their target. Instead every
//! `GameObjectRef`/`ComponentRef` variable holding a target is subscribed to
//! that object's [`OnDeleteObservers`]. When the object is destroyed, the
//! subscribed variables are nulled and external listeners are called with
//! the doomed object before it is dropped.

use std::fmt;

use crate::error::SceneError;
use crate::game_object::GameObject;
use crate::ids::{ComponentId, GameObjectId, ListenerId};
use crate::value::Value;
use crate::world::World;

/// Callback invoked with an object that is about to be destroyed.
pub type DeleteCallback = Box<dyn FnMut(&GameObject) + Send + Sync>;

/// Key of an entry in an object's delete-observer list.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Subscriber {
    /// A reference variable on a component, nulled automatically.
    Variable {
        component: ComponentId,
        variable: usize,
    },
    /// An external listener registered through [`World::register_on_delete`].
    Listener(ListenerId),
}

pub(crate) struct DeleteSubscription {
    pub(crate) subscriber: Subscriber,
    pub(crate) callback: Option<DeleteCallback>,
}

/// Observer list owned by each [`GameObject`].
///
/// Entries are unique per [`Subscriber`]; registering twice is a no-op, so
/// one deletion notifies each subscriber exactly once.
#[derive(Default)]
pub struct OnDeleteObservers {
    entries: Vec<DeleteSubscription>,
}

impl OnDeleteObservers {
    pub(crate) fn register(
        &mut self,
        subscriber: Subscriber,
        callback: Option<DeleteCallback>,
    ) -> bool {
        if self.contains(subscriber) {
            return false;
        }
        self.entries.push(DeleteSubscription {
            subscriber,
            callback,
        });
        true
    }

    pub(crate) fn unregister(&mut self, subscriber: Subscriber) -> bool {
        let before = self.entries.len();
        self.entries.retain(|e| e.subscriber != subscriber);
        self.entries.len() != before
    }

    pub fn contains(&self, subscriber: Subscriber) -> bool {
        self.entries.iter().any(|e| e.subscriber == subscriber)
    }

    pub fn subscribers(&self) -> impl Iterator<Item = Subscriber> + '_ {
        self.entries.iter().map(|e| e.subscriber)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub(crate) fn take(&mut self) -> Vec<DeleteSubscription> {
        std::mem::take(&mut self.entries)
    }
}

impl fmt::Debug for OnDeleteObservers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.subscribers()).finish()
    }
}

// ---------------------------------------------------------------------------
// World integration
// ---------------------------------------------------------------------------

impl World {
    /// Allocates a handle for an external delete listener.
    pub fn new_listener_id(&mut self) -> ListenerId {
        self.next_listener_id += 1;
        ListenerId(self.next_listener_id)
    }

    /// Calls `callback` when `target` is destroyed.
    ///
    /// Returns `Ok(false)` if `listener` is already subscribed to `target`;
    /// the existing callback is kept.
    pub fn register_on_delete(
        &mut self,
        target: GameObjectId,
        listener: ListenerId,
        callback: impl FnMut(&GameObject) + Send + Sync + 'static,
    ) -> Result<bool, SceneError> {
        let object = self
            .object_mut(target)
            .ok_or(SceneError::ObjectNotFound(target))?;
        Ok(object
            .on_delete
            .register(Subscriber::Listener(listener), Some(Box::new(callback))))
    }

    /// Removes a listener; returns whether it was subscribed.
    pub fn unregister_on_delete(
        &mut self,
        target: GameObjectId,
        listener: ListenerId,
    ) -> Result<bool, SceneError> {
        let object = self
            .object_mut(target)
            .ok_or(SceneError::ObjectNotFound(target))?;
        Ok(object.on_delete.unregister(Subscriber::Listener(listener)))
    }

    /// The object whose deletion invalidates `value`, if it is a tracked
    /// reference.
    pub(crate) fn reference_owner(&self, value: &Value) -> Option<GameObjectId> {
        match value {
            Value::GameObjectRef(target) => *target,
            Value::ComponentRef(Some(component)) => self.owner_of(*component),
            _ => None,
        }
    }

    /// Moves the delete subscription of one variable from the object `old`
    /// points at to the object `new` points at.
    pub(crate) fn resubscribe_variable(
        &mut self,
        component: ComponentId,
        variable: usize,
        old: &Value,
        new: &Value,
    ) {
        let old_target = self.reference_owner(old);
        let new_target = self.reference_owner(new);
        if old_target == new_target {
            return;
        }
        let subscriber = Subscriber::Variable {
            component,
            variable,
        };
        if let Some(target) = old_target
            && let Some(object) = self.object_mut(target)
        {
            object.on_delete.unregister(subscriber);
        }
        if let Some(target) = new_target
            && let Some(object) = self.object_mut(target)
        {
            object.on_delete.register(subscriber, None);
            log::trace!("{component} variable #{variable} subscribed to {target}");
        }
    }

    /// Subscribes every tracked reference of a freshly created or loaded
    /// component.
    pub(crate) fn subscribe_component_references(&mut self, component: ComponentId) {
        for (index, value) in self.tracked_references(component) {
            let null = Value::null_of(value.variable_type()).unwrap_or_else(|| value.clone());
            self.resubscribe_variable(component, index, &null, &value);
        }
    }

    /// Drops every delete subscription held by the component's variables.
    pub(crate) fn release_component_references(&mut self, component: ComponentId) {
        for (index, value) in self.tracked_references(component) {
            let null = Value::null_of(value.variable_type()).unwrap_or_else(|| value.clone());
            self.resubscribe_variable(component, index, &value, &null);
        }
    }

    fn tracked_references(&self, component: ComponentId) -> Vec<(usize, Value)> {
        let Some(instance) = self.component(component) else {
            return Vec::new();
        };
        instance
            .component_type()
            .variables()
            .iter()
            .filter(|v| v.var_type().tracks_deletion())
            .filter_map(|v| instance.read(v).map(|value| (v.index(), value)))
            .filter(|(_, value)| self.reference_owner(value).is_some())
            .collect()
    }

    /// Nulls a subscribed variable whose target is going away.
    ///
    /// `removed_component` narrows ComponentRef clearing to one component
    /// when only that component is being removed.
    pub(crate) fn clear_subscribed_variable(
        &mut self,
        component: ComponentId,
        variable: usize,
        doomed_object: GameObjectId,
        removed_component: Option<ComponentId>,
    ) -> bool {
        let Some(ty) = self.component(component).map(|c| c.component_type().clone()) else {
            return false;
        };
        let Some(descriptor) = ty.variable_at(variable) else {
            return false;
        };
        let Some(value) = self.component(component).and_then(|c| c.read(descriptor)) else {
            return false;
        };

        let affected = match (&value, removed_component) {
            (Value::GameObjectRef(Some(target)), None) => *target == doomed_object,
            (Value::ComponentRef(Some(target)), None) => {
                self.owner_of(*target) == Some(doomed_object)
            }
            (Value::ComponentRef(Some(target)), Some(removed)) => *target == removed,
            _ => false,
        };
        if !affected {
            return false;
        }

        let Some(null) = Value::null_of(descriptor.var_type()) else {
            return false;
        };
        if let Some(instance) = self.component_mut(component) {
            instance.write(descriptor, null);
            log::debug!(
                "'{}' of {component} cleared: its target on {doomed_object} was destroyed",
                descriptor.name()
            );
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ids::SceneId;

    #[test]
    fn registration_is_unique_per_subscriber() {
        let mut observers = OnDeleteObservers::default();
        let subscriber = Subscriber::Variable {
            component: ComponentId::new(SceneId(1), 3),
            variable: 0,
        };

        assert!(observers.register(subscriber, None));
        assert!(!observers.register(subscriber, None));
        assert_eq!(observers.len(), 1);

        assert!(observers.unregister(subscriber));
        assert!(!observers.unregister(subscriber));
        assert!(observers.is_empty());
    }

    #[test]
    fn take_empties_the_list() {
        let mut observers = OnDeleteObservers::default();
        observers.register(Subscriber::Listener(ListenerId(1)), Some(Box::new(|_: &GameObject| {})));
        observers.register(Subscriber::Listener(ListenerId(2)), None);

        let taken = observers.take();
        assert_eq!(taken.len(), 2);
        assert!(taken[0].callback.is_some());
        assert!(observers.is_empty());
    }
}
