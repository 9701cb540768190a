//! Correlation registry
//!
//! Maps instance ids to the component they currently refer to, and separately
//! to the actor running on their behalf. The registry lives in the
//! coordinator's [`Session`](crate::coordinator::Session) and is only mutated
//! by the interception hooks, so registry state and actor state change
//! together inside the coordinator's message loop.

use rustc_hash::FxHashMap;

use crate::actor::ActorHandle;
use crate::identity::{ComponentDescriptor, InstanceId};

/// Instance id → descriptor and instance id → actor
#[derive(Debug, Default)]
pub struct Registry {
    components: FxHashMap<InstanceId, ComponentDescriptor>,
    actors: FxHashMap<InstanceId, ActorHandle>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn put(
        &mut self,
        id: InstanceId,
        descriptor: ComponentDescriptor,
    ) -> Option<ComponentDescriptor> {
        self.components.insert(id, descriptor)
    }

    /// Descriptor an attached instance refers to
    pub fn get(&self, id: InstanceId) -> Option<&ComponentDescriptor> {
        self.components.get(&id)
    }

    pub(crate) fn delete(&mut self, id: InstanceId) -> Option<ComponentDescriptor> {
        self.components.remove(&id)
    }

    pub(crate) fn put_actor(&mut self, id: InstanceId, actor: ActorHandle) -> Option<ActorHandle> {
        self.actors.insert(id, actor)
    }

    /// Live actor for an attached instance
    pub fn get_actor(&self, id: InstanceId) -> Option<&ActorHandle> {
        self.actors.get(&id)
    }

    pub(crate) fn delete_actor(&mut self, id: InstanceId) -> Option<ActorHandle> {
        self.actors.remove(&id)
    }

    /// Check if an instance has a relay-routing entry
    pub fn contains(&self, id: InstanceId) -> bool {
        self.components.contains_key(&id)
    }

    /// Number of attached instances
    pub fn len(&self) -> usize {
        self.components.len()
    }

    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }

    /// Number of registered actors
    pub fn actor_count(&self) -> usize {
        self.actors.len()
    }

    /// Drop every entry, stopping all registered actors
    pub(crate) fn stop_all(&mut self) -> usize {
        self.components.clear();
        let mut stopped = 0;
        for (_, actor) in self.actors.drain() {
            if actor.stop() {
                stopped += 1;
            }
        }
        stopped
    }
}
