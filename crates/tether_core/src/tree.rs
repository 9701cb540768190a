//! Component tree
//!
//! The slice of the UI layer tether needs: it hands out instance ids, keeps
//! the mounted instances, routes props refreshes and relay deliveries to them
//! and, when an instance is removed, fires whatever removal binding its root
//! element carries.
//!
//! Instances are keyed by [`InstanceId`] and indexed by
//! [`ComponentDescriptor`] so a component rendered again with the same id
//! refreshes the existing instance instead of mounting a new one.

use rustc_hash::FxHashMap;
use slotmap::SlotMap;

use crate::actor::AnyMessage;
use crate::component::ActorComponent;
use crate::coordinator::CoordinatorAddress;
use crate::dispatcher::{AnyInstance, Env, Instance, Update};
use crate::error::Result;
use crate::event::UiEvent;
use crate::identity::{ComponentDescriptor, InstanceId};

/// "On remove, fire this event for this instance"
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RemovalBinding {
    pub event: String,
    pub target: InstanceId,
}

/// Attributes applied to an instance's outermost element
#[derive(Clone, Debug, Default)]
pub struct RootBinding {
    on_remove: Option<RemovalBinding>,
}

impl RootBinding {
    pub fn bind_removal(&mut self, event: &str, target: InstanceId) {
        self.on_remove = Some(RemovalBinding {
            event: event.to_string(),
            target,
        });
    }

    pub fn removal(&self) -> Option<&RemovalBinding> {
        self.on_remove.as_ref()
    }
}

/// The mounted component instances of one coordinator
#[derive(Default)]
pub struct ComponentTree {
    instances: SlotMap<InstanceId, Box<dyn AnyInstance>>,
    by_descriptor: FxHashMap<ComponentDescriptor, InstanceId>,
}

impl ComponentTree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Render component `C` under `id`, mounting it on first sight
    pub(crate) fn render<C: ActorComponent>(
        &mut self,
        id: String,
        props: C::Props,
        env: &Env<'_>,
    ) -> Result<InstanceId> {
        let descriptor = ComponentDescriptor::of::<C>(id);
        let instance_id = match self.by_descriptor.get(&descriptor) {
            Some(&existing) => existing,
            None => {
                let key = self.instances.insert_with_key(|key| {
                    Box::new(Instance::<C>::new(key, descriptor.clone())) as Box<dyn AnyInstance>
                });
                self.by_descriptor.insert(descriptor, key);
                key
            }
        };

        let Some(instance) = self
            .instances
            .get_mut(instance_id)
            .and_then(|instance| instance.as_any_mut().downcast_mut::<Instance<C>>())
        else {
            tracing::error!(instance = ?instance_id, "descriptor index points at a foreign instance");
            return Ok(instance_id);
        };
        instance.dispatch(Update::Props(props), env)?;
        Ok(instance_id)
    }

    /// Deliver a relayed message to instance `id`
    ///
    /// Returns false if `id` is no longer mounted or no longer renders
    /// `descriptor`; a remounted descriptor gets a fresh id, so relays from a
    /// removed instance's actor never reach its successor.
    pub(crate) fn push_update(
        &mut self,
        id: InstanceId,
        descriptor: &ComponentDescriptor,
        message: AnyMessage,
        env: &Env<'_>,
    ) -> Result<bool> {
        match self.instances.get_mut(id) {
            Some(instance) if instance.descriptor() == descriptor => {
                instance.relay(message, env)?;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    /// Remove an instance, firing its root removal binding if it has one
    pub(crate) fn remove(&mut self, id: InstanceId, coordinator: &CoordinatorAddress) -> bool {
        let Some(instance) = self.instances.remove(id) else {
            return false;
        };
        self.by_descriptor.remove(instance.descriptor());

        match instance.root().removal() {
            Some(binding) => {
                let event = UiEvent::detach(binding.event.clone(), binding.target);
                if coordinator.send_event(event).is_err() {
                    tracing::debug!(instance = ?id, "coordinator gone before detach event");
                }
            }
            None => {
                tracing::warn!(
                    component = %instance.descriptor(),
                    "removed instance has no removal binding; its actor cannot be detached"
                );
            }
        }
        true
    }

    /// Id of the instance mounted for `descriptor`
    pub fn lookup(&self, descriptor: &ComponentDescriptor) -> Option<InstanceId> {
        self.by_descriptor.get(descriptor).copied()
    }

    /// Typed access to a mounted instance
    pub fn get<C: ActorComponent>(&self, id: &str) -> Option<&Instance<C>> {
        let key = self.lookup(&ComponentDescriptor::of::<C>(id))?;
        self.instances
            .get(key)
            .and_then(|instance| instance.as_any().downcast_ref::<Instance<C>>())
    }

    pub fn contains(&self, id: InstanceId) -> bool {
        self.instances.contains_key(id)
    }

    /// Descriptor of a mounted instance
    pub fn descriptor(&self, id: InstanceId) -> Option<&ComponentDescriptor> {
        self.instances.get(id).map(|instance| instance.descriptor())
    }

    pub fn len(&self) -> usize {
        self.instances.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::component::{Context, Mount};
    use crate::config::TetherConfig;
    use crate::coordinator::Inbound;
    use crate::registry::Registry;

    #[derive(Default)]
    struct Label {
        text: String,
    }

    impl ActorComponent for Label {
        type Props = &'static str;
        type Message = ();

        fn on_mount(&mut self, _props: &&'static str, _cx: &mut Context<'_>) -> Mount {
            Mount::Ready
        }

        fn on_update(&mut self, props: &&'static str, _cx: &mut Context<'_>) {
            self.text = props.to_string();
        }
    }

    #[test]
    fn test_render_reuses_instance_per_descriptor() {
        let (address, _inbox) = CoordinatorAddress::channel();
        let registry = Registry::new();
        let config = TetherConfig::default();
        let env = Env {
            registry: &registry,
            coordinator: &address,
            config: &config,
        };
        let mut tree = ComponentTree::new();

        let a = tree.render::<Label>("a".into(), "one", &env).unwrap();
        let again = tree.render::<Label>("a".into(), "two", &env).unwrap();
        let b = tree.render::<Label>("b".into(), "three", &env).unwrap();

        assert_eq!(a, again);
        assert_ne!(a, b);
        assert_eq!(tree.len(), 2);
        assert_eq!(tree.get::<Label>("a").unwrap().state().text, "two");
    }

    #[test]
    fn test_remove_fires_detach_event() {
        let (address, mut inbox) = CoordinatorAddress::channel();
        let registry = Registry::new();
        let config = TetherConfig::default();
        let env = Env {
            registry: &registry,
            coordinator: &address,
            config: &config,
        };
        let mut tree = ComponentTree::new();

        let id = tree.render::<Label>("gone".into(), "x", &env).unwrap();
        assert!(tree.remove(id, &address));
        assert!(!tree.remove(id, &address));
        assert!(tree.get::<Label>("gone").is_none());

        match inbox.try_recv() {
            Ok(Inbound::Event(event)) => {
                assert_eq!(event.name, "tether:detach");
                assert_eq!(event.target(), Some(id));
            }
            _ => panic!("expected a detach event"),
        }
    }

    #[test]
    fn test_ids_are_not_reused() {
        let (address, _inbox) = CoordinatorAddress::channel();
        let registry = Registry::new();
        let config = TetherConfig::default();
        let env = Env {
            registry: &registry,
            coordinator: &address,
            config: &config,
        };
        let mut tree = ComponentTree::new();

        let first = tree.render::<Label>("slot".into(), "x", &env).unwrap();
        tree.remove(first, &address);
        let second = tree.render::<Label>("slot".into(), "y", &env).unwrap();

        assert_ne!(first, second);
        assert!(!tree.contains(first));
    }

    #[test]
    fn test_relay_after_remount_does_not_reach_successor() {
        let (address, _inbox) = CoordinatorAddress::channel();
        let registry = Registry::new();
        let config = TetherConfig::default();
        let env = Env {
            registry: &registry,
            coordinator: &address,
            config: &config,
        };
        let mut tree = ComponentTree::new();

        let old = tree.render::<Label>("slot".into(), "x", &env).unwrap();
        let descriptor = tree.descriptor(old).cloned().unwrap();
        tree.remove(old, &address);
        let new = tree.render::<Label>("slot".into(), "y", &env).unwrap();

        assert!(!tree.push_update(old, &descriptor, Box::new(()), &env).unwrap());
        assert!(tree.push_update(new, &descriptor, Box::new(()), &env).unwrap());
    }
}
