//! Update dispatcher
//!
//! Every refresh of a component instance goes through [`Instance::dispatch`].
//! An instance is a two-state machine:
//!
//! ```text
//! UNMOUNTED ──first Props──▶ MOUNTED ──Props──▶ MOUNTED
//!                               │
//!                               └──Relay──▶ on_message
//! ```
//!
//! The first props refresh binds the root removal hook, runs `on_mount` and,
//! if an actor was requested, announces it to the coordinator with an attach
//! control message before the actor task is scheduled. Every props refresh,
//! mounting or not, ends with `on_update`. Relayed messages go to
//! `on_message` only.

use std::any::Any;

use crate::actor::{AnyMessage, PendingActor};
use crate::component::{ActorComponent, Context, Mount, Reply};
use crate::config::TetherConfig;
use crate::coordinator::CoordinatorAddress;
use crate::error::{Result, TetherError};
use crate::identity::{ComponentDescriptor, InstanceId};
use crate::interception::Control;
use crate::registry::Registry;
use crate::tree::RootBinding;

/// One refresh of a component instance
pub enum Update<P> {
    /// Ordinary render with new props
    Props(P),
    /// A message relayed from the instance's actor
    Relay(AnyMessage),
}

/// Coordinator state a dispatch may read
pub(crate) struct Env<'a> {
    pub registry: &'a Registry,
    pub coordinator: &'a CoordinatorAddress,
    pub config: &'a TetherConfig,
}

/// A mounted (or about to be mounted) component instance
pub struct Instance<C: ActorComponent> {
    id: InstanceId,
    descriptor: ComponentDescriptor,
    state: C,
    mounted: bool,
    root: RootBinding,
}

impl<C: ActorComponent> Instance<C> {
    pub(crate) fn new(id: InstanceId, descriptor: ComponentDescriptor) -> Self {
        Self {
            id,
            descriptor,
            state: C::default(),
            mounted: false,
            root: RootBinding::default(),
        }
    }

    pub fn id(&self) -> InstanceId {
        self.id
    }

    pub fn state(&self) -> &C {
        &self.state
    }

    pub fn is_mounted(&self) -> bool {
        self.mounted
    }

    pub(crate) fn dispatch(&mut self, update: Update<C::Props>, env: &Env<'_>) -> Result<()> {
        match update {
            Update::Relay(message) => self.handle_relay(message, env),
            Update::Props(props) => {
                if !self.mounted {
                    self.mount(&props, env)?;
                }
                let mut cx = Context::new(self.id, &self.descriptor, env.registry, env.coordinator);
                self.state.on_update(&props, &mut cx);
                Ok(())
            }
        }
    }

    fn mount(&mut self, props: &C::Props, env: &Env<'_>) -> Result<()> {
        self.mounted = true;
        self.root.bind_removal(&env.config.detach_event, self.id);

        let mut cx = Context::new(self.id, &self.descriptor, env.registry, env.coordinator);
        match self.state.on_mount(props, &mut cx) {
            Mount::Ready => {
                if env.config.warn_without_actor {
                    tracing::warn!(
                        component = %self.descriptor,
                        "on_mount requested no background actor; plain components do not need tether"
                    );
                }
            }
            Mount::Spawn(setup) => {
                let actor = PendingActor::new(self.id);
                env.coordinator.control(Control::Attach {
                    id: self.id,
                    descriptor: self.descriptor.clone(),
                    actor: actor.handle(),
                })?;
                actor.spawn(env.coordinator.clone(), setup);
                tracing::debug!(component = %self.descriptor, instance = ?self.id, "actor spawned");
            }
        }
        Ok(())
    }

    fn handle_relay(&mut self, message: AnyMessage, env: &Env<'_>) -> Result<()> {
        let message = match message.downcast::<C::Message>() {
            Ok(message) => *message,
            Err(_) => {
                return Err(self.violation(format!(
                    "relayed payload is not a {}",
                    std::any::type_name::<C::Message>()
                )))
            }
        };

        let mut cx = Context::new(self.id, &self.descriptor, env.registry, env.coordinator);
        match self.state.on_message(message, &mut cx) {
            Reply::Handled => Ok(()),
            other => Err(self.violation(format!("on_message answered {other:?}"))),
        }
    }

    fn violation(&self, detail: String) -> TetherError {
        tracing::error!(component = %self.descriptor, %detail, "message contract violated");
        TetherError::ContractViolation {
            descriptor: self.descriptor.clone(),
            detail,
        }
    }
}

/// Type-erased view of an instance, as stored in the component tree
pub(crate) trait AnyInstance {
    fn id(&self) -> InstanceId;
    fn descriptor(&self) -> &ComponentDescriptor;
    fn root(&self) -> &RootBinding;
    fn relay(&mut self, message: AnyMessage, env: &Env<'_>) -> Result<()>;
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<C: ActorComponent> AnyInstance for Instance<C> {
    fn id(&self) -> InstanceId {
        self.id
    }

    fn descriptor(&self) -> &ComponentDescriptor {
        &self.descriptor
    }

    fn root(&self) -> &RootBinding {
        &self.root
    }

    fn relay(&mut self, message: AnyMessage, env: &Env<'_>) -> Result<()> {
        self.dispatch(Update::Relay(message), env)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
