//! The component contract
//!
//! A component that wants its own background actor implements
//! [`ActorComponent`]. All three callbacks are optional:
//!
//! - [`on_mount`](ActorComponent::on_mount) runs once per instance lifetime and
//!   may return [`Mount::Spawn`] with a setup callback to request an actor.
//! - [`on_update`](ActorComponent::on_update) runs on every refresh, including
//!   the mounting one.
//! - [`on_message`](ActorComponent::on_message) runs for every message the
//!   actor relays and must answer [`Reply::Handled`].
//!
//! ```ignore
//! use tether_core::prelude::*;
//!
//! #[derive(Default)]
//! struct Ticker { ticks: u64 }
//!
//! impl ActorComponent for Ticker {
//!     type Props = Bus;
//!     type Message = Tick;
//!
//!     fn on_mount(&mut self, bus: &Bus, _cx: &mut Context<'_>) -> Mount {
//!         let bus = bus.clone();
//!         Mount::spawn(move |actor| bus.subscribe(actor.mailbox()))
//!     }
//!
//!     fn on_message(&mut self, _tick: Tick, _cx: &mut Context<'_>) -> Reply {
//!         self.ticks += 1;
//!         Reply::Handled
//!     }
//! }
//! ```

use std::any::Any;

use crate::actor::{ActorContext, Setup, Undelivered};
use crate::coordinator::CoordinatorAddress;
use crate::error::Result;
use crate::identity::{ComponentDescriptor, InstanceId};
use crate::registry::Registry;

/// Answer of [`ActorComponent::on_mount`]
pub enum Mount {
    /// No background actor
    Ready,
    /// Start an actor that runs this setup callback first
    Spawn(Setup),
}

impl Mount {
    pub fn spawn<F>(setup: F) -> Self
    where
        F: FnOnce(&ActorContext) + Send + 'static,
    {
        Mount::Spawn(Box::new(setup))
    }
}

/// Answer of [`ActorComponent::on_message`]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Reply {
    Handled,
    /// Breaks the contract; the coordinator fails with a contract violation
    Unhandled,
}

/// A component instance that can own a background actor
pub trait ActorComponent: Default + 'static {
    /// Props passed down on every refresh
    type Props: 'static;
    /// Payload type the actor relays
    type Message: Send + 'static;

    fn on_mount(&mut self, _props: &Self::Props, _cx: &mut Context<'_>) -> Mount {
        Mount::Ready
    }

    fn on_update(&mut self, _props: &Self::Props, _cx: &mut Context<'_>) {}

    fn on_message(&mut self, _message: Self::Message, _cx: &mut Context<'_>) -> Reply {
        Reply::Handled
    }
}

/// What a component callback can reach of the coordinator
pub struct Context<'a> {
    id: InstanceId,
    descriptor: &'a ComponentDescriptor,
    registry: &'a Registry,
    coordinator: &'a CoordinatorAddress,
}

impl<'a> Context<'a> {
    pub(crate) fn new(
        id: InstanceId,
        descriptor: &'a ComponentDescriptor,
        registry: &'a Registry,
        coordinator: &'a CoordinatorAddress,
    ) -> Self {
        Self {
            id,
            descriptor,
            registry,
            coordinator,
        }
    }

    /// This instance's id
    pub fn id(&self) -> InstanceId {
        self.id
    }

    pub fn descriptor(&self) -> &ComponentDescriptor {
        self.descriptor
    }

    /// Deliver `message` straight into another instance's actor mailbox
    pub fn send_to_component<M: Any + Send>(
        &self,
        target: InstanceId,
        message: M,
    ) -> std::result::Result<(), Undelivered> {
        send_to_component(self.registry, target, Box::new(message))
    }

    /// Send a message to the coordinator's own inbound handler
    pub fn send_to_coordinator<M: Any + Send>(&self, message: M) -> Result<()> {
        self.coordinator.send(message)
    }
}

pub(crate) fn send_to_component(
    registry: &Registry,
    target: InstanceId,
    message: crate::actor::AnyMessage,
) -> std::result::Result<(), Undelivered> {
    let Some(actor) = registry.get_actor(target) else {
        tracing::warn!(instance = ?target, "send_to_component: no actor registered");
        return Err(Undelivered(message));
    };
    actor.mailbox().send_any(message).map_err(|undelivered| {
        tracing::warn!(instance = ?target, "send_to_component: actor already exited");
        undelivered
    })
}
