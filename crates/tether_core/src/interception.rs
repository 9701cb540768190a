//! Interception hooks
//!
//! Two hooks installed once per coordinator, both under
//! [`TetherConfig::hook_name`](crate::config::TetherConfig::hook_name):
//!
//! - the **info hook** recognizes [`Control`] messages. `Attach` and `Detach`
//!   mutate the registry; `Relay` is looked up by instance id and pushed to
//!   the owning instance, or dropped if that instance is no longer attached.
//! - the **event hook** recognizes the reserved detach event. It stops the
//!   instance's actor, clears both registry entries and self-sends `Detach`.
//!
//! Everything else continues down the chain untouched, so the coordinator's
//! own `View` logic sees exactly what it would without tether installed.

use crate::actor::{ActorHandle, AnyMessage};
use crate::coordinator::{Coordinator, Session, View};
use crate::error::Result;
use crate::event::UiEvent;
use crate::hooks::Flow;
use crate::identity::{ComponentDescriptor, InstanceId};

/// Control traffic tether sends to its own coordinator
pub(crate) enum Control {
    Attach {
        id: InstanceId,
        descriptor: ComponentDescriptor,
        actor: ActorHandle,
    },
    Detach {
        id: InstanceId,
    },
    Relay {
        id: InstanceId,
        payload: AnyMessage,
    },
}

/// Attach both interception hooks to `coordinator`
///
/// Must happen once per coordinator; a second call fails with
/// [`TetherError::DuplicateHook`](crate::error::TetherError::DuplicateHook).
pub fn install<V: View>(coordinator: &mut Coordinator<V>) -> Result<()> {
    let name = coordinator.session().config().hook_name.clone();
    coordinator.attach_info_hook(name.clone(), info_hook)?;
    if let Err(err) = coordinator.attach_event_hook(name.clone(), event_hook) {
        coordinator.detach_info_hook(&name);
        return Err(err);
    }
    tracing::debug!(hook = %name, "interception hooks installed");
    Ok(())
}

pub(crate) fn info_hook(session: &mut Session, message: AnyMessage) -> Result<Flow<AnyMessage>> {
    let control = match message.downcast::<Control>() {
        Ok(control) => *control,
        Err(other) => return Ok(Flow::Continue(other)),
    };

    match control {
        Control::Attach {
            id,
            descriptor,
            actor,
        } => {
            tracing::debug!(component = %descriptor, instance = ?id, "attached");
            session.registry.put(id, descriptor);
            if let Some(previous) = session.registry.put_actor(id, actor) {
                previous.stop();
            }
        }
        Control::Detach { id } => {
            // The detach event already cleared the entries; this only catches
            // anything attached in between.
            session.registry.delete(id);
            if let Some(actor) = session.registry.delete_actor(id) {
                actor.stop();
            }
            tracing::debug!(instance = ?id, "detached");
        }
        Control::Relay { id, payload } => match session.registry.get(id).cloned() {
            Some(descriptor) => {
                if !session.push_update(id, &descriptor, payload)? {
                    tracing::debug!(component = %descriptor, "relay target no longer mounted");
                }
            }
            None => {
                tracing::debug!(instance = ?id, "dropping relay for unattached instance");
            }
        },
    }
    Ok(Flow::Halt)
}

pub(crate) fn event_hook(session: &mut Session, event: UiEvent) -> Result<Flow<UiEvent>> {
    if event.name != session.config.detach_event {
        return Ok(Flow::Continue(event));
    }
    let Some(id) = event.target() else {
        tracing::warn!(event = %event.name, "detach event without a target instance");
        return Ok(Flow::Halt);
    };

    if let Some(actor) = session.registry.delete_actor(id) {
        actor.stop();
    }
    session.registry.delete(id);
    session.address.control(Control::Detach { id })?;
    Ok(Flow::Halt)
}
