//! Per-instance background actors
//!
//! An actor is a tokio task owned by one component instance. It runs the
//! instance's setup callback once, then relays every message that lands in
//! its mailbox to the coordinator, tagged with the instance id, until it is
//! told to stop.
//!
//! ```text
//! external source ──▶ Mailbox ──▶ actor task ──Relay{id, payload}──▶ coordinator
//! ```
//!
//! Each mailbox message produces exactly one relay, in mailbox order. Nothing
//! is promised about ordering across actors.

use std::any::Any;
use std::fmt;

use tokio::sync::mpsc;

use crate::coordinator::CoordinatorAddress;
use crate::identity::InstanceId;

/// A type-erased message travelling between actors and the coordinator
pub type AnyMessage = Box<dyn Any + Send>;

/// Setup callback run once inside a freshly spawned actor
pub type Setup = Box<dyn FnOnce(&ActorContext) + Send>;

pub(crate) enum Signal {
    Stop,
    Deliver(AnyMessage),
}

/// A message that could not be handed to its actor
///
/// Returned by [`Mailbox::send`] and `send_to_component` so the caller gets
/// the message back.
pub struct Undelivered(pub AnyMessage);

impl Undelivered {
    pub fn into_inner(self) -> AnyMessage {
        self.0
    }
}

impl fmt::Debug for Undelivered {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Undelivered(..)")
    }
}

/// Sending side of an actor's mailbox
///
/// Cheap to clone. Handed to the setup callback so an external source can
/// feed the actor.
#[derive(Clone)]
pub struct Mailbox {
    id: InstanceId,
    tx: mpsc::UnboundedSender<Signal>,
}

impl Mailbox {
    /// Instance the mailbox belongs to
    pub fn id(&self) -> InstanceId {
        self.id
    }

    /// Enqueue a message for relay
    pub fn send<M: Any + Send>(&self, message: M) -> Result<(), Undelivered> {
        self.send_any(Box::new(message))
    }

    /// Enqueue an already boxed message
    pub fn send_any(&self, message: AnyMessage) -> Result<(), Undelivered> {
        self.tx
            .send(Signal::Deliver(message))
            .map_err(|err| match err.0 {
                Signal::Deliver(message) => Undelivered(message),
                Signal::Stop => unreachable!("only deliveries are sent through send_any"),
            })
    }

    /// True once the actor has exited
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

impl fmt::Debug for Mailbox {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Mailbox")
            .field("id", &self.id)
            .field("closed", &self.is_closed())
            .finish()
    }
}

/// What the setup callback gets to see of its actor
pub struct ActorContext {
    mailbox: Mailbox,
}

impl ActorContext {
    pub fn id(&self) -> InstanceId {
        self.mailbox.id
    }

    /// The actor's own mailbox, for subscribing to external sources
    pub fn mailbox(&self) -> Mailbox {
        self.mailbox.clone()
    }
}

/// Coordinator-side handle to a running actor
#[derive(Clone, Debug)]
pub struct ActorHandle {
    mailbox: Mailbox,
}

impl ActorHandle {
    pub fn id(&self) -> InstanceId {
        self.mailbox.id
    }

    pub fn mailbox(&self) -> &Mailbox {
        &self.mailbox
    }

    /// Ask the actor to stop. Not acknowledged; returns false if it already exited.
    pub fn stop(&self) -> bool {
        self.mailbox.tx.send(Signal::Stop).is_ok()
    }

    pub fn is_closed(&self) -> bool {
        self.mailbox.is_closed()
    }
}

/// An actor whose mailbox exists but whose task has not been scheduled yet
///
/// Lets the dispatcher announce the handle to the coordinator before the
/// actor can relay anything.
pub struct PendingActor {
    handle: ActorHandle,
    rx: mpsc::UnboundedReceiver<Signal>,
}

impl PendingActor {
    pub fn new(id: InstanceId) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            handle: ActorHandle {
                mailbox: Mailbox { id, tx },
            },
            rx,
        }
    }

    pub fn handle(&self) -> ActorHandle {
        self.handle.clone()
    }

    /// Schedule the actor task. Must be called from within a tokio runtime.
    pub fn spawn(self, coordinator: CoordinatorAddress, setup: Setup) -> ActorHandle {
        let Self { handle, rx } = self;
        let context = ActorContext {
            mailbox: handle.mailbox.clone(),
        };
        tokio::spawn(run_actor(context, rx, coordinator, setup));
        handle
    }
}

/// Spawn an actor for `id` that relays to `coordinator` after running `setup`
pub fn spawn(coordinator: CoordinatorAddress, id: InstanceId, setup: Setup) -> ActorHandle {
    PendingActor::new(id).spawn(coordinator, setup)
}

async fn run_actor(
    context: ActorContext,
    mut rx: mpsc::UnboundedReceiver<Signal>,
    coordinator: CoordinatorAddress,
    setup: Setup,
) {
    let id = context.id();
    // Panics here end the task like any other actor failure
    setup(&context);
    // Only the receiver should keep the channel open from here on
    drop(context);

    while let Some(signal) = rx.recv().await {
        match signal {
            Signal::Stop => {
                tracing::debug!(instance = ?id, "actor stopped");
                break;
            }
            Signal::Deliver(message) => {
                tracing::trace!(instance = ?id, "relaying message to coordinator");
                if coordinator.relay(id, message).is_err() {
                    tracing::debug!(instance = ?id, "coordinator gone, actor exiting");
                    break;
                }
            }
        }
    }
}
