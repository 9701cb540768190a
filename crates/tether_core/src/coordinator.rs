//! The coordinator
//!
//! One coordinator owns one mailbox and handles its inbound traffic strictly
//! one message at a time. Its own behavior lives in a [`View`]; its state
//! container is the [`Session`], which owns the component tree and the
//! correlation registry.
//!
//! ```text
//!            ┌──────────────── Coordinator ────────────────┐
//! actors ──▶ │ mailbox ─▶ info hooks  ─▶ View::handle_info  │
//! UI     ──▶ │         ─▶ event hooks ─▶ View::handle_event │
//!            │                 │                            │
//!            │              Session (tree, registry)        │
//!            └──────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```ignore
//! let mut coordinator = Coordinator::new(MyPage::default(), TetherConfig::default());
//! coordinator.mount()?;          // installs the interception hooks
//! let address = coordinator.address();
//! // hand `address` to whatever feeds the coordinator, then
//! let page = coordinator.run().await?;
//! ```
//!
//! The coordinator is not `Send`; run it on the task that owns it.

use std::any::Any;

use tokio::sync::mpsc;

use crate::actor::{AnyMessage, Undelivered};
use crate::component::{self, ActorComponent};
use crate::config::TetherConfig;
use crate::dispatcher::{Env, Instance};
use crate::error::{Result, TetherError};
use crate::event::UiEvent;
use crate::hooks::{Flow, HookChain};
use crate::identity::{ComponentDescriptor, InstanceId};
use crate::interception::{self, Control};
use crate::registry::Registry;
use crate::tree::ComponentTree;

/// Everything that can land in a coordinator mailbox
pub enum Inbound {
    /// A generic message: control traffic, relays, or the view's own
    Info(AnyMessage),
    /// An event raised by the UI layer
    Event(UiEvent),
    /// Stop the loop
    Shutdown,
}

/// Sending side of a coordinator mailbox
#[derive(Clone, Debug)]
pub struct CoordinatorAddress {
    tx: mpsc::UnboundedSender<Inbound>,
}

impl CoordinatorAddress {
    pub(crate) fn channel() -> (Self, mpsc::UnboundedReceiver<Inbound>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    /// Send a message to the coordinator's inbound handler
    pub fn send<M: Any + Send>(&self, message: M) -> Result<()> {
        self.send_inbound(Inbound::Info(Box::new(message)))
    }

    /// Deliver a UI event
    pub fn send_event(&self, event: UiEvent) -> Result<()> {
        self.send_inbound(Inbound::Event(event))
    }

    /// Ask the coordinator loop to stop after the messages already queued
    pub fn shutdown(&self) -> Result<()> {
        self.send_inbound(Inbound::Shutdown)
    }

    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }

    pub(crate) fn control(&self, control: Control) -> Result<()> {
        self.send_inbound(Inbound::Info(Box::new(control)))
    }

    pub(crate) fn relay(&self, id: InstanceId, payload: AnyMessage) -> Result<()> {
        self.control(Control::Relay { id, payload })
    }

    fn send_inbound(&self, inbound: Inbound) -> Result<()> {
        self.tx
            .send(inbound)
            .map_err(|_| TetherError::MailboxClosed)
    }
}

/// The coordinator's own logic
///
/// Receives whatever the interception hooks let through.
pub trait View: 'static {
    fn mount(&mut self, _session: &mut Session) -> Result<()> {
        Ok(())
    }

    fn handle_info(&mut self, _message: AnyMessage, _session: &mut Session) -> Result<()> {
        tracing::debug!("unhandled info message");
        Ok(())
    }

    fn handle_event(&mut self, event: UiEvent, _session: &mut Session) -> Result<()> {
        tracing::debug!(event = %event.name, "unhandled UI event");
        Ok(())
    }
}

/// Coordinator-private state: component tree, registry and configuration
pub struct Session {
    pub(crate) tree: ComponentTree,
    pub(crate) registry: Registry,
    pub(crate) address: CoordinatorAddress,
    pub(crate) config: TetherConfig,
}

impl Session {
    fn new(address: CoordinatorAddress, config: TetherConfig) -> Self {
        Self {
            tree: ComponentTree::new(),
            registry: Registry::new(),
            address,
            config,
        }
    }

    /// Render component `C` under `id` with new props
    ///
    /// Mounts the instance the first time `(C, id)` is seen and refreshes it
    /// afterwards.
    pub fn render<C: ActorComponent>(
        &mut self,
        id: impl Into<String>,
        props: C::Props,
    ) -> Result<InstanceId> {
        let env = Env {
            registry: &self.registry,
            coordinator: &self.address,
            config: &self.config,
        };
        self.tree.render::<C>(id.into(), props, &env)
    }

    /// Stop rendering an instance; its detach event is queued on the mailbox
    pub fn remove(&mut self, id: InstanceId) -> bool {
        self.tree.remove(id, &self.address)
    }

    /// Deliver `message` straight into the actor mailbox of `target`
    pub fn send_to_component<M: Any + Send>(
        &self,
        target: InstanceId,
        message: M,
    ) -> std::result::Result<(), Undelivered> {
        component::send_to_component(&self.registry, target, Box::new(message))
    }

    /// A mounted instance of `C`, by component id
    pub fn component<C: ActorComponent>(&self, id: &str) -> Option<&Instance<C>> {
        self.tree.get::<C>(id)
    }

    pub(crate) fn push_update(
        &mut self,
        id: InstanceId,
        descriptor: &ComponentDescriptor,
        payload: AnyMessage,
    ) -> Result<bool> {
        let env = Env {
            registry: &self.registry,
            coordinator: &self.address,
            config: &self.config,
        };
        self.tree.push_update(id, descriptor, payload, &env)
    }

    pub fn tree(&self) -> &ComponentTree {
        &self.tree
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn address(&self) -> &CoordinatorAddress {
        &self.address
    }

    pub fn config(&self) -> &TetherConfig {
        &self.config
    }
}

/// A single-threaded coordinator driving one [`View`]
pub struct Coordinator<V: View> {
    view: V,
    session: Session,
    info_hooks: HookChain<Session, AnyMessage>,
    event_hooks: HookChain<Session, UiEvent>,
    inbox: mpsc::UnboundedReceiver<Inbound>,
    mounted: bool,
}

impl<V: View> Coordinator<V> {
    pub fn new(view: V, config: TetherConfig) -> Self {
        let (address, inbox) = CoordinatorAddress::channel();
        Self {
            view,
            session: Session::new(address, config),
            info_hooks: HookChain::new(),
            event_hooks: HookChain::new(),
            inbox,
            mounted: false,
        }
    }

    pub fn address(&self) -> CoordinatorAddress {
        self.session.address.clone()
    }

    pub fn view(&self) -> &V {
        &self.view
    }

    pub fn view_mut(&mut self) -> &mut V {
        &mut self.view
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn session_mut(&mut self) -> &mut Session {
        &mut self.session
    }

    /// Install the interception hooks and mount the view
    ///
    /// Mounting twice fails without running the view's mount again.
    pub fn mount(&mut self) -> Result<()> {
        interception::install(self)?;
        self.mounted = true;
        self.view.mount(&mut self.session)
    }

    pub fn is_mounted(&self) -> bool {
        self.mounted
    }

    pub fn attach_info_hook<F>(&mut self, name: impl Into<String>, hook: F) -> Result<()>
    where
        F: FnMut(&mut Session, AnyMessage) -> Result<Flow<AnyMessage>> + 'static,
    {
        self.info_hooks.attach(name, hook)
    }

    pub fn detach_info_hook(&mut self, name: &str) -> bool {
        self.info_hooks.detach(name)
    }

    pub fn attach_event_hook<F>(&mut self, name: impl Into<String>, hook: F) -> Result<()>
    where
        F: FnMut(&mut Session, UiEvent) -> Result<Flow<UiEvent>> + 'static,
    {
        self.event_hooks.attach(name, hook)
    }

    pub fn detach_event_hook(&mut self, name: &str) -> bool {
        self.event_hooks.detach(name)
    }

    /// Wait for and handle one inbound message
    ///
    /// Returns `Ok(false)` once the coordinator has been shut down.
    pub async fn step(&mut self) -> Result<bool> {
        match self.inbox.recv().await {
            Some(inbound) => self.handle(inbound),
            None => Ok(false),
        }
    }

    /// Handle everything already queued, without waiting
    ///
    /// Returns the number of messages and events handled; a shutdown request
    /// ends the drain and is not counted.
    pub fn drain(&mut self) -> Result<usize> {
        let mut handled = 0;
        while let Ok(inbound) = self.inbox.try_recv() {
            if !self.handle(inbound)? {
                break;
            }
            handled += 1;
        }
        Ok(handled)
    }

    /// Run until shut down or a handler fails
    ///
    /// Either way every registered actor is stopped before returning.
    pub async fn run(mut self) -> Result<V> {
        let result = loop {
            match self.step().await {
                Ok(true) => continue,
                Ok(false) => break Ok(()),
                Err(err) => break Err(err),
            }
        };
        let stopped = self.session.registry.stop_all();
        tracing::debug!(stopped, "coordinator loop exited");
        result.map(|()| self.view)
    }

    fn handle(&mut self, inbound: Inbound) -> Result<bool> {
        match inbound {
            Inbound::Info(message) => {
                if let Flow::Continue(message) = self.info_hooks.run(&mut self.session, message)? {
                    self.view.handle_info(message, &mut self.session)?;
                }
            }
            Inbound::Event(event) => {
                if let Flow::Continue(event) = self.event_hooks.run(&mut self.session, event)? {
                    self.view.handle_event(event, &mut self.session)?;
                }
            }
            Inbound::Shutdown => {
                self.inbox.close();
                return Ok(false);
            }
        }
        Ok(true)
    }
}
