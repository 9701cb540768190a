//! Tether Core
//!
//! Lets a component instance hosted inside a single-threaded coordinator own a
//! long-lived background actor and receive that actor's messages as if the
//! component were the coordinator itself.
//!
//! - **Identity**: every mounted instance gets an [`InstanceId`]
//! - **Actors**: one tokio task per instance that asked for one, relaying its
//!   mailbox to the coordinator
//! - **Registry**: instance id → component and instance id → actor, owned by
//!   the coordinator's [`Session`]
//! - **Interception**: two hooks on the coordinator's inbound-message and
//!   UI-event paths that attach, detach and route relays, and pass anything
//!   else through untouched
//! - **Dispatch**: the per-instance mount/update/message state machine
//!
//! # Example
//!
//! ```ignore
//! use tether_core::prelude::*;
//!
//! #[derive(Default)]
//! struct Page;
//!
//! impl View for Page {
//!     fn mount(&mut self, session: &mut Session) -> Result<()> {
//!         session.render::<Ticker>("ticker", bus.clone())?;
//!         Ok(())
//!     }
//! }
//!
//! let mut coordinator = Coordinator::new(Page, TetherConfig::default());
//! coordinator.mount()?;
//! coordinator.run().await?;
//! ```

pub mod actor;
pub mod component;
pub mod config;
pub mod coordinator;
pub mod dispatcher;
pub mod error;
pub mod event;
pub mod hooks;
pub mod identity;
pub mod interception;
pub mod registry;
pub mod tree;


pub use actor::{spawn, ActorContext, ActorHandle, AnyMessage, Mailbox, PendingActor, Setup, Undelivered};
pub use component::{ActorComponent, Context, Mount, Reply};
pub use config::TetherConfig;
pub use coordinator::{Coordinator, CoordinatorAddress, Inbound, Session, View};
pub use dispatcher::{Instance, Update};
pub use error::{Result, TetherError};
pub use event::UiEvent;
pub use hooks::{Flow, Hook, HookChain};
pub use identity::{ComponentDescriptor, ComponentKind, InstanceId};
pub use interception::install;
pub use registry::Registry;
pub use tree::{ComponentTree, RemovalBinding, RootBinding};

/// Everything a component or coordinator author typically needs
pub mod prelude {
    pub use crate::actor::{ActorContext, AnyMessage, Mailbox};
    pub use crate::component::{ActorComponent, Context, Mount, Reply};
    pub use crate::config::TetherConfig;
    pub use crate::coordinator::{Coordinator, CoordinatorAddress, Session, View};
    pub use crate::error::{Result, TetherError};
    pub use crate::event::UiEvent;
    pub use crate::identity::InstanceId;
}
