//! Error types for tether_core

use thiserror::Error;

use crate::identity::ComponentDescriptor;

/// Errors that can occur while a coordinator routes component traffic
#[derive(Error, Debug)]
pub enum TetherError {
    /// A component answered a relayed message with something other than
    /// [`Reply::Handled`](crate::component::Reply::Handled), or was handed a
    /// payload of a type it never declared. Fatal for the coordinator.
    #[error("component {descriptor} broke the message contract: {detail}")]
    ContractViolation {
        descriptor: ComponentDescriptor,
        detail: String,
    },

    /// A hook with this name is already attached to the chain
    #[error("hook `{0}` is already attached")]
    DuplicateHook(String),

    /// The coordinator mailbox has been dropped
    #[error("coordinator mailbox closed")]
    MailboxClosed,

    /// Failed to parse configuration
    #[error("configuration parsing failed: {0}")]
    Config(#[from] toml::de::Error),

    /// Failed to read configuration
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for tether_core operations
pub type Result<T> = std::result::Result<T, TetherError>;
