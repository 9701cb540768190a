//! Instance identity
//!
//! Every mounted component instance is addressed by an [`InstanceId`]. Ids are
//! versioned slot keys: once an instance is removed its slot may be recycled,
//! but the key handed out for it never compares equal to a later one.
//!
//! An id on its own says nothing about which component logic it belongs to;
//! that is what a [`ComponentDescriptor`] records.

use std::any::TypeId;
use std::fmt;

use slotmap::new_key_type;

new_key_type! {
    /// Opaque address of one live component instance
    pub struct InstanceId;
}

impl InstanceId {
    /// Convert to raw u64 for transport in UI event payloads
    pub fn to_raw(&self) -> u64 {
        use slotmap::Key;
        self.data().as_ffi()
    }

    /// Reconstruct from raw u64
    pub fn from_raw(raw: u64) -> Self {
        slotmap::KeyData::from_ffi(raw).into()
    }
}

/// The user-defined component type behind an instance
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ComponentKind {
    type_id: TypeId,
    name: &'static str,
}

impl ComponentKind {
    pub fn of<C: 'static>() -> Self {
        Self {
            type_id: TypeId::of::<C>(),
            name: std::any::type_name::<C>(),
        }
    }

    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Type name without its module path
    pub fn short_name(&self) -> &'static str {
        self.name.rsplit("::").next().unwrap_or(self.name)
    }
}

/// (component type, component id): which logic and which logical instance
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ComponentDescriptor {
    kind: ComponentKind,
    id: String,
}

impl ComponentDescriptor {
    pub fn new(kind: ComponentKind, id: impl Into<String>) -> Self {
        Self {
            kind,
            id: id.into(),
        }
    }

    /// Descriptor for component type `C` with the given id
    pub fn of<C: 'static>(id: impl Into<String>) -> Self {
        Self::new(ComponentKind::of::<C>(), id)
    }

    pub fn kind(&self) -> ComponentKind {
        self.kind
    }

    pub fn id(&self) -> &str {
        &self.id
    }
}

impl fmt::Display for ComponentDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.kind.short_name(), self.id)
    }
}
