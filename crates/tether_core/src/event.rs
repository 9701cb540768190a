//! UI-originated events
//!
//! Events reach the coordinator the way a client would send them: a name and
//! a JSON value. The only event tether itself interprets is the reserved
//! detach event, whose value carries the removed instance's id.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::identity::InstanceId;

/// A named event raised by the rendering layer
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct UiEvent {
    pub name: String,
    #[serde(default)]
    pub value: Value,
}

impl UiEvent {
    pub fn new(name: impl Into<String>, value: Value) -> Self {
        Self {
            name: name.into(),
            value,
        }
    }

    /// The event a root removal binding fires for `target`
    pub fn detach(name: impl Into<String>, target: InstanceId) -> Self {
        Self::new(name, json!({ "target": target.to_raw() }))
    }

    /// Instance id carried in the `target` field, if any
    pub fn target(&self) -> Option<InstanceId> {
        self.value
            .get("target")
            .and_then(Value::as_u64)
            .map(InstanceId::from_raw)
    }
}
