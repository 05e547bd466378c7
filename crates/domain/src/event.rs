//! An immutable record of something that happened to an accessory.
//!
//! Events are produced when accessory state changes and when a command
//! pushed to a device succeeds or fails.

use serde::{Deserialize, Serialize};

use crate::id::{DeviceId, EventId};
use crate::time::{self, Timestamp};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    /// Payload is the new [`AccessorySnapshot`](crate::accessory::AccessorySnapshot).
    StateUpdated,
    CommandSucceeded,
    CommandFailed,
}

impl EventKind {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::StateUpdated => "state_updated",
            Self::CommandSucceeded => "command_succeeded",
            Self::CommandFailed => "command_failed",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub id: EventId,
    pub kind: EventKind,
    pub device_id: DeviceId,
    pub timestamp: Timestamp,
    pub data: serde_json::Value,
}

impl Event {
    /// Create an event stamped with the current time.
    #[must_use]
    pub fn new(kind: EventKind, device_id: DeviceId, data: serde_json::Value) -> Self {
        Self {
            id: EventId::new(),
            kind,
            device_id,
            timestamp: time::now(),
            data,
        }
    }
}
