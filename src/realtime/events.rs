//! Event envelopes pushed to broadcast rooms.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Kind of a broadcast event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum EventKind {
    /// A schedule record changed (hours, availability, notes).
    ScheduleUpdate,
    /// A work order was assigned or moved to a different technician/day.
    WorkOrderReassignment,
    /// A reassignment produced an overlap or overallocation. Advisory only;
    /// the REST response to the initiator is authoritative.
    ScheduleConflict,
}

/// An event as delivered to subscribed clients.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerEvent {
    pub event: EventKind,
    pub payload: serde_json::Value,
    /// Server-side send time.
    pub timestamp: DateTime<Utc>,
}

impl ServerEvent {
    pub fn new(event: EventKind, payload: serde_json::Value) -> Self {
        Self {
            event,
            payload,
            timestamp: Utc::now(),
        }
    }
}
