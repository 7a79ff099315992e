//! Room-based broadcast hub.
//!
//! One `tokio::sync::broadcast` channel per room, created lazily on first
//! subscription. Publishing into a room nobody subscribes to is a no-op.
//! Events are wrapped in `Arc` so a broadcast to a busy room clones a
//! pointer, not the payload.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::NaiveDate;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use crate::api::{TechnicianId, WorkOrderId};

use super::events::ServerEvent;

const ROOM_CHANNEL_CAPACITY: usize = 256;

/// A logical group of clients receiving a class of events together.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Room {
    /// Events about one work order.
    #[serde(rename_all = "camelCase")]
    WorkOrder { id: WorkOrderId },
    /// Schedule events for one technician.
    #[serde(rename_all = "camelCase")]
    TechnicianSchedules { technician_id: TechnicianId },
    /// Schedule events for one calendar day.
    #[serde(rename_all = "camelCase")]
    DateSchedules { date: NaiveDate },
    /// All schedule events.
    Schedules,
}

impl std::fmt::Display for Room {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Room::WorkOrder { id } => write!(f, "work-order:{}", id),
            Room::TechnicianSchedules { technician_id } => {
                write!(f, "technician-schedules:{}", technician_id)
            }
            Room::DateSchedules { date } => write!(f, "date-schedules:{}", date),
            Room::Schedules => write!(f, "schedules"),
        }
    }
}

/// Broadcast hub shared by the HTTP layer and the service layer.
pub struct Hub {
    rooms: RwLock<HashMap<Room, broadcast::Sender<Arc<ServerEvent>>>>,
}

impl Hub {
    pub fn new() -> Self {
        Self {
            rooms: RwLock::new(HashMap::new()),
        }
    }

    /// Subscribe to a room, creating its channel on first use.
    pub fn subscribe(&self, room: Room) -> broadcast::Receiver<Arc<ServerEvent>> {
        let mut rooms = self.rooms.write();
        rooms
            .entry(room)
            .or_insert_with(|| broadcast::channel(ROOM_CHANNEL_CAPACITY).0)
            .subscribe()
    }

    /// Publish an event into one room. Fire-and-forget: delivery failures
    /// (no subscribers, lagging receivers) are not errors.
    pub fn publish(&self, room: Room, event: &Arc<ServerEvent>) {
        let rooms = self.rooms.read();
        if let Some(sender) = rooms.get(&room) {
            let delivered = sender.send(Arc::clone(event)).unwrap_or(0);
            tracing::trace!(room = %room, receivers = delivered, "broadcast event");
        }
    }

    /// Publish one event into several rooms.
    pub fn publish_to_all(&self, rooms: &[Room], event: ServerEvent) {
        let event = Arc::new(event);
        for room in rooms {
            self.publish(*room, &event);
        }
    }

    /// Drop channels with no remaining subscribers.
    pub fn prune_idle_rooms(&self) -> usize {
        let mut rooms = self.rooms.write();
        let before = rooms.len();
        rooms.retain(|_, sender| sender.receiver_count() > 0);
        before - rooms.len()
    }

    /// Number of rooms with an open channel.
    pub fn room_count(&self) -> usize {
        self.rooms.read().len()
    }
}

impl Default for Hub {
    fn default() -> Self {
        Self::new()
    }
}
