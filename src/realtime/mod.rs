//! Real-time broadcast layer.
//!
//! Connected clients join named rooms; schedule and assignment mutations
//! publish event envelopes into those rooms. Delivery is fire-and-forget,
//! at-most-once: disconnected or lagging clients miss events and reconcile
//! on their next full fetch.

mod events;
mod hub;

pub use events::{EventKind, ServerEvent};
pub use hub::{Hub, Room};
