// src/services/events.rs

//! Notifications for the presentation layer.
//!
//! The core never holds a renderer; it broadcasts events and whoever
//! subscribed decides how to redraw.

use tokio::sync::broadcast;

use crate::models::Status;

const CAPACITY: usize = 64;

/// Change notifications emitted by the service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PropertyEvent {
    /// A listing was selected; carries its key
    SelectionChanged { key: String },
    /// Rows in a status bucket should be re-read
    ListChanged { status: Status },
}

/// Broadcast channel for [`PropertyEvent`]s.
#[derive(Debug, Clone)]
pub struct EventBus {
    sender: broadcast::Sender<PropertyEvent>,
}

impl EventBus {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(CAPACITY);
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<PropertyEvent> {
        self.sender.subscribe()
    }

    /// Emit an event. Having no subscribers is not an error.
    pub fn emit(&self, event: PropertyEvent) {
        if self.sender.send(event).is_err() {
            log::trace!("No subscribers for event");
        }
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}
