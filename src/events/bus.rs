use tokio::sync::broadcast;

use super::types::*;

const BUS_CAPACITY: usize = 1000;

/// Event bus for sandbox-wide event distribution
///
/// Cloning yields another handle onto the same channel. Subscribers receive every
/// event emitted after they subscribed; dropping the receiver unsubscribes.
#[derive(Clone)]
pub struct EventBus {
    sender: broadcast::Sender<SystemEvent>,
}

impl EventBus {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(BUS_CAPACITY);
        Self { sender }
    }

    /// Emit an event to all subscribers
    pub fn emit(&self, event: SystemEvent) {
        // Ignore the error if there are no receivers
        let _ = self.sender.send(event);
    }

    /// Emit an event with convenience parameters
    pub fn emit_event(&self, event: SandboxEvent, source: &str) {
        self.emit(SystemEvent::new(event, source));
    }

    /// Subscribe to receive events
    pub fn subscribe(&self) -> broadcast::Receiver<SystemEvent> {
        self.sender.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}
