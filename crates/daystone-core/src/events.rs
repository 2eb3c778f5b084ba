use tokio::sync::broadcast;

/// A store area changed and in-memory projections should re-read it. Events
/// carry no payload and delivery is at-most-once, so handlers must re-read
/// idempotently rather than apply deltas.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreEvent {
    TasksChanged,
    ProjectsChanged,
    FootstonesChanged,
}

/// Fire-and-forget broadcast of [`StoreEvent`]s. Cloning shares the channel,
/// so every component can hold a handle.
#[derive(Debug, Clone)]
pub struct EventBus {
    sender: broadcast::Sender<StoreEvent>,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<StoreEvent> {
        self.sender.subscribe()
    }

    /// Publishing with no subscribers is not an error.
    pub fn publish(&self, event: StoreEvent) {
        let _ = self.sender.send(event);
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(16)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
