//! Gallery notifications.
//!
//! Fire-and-forget broadcast: dispatch never waits for subscribers, and a
//! subscriber that falls more than the channel capacity behind loses the
//! oldest events.

use tokio::sync::broadcast;
use tracing::debug;

use crate::models::PhotoRecord;

/// Default number of events buffered per subscriber.
pub const DEFAULT_EVENT_CAPACITY: usize = 64;

/// Events emitted by the gallery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PhotoEvent {
    /// A new photo was captured and stored.
    Added(PhotoRecord),
}

impl PhotoEvent {
    pub fn name(&self) -> &'static str {
        match self {
            PhotoEvent::Added(_) => "photo-added",
        }
    }
}

/// Subscriber registry for [`PhotoEvent`]s.
#[derive(Debug, Clone)]
pub struct PhotoEvents {
    tx: broadcast::Sender<PhotoEvent>,
}

impl PhotoEvents {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    /// Register a new subscriber. It sees events dispatched after this call.
    pub fn subscribe(&self) -> broadcast::Receiver<PhotoEvent> {
        self.tx.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }

    /// Broadcast an event. Returns how many subscribers it reached.
    pub fn dispatch(&self, event: PhotoEvent) -> usize {
        let name = event.name();
        match self.tx.send(event) {
            Ok(reached) => {
                debug!("Dispatched {} to {} subscriber(s)", name, reached);
                reached
            }
            Err(_) => {
                debug!("Dispatched {} with no subscribers", name);
                0
            }
        }
    }
}

impl Default for PhotoEvents {
    fn default() -> Self {
        Self::new(DEFAULT_EVENT_CAPACITY)
    }
}
