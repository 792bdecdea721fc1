//! Session change notification bus.
//!
//! Every mutating cache operation produces at most one event. Events are not
//! coalesced; subscribers see them in the order the operations ran.

use tokio::sync::broadcast;

use crate::session::Session;

/// Buffer size for the change event channel.
/// Mutations are rare (logins, logouts); 256 leaves slow subscribers plenty
/// of room before they lag.
const CHANNEL_CAPACITY: usize = 256;

/// Snapshot of what a single cache operation changed.
///
/// `changed` is carried for shape compatibility with host session APIs but is
/// always empty - the cache detects additions and removals, not field edits.
#[derive(Debug, Clone, Default)]
pub struct SessionChangeEvent {
    pub added: Vec<Session>,
    pub removed: Vec<Session>,
    pub changed: Vec<Session>,
}

impl SessionChangeEvent {
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty() && self.changed.is_empty()
    }

    pub(crate) fn added(session: Session) -> Self {
        Self {
            added: vec![session],
            ..Self::default()
        }
    }

    pub(crate) fn removed(session: Session) -> Self {
        Self {
            removed: vec![session],
            ..Self::default()
        }
    }
}

/// Fan-out of change events to host listeners.
pub(crate) struct ChangeNotifier {
    sender: broadcast::Sender<SessionChangeEvent>,
}

impl ChangeNotifier {
    pub fn new() -> Self {
        let (sender, _receiver) = broadcast::channel(CHANNEL_CAPACITY);
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SessionChangeEvent> {
        self.sender.subscribe()
    }

    /// Publish a non-empty event. Empty events are dropped so operations
    /// that changed nothing stay silent.
    pub fn emit(&self, event: SessionChangeEvent) {
        if event.is_empty() {
            return;
        }
        // A send error only means nobody is listening right now.
        let _ = self.sender.send(event);
    }
}
