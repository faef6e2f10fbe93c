use crate::broadcast::hub::HubInner;

use std::sync::Weak;

use tokio::sync::mpsc;

/// A live viewer's queue of broadcast events.
///
/// Dropping the subscription unsubscribes it, so cleanup runs on every exit
/// path of the task that owns it, including an aborted HTTP connection.
#[derive(Debug)]
pub struct Subscription {
    id: u64,
    rx: mpsc::Receiver<String>,
    hub: Weak<HubInner>,
}

impl Subscription {
    pub(crate) fn new(id: u64, rx: mpsc::Receiver<String>, hub: Weak<HubInner>) -> Self {
        Self { id, rx, hub }
    }

    /// Identifier assigned by the hub, unique for the hub's lifetime.
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Wait for the next event.
    ///
    /// Returns `None` once the hub has closed this subscription (eviction)
    /// and any buffered events have been drained.
    pub async fn recv(&mut self) -> Option<String> {
        self.rx.recv().await
    }

    /// Take a buffered event without waiting.
    pub fn try_recv(&mut self) -> Option<String> {
        self.rx.try_recv().ok()
    }

    /// Whether the hub has closed this subscription.
    pub fn is_closed(&self) -> bool {
        self.rx.is_closed()
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.rx.close();
        if let Some(hub) = self.hub.upgrade() {
            hub.remove(self.id);
        }
    }
}
