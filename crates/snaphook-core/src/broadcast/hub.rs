use crate::broadcast::Subscription;

use std::{
    collections::VecDeque,
    sync::{
        Arc, PoisonError, RwLock,
        atomic::{AtomicU64, Ordering},
    },
};

use tokio::sync::mpsc::{self, error::TrySendError};
use tracing::{debug, info, instrument, trace};

/// Maximum number of live viewers before the oldest is evicted.
pub const MAX_SUBSCRIBERS: usize = 5;

/// Per-viewer queue depth. Events beyond this are dropped for that viewer.
pub const SUBSCRIBER_QUEUE_CAPACITY: usize = 10;

/// Fan-out of "new image available" events to live preview viewers.
///
/// Publishing never waits on a subscriber: a full queue drops the event for
/// that subscriber only. Viewers re-fetch the latest image on any event, so a
/// dropped event costs nothing but a redundant refresh.
///
/// Cloning is cheap and yields a handle to the same hub.
#[derive(Debug, Clone)]
pub struct BroadcastHub {
    inner: Arc<HubInner>,
}

#[derive(Debug)]
pub(crate) struct HubInner {
    subscribers: RwLock<VecDeque<Subscriber>>,
    next_id: AtomicU64,
    max_subscribers: usize,
    queue_capacity: usize,
}

#[derive(Debug)]
struct Subscriber {
    id: u64,
    tx: mpsc::Sender<String>,
}

impl Default for BroadcastHub {
    fn default() -> Self {
        Self::new()
    }
}

impl BroadcastHub {
    /// Create a hub with the default limits.
    pub fn new() -> Self {
        Self::with_limits(MAX_SUBSCRIBERS, SUBSCRIBER_QUEUE_CAPACITY)
    }

    /// Create a hub with custom limits (each at least 1).
    pub fn with_limits(max_subscribers: usize, queue_capacity: usize) -> Self {
        Self {
            inner: Arc::new(HubInner {
                subscribers: RwLock::new(VecDeque::with_capacity(max_subscribers)),
                next_id: AtomicU64::new(1),
                max_subscribers: max_subscribers.max(1),
                queue_capacity: queue_capacity.max(1),
            }),
        }
    }

    /// Admit a new viewer.
    ///
    /// When the hub is full the oldest subscriber is closed and removed
    /// before the new one is admitted.
    #[instrument(skip(self))]
    pub fn subscribe(&self) -> Subscription {
        let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed);
        let (tx, rx) = mpsc::channel(self.inner.queue_capacity);

        let (evicted, count) = {
            let mut subs = self
                .inner
                .subscribers
                .write()
                .unwrap_or_else(PoisonError::into_inner);

            let mut evicted = Vec::new();
            while subs.len() >= self.inner.max_subscribers {
                if let Some(oldest) = subs.pop_front() {
                    evicted.push(oldest.id);
                }
            }
            subs.push_back(Subscriber { id, tx });

            (evicted, subs.len())
        };

        for old_id in evicted {
            info!(subscriber_id = old_id, "Evicted oldest subscriber");
        }
        debug!(subscriber_id = id, subscribers = count, "Subscriber admitted");

        Subscription::new(id, rx, Arc::downgrade(&self.inner))
    }

    /// Deliver `event` to every subscriber without blocking.
    ///
    /// Returns how many subscribers accepted the event.
    #[instrument(skip(self))]
    pub fn publish(&self, event: &str) -> usize {
        let subs = self
            .inner
            .subscribers
            .read()
            .unwrap_or_else(PoisonError::into_inner);

        let mut delivered = 0;
        for sub in subs.iter() {
            match sub.tx.try_send(event.to_string()) {
                Ok(()) => delivered += 1,
                Err(TrySendError::Full(_)) => {
                    trace!(subscriber_id = sub.id, "Subscriber queue full, event dropped")
                }
                Err(TrySendError::Closed(_)) => {
                    trace!(subscriber_id = sub.id, "Subscriber already closed")
                }
            }
        }

        debug!(delivered, subscribers = subs.len(), "Event published");

        delivered
    }

    /// Remove and close a subscription. Equivalent to dropping it.
    pub fn unsubscribe(&self, subscription: Subscription) {
        drop(subscription);
    }

    /// Close every subscription and empty the hub.
    ///
    /// Open event streams see end-of-stream once their buffered events are
    /// drained. Returns how many subscribers were closed.
    #[instrument(skip(self))]
    pub fn close_all(&self) -> usize {
        let closed = std::mem::take(
            &mut *self
                .inner
                .subscribers
                .write()
                .unwrap_or_else(PoisonError::into_inner),
        );

        if !closed.is_empty() {
            info!(closed = closed.len(), "Closed all subscribers");
        }

        closed.len()
    }

    /// Number of live subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.inner
            .subscribers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Whether any viewer is currently connected.
    pub fn has_subscribers(&self) -> bool {
        self.subscriber_count() > 0
    }
}

impl HubInner {
    /// Drop the sender for `id`, if still present. Idempotent.
    pub(crate) fn remove(&self, id: u64) {
        let removed = {
            let mut subs = self
                .subscribers
                .write()
                .unwrap_or_else(PoisonError::into_inner);
            match subs.iter().position(|s| s.id == id) {
                Some(pos) => subs.remove(pos).is_some(),
                None => false,
            }
        };

        if removed {
            debug!(subscriber_id = id, "Subscriber removed");
        }
    }
}
