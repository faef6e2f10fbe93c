use crate::{BroadcastHub, MAX_SUBSCRIBERS, SUBSCRIBER_QUEUE_CAPACITY, UPDATE_EVENT};

use std::time::{Duration, Instant};

use tokio::time::timeout;

/// WHAT: Every subscriber receives a published event
/// WHY: All open viewer tabs must refresh on a new screenshot
#[tokio::test]
#[allow(clippy::unwrap_used)]
async fn given_subscribers_when_publishing_then_each_receives() {
    // Given: Three subscribers
    let hub = BroadcastHub::new();
    let mut subs: Vec<_> = (0..3).map(|_| hub.subscribe()).collect();

    // When: Publishing an update
    let delivered = hub.publish(UPDATE_EVENT);

    // Then: All three get it
    assert_eq!(delivered, 3);
    for sub in &mut subs {
        let event = timeout(Duration::from_millis(100), sub.recv())
            .await
            .unwrap();
        assert_eq!(event.as_deref(), Some(UPDATE_EVENT));
    }
}

/// WHAT: Publishing with no subscribers is a no-op
/// WHY: Captures happen whether or not a viewer is open
#[test]
fn given_no_subscribers_when_publishing_then_zero_delivered() {
    // Given: An empty hub
    let hub = BroadcastHub::new();

    // When/Then: Publishing delivers to nobody and does not fail
    assert_eq!(hub.publish(UPDATE_EVENT), 0);
    assert!(!hub.has_subscribers());
}

/// WHAT: A sixth subscriber evicts exactly the oldest
/// WHY: Newest connection wins a slot, FIFO eviction
#[tokio::test]
#[allow(clippy::unwrap_used)]
async fn given_full_hub_when_sixth_subscribes_then_oldest_closed() {
    // Given: Five subscribers C1..C5
    let hub = BroadcastHub::new();
    let mut c1 = hub.subscribe();
    let mut rest: Vec<_> = (0..MAX_SUBSCRIBERS - 1).map(|_| hub.subscribe()).collect();
    assert_eq!(hub.subscriber_count(), MAX_SUBSCRIBERS);

    // When: C6 subscribes
    let _c6 = hub.subscribe();

    // Then: C1 is closed, C2..C6 remain
    assert_eq!(hub.subscriber_count(), MAX_SUBSCRIBERS);
    assert!(c1.is_closed());
    assert!(rest.iter().all(|sub| !sub.is_closed()));
    let closed = timeout(Duration::from_millis(100), c1.recv()).await.unwrap();
    assert!(closed.is_none());

    hub.publish(UPDATE_EVENT);
    for sub in &mut rest {
        assert_eq!(sub.try_recv().as_deref(), Some(UPDATE_EVENT));
    }
}

/// WHAT: Dropping an evicted subscription does not remove anyone else
/// WHY: Unsubscribe must be idempotent and keyed by identity
#[test]
fn given_evicted_subscription_when_dropped_then_others_unaffected() {
    // Given: A hub with a limit of 2 where the first subscriber was evicted
    let hub = BroadcastHub::with_limits(2, 4);
    let first = hub.subscribe();
    let _second = hub.subscribe();
    let _third = hub.subscribe();
    assert_eq!(hub.subscriber_count(), 2);

    // When: The evicted handle is finally dropped
    hub.unsubscribe(first);

    // Then: The two live subscribers are still counted
    assert_eq!(hub.subscriber_count(), 2);
}

/// WHAT: Dropping a subscription removes it from the hub
/// WHY: A disconnected viewer must stop counting as connected
#[test]
fn given_subscription_when_dropped_then_count_decrements() {
    // Given: Two subscribers
    let hub = BroadcastHub::new();
    let first = hub.subscribe();
    let second = hub.subscribe();

    // When: Dropping one
    drop(first);

    // Then: One remains; dropping the other empties the hub
    assert_eq!(hub.subscriber_count(), 1);
    drop(second);
    assert!(!hub.has_subscribers());
}

/// WHAT: Publish never blocks on a full subscriber queue
/// WHY: A stalled viewer must not stall the capture pipeline
#[test]
fn given_full_queue_when_publishing_repeatedly_then_returns_immediately() {
    // Given: A subscriber that never reads
    let hub = BroadcastHub::new();
    let mut stalled = hub.subscribe();

    // When: Publishing far more events than the queue holds
    let started = Instant::now();
    let delivered: usize = (0..1_000).map(|_| hub.publish(UPDATE_EVENT)).sum();

    // Then: Completes quickly; only the queue's worth was delivered
    assert!(started.elapsed() < Duration::from_secs(1));
    assert_eq!(delivered, SUBSCRIBER_QUEUE_CAPACITY);

    let mut drained = 0;
    while stalled.try_recv().is_some() {
        drained += 1;
    }
    assert_eq!(drained, SUBSCRIBER_QUEUE_CAPACITY);
}

/// WHAT: A full queue drops events for that subscriber only
/// WHY: Backpressure is per viewer, not global
#[test]
fn given_one_full_queue_when_publishing_then_other_subscriber_still_receives() {
    // Given: One stalled and one draining subscriber
    let hub = BroadcastHub::with_limits(5, 1);
    let _stalled = hub.subscribe();
    let mut live = hub.subscribe();
    hub.publish(UPDATE_EVENT);
    assert!(live.try_recv().is_some());

    // When: Publishing again while the stalled queue is full
    let delivered = hub.publish(UPDATE_EVENT);

    // Then: The live subscriber got it
    assert_eq!(delivered, 1);
    assert_eq!(live.try_recv().as_deref(), Some(UPDATE_EVENT));
}

/// WHAT: Publish racing with unsubscribe never panics
/// WHY: Viewers disconnect at arbitrary times
#[test]
fn given_concurrent_unsubscribes_when_publishing_then_no_panic() {
    // Given: A hub with churn on another thread
    let hub = BroadcastHub::new();
    let churn_hub = hub.clone();
    let churn = std::thread::spawn(move || {
        for _ in 0..500 {
            let sub = churn_hub.subscribe();
            drop(sub);
        }
    });

    // When: Publishing concurrently
    for _ in 0..500 {
        hub.publish(UPDATE_EVENT);
    }

    // Then: Both sides finish and the hub is empty
    assert!(churn.join().is_ok());
    assert_eq!(hub.subscriber_count(), 0);
}

/// WHAT: close_all empties the hub and ends every subscription after its buffer drains
/// WHY: Stopping the preview server must disconnect every viewer
#[tokio::test]
#[allow(clippy::unwrap_used)]
async fn given_subscribers_with_pending_event_when_closing_all_then_drained_then_ended() {
    // Given: Two subscribers with one buffered event each
    let hub = BroadcastHub::new();
    let mut a = hub.subscribe();
    let mut b = hub.subscribe();
    hub.publish(UPDATE_EVENT);

    // When: Closing all
    let closed = hub.close_all();

    // Then: The hub is empty and later events go nowhere
    assert_eq!(closed, 2);
    assert_eq!(hub.subscriber_count(), 0);
    assert!(!hub.has_subscribers());
    assert_eq!(hub.publish(UPDATE_EVENT), 0);

    // And: Each subscription yields its buffered event, then ends
    for sub in [&mut a, &mut b] {
        assert!(sub.is_closed());
        let pending = timeout(Duration::from_millis(100), sub.recv()).await.unwrap();
        assert_eq!(pending.as_deref(), Some(UPDATE_EVENT));
        let end = timeout(Duration::from_millis(100), sub.recv()).await.unwrap();
        assert!(end.is_none());
    }

    // And: The hub accepts new subscribers afterwards
    let _fresh = hub.subscribe();
    assert_eq!(hub.subscriber_count(), 1);
}
