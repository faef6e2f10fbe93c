mod hub;
mod subscription;

pub use {
    hub::{BroadcastHub, MAX_SUBSCRIBERS, SUBSCRIBER_QUEUE_CAPACITY},
    subscription::Subscription,
};

/// Event published after a new image is appended to the history.
pub const UPDATE_EVENT: &str = "update";
