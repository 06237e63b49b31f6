/// Errors surfaced by a [`crate::Presence`] implementation.
#[derive(Debug, thiserror::Error)]
pub enum PresenceError {
    /// The backing store or connection is unreachable.
    #[error("presence backend unavailable: {0}")]
    Unavailable(String),

    /// A command was rejected by the backend (e.g. wrong type for key).
    #[error("presence command failed: {0}")]
    Command(String),

    /// A subscribed channel's handler task has already stopped.
    #[error("subscription channel closed")]
    SubscriptionClosed,
}
