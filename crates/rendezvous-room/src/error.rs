use rendezvous_protocol::RoomId;

/// Errors surfaced by the room contract and its actor runtime.
#[derive(Debug, thiserror::Error)]
pub enum RoomError {
    /// The room's actor task has stopped (panicked, or disposed already);
    /// its handle can no longer be used.
    #[error("room {0} is unavailable")]
    Unavailable(RoomId),

    /// `on_create` rejected the given options.
    #[error("room {0} rejected create options: {1}")]
    CreateRejected(RoomId, String),

    /// `call` was invoked with a method the handler doesn't recognize.
    #[error("room {0} has no method \"{1}\"")]
    UnknownMethod(RoomId, String),
}
