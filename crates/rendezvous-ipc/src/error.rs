/// Failure modes of an IPC round-trip (spec §4.2).
///
/// `ChannelUnreachable` and `Timeout` are indistinguishable from the
/// requester's point of view — both just mean no reply arrived in time
/// — but are kept as separate variants so a caller that already knows
/// presence itself failed (vs. a slow/absent dispatcher) can tell them
/// apart without string-matching.
#[derive(Debug, thiserror::Error)]
pub enum IpcError {
    #[error("ipc request timed out after {0:?}")]
    Timeout(std::time::Duration),

    #[error("presence backend unavailable: {0}")]
    ChannelUnreachable(String),

    #[error("ipc marshalling failed: {0}")]
    Marshalling(String),

    #[error("remote dispatch failed: {0}")]
    Remote(String),
}
