//! Unified error type for the rendezvous meta-crate.

use rendezvous_driver::DriverError;
use rendezvous_ipc::IpcError;
use rendezvous_presence::PresenceError;
use rendezvous_protocol::MatchMakeError;
use rendezvous_room::RoomError;

/// Top-level error that wraps every sub-crate's error type.
///
/// When depending on the `rendezvous` meta-crate directly, callers deal
/// with this single error instead of importing errors from each layer
/// crate. The `#[from]` attribute on each variant auto-generates `From`
/// impls, so `?` converts sub-crate errors automatically.
#[derive(Debug, thiserror::Error)]
pub enum RendezvousError {
    /// A matchmaking-level error (no handler, invalid criteria, expired
    /// session, seat reservation failure, ...).
    #[error(transparent)]
    MatchMake(#[from] MatchMakeError),

    /// A presence backend error (set/hash/counter/pub-sub operation failed).
    #[error(transparent)]
    Presence(#[from] PresenceError),

    /// A driver (room listing store) error.
    #[error(transparent)]
    Driver(#[from] DriverError),

    /// A room actor error (unavailable, rejected create options, unknown method).
    #[error(transparent)]
    Room(#[from] RoomError),

    /// An IPC round-trip error (timeout, unreachable channel, marshalling).
    #[error(transparent)]
    Ipc(#[from] IpcError),
}

#[cfg(test)]
mod tests {
    use super::*;
    use rendezvous_protocol::{MatchMakeErrorCode, RoomId};

    #[test]
    fn test_from_matchmake_error() {
        let err = MatchMakeError::no_handler("chat");
        let wrapped: RendezvousError = err.into();
        assert!(matches!(wrapped, RendezvousError::MatchMake(e) if e.code == MatchMakeErrorCode::NoHandler));
    }

    #[test]
    fn test_from_presence_error() {
        let err = PresenceError::Unavailable("down".into());
        let wrapped: RendezvousError = err.into();
        assert!(matches!(wrapped, RendezvousError::Presence(_)));
    }

    #[test]
    fn test_from_driver_error() {
        let err = DriverError::NotFound("r1".into());
        let wrapped: RendezvousError = err.into();
        assert!(matches!(wrapped, RendezvousError::Driver(_)));
    }

    #[test]
    fn test_from_room_error() {
        let err = RoomError::Unavailable(RoomId("r1".into()));
        let wrapped: RendezvousError = err.into();
        assert!(matches!(wrapped, RendezvousError::Room(_)));
    }

    #[test]
    fn test_from_ipc_error() {
        let err = IpcError::Timeout(std::time::Duration::from_millis(50));
        let wrapped: RendezvousError = err.into();
        assert!(matches!(wrapped, RendezvousError::Ipc(_)));
    }
}
