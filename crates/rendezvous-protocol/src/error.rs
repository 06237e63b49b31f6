//! Error codes surfaced to clients (spec §6) and the matchmaker's error
//! taxonomy (spec §7).

use crate::RoomId;

/// The fixed set of error codes surfaced to clients (spec §6).
///
/// `#[repr(u16)]` gives each variant a stable wire value, matching the
/// teacher's convention of HTTP-style integer codes
/// (`SystemMessage::Error { code: u16, .. }`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[repr(u16)]
pub enum MatchMakeErrorCode {
    /// No handler is registered for the requested room type.
    NoHandler = 4210,
    /// `join`'s selection criteria matched no room.
    InvalidCriteria = 4211,
    /// `joinById` was given an id that doesn't exist (or is locked).
    InvalidRoomId = 4212,
    /// A reconnection session id has expired.
    Expired = 4213,
    /// Catch-all: remote-room-call timeout or any other unclassified
    /// matchmaking failure.
    Unhandled = 4214,
    /// `reserveSeat` failed because the room filled up first.
    SeatReservationFailed = 4215,
}

impl std::fmt::Display for MatchMakeErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::NoHandler => "ERR_MATCHMAKE_NO_HANDLER",
            Self::InvalidCriteria => "ERR_MATCHMAKE_INVALID_CRITERIA",
            Self::InvalidRoomId => "ERR_MATCHMAKE_INVALID_ROOM_ID",
            Self::Expired => "ERR_MATCHMAKE_EXPIRED",
            Self::Unhandled => "ERR_MATCHMAKE_UNHANDLED",
            Self::SeatReservationFailed => "ERR_MATCHMAKE_SEAT_RESERVATION",
        };
        write!(f, "{name}")
    }
}

/// A user-surfaceable matchmaking error: an error code plus a message.
///
/// This is the error the HTTP handler (out of scope here) serializes as
/// `{code, error: message}`, defaulting `code` to
/// [`MatchMakeErrorCode::Unhandled`] for anything this crate doesn't
/// classify more specifically (spec §7).
#[derive(Debug, Clone, thiserror::Error)]
#[error("{code}: {message}")]
pub struct MatchMakeError {
    pub code: MatchMakeErrorCode,
    pub message: String,
}

impl MatchMakeError {
    pub fn new(code: MatchMakeErrorCode, message: impl Into<String>) -> Self {
        Self { code, message: message.into() }
    }

    pub fn no_handler(room_name: &str) -> Self {
        Self::new(
            MatchMakeErrorCode::NoHandler,
            format!("no handler registered for room type \"{room_name}\""),
        )
    }

    pub fn invalid_criteria(room_name: &str) -> Self {
        Self::new(
            MatchMakeErrorCode::InvalidCriteria,
            format!("no available room matching criteria for \"{room_name}\""),
        )
    }

    pub fn invalid_room_id(room_id: &RoomId) -> Self {
        Self::new(
            MatchMakeErrorCode::InvalidRoomId,
            format!("room \"{room_id}\" not found"),
        )
    }

    pub fn expired(session_id_repr: impl std::fmt::Display) -> Self {
        Self::new(
            MatchMakeErrorCode::Expired,
            format!("session \"{session_id_repr}\" expired"),
        )
    }

    pub fn unhandled(message: impl Into<String>) -> Self {
        Self::new(MatchMakeErrorCode::Unhandled, message)
    }
}

/// Internal-ish error: the only error [`crate::MatchMakeErrorCode`]'s
/// owner, `joinOrCreate`, retries on (spec §4.5/§7). Someone else reserved
/// the last seat before we did.
#[derive(Debug, Clone, thiserror::Error)]
#[error("{room_id} is already full.")]
pub struct SeatReservationError {
    pub room_id: RoomId,
}

impl SeatReservationError {
    pub fn new(room_id: RoomId) -> Self {
        Self { room_id }
    }
}

impl From<SeatReservationError> for MatchMakeError {
    fn from(err: SeatReservationError) -> Self {
        MatchMakeError::new(MatchMakeErrorCode::SeatReservationFailed, err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code_display_matches_fixed_names() {
        assert_eq!(
            MatchMakeErrorCode::NoHandler.to_string(),
            "ERR_MATCHMAKE_NO_HANDLER"
        );
        assert_eq!(
            MatchMakeErrorCode::SeatReservationFailed.to_string(),
            "ERR_MATCHMAKE_SEAT_RESERVATION"
        );
    }

    #[test]
    fn test_seat_reservation_error_message() {
        let err = SeatReservationError::new(RoomId("r1".into()));
        assert_eq!(err.to_string(), "r1 is already full.");
    }

    #[test]
    fn test_seat_reservation_error_converts_to_matchmake_error() {
        let err = SeatReservationError::new(RoomId("r1".into()));
        let mm: MatchMakeError = err.into();
        assert_eq!(mm.code, MatchMakeErrorCode::SeatReservationFailed);
    }

    #[test]
    fn test_matchmake_error_constructors_set_expected_codes() {
        assert_eq!(
            MatchMakeError::no_handler("chat").code,
            MatchMakeErrorCode::NoHandler
        );
        assert_eq!(
            MatchMakeError::invalid_criteria("chat").code,
            MatchMakeErrorCode::InvalidCriteria
        );
        assert_eq!(
            MatchMakeError::invalid_room_id(&RoomId("r1".into())).code,
            MatchMakeErrorCode::InvalidRoomId
        );
    }
}
