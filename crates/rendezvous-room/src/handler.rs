//! The room contract the matchmaker core consumes (spec §6).

use async_trait::async_trait;
use rendezvous_protocol::{ClientOptions, SessionId};

use crate::RoomError;

/// The behavior a room type must implement to be matchmakeable.
///
/// This is deliberately narrower than the teacher's `GameLogic` trait:
/// `GameLogic` also models in-room game rules (`handle_message`, `tick`,
/// `is_finished`), which are an application concern outside a
/// matchmaking core's scope. `RoomHandler` covers only what the
/// matchmaker itself must be able to do to a room — create it, reserve
/// and check seats, disconnect it, and dispatch arbitrary remote calls.
#[async_trait]
pub trait RoomHandler: Send + 'static {
    /// Called once, right after the room is placed in the local table.
    /// Rejecting here aborts room creation (spec §4.8 step 4).
    async fn on_create(&mut self, options: ClientOptions) -> Result<(), RoomError>;

    /// Attempts to reserve a seat for `session_id`. Returns `false` if
    /// the room is locked or full (spec §4.10, invariant 6).
    async fn reserve_seat(&mut self, session_id: SessionId, options: ClientOptions) -> bool;

    /// Releases `session_id`'s seat, e.g. when its connection drops
    /// (spec §4.11, "leave(client): forward to handler"). Does not
    /// itself emit anything — the room actor emits `leave` once this
    /// returns.
    async fn release_seat(&mut self, session_id: SessionId);

    /// Reports whether `session_id` currently holds a reservation.
    async fn has_reserved_seat(&self, session_id: SessionId) -> bool;

    /// Forcibly disconnects every client and tears down the room's
    /// internal state. Does not itself remove the listing — the
    /// matchmaker's dispose sequence (spec §4.11) does that.
    async fn disconnect(&mut self);

    /// Invokes an arbitrary room method by name (spec §4.9,
    /// `remoteRoomCall`'s non-framework dispatch path).
    async fn call(&mut self, method: &str, args: serde_json::Value) -> Result<serde_json::Value, RoomError>;
}

/// An object-safe factory producing a fresh [`RoomHandler`] per room
/// instance.
///
/// The teacher's `GameLogic` is generic over one concrete type per
/// `RoomManager<G>`; the matchmaker instead registers many room type
/// names at once against one `MatchMaker`, so each registration needs
/// its own boxed handler rather than a single static type parameter.
pub trait RoomHandlerFactory: Send + Sync + 'static {
    fn create(&self) -> Box<dyn RoomHandler>;
}

impl<F> RoomHandlerFactory for F
where
    F: Fn() -> Box<dyn RoomHandler> + Send + Sync + 'static,
{
    fn create(&self) -> Box<dyn RoomHandler> {
        (self)()
    }
}
