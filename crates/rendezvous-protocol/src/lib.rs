//! Wire types and cluster key/channel layout for the rendezvous matchmaking core.
//!
//! This crate defines the "language" nodes in a rendezvous cluster speak:
//!
//! - **Identity types** ([`ProcessId`], [`RoomId`], [`SessionId`]) — the
//!   newtype wrappers used everywhere else in the stack.
//! - **Data model** ([`Node`], [`RoomListing`], [`ClientOptions`]) — the
//!   structures that travel over presence pub/sub or get persisted by a
//!   driver.
//! - **IPC envelopes** ([`IpcRequest`], [`IpcResponse`], [`RoomMethod`]) —
//!   the request/reply payloads the IPC layer correlates.
//! - **Error codes** ([`MatchMakeErrorCode`], [`MatchMakeError`]) — the
//!   fixed enum surfaced to clients.
//! - **Cluster key/channel layout** ([`keys`]) — bit-exact string
//!   formatting shared by every crate that talks to presence.

mod error;
mod ipc;
mod types;

pub mod keys;

pub use error::{MatchMakeError, MatchMakeErrorCode, SeatReservationError};
pub use ipc::{IpcRequest, IpcRequestKind, IpcResponse, RequestId, RoomMethod};
pub use types::{
    ClientOptions, Node, NodeAddress, ProcessId, RoomId, RoomInternalState,
    RoomListing, SeatReservation, SessionId, SortDirection, SortSpec,
};
