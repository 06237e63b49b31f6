//! The MatchMaker core: registry of room handlers, per-process room
//! table, load-balanced room creator, remote-room-call IPC,
//! seat-reservation concurrency gate, room state machine, node
//! discovery, and graceful shutdown (spec §4.5–§4.14).
//!
//! [`MatchMaker`] is the single entry point — everything else in this
//! crate (`discovery`, `lobby`, `dispatch`, `config`) is an internal
//! collaborator it wires together.

mod config;
mod discovery;
mod dispatch;
mod lobby;
mod matchmaker;

pub use config::{MatchMakerConfig, REMOTE_ROOM_SHORT_TIMEOUT};
pub use matchmaker::MatchMaker;
