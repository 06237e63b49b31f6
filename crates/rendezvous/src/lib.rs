//! # Rendezvous
//!
//! Distributed matchmaking and room-lifecycle core for a multiplayer
//! game server cluster.
//!
//! Multiple server processes cooperate through a shared [`Presence`]
//! substrate (pub/sub + set/hash key-value store) to advertise liveness,
//! distribute room creation by load, let a node discover an existing
//! public room on a client's behalf, reserve seats in rooms that may be
//! hosted on a remote node, and clean up after ungraceful shutdowns.
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use rendezvous::prelude::*;
//! use std::sync::Arc;
//!
//! # struct MyRoom;
//! # #[async_trait::async_trait]
//! # impl RoomHandler for MyRoom {
//! #     async fn on_create(&mut self, _: ClientOptions) -> Result<(), RoomError> { Ok(()) }
//! #     async fn reserve_seat(&mut self, _: SessionId, _: ClientOptions) -> bool { true }
//! #     async fn release_seat(&mut self, _: SessionId) {}
//! #     async fn has_reserved_seat(&self, _: SessionId) -> bool { true }
//! #     async fn disconnect(&mut self) {}
//! #     async fn call(&mut self, _: &str, args: serde_json::Value) -> Result<serde_json::Value, RoomError> { Ok(args) }
//! # }
//! # struct MyRoomFactory;
//! # impl RoomHandlerFactory for MyRoomFactory {
//! #     fn create(&self) -> Box<dyn RoomHandler> { Box::new(MyRoom) }
//! # }
//! # async fn run() -> Result<(), RendezvousError> {
//! let matchmaker = MatchMakerBuilder::new()
//!     .bind("127.0.0.1", 2567)
//!     .local()
//!     .build()
//!     .await?;
//!
//! matchmaker.define_room_type("chat", Arc::new(MyRoomFactory), ClientOptions::new()).await;
//! let reservation = matchmaker.join_or_create("chat", ClientOptions::new()).await?;
//! # let _ = reservation;
//! # Ok(())
//! # }
//! ```

mod error;

pub use error::RendezvousError;

/// Everything most callers need, re-exported in one place — the same
/// role the teacher's `arcforge::prelude` plays, just not empty.
pub mod prelude {
    pub use rendezvous_driver::{Driver, FindConditions, LocalDriver};
    pub use rendezvous_presence::{LocalPresence, Presence};
    pub use rendezvous_protocol::{
        keys, ClientOptions, MatchMakeError, MatchMakeErrorCode, Node, NodeAddress, ProcessId,
        RoomId, RoomInternalState, RoomListing, SeatReservation, SeatReservationError, SessionId,
        SortDirection, SortSpec,
    };
    pub use rendezvous_room::{RoomError, RoomHandler, RoomHandlerFactory};
    pub use rendezvous_matchmaker::{MatchMaker, MatchMakerConfig};

    #[cfg(feature = "redis-backend")]
    pub use rendezvous_driver::RedisDriver;
    #[cfg(feature = "redis-backend")]
    pub use rendezvous_presence::RedisPresence;

    pub use crate::{MatchMakerBuilder, RendezvousError};
}

use std::sync::Arc;

use rendezvous_driver::{Driver, LocalDriver};
use rendezvous_presence::{LocalPresence, Presence};
use rendezvous_protocol::{Node, NodeAddress, ProcessId};

/// Which [`Presence`]/[`Driver`] pair to build, mirroring spec §4.1's
/// requirement that both a local and a remote backend be supported.
enum Backend {
    /// Single-process mode: `LocalPresence` + `LocalDriver`.
    Local,
    /// Cluster mode: both backends connect to the same Redis instance.
    #[cfg(feature = "redis-backend")]
    Redis { url: String },
}

/// Builds a [`MatchMaker`](rendezvous_matchmaker::MatchMaker), the same
/// plain-struct-with-setters shape as the teacher's
/// `ArcforgeServerBuilder` — no `#[builder]` macro, just chained setters
/// over a `Default`-friendly config.
pub struct MatchMakerBuilder {
    address: String,
    port: u16,
    process_id: Option<ProcessId>,
    backend: Backend,
    config: rendezvous_matchmaker::MatchMakerConfig,
}

impl MatchMakerBuilder {
    pub fn new() -> Self {
        Self {
            address: "127.0.0.1".to_string(),
            port: 2567,
            process_id: None,
            backend: Backend::Local,
            config: rendezvous_matchmaker::MatchMakerConfig::default(),
        }
    }

    /// Sets the address/port this node externalizes on `rendezvous:nodes`
    /// (spec §3/§4.4). This is *not* a transport bind call — the
    /// HTTP/WebSocket transport that actually listens on this address is
    /// out of this crate's scope.
    pub fn bind(mut self, address: impl Into<String>, port: u16) -> Self {
        self.address = address.into();
        self.port = port;
        self
    }

    /// Overrides the generated `ProcessId`. Mostly useful for tests that
    /// need stable, human-readable process identifiers.
    pub fn process_id(mut self, process_id: ProcessId) -> Self {
        self.process_id = Some(process_id);
        self
    }

    /// Single-process mode: `LocalPresence` + `LocalDriver`, no cluster.
    pub fn local(mut self) -> Self {
        self.backend = Backend::Local;
        self
    }

    /// Cluster mode: both the presence and driver layers connect to
    /// `redis_url`, making this node one of potentially many sharing
    /// that Redis instance.
    #[cfg(feature = "redis-backend")]
    pub fn redis(mut self, redis_url: impl Into<String>) -> Self {
        self.backend = Backend::Redis { url: redis_url.into() };
        self
    }

    pub fn config(mut self, config: rendezvous_matchmaker::MatchMakerConfig) -> Self {
        self.config = config;
        self
    }

    /// Connects the chosen backend, constructs the [`MatchMaker`], and
    /// runs its `setup()` — registers the node and installs the process
    /// inbox — before returning it ready to use.
    pub async fn build(self) -> Result<Arc<rendezvous_matchmaker::MatchMaker>, RendezvousError> {
        let process_id = self.process_id.unwrap_or_else(ProcessId::generate);
        let node = Node {
            process_id: process_id.clone(),
            address: NodeAddress { address: self.address, port: self.port },
        };

        let (presence, driver): (Arc<dyn Presence>, Arc<dyn Driver>) = match self.backend {
            Backend::Local => (Arc::new(LocalPresence::new()), Arc::new(LocalDriver::new())),
            #[cfg(feature = "redis-backend")]
            Backend::Redis { url } => {
                let presence = rendezvous_presence::RedisPresence::connect(&url).await?;
                let driver = rendezvous_driver::RedisDriver::connect(&url).await?;
                (Arc::new(presence), Arc::new(driver))
            }
        };

        let matchmaker = rendezvous_matchmaker::MatchMaker::new(process_id, node, presence, driver, self.config);
        matchmaker.setup().await?;
        Ok(matchmaker)
    }
}

impl Default for MatchMakerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_builder_defaults_to_local_backend_and_builds() {
        let matchmaker = MatchMakerBuilder::new()
            .bind("127.0.0.1", 2567)
            .local()
            .build()
            .await
            .unwrap();
        assert!(!matchmaker.process_id().to_string().is_empty());
    }

    #[tokio::test]
    async fn test_builder_honors_explicit_process_id() {
        let matchmaker = MatchMakerBuilder::new()
            .process_id(ProcessId("fixed-id".into()))
            .build()
            .await
            .unwrap();
        assert_eq!(matchmaker.process_id(), &ProcessId("fixed-id".into()));
    }
}
