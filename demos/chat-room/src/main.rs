//! A minimal chat room handler running on a two-node local cluster.
//!
//! Both nodes share one `LocalPresence` + `LocalDriver` pair — the same
//! trick the matchmaker's own scenario tests use to simulate a cluster
//! without a real Redis. Both nodes register the "chat" room type, as
//! a real deployment would; `node-a` is made to look busier so
//! `joinOrCreate`'s `createRoom` load balancer routes the actual
//! creation to `node-b` over IPC (spec §4.7).

use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use rendezvous::prelude::*;

/// A room type with no game logic at all — clients just occupy seats
/// until disconnect. Real applications put message broadcast, tick
/// loops, and game state here; all of that lives outside this crate's
/// scope (spec §1's "Out of scope").
struct ChatRoom {
    seats: HashSet<SessionId>,
    max_clients: usize,
}

#[async_trait]
impl RoomHandler for ChatRoom {
    async fn on_create(&mut self, options: ClientOptions) -> Result<(), RoomError> {
        if let Some(max) = options.get("maxClients").and_then(|v| v.as_u64()) {
            self.max_clients = max as usize;
        }
        tracing::info!(max_clients = self.max_clients, "chat room created");
        Ok(())
    }

    async fn reserve_seat(&mut self, session_id: SessionId, _options: ClientOptions) -> bool {
        if self.seats.len() >= self.max_clients {
            return false;
        }
        self.seats.insert(session_id);
        true
    }

    async fn release_seat(&mut self, session_id: SessionId) {
        self.seats.remove(&session_id);
    }

    async fn has_reserved_seat(&self, session_id: SessionId) -> bool {
        self.seats.contains(&session_id)
    }

    async fn disconnect(&mut self) {
        self.seats.clear();
    }

    async fn call(&mut self, method: &str, args: serde_json::Value) -> Result<serde_json::Value, RoomError> {
        match method {
            "seatCount" => Ok(serde_json::json!(self.seats.len())),
            other => Err(RoomError::UnknownMethod(RoomId("chat".into()), other.to_string())),
        }
    }
}

struct ChatRoomFactory;

impl RoomHandlerFactory for ChatRoomFactory {
    fn create(&self) -> Box<dyn RoomHandler> {
        Box::new(ChatRoom { seats: HashSet::new(), max_clients: 4 })
    }
}

async fn node(process_id: &str, presence: Arc<LocalPresence>, driver: Arc<LocalDriver>) -> Arc<MatchMaker> {
    let matchmaker = MatchMaker::new(
        ProcessId(process_id.to_string()),
        Node {
            process_id: ProcessId(process_id.to_string()),
            address: NodeAddress { address: "127.0.0.1".into(), port: 2567 },
        },
        presence,
        driver,
        MatchMakerConfig::default(),
    );
    matchmaker.setup().await.expect("node setup");
    matchmaker
}

#[tokio::main]
async fn main() -> Result<(), RendezvousError> {
    tracing_subscriber::fmt::init();

    let presence = Arc::new(LocalPresence::new());
    let driver = Arc::new(LocalDriver::new());

    let node_a = node("node-a", presence.clone(), driver.clone()).await;
    let node_b = node("node-b", presence.clone(), driver.clone()).await;

    // Both nodes host the "chat" room type, as a real deployment would,
    // so the load balancer in createRoom (spec §4.7) has real choices.
    node_a.define_room_type("chat", Arc::new(ChatRoomFactory), ClientOptions::new()).await;
    node_b.define_room_type("chat", Arc::new(ChatRoomFactory), ClientOptions::new()).await;

    // Tip the room-count hash so node-a looks busier than node-b. With
    // no existing room to join, joinOrCreate falls through to
    // createRoom's load balancer, which then picks node-b and proxies
    // the create over IPC (spec §4.7).
    presence.hincrby(keys::ROOM_COUNT_HASH, "node-a", 3).await.expect("seed room count");

    let reservation = node_a.join_or_create("chat", ClientOptions::new()).await?;
    println!(
        "client joined room {} on process {} with session {}",
        reservation.room.room_id, reservation.room.process_id, reservation.session_id,
    );

    node_a.graceful_shutdown().await?;
    node_b.graceful_shutdown().await?;
    Ok(())
}
