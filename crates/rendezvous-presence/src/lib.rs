//! Pub/sub and key-value presence abstraction (spec §4.1).
//!
//! `Presence` is the one interface the matchmaker core talks to for
//! anything cluster-visible — set membership, hashes, counters, and
//! pub/sub. Two backends satisfy it: [`LocalPresence`] (single process,
//! for embedding rendezvous in a standalone server) and [`RedisPresence`]
//! (shared across a cluster). This mirrors the teacher's
//! `Transport`/`Connection` split: one trait per capability, swappable
//! implementations behind it.

mod error;
mod local;
#[cfg(feature = "redis-backend")]
mod redis_backend;

pub use error::PresenceError;
pub use local::LocalPresence;
#[cfg(feature = "redis-backend")]
pub use redis_backend::RedisPresence;

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::mpsc;

/// A live subscription to a pub/sub channel.
///
/// Holds the receiving half of the channel the backend feeds published
/// messages into. Dropping a `Subscription` does not itself unsubscribe —
/// call [`Presence::unsubscribe`] with the same channel name to stop
/// delivery and let the backend release its resources.
pub struct Subscription {
    pub channel: String,
    pub receiver: mpsc::UnboundedReceiver<String>,
}

impl Subscription {
    /// Waits for the next message published on this subscription's channel.
    ///
    /// Returns `None` once the backend has torn the subscription down
    /// (e.g. after `unsubscribe`).
    pub async fn recv(&mut self) -> Option<String> {
        self.receiver.recv().await
    }
}

/// Key-value and pub/sub operations the matchmaking core needs from a
/// cluster-visible backend (spec §4.1).
///
/// All operations are asynchronous and fallible. Implementations must
/// guarantee:
/// - (a) a subscriber has its handler installed before `subscribe`
///   returns (no missed messages published right after subscribing),
/// - (b) `publish` fan-out is best-effort — a channel with no
///   subscriber silently drops the message,
/// - (c) message order within a channel is preserved from the
///   perspective of a single subscriber.
#[async_trait]
pub trait Presence: Send + Sync + 'static {
    async fn sadd(&self, key: &str, member: &str) -> Result<(), PresenceError>;
    async fn srem(&self, key: &str, member: &str) -> Result<(), PresenceError>;
    async fn smembers(&self, key: &str) -> Result<Vec<String>, PresenceError>;

    async fn hset(&self, key: &str, field: &str, value: &str) -> Result<(), PresenceError>;
    async fn hget(&self, key: &str, field: &str) -> Result<Option<String>, PresenceError>;
    async fn hgetall(&self, key: &str) -> Result<HashMap<String, String>, PresenceError>;
    async fn hincrby(&self, key: &str, field: &str, delta: i64) -> Result<i64, PresenceError>;
    async fn hdel(&self, key: &str, field: &str) -> Result<(), PresenceError>;

    async fn incr(&self, key: &str) -> Result<i64, PresenceError>;
    async fn decr(&self, key: &str) -> Result<i64, PresenceError>;
    async fn del(&self, key: &str) -> Result<(), PresenceError>;

    async fn publish(&self, channel: &str, message: &str) -> Result<(), PresenceError>;
    async fn subscribe(&self, channel: &str) -> Result<Subscription, PresenceError>;
    async fn unsubscribe(&self, channel: &str) -> Result<(), PresenceError>;
}
