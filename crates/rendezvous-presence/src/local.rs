//! Process-private [`Presence`] implementation, for running rendezvous as
//! a single standalone node.

use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use tokio::sync::{mpsc, Mutex};

use crate::{Presence, PresenceError, Subscription};

#[derive(Default)]
struct LocalStore {
    sets: HashMap<String, HashSet<String>>,
    hashes: HashMap<String, HashMap<String, String>>,
    counters: HashMap<String, i64>,
    subscribers: HashMap<String, Vec<mpsc::UnboundedSender<String>>>,
}

/// An in-memory [`Presence`] backend, scoped to one process.
///
/// All state lives behind a single `tokio::sync::Mutex`, the same
/// one-lock-no-partial-update pattern the teacher uses for its session
/// and room tables. Nothing here ever awaits while holding the lock, so
/// contention is just memcpy-and-release.
pub struct LocalPresence {
    store: Mutex<LocalStore>,
}

impl LocalPresence {
    pub fn new() -> Self {
        Self { store: Mutex::new(LocalStore::default()) }
    }
}

impl Default for LocalPresence {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Presence for LocalPresence {
    async fn sadd(&self, key: &str, member: &str) -> Result<(), PresenceError> {
        let mut store = self.store.lock().await;
        store.sets.entry(key.to_string()).or_default().insert(member.to_string());
        Ok(())
    }

    async fn srem(&self, key: &str, member: &str) -> Result<(), PresenceError> {
        let mut store = self.store.lock().await;
        if let Some(set) = store.sets.get_mut(key) {
            set.remove(member);
        }
        Ok(())
    }

    async fn smembers(&self, key: &str) -> Result<Vec<String>, PresenceError> {
        let store = self.store.lock().await;
        Ok(store.sets.get(key).map(|s| s.iter().cloned().collect()).unwrap_or_default())
    }

    async fn hset(&self, key: &str, field: &str, value: &str) -> Result<(), PresenceError> {
        let mut store = self.store.lock().await;
        store
            .hashes
            .entry(key.to_string())
            .or_default()
            .insert(field.to_string(), value.to_string());
        Ok(())
    }

    async fn hget(&self, key: &str, field: &str) -> Result<Option<String>, PresenceError> {
        let store = self.store.lock().await;
        Ok(store.hashes.get(key).and_then(|h| h.get(field).cloned()))
    }

    async fn hgetall(&self, key: &str) -> Result<HashMap<String, String>, PresenceError> {
        let store = self.store.lock().await;
        Ok(store.hashes.get(key).cloned().unwrap_or_default())
    }

    async fn hincrby(&self, key: &str, field: &str, delta: i64) -> Result<i64, PresenceError> {
        let mut store = self.store.lock().await;
        let hash = store.hashes.entry(key.to_string()).or_default();
        let current = hash.get(field).and_then(|v| v.parse::<i64>().ok()).unwrap_or(0);
        let next = current + delta;
        hash.insert(field.to_string(), next.to_string());
        Ok(next)
    }

    async fn hdel(&self, key: &str, field: &str) -> Result<(), PresenceError> {
        let mut store = self.store.lock().await;
        if let Some(hash) = store.hashes.get_mut(key) {
            hash.remove(field);
        }
        Ok(())
    }

    async fn incr(&self, key: &str) -> Result<i64, PresenceError> {
        let mut store = self.store.lock().await;
        let next = store.counters.entry(key.to_string()).or_insert(0);
        *next += 1;
        Ok(*next)
    }

    async fn decr(&self, key: &str) -> Result<i64, PresenceError> {
        let mut store = self.store.lock().await;
        let next = store.counters.entry(key.to_string()).or_insert(0);
        *next -= 1;
        Ok(*next)
    }

    async fn del(&self, key: &str) -> Result<(), PresenceError> {
        let mut store = self.store.lock().await;
        store.counters.remove(key);
        store.hashes.remove(key);
        store.sets.remove(key);
        Ok(())
    }

    async fn publish(&self, channel: &str, message: &str) -> Result<(), PresenceError> {
        let mut store = self.store.lock().await;
        if let Some(senders) = store.subscribers.get_mut(channel) {
            senders.retain(|tx| tx.send(message.to_string()).is_ok());
        }
        Ok(())
    }

    async fn subscribe(&self, channel: &str) -> Result<Subscription, PresenceError> {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut store = self.store.lock().await;
        store.subscribers.entry(channel.to_string()).or_default().push(tx);
        Ok(Subscription { channel: channel.to_string(), receiver: rx })
    }

    async fn unsubscribe(&self, channel: &str) -> Result<(), PresenceError> {
        let mut store = self.store.lock().await;
        store.subscribers.remove(channel);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_sadd_srem_smembers_round_trip() {
        let presence = LocalPresence::new();
        presence.sadd("set", "a").await.unwrap();
        presence.sadd("set", "b").await.unwrap();
        let mut members = presence.smembers("set").await.unwrap();
        members.sort();
        assert_eq!(members, vec!["a", "b"]);

        presence.srem("set", "a").await.unwrap();
        assert_eq!(presence.smembers("set").await.unwrap(), vec!["b"]);
    }

    #[tokio::test]
    async fn test_hash_ops_set_get_incr_del() {
        let presence = LocalPresence::new();
        presence.hset("h", "f1", "v1").await.unwrap();
        assert_eq!(presence.hget("h", "f1").await.unwrap(), Some("v1".to_string()));

        let next = presence.hincrby("h", "count", 3).await.unwrap();
        assert_eq!(next, 3);
        let next = presence.hincrby("h", "count", -1).await.unwrap();
        assert_eq!(next, 2);

        presence.hdel("h", "f1").await.unwrap();
        assert_eq!(presence.hget("h", "f1").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_incr_decr_del_counter() {
        let presence = LocalPresence::new();
        assert_eq!(presence.incr("c").await.unwrap(), 1);
        assert_eq!(presence.incr("c").await.unwrap(), 2);
        assert_eq!(presence.decr("c").await.unwrap(), 1);
        presence.del("c").await.unwrap();
        assert_eq!(presence.incr("c").await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_publish_with_no_subscriber_is_dropped_silently() {
        let presence = LocalPresence::new();
        presence.publish("nobody-home", "hello").await.unwrap();
    }

    #[tokio::test]
    async fn test_subscribe_receives_published_messages_in_order() {
        let presence = LocalPresence::new();
        let mut sub = presence.subscribe("chan").await.unwrap();
        presence.publish("chan", "one").await.unwrap();
        presence.publish("chan", "two").await.unwrap();

        assert_eq!(sub.recv().await, Some("one".to_string()));
        assert_eq!(sub.recv().await, Some("two".to_string()));
    }

    #[tokio::test]
    async fn test_unsubscribe_stops_delivery() {
        let presence = LocalPresence::new();
        let mut sub = presence.subscribe("chan").await.unwrap();
        presence.unsubscribe("chan").await.unwrap();
        presence.publish("chan", "late").await.unwrap();
        assert_eq!(sub.recv().await, None);
    }

    #[tokio::test]
    async fn test_multiple_subscribers_all_receive_fanout() {
        let presence = LocalPresence::new();
        let mut sub_a = presence.subscribe("chan").await.unwrap();
        let mut sub_b = presence.subscribe("chan").await.unwrap();
        presence.publish("chan", "hi").await.unwrap();

        assert_eq!(sub_a.recv().await, Some("hi".to_string()));
        assert_eq!(sub_b.recv().await, Some("hi".to_string()));
    }
}
