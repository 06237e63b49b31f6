//! Redis-backed [`Presence`], the "remote, shared across the cluster"
//! implementation spec §4.1 requires.
//!
//! Key-value operations run over a [`redis::aio::ConnectionManager`]
//! (auto-reconnecting, safe to clone and share). Pub/sub runs on a
//! single dedicated connection owned by a background task — Redis
//! pub/sub connections can't interleave `SUBSCRIBE` with normal commands,
//! so that connection is never used for anything else.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use futures_util::StreamExt;
use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use tokio::sync::{mpsc, oneshot, Mutex};

use crate::{Presence, PresenceError, Subscription};

impl From<redis::RedisError> for PresenceError {
    fn from(err: redis::RedisError) -> Self {
        if err.is_connection_dropped() || err.is_connection_refusal() {
            PresenceError::Unavailable(err.to_string())
        } else {
            PresenceError::Command(err.to_string())
        }
    }
}

enum PubSubCommand {
    Subscribe {
        channel: String,
        reply: oneshot::Sender<mpsc::UnboundedReceiver<String>>,
    },
    Unsubscribe {
        channel: String,
    },
}

type SubscriberMap = Arc<Mutex<HashMap<String, Vec<mpsc::UnboundedSender<String>>>>>;

/// A [`Presence`] backend shared across every node in the cluster via Redis.
pub struct RedisPresence {
    conn: ConnectionManager,
    pubsub_commands: mpsc::UnboundedSender<PubSubCommand>,
}

impl RedisPresence {
    /// Connects to `redis_url` and starts the background pub/sub pump.
    pub async fn connect(redis_url: &str) -> Result<Self, PresenceError> {
        let client = redis::Client::open(redis_url)
            .map_err(|e| PresenceError::Unavailable(e.to_string()))?;
        let conn = client.get_connection_manager().await?;
        let pubsub = client.get_async_pubsub().await?;

        let (tx, rx) = mpsc::unbounded_channel();
        let subscribers: SubscriberMap = Arc::new(Mutex::new(HashMap::new()));
        tokio::spawn(run_pubsub_pump(pubsub, rx, subscribers));

        Ok(Self { conn, pubsub_commands: tx })
    }
}

async fn run_pubsub_pump(
    mut pubsub: redis::aio::PubSub,
    mut commands: mpsc::UnboundedReceiver<PubSubCommand>,
    subscribers: SubscriberMap,
) {
    loop {
        tokio::select! {
            msg = pubsub.on_message().next() => {
                let Some(msg) = msg else { break };
                let channel: String = msg.get_channel_name().to_string();
                let payload: String = match msg.get_payload() {
                    Ok(p) => p,
                    Err(_) => continue,
                };
                let mut subs = subscribers.lock().await;
                if let Some(senders) = subs.get_mut(&channel) {
                    senders.retain(|tx| tx.send(payload.clone()).is_ok());
                }
            }
            cmd = commands.recv() => {
                match cmd {
                    Some(PubSubCommand::Subscribe { channel, reply }) => {
                        let (tx, rx) = mpsc::unbounded_channel();
                        let mut subs = subscribers.lock().await;
                        let is_new = !subs.contains_key(&channel);
                        subs.entry(channel.clone()).or_default().push(tx);
                        drop(subs);
                        if is_new && pubsub.subscribe(&channel).await.is_err() {
                            tracing::warn!(%channel, "redis subscribe failed");
                        }
                        let _ = reply.send(rx);
                    }
                    Some(PubSubCommand::Unsubscribe { channel }) => {
                        subscribers.lock().await.remove(&channel);
                        let _ = pubsub.unsubscribe(&channel).await;
                    }
                    None => break,
                }
            }
        }
    }
}

#[async_trait]
impl Presence for RedisPresence {
    async fn sadd(&self, key: &str, member: &str) -> Result<(), PresenceError> {
        let mut conn = self.conn.clone();
        conn.sadd::<_, _, ()>(key, member).await?;
        Ok(())
    }

    async fn srem(&self, key: &str, member: &str) -> Result<(), PresenceError> {
        let mut conn = self.conn.clone();
        conn.srem::<_, _, ()>(key, member).await?;
        Ok(())
    }

    async fn smembers(&self, key: &str) -> Result<Vec<String>, PresenceError> {
        let mut conn = self.conn.clone();
        Ok(conn.smembers(key).await?)
    }

    async fn hset(&self, key: &str, field: &str, value: &str) -> Result<(), PresenceError> {
        let mut conn = self.conn.clone();
        conn.hset::<_, _, _, ()>(key, field, value).await?;
        Ok(())
    }

    async fn hget(&self, key: &str, field: &str) -> Result<Option<String>, PresenceError> {
        let mut conn = self.conn.clone();
        Ok(conn.hget(key, field).await?)
    }

    async fn hgetall(&self, key: &str) -> Result<HashMap<String, String>, PresenceError> {
        let mut conn = self.conn.clone();
        Ok(conn.hgetall(key).await?)
    }

    async fn hincrby(&self, key: &str, field: &str, delta: i64) -> Result<i64, PresenceError> {
        let mut conn = self.conn.clone();
        Ok(conn.hincr(key, field, delta).await?)
    }

    async fn hdel(&self, key: &str, field: &str) -> Result<(), PresenceError> {
        let mut conn = self.conn.clone();
        conn.hdel::<_, _, ()>(key, field).await?;
        Ok(())
    }

    async fn incr(&self, key: &str) -> Result<i64, PresenceError> {
        let mut conn = self.conn.clone();
        Ok(conn.incr(key, 1).await?)
    }

    async fn decr(&self, key: &str) -> Result<i64, PresenceError> {
        let mut conn = self.conn.clone();
        Ok(conn.decr(key, 1).await?)
    }

    async fn del(&self, key: &str) -> Result<(), PresenceError> {
        let mut conn = self.conn.clone();
        conn.del::<_, ()>(key).await?;
        Ok(())
    }

    async fn publish(&self, channel: &str, message: &str) -> Result<(), PresenceError> {
        let mut conn = self.conn.clone();
        conn.publish::<_, _, ()>(channel, message).await?;
        Ok(())
    }

    async fn subscribe(&self, channel: &str) -> Result<Subscription, PresenceError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.pubsub_commands
            .send(PubSubCommand::Subscribe { channel: channel.to_string(), reply: reply_tx })
            .map_err(|_| PresenceError::SubscriptionClosed)?;
        let receiver = reply_rx.await.map_err(|_| PresenceError::SubscriptionClosed)?;
        Ok(Subscription { channel: channel.to_string(), receiver })
    }

    async fn unsubscribe(&self, channel: &str) -> Result<(), PresenceError> {
        self.pubsub_commands
            .send(PubSubCommand::Unsubscribe { channel: channel.to_string() })
            .map_err(|_| PresenceError::SubscriptionClosed)?;
        Ok(())
    }
}
