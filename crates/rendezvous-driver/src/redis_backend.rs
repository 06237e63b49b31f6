//! Redis-backed [`Driver`]: one hash per room, a set index per room name.

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use rendezvous_protocol::{ProcessId, RoomId, RoomListing, SortSpec};

use crate::{apply_sort, Driver, DriverError, FindConditions};

impl From<redis::RedisError> for DriverError {
    fn from(err: redis::RedisError) -> Self {
        if err.is_connection_dropped() || err.is_connection_refusal() {
            DriverError::Unavailable(err.to_string())
        } else {
            DriverError::Command(err.to_string())
        }
    }
}

fn listing_key(room_id: &RoomId) -> String {
    format!("roomlisting:{room_id}")
}

fn name_index_key(name: &str) -> String {
    format!("roomlisting-by-name:{name}")
}

/// A [`Driver`] backed by a Redis hash per room plus a per-name set index.
pub struct RedisDriver {
    conn: ConnectionManager,
}

impl RedisDriver {
    pub async fn connect(redis_url: &str) -> Result<Self, DriverError> {
        let client = redis::Client::open(redis_url)
            .map_err(|e| DriverError::Unavailable(e.to_string()))?;
        let conn = client.get_connection_manager().await?;
        Ok(Self { conn })
    }

    async fn load(&self, room_id: &RoomId) -> Result<Option<RoomListing>, DriverError> {
        let mut conn = self.conn.clone();
        let raw: Option<String> = conn.get(listing_key(room_id)).await?;
        Ok(raw.and_then(|s| serde_json::from_str(&s).ok()))
    }
}

#[async_trait]
impl Driver for RedisDriver {
    async fn create_instance(
        &self,
        room_id: RoomId,
        name: &str,
        process_id: ProcessId,
    ) -> Result<RoomListing, DriverError> {
        Ok(RoomListing::new(room_id, name, process_id))
    }

    async fn find(
        &self,
        conditions: &FindConditions,
        sort: Option<&SortSpec>,
    ) -> Result<Vec<RoomListing>, DriverError> {
        let mut conn = self.conn.clone();
        let room_ids: Vec<String> = match &conditions.name {
            Some(name) => conn.smembers(name_index_key(name)).await?,
            None => conn.keys("roomlisting:*").await?,
        };

        let mut matched = Vec::new();
        for id in room_ids {
            if let Some(listing) = self.load(&RoomId(id)).await? {
                if conditions.matches(&listing) {
                    matched.push(listing);
                }
            }
        }
        if let Some(sort) = sort {
            apply_sort(&mut matched, sort);
        }
        Ok(matched)
    }

    async fn find_one(&self, conditions: &FindConditions) -> Result<Option<RoomListing>, DriverError> {
        // Best-effort (spec §4.3): first match wins, no dedup across races.
        Ok(self.find(conditions, None).await?.into_iter().next())
    }

    async fn save(&self, listing: &RoomListing) -> Result<(), DriverError> {
        let mut conn = self.conn.clone();
        let serialized = serde_json::to_string(listing)
            .map_err(|e| DriverError::Command(e.to_string()))?;
        conn.set::<_, _, ()>(listing_key(&listing.room_id), serialized).await?;
        conn.sadd::<_, _, ()>(name_index_key(&listing.name), listing.room_id.0.clone()).await?;
        Ok(())
    }

    async fn remove(&self, room_id: &RoomId) -> Result<(), DriverError> {
        let listing = self.load(room_id).await?;
        let mut conn = self.conn.clone();
        conn.del::<_, ()>(listing_key(room_id)).await?;
        if let Some(listing) = listing {
            conn.srem::<_, _, ()>(name_index_key(&listing.name), room_id.0.clone()).await?;
        }
        Ok(())
    }
}
