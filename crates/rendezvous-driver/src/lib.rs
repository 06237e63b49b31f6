//! RoomListing storage and query backends (spec §4.3).
//!
//! `Driver` is the interface the matchmaker core uses to allocate, find,
//! and persist [`RoomListing`] records. [`RoomListingHandle`] bundles a
//! mutable listing with a back-reference to its owning driver — the same
//! shape as the teacher's `RoomHandle` owning a sender back to its actor,
//! except here the "actor" is whatever storage backend is holding the
//! authoritative copy.

mod error;
mod local;
#[cfg(feature = "redis-backend")]
mod redis_backend;

pub use error::DriverError;
pub use local::LocalDriver;
#[cfg(feature = "redis-backend")]
pub use redis_backend::RedisDriver;

use std::sync::Arc;

use async_trait::async_trait;
use rendezvous_protocol::{ProcessId, RoomId, RoomListing, SortSpec};

/// Selection criteria for [`Driver::find`] / [`Driver::find_one`].
///
/// `name` restricts to one room type; `conditions` matches arbitrary
/// `metadata` key/value pairs (the filter-field projection handlers
/// declare via `filter_by`).
#[derive(Debug, Clone, Default)]
pub struct FindConditions {
    pub name: Option<String>,
    pub metadata: serde_json::Map<String, serde_json::Value>,
    pub locked: Option<bool>,
    pub private: Option<bool>,
}

impl FindConditions {
    pub fn by_name(name: impl Into<String>) -> Self {
        Self { name: Some(name.into()), ..Default::default() }
    }

    pub(crate) fn matches(&self, listing: &RoomListing) -> bool {
        if let Some(name) = &self.name {
            if &listing.name != name {
                return false;
            }
        }
        if let Some(locked) = self.locked {
            if listing.locked != locked {
                return false;
            }
        }
        if let Some(private) = self.private {
            if listing.private != private {
                return false;
            }
        }
        self.metadata.iter().all(|(key, value)| listing.metadata.get(key) == Some(value))
    }
}

/// Stores and queries [`RoomListing`] records across the cluster.
#[async_trait]
pub trait Driver: Send + Sync + 'static {
    /// Allocates a new listing for `name`, owned by `process_id`. Not yet
    /// persisted — the caller fills in remaining fields, wraps it in a
    /// [`RoomListingHandle`], then calls `save`.
    async fn create_instance(
        &self,
        room_id: RoomId,
        name: &str,
        process_id: ProcessId,
    ) -> Result<RoomListing, DriverError>;

    /// Returns every listing matching `conditions`, ordered by `sort` if given.
    async fn find(
        &self,
        conditions: &FindConditions,
        sort: Option<&SortSpec>,
    ) -> Result<Vec<RoomListing>, DriverError>;

    /// Returns one listing matching `conditions`, best-effort under races
    /// (spec §4.3 — duplicates across a race are tolerated, not deduplicated).
    async fn find_one(&self, conditions: &FindConditions) -> Result<Option<RoomListing>, DriverError>;

    /// Persists `listing`'s current fields.
    async fn save(&self, listing: &RoomListing) -> Result<(), DriverError>;

    /// Deletes the listing for `room_id`.
    async fn remove(&self, room_id: &RoomId) -> Result<(), DriverError>;
}

/// A mutable [`RoomListing`] paired with the driver that persists it.
pub struct RoomListingHandle {
    pub listing: RoomListing,
    driver: Arc<dyn Driver>,
}

impl RoomListingHandle {
    pub fn new(listing: RoomListing, driver: Arc<dyn Driver>) -> Self {
        Self { listing, driver }
    }

    /// Persists the handle's current `listing` fields.
    pub async fn save(&self) -> Result<(), DriverError> {
        self.driver.save(&self.listing).await
    }

    /// Deletes this listing from the driver.
    pub async fn remove(&self) -> Result<(), DriverError> {
        self.driver.remove(&self.listing.room_id).await
    }
}

/// Applies a [`SortSpec`] to a vector of listings in place.
pub(crate) fn apply_sort(listings: &mut [RoomListing], sort: &SortSpec) {
    listings.sort_by(|a, b| {
        for (field, direction) in &sort.0 {
            let ordering = compare_field(a, b, field);
            let ordering = match direction {
                rendezvous_protocol::SortDirection::Ascending => ordering,
                rendezvous_protocol::SortDirection::Descending => ordering.reverse(),
            };
            if ordering != std::cmp::Ordering::Equal {
                return ordering;
            }
        }
        std::cmp::Ordering::Equal
    });
}

fn compare_field(a: &RoomListing, b: &RoomListing, field: &str) -> std::cmp::Ordering {
    match field {
        "clients" => a.clients.cmp(&b.clients),
        "maxClients" | "max_clients" => a.max_clients.cmp(&b.max_clients),
        "name" => a.name.cmp(&b.name),
        "roomId" | "room_id" => a.room_id.0.cmp(&b.room_id.0),
        _ => {
            let av = a.metadata.get(field);
            let bv = b.metadata.get(field);
            match (av, bv) {
                (Some(serde_json::Value::Number(x)), Some(serde_json::Value::Number(y))) => x
                    .as_f64()
                    .partial_cmp(&y.as_f64())
                    .unwrap_or(std::cmp::Ordering::Equal),
                (Some(serde_json::Value::String(x)), Some(serde_json::Value::String(y))) => x.cmp(y),
                _ => std::cmp::Ordering::Equal,
            }
        }
    }
}
