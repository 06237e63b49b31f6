//! In-memory [`Driver`], for running rendezvous as a single standalone node.

use async_trait::async_trait;
use rendezvous_protocol::{ProcessId, RoomId, RoomListing, SortSpec};
use tokio::sync::Mutex;

use crate::{apply_sort, Driver, DriverError, FindConditions};

/// A `Vec<RoomListing>` behind a mutex, linear-scanned for `find`/`find_one`
/// (matches spec's "local (in-memory array)" backend).
#[derive(Default)]
pub struct LocalDriver {
    listings: Mutex<Vec<RoomListing>>,
}

impl LocalDriver {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Driver for LocalDriver {
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
        let listings = self.listings.lock().await;
        let mut matched: Vec<RoomListing> =
            listings.iter().filter(|l| conditions.matches(l)).cloned().collect();
        if let Some(sort) = sort {
            apply_sort(&mut matched, sort);
        }
        Ok(matched)
    }

    async fn find_one(&self, conditions: &FindConditions) -> Result<Option<RoomListing>, DriverError> {
        let listings = self.listings.lock().await;
        Ok(listings.iter().find(|l| conditions.matches(l)).cloned())
    }

    async fn save(&self, listing: &RoomListing) -> Result<(), DriverError> {
        let mut listings = self.listings.lock().await;
        if let Some(existing) = listings.iter_mut().find(|l| l.room_id == listing.room_id) {
            *existing = listing.clone();
        } else {
            listings.push(listing.clone());
        }
        Ok(())
    }

    async fn remove(&self, room_id: &RoomId) -> Result<(), DriverError> {
        let mut listings = self.listings.lock().await;
        listings.retain(|l| &l.room_id != room_id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn seeded_driver() -> LocalDriver {
        let driver = LocalDriver::new();
        let mut listing = driver
            .create_instance(RoomId("r1".into()), "chat", ProcessId("p1".into()))
            .await
            .unwrap();
        listing.max_clients = 4;
        driver.save(&listing).await.unwrap();
        driver
    }

    #[tokio::test]
    async fn test_create_instance_returns_unsaved_default_listing() {
        let driver = LocalDriver::new();
        let listing = driver
            .create_instance(RoomId("r1".into()), "chat", ProcessId("p1".into()))
            .await
            .unwrap();
        assert_eq!(listing.name, "chat");
        assert!(driver.find_one(&FindConditions::by_name("chat")).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_save_then_find_one_by_name_returns_listing() {
        let driver = seeded_driver().await;
        let found = driver.find_one(&FindConditions::by_name("chat")).await.unwrap();
        assert_eq!(found.unwrap().room_id, RoomId("r1".into()));
    }

    #[tokio::test]
    async fn test_save_is_upsert_not_duplicate() {
        let driver = seeded_driver().await;
        let mut listing = driver.find_one(&FindConditions::by_name("chat")).await.unwrap().unwrap();
        listing.clients = 2;
        driver.save(&listing).await.unwrap();

        let all = driver.find(&FindConditions::by_name("chat"), None).await.unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].clients, 2);
    }

    #[tokio::test]
    async fn test_remove_deletes_listing() {
        let driver = seeded_driver().await;
        driver.remove(&RoomId("r1".into())).await.unwrap();
        assert!(driver.find_one(&FindConditions::by_name("chat")).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_find_filters_by_locked_condition() {
        let driver = seeded_driver().await;
        let mut locked_conditions = FindConditions::by_name("chat");
        locked_conditions.locked = Some(true);
        assert!(driver.find(&locked_conditions, None).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_find_applies_sort_spec() {
        let driver = LocalDriver::new();
        for (id, clients) in [("r1", 3u32), ("r2", 1), ("r3", 2)] {
            let mut listing = driver
                .create_instance(RoomId(id.into()), "chat", ProcessId("p1".into()))
                .await
                .unwrap();
            listing.clients = clients;
            driver.save(&listing).await.unwrap();
        }
        let sort = SortSpec::new().push("clients", rendezvous_protocol::SortDirection::Ascending);
        let ordered = driver.find(&FindConditions::by_name("chat"), Some(&sort)).await.unwrap();
        let ids: Vec<_> = ordered.iter().map(|l| l.room_id.0.clone()).collect();
        assert_eq!(ids, vec!["r2", "r3", "r1"]);
    }
}
