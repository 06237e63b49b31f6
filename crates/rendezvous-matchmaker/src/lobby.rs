//! Lobby notifier (spec §4.13): broadcast room additions/removals on
//! `$lobby` so external proxies can keep a live room list without polling.

use rendezvous_presence::Presence;
use rendezvous_protocol::{keys, RoomId};

pub async fn notify(presence: &dyn Presence, room_id: &RoomId, removed: bool) {
    let message = keys::lobby_message(room_id, removed);
    if let Err(err) = presence.publish(keys::LOBBY_CHANNEL, &message).await {
        tracing::warn!(%err, %room_id, "lobby notify failed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rendezvous_presence::LocalPresence;

    #[tokio::test]
    async fn test_notify_add_publishes_zero_flag() {
        let presence = LocalPresence::new();
        let mut sub = presence.subscribe(keys::LOBBY_CHANNEL).await.unwrap();
        notify(&presence, &RoomId("r1".into()), false).await;
        assert_eq!(sub.recv().await.unwrap(), "r1,0");
    }

    #[tokio::test]
    async fn test_notify_remove_publishes_one_flag() {
        let presence = LocalPresence::new();
        let mut sub = presence.subscribe(keys::LOBBY_CHANNEL).await.unwrap();
        notify(&presence, &RoomId("r1".into()), true).await;
        assert_eq!(sub.recv().await.unwrap(), "r1,1");
    }
}
