//! Cluster-visible key/channel layout (spec §6), bit-exact for backend
//! compatibility. Every crate that formats one of these strings imports
//! this module rather than inlining the literal, so the layout can only
//! drift in one place.

use crate::{ProcessId, RoomId};

/// The set holding every live node's externalized address.
pub const NODES_SET: &str = "rendezvous:nodes";

/// The broadcast channel nodes publish `add,<addr>` / `remove,<addr>` on.
pub const NODES_DISCOVERY_CHANNEL: &str = "rendezvous:nodes:discovery";

/// The hash mapping `processId -> decimal room count`.
pub const ROOM_COUNT_HASH: &str = "roomcount";

/// The room-addition/removal broadcast channel.
pub const LOBBY_CHANNEL: &str = "$lobby";

/// A process's inbox channel: receives `createRoom` requests.
pub fn process_channel(process_id: &ProcessId) -> String {
    format!("p:{process_id}")
}

/// A room's inbox channel: receives method invocations for that room.
pub fn room_channel(room_id: &RoomId) -> String {
    format!("${room_id}")
}

/// The per-room-name concurrency-gate counter key.
pub fn concurrency_key(room_name: &str) -> String {
    format!("c:{room_name}")
}

/// Formats a lobby message: `<roomId>,<0|1>` (1 = removal).
pub fn lobby_message(room_id: &RoomId, removed: bool) -> String {
    format!("{room_id},{}", if removed { 1 } else { 0 })
}

/// Parses a lobby message back into `(room_id, removed)`.
pub fn parse_lobby_message(message: &str) -> Option<(RoomId, bool)> {
    let (id, flag) = message.rsplit_once(',')?;
    let removed = match flag {
        "0" => false,
        "1" => true,
        _ => return None,
    };
    Some((RoomId(id.to_string()), removed))
}

/// Formats a discovery message: `add,<addr>` / `remove,<addr>`.
pub fn discovery_message(added: bool, address: &str) -> String {
    format!("{},{address}", if added { "add" } else { "remove" })
}

/// Parses a discovery message back into `(added, address)`.
pub fn parse_discovery_message(message: &str) -> Option<(bool, &str)> {
    let (kind, addr) = message.split_once(',')?;
    let added = match kind {
        "add" => true,
        "remove" => false,
        _ => return None,
    };
    Some((added, addr))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_process_channel_layout() {
        let pid = ProcessId("p1".into());
        assert_eq!(process_channel(&pid), "p:p1");
    }

    #[test]
    fn test_room_channel_layout() {
        let rid = RoomId("r1".into());
        assert_eq!(room_channel(&rid), "$r1");
    }

    #[test]
    fn test_concurrency_key_layout() {
        assert_eq!(concurrency_key("chat"), "c:chat");
    }

    #[test]
    fn test_lobby_message_round_trip_add() {
        let rid = RoomId("r1".into());
        let msg = lobby_message(&rid, false);
        assert_eq!(msg, "r1,0");
        let (parsed_id, removed) = parse_lobby_message(&msg).unwrap();
        assert_eq!(parsed_id, rid);
        assert!(!removed);
    }

    #[test]
    fn test_lobby_message_round_trip_remove() {
        let rid = RoomId("r1".into());
        let msg = lobby_message(&rid, true);
        assert_eq!(msg, "r1,1");
        let (_, removed) = parse_lobby_message(&msg).unwrap();
        assert!(removed);
    }

    #[test]
    fn test_parse_lobby_message_rejects_garbage() {
        assert!(parse_lobby_message("no-comma-here").is_none());
        assert!(parse_lobby_message("room,7").is_none());
    }

    #[test]
    fn test_discovery_message_round_trip() {
        let msg = discovery_message(true, "p1/10.0.0.1:2567");
        assert_eq!(msg, "add,p1/10.0.0.1:2567");
        let (added, addr) = parse_discovery_message(&msg).unwrap();
        assert!(added);
        assert_eq!(addr, "p1/10.0.0.1:2567");
    }

    #[test]
    fn test_discovery_message_remove() {
        let msg = discovery_message(false, "p1/10.0.0.1:2567");
        let (added, _) = parse_discovery_message(&msg).unwrap();
        assert!(!added);
    }
}
