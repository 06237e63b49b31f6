//! Core data-model types: identities, node/room records, and options maps.

use std::fmt;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Identity types
// ---------------------------------------------------------------------------

/// A stable identifier for a server process participating in the cluster.
///
/// Newtype wrapper (same pattern the teacher uses for `PlayerId`/`RoomId`):
/// wrapping a `String` in a named struct stops a `RoomId` or raw process
/// string from being passed where a `ProcessId` is expected.
///
/// Unlike a single-process counter, this must be unique *cluster-wide*, so
/// it is minted with `uuid` v4 rather than an `AtomicU64`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProcessId(pub String);

impl ProcessId {
    /// Generates a fresh, cluster-wide-unique process id.
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }
}

impl fmt::Display for ProcessId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A unique identifier for a room, stable across the cluster.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoomId(pub String);

impl RoomId {
    /// Generates a fresh, cluster-wide-unique room id.
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }
}

impl fmt::Display for RoomId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// An advance seat booking, to be redeemed by the client's subsequent
/// websocket connect.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(pub String);

impl SessionId {
    /// Generates a fresh session id.
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Node / address
// ---------------------------------------------------------------------------

/// The address a node is reachable at, as externalized on `nodes-set`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeAddress {
    pub address: String,
    pub port: u16,
}

impl fmt::Display for NodeAddress {
    /// Formats `address:port`, bracketing `::` as `[::]:port` (spec §4.4/§6).
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.address == "::" {
            write!(f, "[::]:{}", self.port)
        } else {
            write!(f, "{}:{}", self.address, self.port)
        }
    }
}

/// A node (server process) participating in the cluster.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Node {
    pub process_id: ProcessId,
    pub address: NodeAddress,
}

impl fmt::Display for Node {
    /// Formats `processId/address:port`, the exact layout stored in
    /// `rendezvous:nodes` and broadcast on `rendezvous:nodes:discovery`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.process_id, self.address)
    }
}

// ---------------------------------------------------------------------------
// ClientOptions — opaque boundary type
// ---------------------------------------------------------------------------

/// An opaque, serializable bag of client-supplied options.
///
/// REDESIGN FLAGS item: dynamic `ClientOptions` is represented as a map of
/// string to JSON value at the boundary. Handlers decode the keys they care
/// about (declared via `filter_by`) into typed filter structs themselves;
/// the matchmaker core never interprets option values.
pub type ClientOptions = serde_json::Map<String, serde_json::Value>;

// ---------------------------------------------------------------------------
// Sorting
// ---------------------------------------------------------------------------

/// Sort direction for a single field in a [`SortSpec`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SortDirection {
    Ascending,
    Descending,
}

/// An ordered list of `(field, direction)` pairs — the Rust expression of
/// the driver's "sort(...) chain" (spec §4.3).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortSpec(pub Vec<(String, SortDirection)>);

impl SortSpec {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(mut self, field: impl Into<String>, dir: SortDirection) -> Self {
        self.0.push((field.into(), dir));
        self
    }
}

// ---------------------------------------------------------------------------
// RoomInternalState — process-local lifecycle
// ---------------------------------------------------------------------------

/// The owning process's view of a room's lifecycle (spec §3).
///
/// Distinct from [`RoomListing::locked`]: a room can be `Created` and
/// `locked` at the same time — `locked` only controls discoverability,
/// while this tracks whether the room object itself is still being built,
/// live, or torn down.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RoomInternalState {
    Creating,
    Created,
    Disposing,
}

impl fmt::Display for RoomInternalState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Creating => write!(f, "Creating"),
            Self::Created => write!(f, "Created"),
            Self::Disposing => write!(f, "Disposing"),
        }
    }
}

// ---------------------------------------------------------------------------
// RoomListing — cluster-visible record
// ---------------------------------------------------------------------------

/// A cluster-visible record describing one room (spec §3).
///
/// Mutable; persisted via a driver on every state change. `metadata` holds
/// the filter-field projection from the room's create options — the
/// fields a handler's `filter_by` keys name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoomListing {
    pub room_id: RoomId,
    pub name: String,
    pub process_id: ProcessId,
    pub locked: bool,
    pub private: bool,
    pub unlisted: bool,
    pub clients: u32,
    pub max_clients: u32,
    #[serde(default)]
    pub metadata: serde_json::Map<String, serde_json::Value>,
}

impl RoomListing {
    /// Creates a fresh listing in its initial (unlocked, public) state.
    pub fn new(room_id: RoomId, name: impl Into<String>, process_id: ProcessId) -> Self {
        Self {
            room_id,
            name: name.into(),
            process_id,
            locked: false,
            private: false,
            unlisted: false,
            clients: 0,
            max_clients: 0,
            metadata: serde_json::Map::new(),
        }
    }
}

/// Returned by every seat-reserving matchmaker operation (spec §4.5).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeatReservation {
    pub room: RoomListing,
    pub session_id: SessionId,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_process_id_generate_is_unique() {
        let a = ProcessId::generate();
        let b = ProcessId::generate();
        assert_ne!(a, b);
    }

    #[test]
    fn test_node_address_display_plain() {
        let addr = NodeAddress { address: "10.0.0.5".into(), port: 2567 };
        assert_eq!(addr.to_string(), "10.0.0.5:2567");
    }

    #[test]
    fn test_node_address_display_brackets_unspecified_ipv6() {
        let addr = NodeAddress { address: "::".into(), port: 2567 };
        assert_eq!(addr.to_string(), "[::]:2567");
    }

    #[test]
    fn test_node_display_matches_cluster_layout() {
        let node = Node {
            process_id: ProcessId("p-1".into()),
            address: NodeAddress { address: "127.0.0.1".into(), port: 2567 },
        };
        assert_eq!(node.to_string(), "p-1/127.0.0.1:2567");
    }

    #[test]
    fn test_room_id_serializes_as_plain_string() {
        let id = RoomId("abc".into());
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"abc\"");
    }

    #[test]
    fn test_room_listing_new_defaults_unlocked_and_public() {
        let listing = RoomListing::new(
            RoomId("r1".into()),
            "chat",
            ProcessId("p1".into()),
        );
        assert!(!listing.locked);
        assert!(!listing.private);
        assert!(!listing.unlisted);
        assert_eq!(listing.clients, 0);
    }

    #[test]
    fn test_sort_spec_builder() {
        let spec = SortSpec::new()
            .push("clients", SortDirection::Descending)
            .push("name", SortDirection::Ascending);
        assert_eq!(spec.0.len(), 2);
        assert_eq!(spec.0[0].1, SortDirection::Descending);
    }
}
