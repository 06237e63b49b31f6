//! Tunables for the matchmaker core. Plain struct with `Default`, the
//! same shape the teacher uses for `SessionConfig`/`TickConfig` — no
//! builder, just public fields a caller overrides before passing it in.

use std::time::Duration;

/// The published colyseus default for remote-room-call and remote-create
/// timeouts.
pub const REMOTE_ROOM_SHORT_TIMEOUT: Duration = Duration::from_millis(2000);

#[derive(Debug, Clone)]
pub struct MatchMakerConfig {
    /// Timeout for remote-room-call and remote-create-room IPC requests.
    pub remote_room_timeout: Duration,

    /// Cap applied to the concurrency gate's stagger delay
    /// (`min(concurrency * 100ms, this)`), spec §4.6.
    pub concurrency_gate_cap: Duration,

    /// Per-joiner stagger unit in the concurrency gate (`100ms` in spec).
    pub concurrency_gate_unit: Duration,

    /// Maximum `joinOrCreate` attempts before giving up on repeated
    /// `SeatReservationError` (spec §4.5: "up to 5 attempts").
    pub join_or_create_max_attempts: u32,

    /// Bounded channel capacity for each room actor's command queue.
    pub room_command_channel_size: usize,
}

impl Default for MatchMakerConfig {
    fn default() -> Self {
        Self {
            remote_room_timeout: REMOTE_ROOM_SHORT_TIMEOUT,
            concurrency_gate_cap: REMOTE_ROOM_SHORT_TIMEOUT,
            concurrency_gate_unit: Duration::from_millis(100),
            join_or_create_max_attempts: 5,
            room_command_channel_size: 32,
        }
    }
}
