//! Tuning knobs for the match rules and the listener.

use std::path::PathBuf;
use std::time::Duration;

/// Rules and timings applied to every room.
#[derive(Debug, Clone)]
pub struct GameConfig {
    /// Kills that end a round immediately.
    pub kill_goal: u32,
    /// Hard cap on the length of a round.
    pub round_duration: Duration,
    /// Extra slack before the deadline watcher wakes up.
    pub deadline_grace: Duration,
    pub respawn_delay: Duration,
    /// How long the scoreboard stays up before the room returns to the lobby.
    pub reset_delay: Duration,
    pub sword_cooldown: Duration,
    /// Maximum number of simultaneously registered connections.
    pub max_clients: usize,
    /// Messages a connection may have waiting before it counts as stalled.
    pub outbound_queue: usize,
    pub room_code_len: usize,
    /// Collisions tolerated while drawing a fresh room code.
    pub room_code_attempts: usize,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            kill_goal: 10,
            round_duration: Duration::from_secs(180),
            deadline_grace: Duration::from_secs(1),
            respawn_delay: Duration::from_secs(3),
            reset_delay: Duration::from_secs(8),
            sword_cooldown: Duration::from_secs(7),
            max_clients: 256,
            outbound_queue: 256,
            room_code_len: 6,
            room_code_attempts: 64,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub address: String,
    /// HTML page returned for plain HTTP requests.
    pub document: Option<PathBuf>,
    pub game: GameConfig,
}

impl ServerConfig {
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            document: None,
            game: GameConfig::default(),
        }
    }
}
