//! Authoritative game state.
//!
//! `GameState` owns the connection registry, the player store and the room
//! book. Every worker mutates it only while holding the one lock in
//! [`crate::scheduler::SharedState`]; nothing inside does its own locking.
//! Message handlers live in `lobby`, `combat`, `shop` and `relay`, fan-out in
//! `broadcast`.

use crate::config::GameConfig;
use crate::player::PlayerStore;
use crate::registry::{ConnectionRegistry, Outbound};
use crate::room::{Departure, RoomBook};
use crate::scheduler::{Scheduled, ScheduledTask};
use log::{debug, info};
use shared::{Phase, ServerMessage, SessionId};
use std::net::SocketAddr;

pub struct GameState {
    pub(crate) config: GameConfig,
    pub(crate) registry: ConnectionRegistry,
    pub(crate) players: PlayerStore,
    pub(crate) rooms: RoomBook,
}

impl GameState {
    pub fn new(config: GameConfig) -> Self {
        Self {
            registry: ConnectionRegistry::new(config.max_clients),
            players: PlayerStore::new(),
            rooms: RoomBook::new(config.room_code_len, config.room_code_attempts),
            config,
        }
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn registry(&self) -> &ConnectionRegistry {
        &self.registry
    }

    pub fn players(&self) -> &PlayerStore {
        &self.players
    }

    pub fn rooms(&self) -> &RoomBook {
        &self.rooms
    }

    /// Registers an upgraded connection and greets it with its handle.
    /// Returns `None` when the server is full.
    pub fn connect(&mut self, addr: SocketAddr, sender: Outbound) -> Option<SessionId> {
        let id = self.registry.register(addr, sender)?;
        self.send_to(id, &ServerMessage::Connected { pid: id });
        Some(id)
    }

    pub fn is_connected(&self, id: SessionId) -> bool {
        self.registry.contains(id)
    }

    /// Tears down everything tied to a session. Safe to call more than once.
    pub fn remove_session(&mut self, id: SessionId) {
        let registered = self.registry.unregister(id);
        let player = self.leave_room(id);
        match player {
            Some(name) => info!("{} (session {}) disconnected", name, id),
            None if registered => info!("Session {} disconnected", id),
            None => {}
        }
    }

    /// Drops the player record and room membership of `id`, telling the rest
    /// of the room. Returns the departed player's name.
    pub(crate) fn leave_room(&mut self, id: SessionId) -> Option<String> {
        let player = self.players.remove(id);
        match self.rooms.leave(id) {
            Departure::Left { code, new_host } => {
                self.broadcast(&ServerMessage::PlayerLeft { pid: id }, None, Some(&code));
                if let Some(host) = new_host {
                    self.broadcast(&ServerMessage::HostChanged { pid: host }, None, Some(&code));
                }
            }
            Departure::Destroyed { .. } | Departure::NotInRoom => {}
        }
        player.map(|p| p.name)
    }

    /// Runs a delayed task after re-validating the state it was armed for.
    pub fn run_scheduled(&mut self, task: ScheduledTask) -> Vec<Scheduled> {
        match task {
            ScheduledTask::Respawn { pid, room } => {
                self.respawn(pid, &room);
                Vec::new()
            }
            ScheduledTask::RoundDeadline { room, round } => self.round_deadline(&room, round),
            ScheduledTask::ResetRoom { room, round } => {
                self.reset_room(&room, round);
                Vec::new()
            }
        }
    }

    fn respawn(&mut self, pid: SessionId, room: &str) {
        if self.rooms.room_code_of(pid) != Some(room) {
            debug!("Respawn for session {} skipped: left room {}", pid, room);
            return;
        }
        let Some(player) = self.players.get_mut(pid) else {
            return;
        };
        if !player.dead {
            debug!("Respawn for session {} skipped: already alive", pid);
            return;
        }
        player.respawn();
        self.broadcast(&ServerMessage::Respawn { pid }, None, Some(room));
    }

    /// Deadline watcher: ends the round with the current kill leader unless
    /// the round already ended some other way. Ties go to the lowest handle.
    fn round_deadline(&mut self, code: &str, round: u64) -> Vec<Scheduled> {
        let Some(room) = self.rooms.get(code) else {
            debug!("Deadline for room {} skipped: room destroyed", code);
            return Vec::new();
        };
        if room.phase != Phase::Active || room.round != round {
            debug!("Deadline for room {} round {} skipped", code, round);
            return Vec::new();
        }

        let mut leader = None;
        let mut best_kills = -1i64;
        for member in &room.members {
            if let Some(player) = self.players.get(*member) {
                if player.kills as i64 > best_kills {
                    best_kills = player.kills as i64;
                    leader = Some(*member);
                }
            }
        }
        self.end_round(code, Some(round), leader)
    }
}
