//! Room book: every live room plus the session to room index.
//!
//! A room moves `Lobby -> Active -> Ended -> Lobby`. Each start bumps the
//! room's round number; delayed work compares against it on wake so a stale
//! timer cannot act on a later round. Rooms disappear as soon as their last
//! member leaves.

use crate::error::RoomError;
use crate::player::EconomySnapshot;
use log::info;
use rand::Rng;
use shared::{Phase, SessionId};
use std::collections::{BTreeSet, HashMap};

const CODE_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

#[derive(Debug, Clone)]
pub struct Room {
    pub code: String,
    pub host: SessionId,
    pub phase: Phase,
    pub members: BTreeSet<SessionId>,
    pub kill_goal: u32,
    /// Incremented on every start.
    pub round: u64,
    /// Wall-clock end of the active round, in milliseconds.
    pub round_deadline: Option<u64>,
    /// Persistent player state captured when the round ended.
    pub saved_economy: HashMap<SessionId, EconomySnapshot>,
}

impl Room {
    fn new(code: String, host: SessionId, kill_goal: u32) -> Self {
        Self {
            code,
            host,
            phase: Phase::Lobby,
            members: BTreeSet::from([host]),
            kill_goal,
            round: 0,
            round_deadline: None,
            saved_economy: HashMap::new(),
        }
    }
}

/// What happened to a room when a member left it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Departure {
    NotInRoom,
    Left {
        code: String,
        new_host: Option<SessionId>,
    },
    Destroyed {
        code: String,
    },
}

pub struct RoomBook {
    rooms: HashMap<String, Room>,
    room_of: HashMap<SessionId, String>,
    code_len: usize,
    code_attempts: usize,
}

impl RoomBook {
    pub fn new(code_len: usize, code_attempts: usize) -> Self {
        Self {
            rooms: HashMap::new(),
            room_of: HashMap::new(),
            code_len,
            code_attempts,
        }
    }

    /// Draws codes until one is free. Gives up after the configured number of
    /// collisions instead of spinning forever.
    pub fn generate_code<R: Rng>(&self, rng: &mut R) -> Result<String, RoomError> {
        for _ in 0..self.code_attempts.max(1) {
            let code: String = (0..self.code_len)
                .map(|_| CODE_ALPHABET[rng.gen_range(0..CODE_ALPHABET.len())] as char)
                .collect();
            if !self.rooms.contains_key(&code) {
                return Ok(code);
            }
        }
        Err(RoomError::CodeSpaceExhausted)
    }

    pub fn create(&mut self, host: SessionId, kill_goal: u32) -> Result<&Room, RoomError> {
        self.create_with_rng(host, kill_goal, &mut rand::thread_rng())
    }

    /// Opens a new lobby with `host` as its only member. The caller must have
    /// removed `host` from any previous room.
    pub fn create_with_rng<R: Rng>(
        &mut self,
        host: SessionId,
        kill_goal: u32,
        rng: &mut R,
    ) -> Result<&Room, RoomError> {
        let code = self.generate_code(rng)?;
        info!("Room {} created by session {}", code, host);
        self.room_of.insert(host, code.clone());
        Ok(self
            .rooms
            .entry(code.clone())
            .or_insert_with(|| Room::new(code, host, kill_goal)))
    }

    /// Adds `id` to the room with the given code. Codes are matched
    /// case-insensitively. Rooms showing the scoreboard refuse new members.
    pub fn join(&mut self, code: &str, id: SessionId) -> Result<&Room, RoomError> {
        let code = normalize_code(code);
        let room = self
            .rooms
            .get_mut(&code)
            .ok_or_else(|| RoomError::NotFound(code.clone()))?;
        if room.phase == Phase::Ended {
            return Err(RoomError::RoundEnded);
        }

        room.members.insert(id);
        self.room_of.insert(id, code);
        Ok(room)
    }

    /// Removes `id` from its room, promoting a new host or destroying the room
    /// as needed.
    pub fn leave(&mut self, id: SessionId) -> Departure {
        let Some(code) = self.room_of.remove(&id) else {
            return Departure::NotInRoom;
        };
        let Some(room) = self.rooms.get_mut(&code) else {
            return Departure::NotInRoom;
        };

        room.members.remove(&id);
        room.saved_economy.remove(&id);

        if room.members.is_empty() {
            self.rooms.remove(&code);
            info!("Room {} destroyed", code);
            return Departure::Destroyed { code };
        }

        let mut new_host = None;
        if room.host == id {
            if let Some(&next) = room.members.iter().next() {
                room.host = next;
                new_host = Some(next);
                info!("Room {} host passed to session {}", code, next);
            }
        }
        Departure::Left { code, new_host }
    }

    /// Host-only `Lobby -> Active` transition. Returns the started room.
    pub fn start(
        &mut self,
        id: SessionId,
        now_ms: u64,
        round_ms: u64,
    ) -> Result<&Room, RoomError> {
        let code = self.room_of.get(&id).ok_or(RoomError::NotInRoom)?;
        let room = self.rooms.get_mut(code).ok_or(RoomError::NotInRoom)?;
        if room.host != id {
            return Err(RoomError::NotHost);
        }
        if room.phase != Phase::Lobby {
            return Err(RoomError::WrongPhase);
        }

        room.phase = Phase::Active;
        room.round += 1;
        room.round_deadline = Some(now_ms + round_ms);
        info!("Room {} started round {}", room.code, room.round);
        Ok(room)
    }

    /// `Active -> Ended`. With `round` set, only acts if the room is still on
    /// that round. Returns `None` when the guard fails.
    pub fn end_round(&mut self, code: &str, round: Option<u64>) -> Option<&mut Room> {
        let room = self.rooms.get_mut(code)?;
        if room.phase != Phase::Active || round.is_some_and(|r| r != room.round) {
            return None;
        }
        room.phase = Phase::Ended;
        room.round_deadline = None;
        Some(room)
    }

    /// `Ended -> Lobby` for the given round.
    pub fn reset(&mut self, code: &str, round: u64) -> Option<&mut Room> {
        let room = self.rooms.get_mut(code)?;
        if room.phase != Phase::Ended || room.round != round {
            return None;
        }
        room.phase = Phase::Lobby;
        Some(room)
    }

    pub fn get(&self, code: &str) -> Option<&Room> {
        self.rooms.get(code)
    }

    pub(crate) fn get_mut(&mut self, code: &str) -> Option<&mut Room> {
        self.rooms.get_mut(code)
    }

    pub fn room_code_of(&self, id: SessionId) -> Option<&str> {
        self.room_of.get(&id).map(String::as_str)
    }

    pub fn room_of(&self, id: SessionId) -> Option<&Room> {
        self.room_code_of(id).and_then(|code| self.rooms.get(code))
    }

    pub fn len(&self) -> usize {
        self.rooms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rooms.is_empty()
    }
}

pub fn normalize_code(code: &str) -> String {
    code.trim().to_ascii_uppercase()
}
