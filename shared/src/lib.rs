//! Protocol vocabulary shared between the arena server and its clients.
//!
//! Holds the tuning constants, the canonical player record, the static item
//! catalog and the tagged message enums for both directions of the wire.

pub mod catalog;
pub mod messages;

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub use catalog::{CatalogItem, Category, Shop};
pub use messages::{ClientMessage, RoundResult, ServerMessage};

/// Opaque per-connection handle assigned by the server at upgrade time.
pub type SessionId = u32;

pub const MAX_NAME_LEN: usize = 12;
pub const DEFAULT_NAME: &str = "PLAYER";
pub const DEFAULT_SKIN: &str = "phantom";
pub const MAX_CHAT_LEN: usize = 80;

pub const MAX_HP: u32 = 3;
pub const SPAWN_X_RED: f32 = 100.0;
pub const SPAWN_X_BLUE: f32 = 1300.0;
pub const SPAWN_Y: f32 = 400.0;
pub const RESPAWN_COUNTDOWN: f32 = 3.0;

pub const DEFAULT_GUN: &str = "pistol";
pub const SWORD: &str = "sword";
pub const DEFAULT_HIT_DAMAGE: u32 = 1;
pub const SWORD_DAMAGE: u32 = 2;

pub const KILL_SCORE: u32 = 100;
pub const KILL_COINS: u32 = 5;

/// Team labels a player can pick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Team {
    Red,
    Blue,
}

impl Team {
    /// Parses a client supplied label, falling back when absent or unknown.
    pub fn from_label(label: Option<&str>, fallback: Team) -> Team {
        match label.map(|l| l.trim().to_ascii_lowercase()) {
            Some(l) if l == "red" => Team::Red,
            Some(l) if l == "blue" => Team::Blue,
            _ => fallback,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Team::Red => "red",
            Team::Blue => "blue",
        }
    }

    pub fn spawn_point(&self) -> (f32, f32) {
        match self {
            Team::Red => (SPAWN_X_RED, SPAWN_Y),
            Team::Blue => (SPAWN_X_BLUE, SPAWN_Y),
        }
    }
}

/// Lifecycle phase of a room.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Lobby,
    Active,
    Ended,
}

/// Canonical per-player record. Field names follow the JSON the browser
/// client renders from.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Player {
    pub pid: SessionId,
    pub name: String,
    pub team: Team,
    pub skin: String,

    pub x: f32,
    pub y: f32,
    pub angle: f32,
    pub vx: f32,
    pub vy: f32,

    pub hp: u32,
    #[serde(rename = "maxHp")]
    pub max_hp: u32,
    pub shield: u32,
    pub dead: bool,
    #[serde(rename = "respTimer")]
    pub resp_timer: f32,

    pub gun: String,
    pub ammo: u32,
    pub reloading: bool,

    pub kills: u32,
    pub deaths: u32,
    pub score: u32,

    // Survives round resets, discarded with the room.
    pub coins: u32,
    pub owned_skins: Vec<String>,
    pub active_skins: BTreeMap<String, String>,

    /// Wall-clock millisecond timestamp before which the sword cannot swing.
    #[serde(skip)]
    pub sword_ready_at: u64,
}

impl Player {
    pub fn new(pid: SessionId, name: String, team: Team, skin: String) -> Self {
        let (x, y) = team.spawn_point();
        Self {
            pid,
            name,
            team,
            skin,
            x,
            y,
            angle: 0.0,
            vx: 0.0,
            vy: 0.0,
            hp: MAX_HP,
            max_hp: MAX_HP,
            shield: 0,
            dead: false,
            resp_timer: 0.0,
            gun: DEFAULT_GUN.to_string(),
            ammo: catalog::magazine_size(DEFAULT_GUN),
            reloading: false,
            kills: 0,
            deaths: 0,
            score: 0,
            coins: 0,
            owned_skins: Vec::new(),
            active_skins: BTreeMap::new(),
            sword_ready_at: 0,
        }
    }

    /// Restores health, position and loadout after a death. Statistics and
    /// economy are left alone.
    pub fn respawn(&mut self) {
        let (x, y) = self.team.spawn_point();
        self.dead = false;
        self.hp = self.max_hp;
        self.resp_timer = 0.0;
        self.x = x;
        self.y = y;
        self.gun = DEFAULT_GUN.to_string();
        self.ammo = catalog::magazine_size(DEFAULT_GUN);
        self.shield = 0;
        self.sword_ready_at = 0;
    }

    /// Resets every transient combat, movement and inventory field to spawn
    /// defaults, including round statistics.
    pub fn reset_for_round(&mut self) {
        self.respawn();
        self.max_hp = MAX_HP;
        self.hp = MAX_HP;
        self.angle = 0.0;
        self.vx = 0.0;
        self.vy = 0.0;
        self.reloading = false;
        self.kills = 0;
        self.deaths = 0;
        self.score = 0;
    }

    /// Colour of the skin equipped on the given weapon, if any.
    pub fn skin_color_for(&self, weapon: &str) -> Option<&'static str> {
        self.active_skins
            .get(weapon)
            .and_then(|id| catalog::lookup(id))
            .and_then(|item| item.color)
    }
}
