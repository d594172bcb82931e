//! JSON application messages, one tagged enum per direction.
//!
//! Every message is an object whose `type` field selects the variant.
//! Inbound types the server does not know decode to
//! [`ClientMessage::Unknown`] instead of failing.

use crate::{Phase, Player, SessionId, Shop, Team};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;

fn default_gun() -> String {
    crate::DEFAULT_GUN.to_string()
}

// Browsers send damage as a JSON number, sometimes with a fraction. Truncate
// toward zero and clamp negatives.
fn whole_damage<'de, D>(deserializer: D) -> Result<Option<u32>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<f64>::deserialize(deserializer)?;
    Ok(raw.map(|dmg| dmg.max(0.0) as u32))
}

/// Messages sent by a client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ClientMessage {
    CreateRoom {
        #[serde(default)]
        name: Option<String>,
        #[serde(default)]
        team: Option<String>,
        #[serde(default)]
        skin: Option<String>,
    },
    JoinRoom {
        #[serde(default)]
        code: String,
        #[serde(default)]
        name: Option<String>,
        #[serde(default)]
        team: Option<String>,
        #[serde(default)]
        skin: Option<String>,
    },
    /// Older clients create a room implicitly on join.
    Join {
        #[serde(default)]
        name: Option<String>,
        #[serde(default)]
        team: Option<String>,
        #[serde(default)]
        skin: Option<String>,
    },
    StartGame,
    State {
        #[serde(default)]
        x: Option<f32>,
        #[serde(default)]
        y: Option<f32>,
        #[serde(default)]
        angle: Option<f32>,
        #[serde(default)]
        vx: Option<f32>,
        #[serde(default)]
        vy: Option<f32>,
    },
    Shoot {
        #[serde(default)]
        x: f32,
        #[serde(default)]
        y: f32,
        #[serde(default)]
        angle: f32,
        #[serde(default = "default_gun")]
        gun: String,
    },
    Hit {
        target: SessionId,
        #[serde(default, deserialize_with = "whole_damage")]
        dmg: Option<u32>,
        #[serde(default, rename = "isSword")]
        is_sword: bool,
    },
    Reload,
    BuyGun {
        gun: String,
    },
    BuySkin {
        skin_id: String,
    },
    SwordSwing {
        #[serde(default)]
        x: f32,
        #[serde(default)]
        y: f32,
        #[serde(default)]
        angle: f32,
    },
    Chat {
        #[serde(default)]
        text: String,
    },
    #[serde(other)]
    Unknown,
}

impl ClientMessage {
    /// Decodes one text frame. Structural failures are returned, never raised.
    pub fn decode(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }
}

/// One row of the end-of-round scoreboard.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoundResult {
    pub pid: SessionId,
    pub name: String,
    pub team: Team,
    pub kills: u32,
    pub deaths: u32,
    pub score: u32,
    pub coins: u32,
}

impl From<&Player> for RoundResult {
    fn from(player: &Player) -> Self {
        Self {
            pid: player.pid,
            name: player.name.clone(),
            team: player.team,
            kills: player.kills,
            deaths: player.deaths,
            score: player.score,
            coins: player.coins,
        }
    }
}

/// Messages sent by the server, either as direct replies or room fan-out.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ServerMessage {
    Connected {
        pid: SessionId,
    },
    Welcome {
        pid: SessionId,
        code: String,
        players: BTreeMap<String, Player>,
        shop: Shop,
    },
    RoomCreated {
        pid: SessionId,
        code: String,
        player: Player,
        shop: Shop,
        kill_goal: u32,
    },
    RoomJoined {
        pid: SessionId,
        code: String,
        state: Phase,
        player: Player,
        players: BTreeMap<String, Player>,
        shop: Shop,
        kill_goal: u32,
    },
    JoinError {
        msg: String,
    },
    PlayerJoined {
        player: Player,
    },
    PlayerLeft {
        pid: SessionId,
    },
    HostChanged {
        pid: SessionId,
    },
    GameStarted {
        kill_goal: u32,
        round_ends: f64,
        players: BTreeMap<String, Player>,
    },
    State {
        pid: SessionId,
        x: f32,
        y: f32,
        angle: f32,
        vx: f32,
        vy: f32,
    },
    Shoot {
        pid: SessionId,
        x: f32,
        y: f32,
        angle: f32,
        gun: String,
    },
    Kill {
        killer_pid: SessionId,
        victim_pid: SessionId,
        killer_name: String,
        victim_name: String,
        killer_team: Team,
        weapon: String,
        #[serde(rename = "skinColor")]
        skin_color: Option<&'static str>,
        attacker_kills: u32,
        attacker_score: u32,
        attacker_coins: u32,
        victim_deaths: u32,
    },
    Damaged {
        pid: SessionId,
        hp: u32,
        shield: u32,
    },
    Respawn {
        pid: SessionId,
    },
    RoundEnd {
        winner_pid: Option<SessionId>,
        winner_name: String,
        results: Vec<RoundResult>,
    },
    ReturnToLobby {
        room: String,
    },
    Reloaded {
        ammo: u32,
    },
    ShopResult {
        success: bool,
        #[serde(skip_serializing_if = "Option::is_none")]
        gun: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        ammo: Option<u32>,
        coins: u32,
        msg: String,
    },
    SkinResult {
        success: bool,
        #[serde(skip_serializing_if = "Option::is_none")]
        skin_id: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        weapon: Option<&'static str>,
        #[serde(skip_serializing_if = "Option::is_none")]
        color: Option<&'static str>,
        coins: u32,
        msg: String,
    },
    SwordSwing {
        pid: SessionId,
        x: f32,
        y: f32,
        angle: f32,
        #[serde(rename = "skinColor")]
        skin_color: Option<&'static str>,
        cooldown: f64,
    },
    SwordAllowed {
        cooldown: f64,
    },
    SwordDenied {
        remaining: f64,
        msg: String,
    },
    Chat {
        pid: SessionId,
        name: String,
        text: String,
    },
    /// Human-readable rejection of a request that has no dedicated result.
    Error {
        msg: String,
    },
}

impl ServerMessage {
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}
