//! Best-effort relays: movement, shots and chat.

use crate::game::GameState;
use crate::utils::truncate_chars;
use shared::{ServerMessage, SessionId, MAX_CHAT_LEN};

/// Client supplied movement sample. Missing position fields keep the old
/// value; missing velocity means standing still.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Movement {
    pub x: Option<f32>,
    pub y: Option<f32>,
    pub angle: Option<f32>,
    pub vx: Option<f32>,
    pub vy: Option<f32>,
}

impl GameState {
    /// Applies a movement sample to a living player and relays the current
    /// pose to the rest of the room. Dead players are relayed unchanged.
    pub fn update_state(&mut self, id: SessionId, movement: Movement) {
        let Some(code) = self.rooms.room_code_of(id).map(str::to_string) else {
            return;
        };
        let Some(player) = self.players.get_mut(id) else {
            return;
        };
        if !player.dead {
            player.x = movement.x.unwrap_or(player.x);
            player.y = movement.y.unwrap_or(player.y);
            player.angle = movement.angle.unwrap_or(player.angle);
            player.vx = movement.vx.unwrap_or(0.0);
            player.vy = movement.vy.unwrap_or(0.0);
        }
        let relay = ServerMessage::State {
            pid: id,
            x: player.x,
            y: player.y,
            angle: player.angle,
            vx: player.vx,
            vy: player.vy,
        };
        self.broadcast(&relay, Some(id), Some(&code));
    }

    /// Relays a shot to the rest of the room and spends one round.
    pub fn shoot(&mut self, id: SessionId, x: f32, y: f32, angle: f32, gun: String) {
        let Some(code) = self.rooms.room_code_of(id).map(str::to_string) else {
            return;
        };
        self.broadcast(
            &ServerMessage::Shoot {
                pid: id,
                x,
                y,
                angle,
                gun,
            },
            Some(id),
            Some(&code),
        );
        if let Some(player) = self.players.get_mut(id) {
            player.ammo = player.ammo.saturating_sub(1);
        }
    }

    /// Room chat, including the sender. Text is capped, never rejected.
    pub fn chat(&mut self, id: SessionId, text: &str) {
        let Some(code) = self.rooms.room_code_of(id).map(str::to_string) else {
            return;
        };
        let name = self
            .players
            .get(id)
            .map(|p| p.name.clone())
            .unwrap_or_else(|| "?".to_string());
        self.broadcast(
            &ServerMessage::Chat {
                pid: id,
                name,
                text: truncate_chars(text, MAX_CHAT_LEN),
            },
            None,
            Some(&code),
        );
    }
}
