//! Message router: one decoded client message, one handler.

use crate::error::RoomError;
use crate::game::GameState;
use crate::relay::Movement;
use crate::scheduler::Scheduled;
use crate::utils::get_timestamp;
use log::debug;
use shared::{ClientMessage, ServerMessage, SessionId};

/// Decodes one text frame and routes it. Undecodable input is dropped.
pub fn route_text(state: &mut GameState, id: SessionId, text: &str) -> Vec<Scheduled> {
    match ClientMessage::decode(text) {
        Ok(message) => route(state, id, message),
        Err(e) => {
            debug!("Dropping malformed message from session {}: {}", id, e);
            Vec::new()
        }
    }
}

/// Dispatches a message from `id` to its handler. Returns delayed work for
/// the caller to schedule once the lock is released.
pub fn route(state: &mut GameState, id: SessionId, message: ClientMessage) -> Vec<Scheduled> {
    if !state.is_connected(id) {
        debug!("Ignoring message from unregistered session {}", id);
        return Vec::new();
    }

    match message {
        ClientMessage::CreateRoom { name, team, skin } => {
            state.create_room(id, name.as_deref(), team.as_deref(), skin.as_deref());
        }
        ClientMessage::JoinRoom {
            code,
            name,
            team,
            skin,
        } => {
            state.join_room(id, &code, name.as_deref(), team.as_deref(), skin.as_deref());
        }
        ClientMessage::Join { name, team, skin } => {
            state.legacy_join(id, name.as_deref(), team.as_deref(), skin.as_deref());
        }
        ClientMessage::StartGame => return state.start_game(id),
        ClientMessage::State {
            x,
            y,
            angle,
            vx,
            vy,
        } => state.update_state(
            id,
            Movement {
                x,
                y,
                angle,
                vx,
                vy,
            },
        ),
        ClientMessage::Shoot { x, y, angle, gun } => state.shoot(id, x, y, angle, gun),
        ClientMessage::Hit {
            target,
            dmg,
            is_sword,
        } => {
            if require_room(state, id) {
                return state.apply_hit(id, target, dmg, is_sword).1;
            }
        }
        ClientMessage::SwordSwing { x, y, angle } => {
            if require_room(state, id) {
                state.sword_swing(id, x, y, angle, get_timestamp());
            }
        }
        ClientMessage::Reload => {
            if require_room(state, id) {
                state.reload(id);
            }
        }
        ClientMessage::BuyGun { gun } => {
            if require_room(state, id) {
                state.buy_gun(id, &gun);
            }
        }
        ClientMessage::BuySkin { skin_id } => {
            if require_room(state, id) {
                state.buy_skin(id, &skin_id);
            }
        }
        ClientMessage::Chat { text } => {
            if require_room(state, id) {
                state.chat(id, &text);
            }
        }
        ClientMessage::Unknown => debug!("Ignoring unknown message type from session {}", id),
    }
    Vec::new()
}

/// Tells the sender it must be in a room first.
fn require_room(state: &GameState, id: SessionId) -> bool {
    if state.rooms().room_code_of(id).is_some() {
        return true;
    }
    state.send_to(
        id,
        &ServerMessage::Error {
            msg: RoomError::NotInRoom.to_string(),
        },
    );
    false
}
