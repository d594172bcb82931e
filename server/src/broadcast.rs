//! Broadcast dispatcher.
//!
//! A message is serialised once and the same `Arc<str>` is queued for every
//! recipient. Recipients are computed and queued while the game lock is held;
//! the socket writes happen later in each connection's writer task, so one
//! slow client never holds up the others. A failed queue means the writer is
//! gone or the client stopped reading, and the session is torn down once the
//! pass is over.

use crate::game::GameState;
use log::{error, warn};
use shared::{ServerMessage, SessionId};
use std::sync::Arc;

fn encode(message: &ServerMessage) -> Option<Arc<str>> {
    match message.to_json() {
        Ok(json) => Some(Arc::from(json)),
        Err(e) => {
            error!("Failed to serialize outbound message: {}", e);
            None
        }
    }
}

impl GameState {
    /// Sends a message to one session. Returns false if it could not be queued.
    pub fn send_to(&self, id: SessionId, message: &ServerMessage) -> bool {
        match encode(message) {
            Some(encoded) => self.registry.send_to(id, &encoded),
            None => false,
        }
    }

    /// Fans a message out to every registered session, or only to members of
    /// `room` when given, skipping `exclude`. Sessions whose queue is closed
    /// or full are removed along with their player and room membership.
    pub fn broadcast(
        &mut self,
        message: &ServerMessage,
        exclude: Option<SessionId>,
        room: Option<&str>,
    ) {
        let Some(encoded) = encode(message) else {
            return;
        };

        let rooms = &self.rooms;
        let mut failed = Vec::new();
        self.registry.for_each_connection(|connection| {
            let id = connection.id;
            if Some(id) == exclude {
                return;
            }
            if let Some(code) = room {
                if rooms.room_code_of(id) != Some(code) {
                    return;
                }
            }
            if !connection.send(&encoded) {
                failed.push(id);
            }
        });

        for id in failed {
            warn!("Dropping session {}: outbound queue closed or full", id);
            self.remove_session(id);
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::config::GameConfig;
    use crate::testing::Harness;
    use shared::ServerMessage;

    #[test]
    fn test_broadcast_room_scope_and_exclude() {
        let mut h = Harness::new();
        let a = h.connect();
        let code = h.create_room(a);
        let b = h.connect();
        h.join_room(b, &code);
        let c = h.connect();
        let other = h.create_room(c);
        assert_ne!(code, other);
        h.drain_all();

        h.state
            .broadcast(&ServerMessage::Respawn { pid: a }, Some(a), Some(&code));
        assert!(h.types(a).is_empty());
        assert_eq!(h.types(b), vec!["respawn"]);
        assert!(h.types(c).is_empty());
    }

    #[test]
    fn test_broadcast_everyone() {
        let mut h = Harness::new();
        let a = h.connect();
        let b = h.connect();
        h.drain_all();

        h.state.broadcast(&ServerMessage::Respawn { pid: 9 }, None, None);
        assert_eq!(h.types(a), vec!["respawn"]);
        assert_eq!(h.types(b), vec!["respawn"]);
    }

    #[test]
    fn test_broadcast_prunes_dead_writer() {
        let mut h = Harness::new();
        let a = h.connect();
        let code = h.create_room(a);
        let b = h.connect();
        h.join_room(b, &code);
        h.drain_all();

        h.kill_writer(b);
        h.state.broadcast(&ServerMessage::Respawn { pid: a }, None, Some(&code));

        assert!(!h.state.is_connected(b));
        assert!(h.state.players().get(b).is_none());
        assert!(!h.state.rooms().get(&code).unwrap().members.contains(&b));
        assert_eq!(h.types(a), vec!["respawn", "playerLeft"]);
    }

    #[test]
    fn test_broadcast_prunes_stalled_reader() {
        let mut h = Harness::with_config(GameConfig {
            outbound_queue: 4,
            ..GameConfig::default()
        });
        let a = h.connect();
        let code = h.create_room(a);
        let b = h.connect();
        h.join_room(b, &code);
        h.drain_all();

        // `b` never reads; `a` keeps up.
        for _ in 0..4 {
            h.state.broadcast(&ServerMessage::Respawn { pid: a }, None, Some(&code));
            h.drain(a);
        }
        assert!(h.state.is_connected(b));

        h.state.broadcast(&ServerMessage::Respawn { pid: a }, None, Some(&code));
        assert!(!h.state.is_connected(b));
        assert!(h.state.players().get(b).is_none());
        assert_eq!(h.types(a), vec!["respawn", "playerLeft"]);
    }

    #[test]
    fn test_pruning_host_promotes_survivor() {
        let mut h = Harness::new();
        let a = h.connect();
        let code = h.create_room(a);
        let b = h.connect();
        h.join_room(b, &code);
        h.drain_all();

        h.kill_writer(a);
        h.state.broadcast(&ServerMessage::Respawn { pid: b }, None, Some(&code));
        assert_eq!(h.state.rooms().get(&code).unwrap().host, b);
        assert_eq!(h.types(b), vec!["respawn", "playerLeft", "hostChanged"]);
    }

    #[test]
    fn test_send_to_unknown_session() {
        let h = Harness::new();
        assert!(!h.state.send_to(77, &ServerMessage::Respawn { pid: 1 }));
    }
}
