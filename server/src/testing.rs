//! In-process harness for unit tests: a `GameState` whose sessions write into
//! local queues instead of sockets.

use crate::config::GameConfig;
use crate::game::GameState;
use serde_json::Value;
use shared::{ClientMessage, SessionId};
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::mpsc::{self, Receiver};

pub fn addr() -> SocketAddr {
    "127.0.0.1:7373".parse().unwrap()
}

pub struct Harness {
    pub state: GameState,
    inboxes: HashMap<SessionId, Receiver<Arc<str>>>,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_config(GameConfig::default())
    }

    pub fn with_config(config: GameConfig) -> Self {
        Self {
            state: GameState::new(config),
            inboxes: HashMap::new(),
        }
    }

    pub fn connect(&mut self) -> SessionId {
        let (tx, rx) = mpsc::channel(self.state.config().outbound_queue.max(1));
        let id = self.state.connect(addr(), tx).unwrap();
        self.inboxes.insert(id, rx);
        id
    }

    /// Simulates a writer task that died: later sends to `id` fail.
    pub fn kill_writer(&mut self, id: SessionId) {
        self.inboxes.remove(&id);
    }

    pub fn create_room(&mut self, host: SessionId) -> String {
        self.state.create_room(host, Some("host"), None, None);
        self.state.rooms().room_code_of(host).unwrap().to_string()
    }

    pub fn join_room(&mut self, id: SessionId, code: &str) {
        self.state.join_room(id, code, Some("guest"), None, None);
        assert_eq!(self.state.rooms().room_code_of(id), Some(code));
    }

    pub fn send(&mut self, id: SessionId, message: ClientMessage) {
        crate::router::route(&mut self.state, id, message);
    }

    /// Everything queued for `id` since the last drain, decoded as JSON.
    pub fn drain(&mut self, id: SessionId) -> Vec<Value> {
        let mut out = Vec::new();
        if let Some(rx) = self.inboxes.get_mut(&id) {
            while let Ok(text) = rx.try_recv() {
                out.push(serde_json::from_str(&text).unwrap());
            }
        }
        out
    }

    pub fn drain_all(&mut self) {
        let ids: Vec<_> = self.inboxes.keys().copied().collect();
        for id in ids {
            self.drain(id);
        }
    }

    pub fn types(&mut self, id: SessionId) -> Vec<String> {
        self.drain(id)
            .into_iter()
            .map(|v| v["type"].as_str().unwrap_or_default().to_string())
            .collect()
    }

    /// Drains `id` and returns the first message of the given type.
    pub fn find(&mut self, id: SessionId, kind: &str) -> Option<Value> {
        self.drain(id).into_iter().find(|v| v["type"] == kind)
    }
}
