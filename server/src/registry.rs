//! Connection registry: session handle to outbound transport.
//!
//! Each upgraded connection owns a writer task draining a bounded queue of
//! encoded text messages into its socket. The registry keeps the sending half
//! of that queue. Pushing onto a queue never blocks, so a slow socket cannot
//! stall whoever holds the game lock. A queue whose writer has died, or that
//! a client stopped reading until it filled up, reports the failure through
//! `send_to` instead.

use log::{info, warn};
use shared::SessionId;
use std::collections::BTreeMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;

/// Outbound half of a connection's write queue.
pub type Outbound = mpsc::Sender<Arc<str>>;

/// A registered connection.
#[derive(Debug)]
pub struct Connection {
    pub id: SessionId,
    pub addr: SocketAddr,
    pub connected_at: Instant,
    sender: Outbound,
}

impl Connection {
    pub fn new(id: SessionId, addr: SocketAddr, sender: Outbound) -> Self {
        Self {
            id,
            addr,
            connected_at: Instant::now(),
            sender,
        }
    }

    /// Queues a message. Fails when the writer side has gone away or the
    /// queue is full.
    pub fn send(&self, message: &Arc<str>) -> bool {
        match self.sender.try_send(Arc::clone(message)) {
            Ok(()) => true,
            Err(TrySendError::Full(_)) => {
                warn!("Session {}: outbound queue full", self.id);
                false
            }
            Err(TrySendError::Closed(_)) => false,
        }
    }
}

/// Tracks every live connection and hands out session handles.
///
/// Handles start at 1 and are never reused during the life of the process.
pub struct ConnectionRegistry {
    connections: BTreeMap<SessionId, Connection>,
    next_session_id: SessionId,
    max_clients: usize,
}

impl ConnectionRegistry {
    pub fn new(max_clients: usize) -> Self {
        Self {
            connections: BTreeMap::new(),
            next_session_id: 1,
            max_clients,
        }
    }

    /// Registers a freshly upgraded connection.
    ///
    /// Returns `None` when the server is at capacity.
    pub fn register(&mut self, addr: SocketAddr, sender: Outbound) -> Option<SessionId> {
        if self.connections.len() >= self.max_clients {
            return None;
        }

        let id = self.next_session_id;
        self.next_session_id = self.next_session_id.wrapping_add(1).max(1);

        info!("Session {} connected from {}", id, addr);
        self.connections.insert(id, Connection::new(id, addr, sender));
        Some(id)
    }

    /// Forgets a connection. Returns false if it was already gone.
    pub fn unregister(&mut self, id: SessionId) -> bool {
        if let Some(connection) = self.connections.remove(&id) {
            info!(
                "Session {} unregistered after {:.1}s",
                id,
                connection.connected_at.elapsed().as_secs_f32()
            );
            true
        } else {
            false
        }
    }

    /// Queues a message for one session. Unknown handles, dead writers and
    /// full queues all report `false`; nothing is raised to the caller.
    pub fn send_to(&self, id: SessionId, message: &Arc<str>) -> bool {
        self.connections
            .get(&id)
            .map(|connection| connection.send(message))
            .unwrap_or(false)
    }

    /// Visits every registered connection in ascending handle order.
    pub fn for_each_connection<F>(&self, mut f: F)
    where
        F: FnMut(&Connection),
    {
        for connection in self.connections.values() {
            f(connection);
        }
    }

    pub fn contains(&self, id: SessionId) -> bool {
        self.connections.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.connections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.connections.is_empty()
    }
}
