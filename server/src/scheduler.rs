//! Delayed work: respawns, round deadlines and the return to the lobby.
//!
//! A task carries only identifiers. When its delay elapses it takes the game
//! lock and re-checks that the room, phase and round it was created for still
//! hold; otherwise it does nothing. Tasks are never cancelled early.

use crate::game::GameState;
use log::debug;
use shared::SessionId;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;

/// The single lock guarding players, rooms and connections.
pub type SharedState = Arc<Mutex<GameState>>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScheduledTask {
    /// Bring a dead player back if they are still dead in the same room.
    Respawn { pid: SessionId, room: String },
    /// End the round on time if nobody reached the kill goal first.
    RoundDeadline { room: String, round: u64 },
    /// Put an ended room back into its lobby.
    ResetRoom { room: String, round: u64 },
}

/// A task and how long to wait before running it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Scheduled {
    pub delay: Duration,
    pub task: ScheduledTask,
}

impl Scheduled {
    pub fn after(delay: Duration, task: ScheduledTask) -> Self {
        Self { delay, task }
    }
}

/// Spawns a worker that sleeps, runs the task under the lock and schedules
/// whatever follow-up work the task produced.
pub fn schedule(state: SharedState, scheduled: Scheduled) {
    tokio::spawn(async move {
        tokio::time::sleep(scheduled.delay).await;
        debug!("Running {:?}", scheduled.task);
        let follow_ups = {
            let mut guard = state.lock().await;
            guard.run_scheduled(scheduled.task)
        };
        schedule_all(&state, follow_ups);
    });
}

pub fn schedule_all(state: &SharedState, tasks: Vec<Scheduled>) {
    for task in tasks {
        schedule(Arc::clone(state), task);
    }
}
