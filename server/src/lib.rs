//! # Arena Server Library
//!
//! This library provides the authoritative server for the arena shooter. It
//! accepts browser connections over a raw TCP socket, upgrades them to framed
//! text messaging, groups players into rooms and keeps the single source of
//! truth for every player's position, health, inventory and score.
//!
//! ## Core Responsibilities
//!
//! ### Wire Protocol
//! Frames are encoded and decoded by hand on top of the byte stream
//! (`frame`), after a one-time HTTP upgrade handshake (`handshake`). Plain
//! HTTP requests are answered with the game document instead.
//!
//! ### Room Lifecycle
//! Rooms move from lobby to an active round, to a scoreboard, and back to
//! the lobby. A round ends when a player reaches the kill goal or when the
//! round deadline passes, whichever happens first.
//!
//! ### Authoritative Combat
//! Hits, kills, respawns and the sword cooldown are resolved on the server.
//! Clients only report what they saw; the server decides what happened and
//! tells the room.
//!
//! ## Architecture Design
//!
//! ### One Lock
//! All state lives in [`game::GameState`] behind a single
//! `tokio::sync::Mutex` ([`scheduler::SharedState`]). Every handler runs to
//! completion while holding it, so concurrent events on the same player are
//! applied one at a time.
//!
//! ### Queued Writes
//! Each connection has an outbound queue drained by its own writer task.
//! Handlers only push onto queues while holding the lock, so a slow socket
//! never stalls the rest of the server. A closed queue is how a dead
//! connection is noticed on the write side.
//!
//! ### Delayed Work
//! Respawns, round deadlines and lobby resets are scheduled tasks that carry
//! only identifiers. When they wake they re-check the room, its phase and
//! its round number, and do nothing if the world has moved on.
//!
//! ## Module Organization
//!
//! - `frame`, `handshake`: the wire protocol.
//! - `registry`: session handles and their outbound queues.
//! - `player`, `room`: player records and the room book.
//! - `game`: the state owner, plus its handlers in `lobby`, `combat`,
//!   `shop`, `relay` and fan-out in `broadcast`.
//! - `router`: decoded client message to handler.
//! - `scheduler`: delayed tasks.
//! - `network`: the listener and per-connection tasks.
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use server::config::ServerConfig;
//! use server::network::Server;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let server = Server::new(ServerConfig::new("127.0.0.1:7373")).await?;
//!     server.run().await
//! }
//! ```

pub mod broadcast;
pub mod combat;
pub mod config;
pub mod error;
pub mod frame;
pub mod game;
pub mod handshake;
pub mod lobby;
pub mod network;
pub mod player;
pub mod registry;
pub mod relay;
pub mod room;
pub mod router;
pub mod scheduler;
pub mod shop;
pub mod utils;

#[cfg(test)]
mod testing;

pub use game::GameState;
pub use scheduler::SharedState;
