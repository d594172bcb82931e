//! TCP listener and per-connection tasks.
//!
//! Every accepted socket gets one task that reads the HTTP request head and
//! either serves the game document or upgrades to framed messaging. An
//! upgraded connection is split: the reading task decodes frames and routes
//! them under the game lock, while a writer task drains the connection's
//! outbound queue into the socket.

use crate::config::{GameConfig, ServerConfig};
use crate::error::{FrameError, HandshakeError};
use crate::frame::{decode_frame, encode_frame, Frame};
use crate::game::GameState;
use crate::handshake::{
    document_response, error_response, read_request, upgrade_response, FALLBACK_DOCUMENT,
};
use crate::router;
use crate::scheduler::{schedule_all, SharedState};
use log::{debug, error, info, warn};
use shared::SessionId;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::io::{AsyncWriteExt, BufReader};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{mpsc, Mutex};

/// Accepts connections and owns the shared game state.
pub struct Server {
    listener: TcpListener,
    state: SharedState,
    document: Arc<[u8]>,
    queue_capacity: usize,
}

impl Server {
    pub async fn new(config: ServerConfig) -> Result<Self, Box<dyn std::error::Error>> {
        let listener = TcpListener::bind(&config.address).await?;
        info!("Server listening on {}", listener.local_addr()?);

        let document: Arc<[u8]> = match &config.document {
            Some(path) => match tokio::fs::read(path).await {
                Ok(bytes) => bytes.into(),
                Err(e) => {
                    warn!("Could not read {}: {}, serving placeholder", path.display(), e);
                    FALLBACK_DOCUMENT.into()
                }
            },
            None => FALLBACK_DOCUMENT.into(),
        };

        Ok(Self {
            listener,
            queue_capacity: config.game.outbound_queue.max(1),
            state: Arc::new(Mutex::new(GameState::new(config.game))),
            document,
        })
    }

    /// Binds with the given rules and the placeholder document.
    pub async fn bind(address: &str, game: GameConfig) -> Result<Self, Box<dyn std::error::Error>> {
        let mut config = ServerConfig::new(address);
        config.game = game;
        Self::new(config).await
    }

    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    pub fn state(&self) -> SharedState {
        Arc::clone(&self.state)
    }

    /// Accept loop. Runs until the listener itself fails.
    pub async fn run(self) -> Result<(), Box<dyn std::error::Error>> {
        loop {
            let (stream, addr) = match self.listener.accept().await {
                Ok(accepted) => accepted,
                Err(e) => {
                    error!("Failed to accept connection: {}", e);
                    continue;
                }
            };
            if let Err(e) = stream.set_nodelay(true) {
                debug!("Could not disable Nagle for {}: {}", addr, e);
            }

            let state = Arc::clone(&self.state);
            let document = Arc::clone(&self.document);
            let queue_capacity = self.queue_capacity;
            tokio::spawn(async move {
                if let Err(e) =
                    handle_connection(stream, addr, state, document, queue_capacity).await
                {
                    debug!("Connection from {} ended during handshake: {}", addr, e);
                }
            });
        }
    }
}

async fn handle_connection(
    stream: TcpStream,
    addr: SocketAddr,
    state: SharedState,
    document: Arc<[u8]>,
    queue_capacity: usize,
) -> Result<(), HandshakeError> {
    let (read_half, mut write_half) = stream.into_split();
    let mut reader = BufReader::new(read_half);

    let request = match read_request(&mut reader).await {
        Ok(request) => request,
        Err(e @ HandshakeError::Io(_)) => return Err(e),
        Err(e) => {
            write_half
                .write_all(&error_response("400 Bad Request"))
                .await?;
            return Err(e);
        }
    };

    if !request.is_upgrade() {
        debug!("{} {} from {}", request.method, request.path, addr);
        write_half.write_all(&document_response(&document)).await?;
        write_half.shutdown().await?;
        return Ok(());
    }

    let key = match request.websocket_key() {
        Ok(key) => key.to_string(),
        Err(e) => {
            write_half
                .write_all(&error_response("400 Bad Request"))
                .await?;
            return Err(e);
        }
    };

    let (sender, receiver) = mpsc::channel(queue_capacity);
    let registered = state.lock().await.connect(addr, sender);
    let Some(id) = registered else {
        warn!("Refusing {}: server full", addr);
        write_half
            .write_all(&error_response("503 Service Unavailable"))
            .await?;
        return Ok(());
    };

    // The upgrade response goes out ahead of anything already queued.
    tokio::spawn(write_loop(write_half, upgrade_response(&key), receiver, id));
    read_loop(reader, id, &state).await;
    state.lock().await.remove_session(id);
    Ok(())
}

async fn write_loop(
    mut writer: OwnedWriteHalf,
    handshake: String,
    mut receiver: mpsc::Receiver<Arc<str>>,
    id: SessionId,
) {
    if let Err(e) = writer.write_all(handshake.as_bytes()).await {
        warn!("Session {}: failed to send upgrade response: {}", id, e);
        return;
    }
    while let Some(message) = receiver.recv().await {
        if let Err(e) = writer.write_all(&encode_frame(message.as_bytes())).await {
            warn!("Session {}: write failed: {}", id, e);
            return;
        }
    }
    let _ = writer.shutdown().await;
}

async fn read_loop(mut reader: BufReader<OwnedReadHalf>, id: SessionId, state: &SharedState) {
    loop {
        let text = match decode_frame(&mut reader).await {
            Ok(Frame::Text(text)) => text,
            Ok(Frame::Ignored) => continue,
            Ok(Frame::Close) => {
                debug!("Session {} sent close", id);
                return;
            }
            Err(FrameError::PayloadTooLarge(len)) => {
                warn!("Session {}: skipped oversized frame of {} bytes", id, len);
                continue;
            }
            Err(FrameError::Io(e)) => {
                debug!("Session {} read ended: {}", id, e);
                return;
            }
        };

        let timers = {
            let mut guard = state.lock().await;
            if !guard.is_connected(id) {
                // Pruned by a failed broadcast while we were reading.
                return;
            }
            router::route_text(&mut guard, id, &text)
        };
        schedule_all(state, timers);
    }
}
