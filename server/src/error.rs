//! Error types for the transport and match layers.
//!
//! Transport errors end a single connection. Room errors are rule violations
//! whose `Display` text is sent back to the requesting client.

use std::io;

/// Failures while decoding a frame from the byte stream.
#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    /// The stream failed or closed mid-frame.
    #[error("transport error: {0}")]
    Io(#[from] io::Error),

    /// The declared payload exceeded the limit and was skipped.
    #[error("frame payload of {0} bytes exceeds limit")]
    PayloadTooLarge(u64),
}

/// Failures while reading the HTTP upgrade request.
#[derive(Debug, thiserror::Error)]
pub enum HandshakeError {
    #[error("transport error: {0}")]
    Io(#[from] io::Error),

    #[error("request head exceeds {0} bytes")]
    HeaderTooLarge(usize),

    #[error("malformed request line: {0:?}")]
    Malformed(String),

    #[error("upgrade request without Sec-WebSocket-Key")]
    MissingKey,
}

/// Rule violations in the room lifecycle.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RoomError {
    #[error("Room '{0}' not found")]
    NotFound(String),

    #[error("Round just ended, wait a moment")]
    RoundEnded,

    #[error("You are not in a room")]
    NotInRoom,

    #[error("Only the host can start the game")]
    NotHost,

    #[error("Room is not in the lobby")]
    WrongPhase,

    #[error("No room codes available, try again later")]
    CodeSpaceExhausted,
}
