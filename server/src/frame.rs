//! Frame codec for the upgraded byte stream.
//!
//! Inbound frames carry a 2 byte header, an optional 16 or 64 bit extended
//! length, an optional 4 byte masking key and the payload. Outbound frames
//! are always single, final, unmasked text frames.

use crate::error::FrameError;
use std::io;
use tokio::io::{AsyncRead, AsyncReadExt};

pub const OPCODE_CONTINUATION: u8 = 0x0;
pub const OPCODE_TEXT: u8 = 0x1;
pub const OPCODE_BINARY: u8 = 0x2;
pub const OPCODE_CLOSE: u8 = 0x8;
pub const OPCODE_PING: u8 = 0x9;
pub const OPCODE_PONG: u8 = 0xA;

const FIN: u8 = 0x80;
const MASK_BIT: u8 = 0x80;

/// Largest payload accepted from a client. Bigger frames are skipped.
pub const MAX_PAYLOAD_LEN: u64 = 1 << 20;

/// Result of reading one frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    /// UTF-8 text, invalid sequences replaced.
    Text(String),
    /// Ping, pong, binary or continuation: nothing to route.
    Ignored,
    /// The peer asked to close the connection.
    Close,
}

/// Reads exactly one frame. Partial reads are retried by `read_exact`
/// until the full frame is available or the stream ends.
pub async fn decode_frame<R>(reader: &mut R) -> Result<Frame, FrameError>
where
    R: AsyncRead + Unpin,
{
    let mut header = [0u8; 2];
    reader.read_exact(&mut header).await?;

    let opcode = header[0] & 0x0F;
    let masked = header[1] & MASK_BIT != 0;
    let len = match header[1] & 0x7F {
        126 => {
            let mut ext = [0u8; 2];
            reader.read_exact(&mut ext).await?;
            u16::from_be_bytes(ext) as u64
        }
        127 => {
            let mut ext = [0u8; 8];
            reader.read_exact(&mut ext).await?;
            u64::from_be_bytes(ext)
        }
        n => n as u64,
    };

    let mask = if masked {
        let mut key = [0u8; 4];
        reader.read_exact(&mut key).await?;
        Some(key)
    } else {
        None
    };

    if len > MAX_PAYLOAD_LEN {
        // Drain the payload so the next header lines up.
        let skipped = tokio::io::copy(&mut (&mut *reader).take(len), &mut tokio::io::sink()).await?;
        if skipped < len {
            return Err(io::Error::from(io::ErrorKind::UnexpectedEof).into());
        }
        return Err(FrameError::PayloadTooLarge(len));
    }

    let mut payload = vec![0u8; len as usize];
    reader.read_exact(&mut payload).await?;
    if let Some(key) = mask {
        apply_mask(&mut payload, key);
    }

    Ok(match opcode {
        OPCODE_CLOSE => Frame::Close,
        OPCODE_TEXT => Frame::Text(String::from_utf8_lossy(&payload).into_owned()),
        _ => Frame::Ignored,
    })
}

/// XORs every byte with `key[i % 4]`. Masking and unmasking are the same.
pub fn apply_mask(payload: &mut [u8], key: [u8; 4]) {
    for (i, byte) in payload.iter_mut().enumerate() {
        *byte ^= key[i % 4];
    }
}

/// Encodes a final, unmasked text frame.
pub fn encode_frame(payload: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(payload.len() + 10);
    write_header(&mut out, OPCODE_TEXT, false, payload.len() as u64);
    out.extend_from_slice(payload);
    out
}

/// Encodes a masked frame the way a client must send it.
pub fn encode_masked_frame(opcode: u8, payload: &[u8], key: [u8; 4]) -> Vec<u8> {
    let mut out = Vec::with_capacity(payload.len() + 14);
    write_header(&mut out, opcode, true, payload.len() as u64);
    out.extend_from_slice(&key);
    let start = out.len();
    out.extend_from_slice(payload);
    apply_mask(&mut out[start..], key);
    out
}

fn write_header(out: &mut Vec<u8>, opcode: u8, masked: bool, len: u64) {
    let mask_bit = if masked { MASK_BIT } else { 0 };
    out.push(FIN | opcode);
    if len < 126 {
        out.push(mask_bit | len as u8);
    } else if len <= u16::MAX as u64 {
        out.push(mask_bit | 126);
        out.extend_from_slice(&(len as u16).to_be_bytes());
    } else {
        out.push(mask_bit | 127);
        out.extend_from_slice(&len.to_be_bytes());
    }
}
