use rand::Rng;
use server::frame::{decode_frame, encode_masked_frame, Frame, OPCODE_CLOSE, OPCODE_TEXT};
use server::handshake::accept_key;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;
use tokio::time::{sleep, timeout};

// Sends one masked text frame
async fn send_json<W: AsyncWrite + Unpin>(
    writer: &mut W,
    json: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let key: [u8; 4] = rand::thread_rng().gen();
    writer
        .write_all(&encode_masked_frame(OPCODE_TEXT, json.as_bytes(), key))
        .await?;
    println!("-> {}", json);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let server_addr = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "127.0.0.1:7373".to_string());

    println!("Connecting to {}", server_addr);
    let stream = TcpStream::connect(&server_addr).await?;
    let (read_half, mut write_half) = stream.into_split();
    let mut reader = BufReader::new(read_half);

    // Upgrade handshake
    let client_key = "dGhlIHNhbXBsZSBub25jZQ==";
    let request = format!(
        "GET /ws HTTP/1.1\r\nHost: {}\r\nUpgrade: websocket\r\nConnection: Upgrade\r\n\
         Sec-WebSocket-Key: {}\r\nSec-WebSocket-Version: 13\r\n\r\n",
        server_addr, client_key
    );
    write_half.write_all(request.as_bytes()).await?;

    let mut status = String::new();
    reader.read_line(&mut status).await?;
    println!("Server replied: {}", status.trim_end());
    let expected = format!("sec-websocket-accept: {}", accept_key(client_key));
    let mut accepted = false;
    loop {
        let mut line = String::new();
        if reader.read_line(&mut line).await? == 0 || line == "\r\n" {
            break;
        }
        if line.trim_end().eq_ignore_ascii_case(&expected) {
            accepted = true;
        }
    }
    if !accepted {
        println!("Handshake failed: accept token missing or wrong");
        return Ok(());
    }

    send_json(
        &mut write_half,
        r#"{"type":"createRoom","name":"tester","team":"red"}"#,
    )
    .await?;

    // Print whatever the server sends while we chat once a second
    let printer = tokio::spawn(async move {
        loop {
            match decode_frame(&mut reader).await {
                Ok(Frame::Text(text)) => println!("<- {}", text),
                Ok(Frame::Ignored) => {}
                Ok(Frame::Close) => {
                    println!("Server closed the connection");
                    break;
                }
                Err(e) => {
                    println!("Read ended: {}", e);
                    break;
                }
            }
        }
    });

    for i in 0..5 {
        sleep(Duration::from_secs(1)).await;
        send_json(
            &mut write_half,
            &format!(r#"{{"type":"chat","text":"ping {}"}}"#, i),
        )
        .await?;
    }

    let key: [u8; 4] = rand::thread_rng().gen();
    write_half
        .write_all(&encode_masked_frame(OPCODE_CLOSE, &[], key))
        .await?;
    let _ = timeout(Duration::from_secs(1), printer).await;
    println!("Test client finished");
    Ok(())
}
