//! Line-delimited JSON command server.
//!
//! Each client sends one [`Command`](crate::protocol::Command) per line and
//! gets one [`CommandResponse`](crate::protocol::CommandResponse) per line back.

use crate::protocol::{CommandResponse, ProtocolError, ProtocolHandler, MAX_COMMAND_SIZE};
use crate::simulator::BusSimulator;
use std::sync::Arc;
use thiserror::Error;
use tokio::io::{
    AsyncBufRead, AsyncBufReadExt, AsyncReadExt, AsyncWrite, AsyncWriteExt, BufReader,
};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

pub type SharedSimulator = Arc<Mutex<BusSimulator>>;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),
}

/// Accepts clients until the task is aborted. A failing client is logged and
/// dropped without affecting the others.
pub async fn serve(listener: TcpListener, simulator: SharedSimulator) -> Result<(), ServerError> {
    info!("🌐 TCP server listening on {}", listener.local_addr()?);

    loop {
        match listener.accept().await {
            Ok((stream, addr)) => {
                info!("🔗 New client connected: {}", addr);
                let client_simulator = Arc::clone(&simulator);

                tokio::spawn(async move {
                    if let Err(e) = handle_client(stream, client_simulator).await {
                        warn!("Client {} error: {}", addr, e);
                    }
                    info!("🔌 Client {} disconnected", addr);
                });
            }
            Err(e) => {
                error!("Failed to accept connection: {}", e);
            }
        }
    }
}

/// One line read from a client, capped at [`MAX_COMMAND_SIZE`] bytes.
#[derive(Debug, PartialEq, Eq)]
enum ClientLine {
    Line(String),
    TooLong,
    Closed,
}

/// Reads the next line without ever buffering more than
/// `MAX_COMMAND_SIZE + 1` bytes. An oversized line is consumed up to its
/// newline so the connection stays usable for the next command.
async fn read_client_line<R>(
    reader: &mut R,
    buf: &mut Vec<u8>,
) -> Result<ClientLine, ServerError>
where
    R: AsyncBufRead + Unpin,
{
    let limit = (MAX_COMMAND_SIZE + 1) as u64;

    buf.clear();
    let read = (&mut *reader).take(limit).read_until(b'\n', buf).await?;
    if read == 0 {
        return Ok(ClientLine::Closed);
    }

    if buf.len() > MAX_COMMAND_SIZE && buf.last() != Some(&b'\n') {
        loop {
            buf.clear();
            let skipped = (&mut *reader).take(limit).read_until(b'\n', buf).await?;
            if skipped == 0 || buf.last() == Some(&b'\n') {
                break;
            }
        }
        return Ok(ClientLine::TooLong);
    }

    Ok(ClientLine::Line(String::from_utf8_lossy(&buf[..]).into_owned()))
}

pub async fn handle_client(
    stream: TcpStream,
    simulator: SharedSimulator,
) -> Result<(), ServerError> {
    let (reader, mut writer) = stream.into_split();
    let mut buf_reader = BufReader::new(reader);
    let mut protocol_handler = ProtocolHandler::new();

    let mut buf = Vec::with_capacity(MAX_COMMAND_SIZE + 1);
    loop {
        let line = match read_client_line(&mut buf_reader, &mut buf).await? {
            ClientLine::Closed => break,
            ClientLine::TooLong => {
                warn!("Dropped command longer than {} bytes", MAX_COMMAND_SIZE);
                let response =
                    protocol_handler.create_parse_error_response(ProtocolError::MessageTooLarge);
                write_response(&mut writer, &mut protocol_handler, &response).await?;
                continue;
            }
            ClientLine::Line(line) => line,
        };

        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }

        let response = match protocol_handler.parse_command(trimmed) {
            Ok(command) => {
                info!("📨 Received command {}: {:?}", command.id, command.command_type);
                let mut simulator_guard = simulator.lock().await;
                simulator_guard.execute_command(command).await
            }
            Err(e) => {
                warn!("Failed to parse command: {}", e);
                protocol_handler.create_parse_error_response(e)
            }
        };

        write_response(&mut writer, &mut protocol_handler, &response).await?;
    }

    Ok(())
}

async fn write_response<W>(
    writer: &mut W,
    protocol_handler: &mut ProtocolHandler,
    response: &CommandResponse,
) -> Result<(), ServerError>
where
    W: AsyncWrite + Unpin,
{
    let response_json = protocol_handler.serialize_response(response)?;
    writer.write_all(response_json.as_bytes()).await?;
    writer.write_all(b"\n").await?;
    debug!("📤 Sent response: {}", response_json);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_oversized_line_is_skipped_whole() {
        let mut input = vec![b'x'; MAX_COMMAND_SIZE * 3];
        input.extend_from_slice(b"\nnext\n");
        let mut reader = BufReader::new(input.as_slice());
        let mut buf = Vec::new();

        let first = read_client_line(&mut reader, &mut buf).await.unwrap();
        assert_eq!(first, ClientLine::TooLong);
        assert!(buf.capacity() <= 2 * (MAX_COMMAND_SIZE + 1));

        let second = read_client_line(&mut reader, &mut buf).await.unwrap();
        assert_eq!(second, ClientLine::Line("next\n".to_string()));

        let third = read_client_line(&mut reader, &mut buf).await.unwrap();
        assert_eq!(third, ClientLine::Closed);
    }

    #[tokio::test]
    async fn test_line_at_size_limit_is_accepted() {
        let mut input = vec![b'y'; MAX_COMMAND_SIZE];
        input.push(b'\n');
        let mut reader = BufReader::new(input.as_slice());
        let mut buf = Vec::new();

        match read_client_line(&mut reader, &mut buf).await.unwrap() {
            ClientLine::Line(line) => assert_eq!(line.trim().len(), MAX_COMMAND_SIZE),
            other => panic!("expected a line, got {:?}", other),
        }
    }
}
