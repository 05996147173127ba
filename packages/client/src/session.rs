//! WebSocket client session management.

use chrono::Local;
use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio_tungstenite::{connect_async, tungstenite::protocol::Message};

use crate::{error::ClientError, formatter::MessageFormatter, ui::redisplay_prompt};

/// Run one connection to the relay.
///
/// Lines from `input` are sent as text frames; frames from the relay are
/// printed as they arrive.
///
/// # Returns
///
/// * `Ok(())` - the input channel closed (the user quit)
/// * `Err(ClientError::ConnectionError)` - the handshake failed
/// * `Err(ClientError::ConnectionLost)` - the relay closed or dropped the connection
pub async fn run_client_session(
    url: &str,
    input: &mut mpsc::UnboundedReceiver<String>,
) -> Result<(), ClientError> {
    let (ws_stream, _response) = connect_async(url)
        .await
        .map_err(|e| ClientError::ConnectionError(e.to_string()))?;

    tracing::info!("Connected to relay!");
    println!("\nType messages and press Enter to send. Press Ctrl+C to exit.\n");
    redisplay_prompt();

    let (mut write, mut read) = ws_stream.split();

    // Ends only when the connection is gone
    let mut read_task = tokio::spawn(async move {
        while let Some(message) = read.next().await {
            match message {
                Ok(Message::Text(text)) => {
                    print!(
                        "{}",
                        MessageFormatter::format_frame(text.as_str(), &Local::now())
                    );
                    redisplay_prompt();
                }
                Ok(Message::Binary(data)) => {
                    print!("{}", MessageFormatter::format_binary_message(data.len()));
                    redisplay_prompt();
                }
                Ok(Message::Close(_)) => {
                    tracing::info!("Relay closed the connection");
                    break;
                }
                Err(e) => {
                    tracing::warn!("WebSocket read error: {}", e);
                    break;
                }
                _ => {}
            }
        }
    });

    loop {
        tokio::select! {
            _ = &mut read_task => return Err(ClientError::ConnectionLost),
            line = input.recv() => match line {
                Some(line) => {
                    if let Err(e) = write.send(Message::text(line)).await {
                        tracing::warn!("Failed to send message: {}", e);
                        read_task.abort();
                        return Err(ClientError::ConnectionLost);
                    }
                }
                None => {
                    let _ = write.close().await;
                    read_task.abort();
                    return Ok(());
                }
            },
        }
    }
}
