//! Wire protocol and the WebSocket channel to the game server.
//!
//! The Lasso server speaks JSON command envelopes over WebSocket text frames:
//! every message, in either direction, is an object whose `command` field
//! selects the variant. Serde's internally-tagged enum representation maps
//! onto that envelope directly.
//!
//! Sending is fire-and-forget: [`Channel::send`] queues the command and a
//! background task drains the queue into the socket. No acknowledgement is
//! awaited and no retry logic exists; if the transport dies, the reader task
//! ends and the main loop observes the closed message stream.

use std::collections::HashMap;

use anyhow::{Context, Result};
use futures_util::{SinkExt, StreamExt};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tokio_tungstenite::{connect_async, tungstenite::Message as WsMessage};

// ── Client → server ──────────────────────────────────────────────────────────

/// Commands this client sends to the server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum ClientCommand {
    /// Handshake: register as a passive watcher. No payload.
    RegisterWatcher,
    /// Handshake: register as an active player under the given display name.
    RegisterPlayer { name: String },
    /// Move the player's position on the unit-square board.
    PlayerMove { x: f64, y: f64 },
}

// ── Server → client ──────────────────────────────────────────────────────────

/// A point of a player's tail, sent as a `[t, x, y]` array.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TailPoint(pub f64, pub f64, pub f64);

impl TailPoint {
    pub fn x(&self) -> f64 {
        self.1
    }

    pub fn y(&self) -> f64 {
        self.2
    }
}

/// Per-player state within a table update.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerState {
    pub x: f64,
    pub y: f64,
    pub r: f64,
    pub tail_points: Vec<TailPoint>,
    pub score: i64,
    /// RGB components in `0.0..=1.0`, exactly as the server assigns them.
    pub color: (f64, f64, f64),
    pub invincible: bool,
}

/// A drifting food dot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FoodState {
    pub x: f64,
    pub y: f64,
    pub r: f64,
    pub dx: f64,
    pub dy: f64,
    pub color: (f64, f64, f64),
}

/// A scoring event: a capture or a penalty, anchored to a board position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreEvent {
    pub x: f64,
    pub y: f64,
    pub score: i64,
    pub player_name: String,
}

/// Full table snapshot, broadcast to every registered client at 10 Hz.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableState {
    pub server_time: f64,
    pub players: HashMap<String, PlayerState>,
    /// Keyed by food id; JSON object keys are strings even though the ids
    /// are numeric on the server.
    pub foods: HashMap<String, FoodState>,
    pub events: Vec<ScoreEvent>,
    pub tail_lifespan: f64,
}

/// Messages the server sends to this client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum ServerMessage {
    UpdateTableState {
        state: TableState,
    },
    Error {
        message: String,
        /// Absent on some error paths; absent means not recoverable.
        #[serde(default)]
        recoverable: bool,
    },
}

// ── Channel ──────────────────────────────────────────────────────────────────

/// Outbound half of the connection, as seen by the screens.
///
/// A trait rather than a concrete type so the entry screen can be exercised
/// against a recording channel in tests.
pub trait Channel {
    /// Queue a command for delivery. Fire-and-forget: success means the
    /// command was accepted for sending, not that the server received it.
    fn send(&mut self, command: ClientCommand) -> Result<()>;
}

/// [`Channel`] backed by the WebSocket writer task.
pub struct WsChannel {
    tx: mpsc::UnboundedSender<ClientCommand>,
}

impl Channel for WsChannel {
    fn send(&mut self, command: ClientCommand) -> Result<()> {
        self.tx
            .send(command)
            .map_err(|_| anyhow::anyhow!("connection to server is closed"))
    }
}

/// Connect to the game server.
///
/// Returns the outbound channel and the stream of inbound server messages.
/// Two background tasks own the socket halves: the writer drains queued
/// commands, the reader decodes text frames. Frames that don't parse as a
/// known [`ServerMessage`] are ignored for forward compatibility. When the
/// socket closes, the reader task drops its sender and the receiver returned
/// here yields `None`.
pub async fn connect(url: &str) -> Result<(WsChannel, mpsc::Receiver<ServerMessage>)> {
    let (socket, _response) = connect_async(url)
        .await
        .with_context(|| format!("failed to connect to {url}"))?;
    let (mut write, mut read) = socket.split();

    let (cmd_tx, mut cmd_rx) = mpsc::unbounded_channel::<ClientCommand>();
    let (msg_tx, msg_rx) = mpsc::channel::<ServerMessage>(64);

    tokio::spawn(async move {
        while let Some(command) = cmd_rx.recv().await {
            // Serialization of our own command enum cannot fail; a send
            // failure means the socket is gone and the task ends.
            let Ok(text) = serde_json::to_string(&command) else {
                continue;
            };
            if write.send(WsMessage::Text(text)).await.is_err() {
                break;
            }
        }
    });

    tokio::spawn(async move {
        while let Some(frame) = read.next().await {
            match frame {
                Ok(WsMessage::Text(text)) => {
                    if let Ok(message) = serde_json::from_str::<ServerMessage>(&text) {
                        if msg_tx.send(message).await.is_err() {
                            break;
                        }
                    }
                }
                Ok(WsMessage::Close(_)) | Err(_) => break,
                Ok(_) => {}
            }
        }
    });

    Ok((WsChannel { tx: cmd_tx }, msg_rx))
}
