//! Client struct definition
//!
//! Represents a connected client and the outbound channel the rest of the
//! server uses to reach it.

use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;

use crate::error::SendError;
use crate::message::ServerMessage;
use crate::types::ConnectionId;

/// Outbound sink for one client
///
/// A cheap clone of the connection's message channel. The connection's
/// write task is the only consumer, so each message reaches the socket
/// whole and in order. Sending through the sink never waits: a full or
/// closed channel is reported and the caller moves on.
#[derive(Debug, Clone)]
pub struct ClientSink {
    sender: mpsc::Sender<ServerMessage>,
}

impl ClientSink {
    pub fn new(sender: mpsc::Sender<ServerMessage>) -> Self {
        Self { sender }
    }

    /// Queue a message for this client without blocking
    pub fn send(&self, msg: ServerMessage) -> Result<(), SendError> {
        self.sender.try_send(msg).map_err(|e| match e {
            TrySendError::Full(_) => SendError::ChannelFull,
            TrySendError::Closed(_) => SendError::ChannelClosed,
        })
    }

    /// Check if two sinks feed the same connection
    pub fn same_channel(&self, other: &ClientSink) -> bool {
        self.sender.same_channel(&other.sender)
    }
}

/// Connected client information
///
/// Owned by the connection handler once the handshake has produced a
/// username.
#[derive(Debug)]
pub struct Client {
    /// Unique identifier for this connection
    pub id: ConnectionId,
    pub username: String,
    /// Server → Client message channel
    pub sink: ClientSink,
}

impl Client {
    /// Create a new client with the given ID, username and sender channel
    pub fn new(id: ConnectionId, username: String, sender: mpsc::Sender<ServerMessage>) -> Self {
        Self {
            id,
            username,
            sink: ClientSink::new(sender),
        }
    }

    /// Send a message to this client, waiting for room in its queue
    ///
    /// For answers to the client's own commands. Fan-out to other clients
    /// goes through [`ClientSink::send`] instead.
    ///
    /// Returns an error if the channel is closed (client disconnected).
    pub async fn send(&self, msg: ServerMessage) -> Result<(), SendError> {
        self.sink
            .sender
            .send(msg)
            .await
            .map_err(|_| SendError::ChannelClosed)
    }
}
