//! ChatServer Actor implementation
//!
//! The central actor that owns the client registry. Connection handlers
//! talk to it over an mpsc channel, so every registry operation runs in
//! this task, one command at a time.

use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, warn};

use crate::client::ClientSink;
use crate::message::ServerMessage;
use crate::registry::Registry;
use crate::router::{self, WhisperOutcome};

/// Commands sent from handlers to the ChatServer actor
#[derive(Debug)]
pub enum ServerCommand {
    /// Username known, start routing to this sink
    Register { username: String, sink: ClientSink },
    /// Connection is gone
    Unregister { username: String },
    /// Deliver to every registered client
    Broadcast { message: ServerMessage },
    /// Private message
    Whisper {
        sender: String,
        recipient: String,
        text: String,
    },
    /// Build the client listing and hand it back
    ListClients { reply: oneshot::Sender<ServerMessage> },
}

/// The main ChatServer actor
pub struct ChatServer {
    /// All registered clients: username -> sink
    registry: Registry,
    /// Command receiver channel
    receiver: mpsc::Receiver<ServerCommand>,
}

impl ChatServer {
    /// Create a new ChatServer with the given command receiver
    pub fn new(receiver: mpsc::Receiver<ServerCommand>) -> Self {
        Self {
            registry: Registry::new(),
            receiver,
        }
    }

    /// Run the ChatServer event loop
    ///
    /// Continuously receives and processes commands until all senders are dropped.
    pub async fn run(mut self) {
        info!("ChatServer started");

        while let Some(cmd) = self.receiver.recv().await {
            self.handle_command(cmd);
        }

        info!("ChatServer shutting down");
    }

    /// Process a single command
    fn handle_command(&mut self, cmd: ServerCommand) {
        match cmd {
            ServerCommand::Register { username, sink } => {
                self.handle_register(username, sink);
            }
            ServerCommand::Unregister { username } => {
                self.handle_unregister(username);
            }
            ServerCommand::Broadcast { message } => {
                let delivered = router::broadcast(&self.registry, &message);
                debug!(
                    "Broadcast delivered to {}/{}",
                    delivered,
                    self.registry.client_count()
                );
            }
            ServerCommand::Whisper {
                sender,
                recipient,
                text,
            } => {
                self.handle_whisper(sender, recipient, text);
            }
            ServerCommand::ListClients { reply } => {
                // Requester may have disconnected while waiting
                let _ = reply.send(router::list_clients(&self.registry));
            }
        }
    }

    fn handle_register(&mut self, username: String, sink: ClientSink) {
        if self.registry.add(username.clone(), sink).is_some() {
            warn!("Username '{}' re-registered, previous client replaced", username);
        } else {
            info!("Registered '{}'", username);
        }
        debug!("Total clients: {}", self.registry.client_count());
    }

    fn handle_unregister(&mut self, username: String) {
        if self.registry.remove(&username).is_some() {
            info!("Unregistered '{}'", username);
        } else {
            debug!("Unregister for unknown username '{}'", username);
        }
        debug!("Total clients: {}", self.registry.client_count());
    }

    fn handle_whisper(&mut self, sender: String, recipient: String, text: String) {
        match router::whisper(&self.registry, &sender, &recipient, &text) {
            Ok(WhisperOutcome::Delivered) => {
                debug!("Whisper {} -> {}", sender, recipient);
            }
            Ok(WhisperOutcome::RecipientNotConnected) => {
                debug!("Whisper {} -> {} failed: recipient not connected", sender, recipient);
            }
            Err(e) => warn!("Dropping whisper to {}: {}", recipient, e),
        }
    }
}
