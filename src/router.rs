//! Message routing over the registry
//!
//! Broadcast, whisper and listing. Delivery goes through `ClientSink::send`,
//! which never waits, so a slow or dead client cannot hold up the others.

use tracing::{debug, warn};

use crate::error::RouteError;
use crate::message::ServerMessage;
use crate::registry::{Registry, Snapshot};

/// Deliver `msg` to every client currently in the registry
///
/// Returns how many clients accepted the message. Failed sinks are
/// skipped; the caller is never told about them.
pub fn broadcast(registry: &Registry, msg: &ServerMessage) -> usize {
    deliver_all(&registry.snapshot(), msg)
}

/// Deliver `msg` to every sink in `snapshot`, skipping failures
pub fn deliver_all(snapshot: &Snapshot, msg: &ServerMessage) -> usize {
    let mut delivered = 0;
    for (username, sink) in snapshot.iter() {
        match sink.send(msg.clone()) {
            Ok(()) => delivered += 1,
            Err(e) => debug!("Skipping {} during broadcast: {}", username, e),
        }
    }
    delivered
}

/// Build the client listing from a snapshot of the registry
///
/// Names are sorted so the listing is stable for a given registry state.
pub fn list_clients(registry: &Registry) -> ServerMessage {
    let mut usernames: Vec<String> = registry
        .snapshot()
        .usernames()
        .map(str::to_string)
        .collect();
    usernames.sort();
    ServerMessage::ClientList { usernames }
}

/// Outcome of a whisper that found its sender
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WhisperOutcome {
    /// Recipient got the message, sender got the echo
    Delivered,
    /// Sender was told the recipient is not connected
    RecipientNotConnected,
}

/// Send a private message from `sender` to `recipient`
///
/// The sender must be registered: without its sink there is nowhere to
/// send the echo or the not-connected notice, so nothing is sent at all.
pub fn whisper(
    registry: &Registry,
    sender: &str,
    recipient: &str,
    text: &str,
) -> Result<WhisperOutcome, RouteError> {
    let Some(sender_sink) = registry.lookup(sender) else {
        return Err(RouteError::SenderNotRegistered(sender.to_string()));
    };

    let Some(recipient_sink) = registry.lookup(recipient) else {
        if let Err(e) = sender_sink.send(ServerMessage::NotConnected {
            recipient: recipient.to_string(),
        }) {
            warn!("Failed to notify {} of unknown recipient: {}", sender, e);
        }
        return Ok(WhisperOutcome::RecipientNotConnected);
    };

    if let Err(e) = recipient_sink.send(ServerMessage::WhisperFrom {
        sender: sender.to_string(),
        text: text.to_string(),
    }) {
        debug!("Whisper to {} dropped: {}", recipient, e);
    }
    if let Err(e) = sender_sink.send(ServerMessage::WhisperTo {
        recipient: recipient.to_string(),
        text: text.to_string(),
    }) {
        debug!("Whisper echo to {} dropped: {}", sender, e);
    }

    Ok(WhisperOutcome::Delivered)
}
