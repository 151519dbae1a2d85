//! Error types for the chat server
//!
//! Defines connection/startup errors, sink delivery errors and routing errors.
//! Uses thiserror for ergonomic error definitions.

use thiserror::Error;
use tokio_util::codec::LinesCodecError;

/// Application-level errors
///
/// All of these are fatal for the scope they occur in: a connection
/// handler stops, or the server refuses to start.
#[derive(Debug, Error)]
pub enum AppError {
    /// IO error (fatal)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Transport failure surfaced through the line codec
    #[error("Line codec error: {0}")]
    Codec(#[from] LinesCodecError),

    /// Channel send error (fatal - internal channel broken)
    #[error("Channel send error")]
    ChannelSend,

    /// Config file could not be read
    #[error("Failed to read config file '{path}': {source}")]
    ConfigRead {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Config file is not valid TOML for `ServerConfig`
    #[error("Failed to parse config: {0}")]
    ConfigParse(#[from] toml::de::Error),

    /// Config values are out of range
    #[error("Invalid config: {0}")]
    InvalidConfig(String),
}

/// Message send errors
///
/// Occurs when pushing a line into a client's outbound channel.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SendError {
    /// The receiving end of the channel has been closed
    #[error("Channel closed")]
    ChannelClosed,

    /// The client is not draining its channel fast enough
    #[error("Channel full")]
    ChannelFull,
}

/// Routing errors
///
/// Raised by the router when the registry is not in the state a
/// command requires.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RouteError {
    /// The whispering client has no registry entry
    #[error("Sender '{0}' is not registered")]
    SenderNotRegistered(String),
}
