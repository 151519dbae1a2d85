//! Outbound message definitions
//!
//! Every line the server writes to a client is a `ServerMessage`. The wire
//! text is produced by its `Display` impl; a message may span several
//! lines (the client listing) but is always written as one unit.

use std::fmt;

/// Server → Client message
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServerMessage {
    /// First line after the connection is accepted
    Welcome,
    /// Asks for the username
    UsernamePrompt,
    /// Personalized welcome once the username is known
    Greeting { username: String },
    /// Someone registered
    Joined { username: String },
    /// Someone disconnected
    Left { username: String },
    /// Public chat line
    Chat { from: String, text: String },
    /// Whisper as seen by the recipient
    WhisperFrom { sender: String, text: String },
    /// Whisper echo as seen by the sender
    WhisperTo { recipient: String, text: String },
    /// Whisper recipient has no registry entry
    NotConnected { recipient: String },
    /// Malformed command
    InvalidCommand,
    /// Registered usernames
    ClientList { usernames: Vec<String> },
}

impl fmt::Display for ServerMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ServerMessage::Welcome => {
                write!(f, "Welcome to the chat server, please make yourself at home!")
            }
            ServerMessage::UsernamePrompt => write!(f, "Please enter your username: "),
            ServerMessage::Greeting { username } => write!(f, "Welcome {}!", username),
            ServerMessage::Joined { username } => write!(f, "{} has joined the chat.", username),
            ServerMessage::Left { username } => write!(f, "{} has left the chat.", username),
            ServerMessage::Chat { from, text } => write!(f, "{}: {}", from, text),
            ServerMessage::WhisperFrom { sender, text } => {
                write!(f, "[Whisper from {}]: {}", sender, text)
            }
            ServerMessage::WhisperTo { recipient, text } => {
                write!(f, "[You whispered to {}]: {}", recipient, text)
            }
            ServerMessage::NotConnected { recipient } => {
                write!(f, "User {} is not connected.", recipient)
            }
            ServerMessage::InvalidCommand => write!(f, "Invalid command!"),
            ServerMessage::ClientList { usernames } => {
                write!(f, "Connected clients:")?;
                for username in usernames {
                    write!(f, "\n- {}", username)?;
                }
                Ok(())
            }
        }
    }
}
