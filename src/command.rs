//! Command parsing and dispatch
//!
//! Turns one line of client input into a `Command`, and a command plus the
//! sender's username into an `Action` for the connection handler to carry
//! out. Nothing here holds state.

use crate::message::ServerMessage;

/// Prefix of the whisper command: `/w <recipient> <message...>`
pub const WHISPER_PREFIX: &str = "/w";

/// Prefix of the listing command: `/l`
pub const LIST_PREFIX: &str = "/l";

/// One parsed input line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Plain chat text for everyone
    Broadcast { text: String },
    /// Private message
    Whisper { recipient: String, text: String },
    /// Request the list of connected clients
    ListClients,
    /// Whisper prefix without recipient or message
    Invalid,
}

impl Command {
    /// Parse a single line
    ///
    /// Only prefixes are matched, so `/wave a b` is a whisper to `a`. The
    /// whisper line is split on single spaces into at most three parts and
    /// the third part keeps its spaces.
    pub fn parse(line: &str) -> Self {
        if line.starts_with(WHISPER_PREFIX) {
            let mut parts = line.splitn(3, ' ');
            let _prefix = parts.next();
            match (parts.next(), parts.next()) {
                (Some(recipient), Some(text)) => Command::Whisper {
                    recipient: recipient.to_string(),
                    text: text.to_string(),
                },
                _ => Command::Invalid,
            }
        } else if line.starts_with(LIST_PREFIX) {
            Command::ListClients
        } else {
            Command::Broadcast {
                text: line.to_string(),
            }
        }
    }
}

/// What the connection handler should do with a line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// Hand a message to the router for every client
    Broadcast(ServerMessage),
    /// Route a whisper through the registry
    Whisper {
        sender: String,
        recipient: String,
        text: String,
    },
    /// Ask for the listing and send it back to the sender
    ListClients,
    /// Answer the sender directly; the router is not involved
    Reply(ServerMessage),
}

/// Map a line from `username` to the action it triggers
pub fn dispatch(username: &str, line: &str) -> Action {
    match Command::parse(line) {
        Command::Broadcast { text } => Action::Broadcast(ServerMessage::Chat {
            from: username.to_string(),
            text,
        }),
        Command::Whisper { recipient, text } => Action::Whisper {
            sender: username.to_string(),
            recipient,
            text,
        },
        Command::ListClients => Action::ListClients,
        Command::Invalid => Action::Reply(ServerMessage::InvalidCommand),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_broadcast() {
        assert_eq!(
            Command::parse("hello world"),
            Command::Broadcast {
                text: "hello world".to_string()
            }
        );
        assert_eq!(
            Command::parse(""),
            Command::Broadcast {
                text: String::new()
            }
        );
    }

    #[test]
    fn test_parse_whisper_keeps_spaces_in_message() {
        assert_eq!(
            Command::parse("/w bob meet me at noon"),
            Command::Whisper {
                recipient: "bob".to_string(),
                text: "meet me at noon".to_string()
            }
        );
    }

    #[test]
    fn test_parse_whisper_missing_parts() {
        assert_eq!(Command::parse("/w"), Command::Invalid);
        assert_eq!(Command::parse("/w onlyone"), Command::Invalid);
    }

    #[test]
    fn test_parse_whisper_trailing_space_is_empty_message() {
        assert_eq!(
            Command::parse("/w bob "),
            Command::Whisper {
                recipient: "bob".to_string(),
                text: String::new()
            }
        );
    }

    #[test]
    fn test_parse_list() {
        assert_eq!(Command::parse("/l"), Command::ListClients);
        assert_eq!(Command::parse("/list"), Command::ListClients);
    }

    #[test]
    fn test_prefix_must_lead_the_line() {
        assert_eq!(
            Command::parse(" /l"),
            Command::Broadcast {
                text: " /l".to_string()
            }
        );
    }

    #[test]
    fn test_dispatch_broadcast_prefixes_username() {
        assert_eq!(
            dispatch("alice", "hello"),
            Action::Broadcast(ServerMessage::Chat {
                from: "alice".to_string(),
                text: "hello".to_string()
            })
        );
    }

    #[test]
    fn test_dispatch_whisper() {
        assert_eq!(
            dispatch("bob", "/w alice secret"),
            Action::Whisper {
                sender: "bob".to_string(),
                recipient: "alice".to_string(),
                text: "secret".to_string()
            }
        );
    }

    #[test]
    fn test_dispatch_invalid_replies_directly() {
        assert_eq!(
            dispatch("alice", "/w onlyone"),
            Action::Reply(ServerMessage::InvalidCommand)
        );
    }

    #[test]
    fn test_dispatch_list() {
        assert_eq!(dispatch("alice", "/l"), Action::ListClients);
    }
}
