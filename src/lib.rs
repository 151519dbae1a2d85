//! Line-oriented TCP Chat Server Library
//!
//! Clients connect over TCP, pick a username and then send lines of text.
//!
//! # Features
//! - Username handshake
//! - Broadcast chat to every connected client
//! - Private messages: `/w <recipient> <message>`
//! - Client listing: `/l`
//! - Join and leave announcements
//!
//! # Architecture
//! Uses the Actor pattern with `mpsc` channels:
//! - `ChatServer` is the central actor owning the client `Registry`
//! - Each connection has a `handler` task communicating with the server
//! - Each connection has a write task draining its outbound channel
//! - No locks needed - all registry access goes through message passing
//!
//! # Example
//! ```ignore
//! use std::sync::Arc;
//! use tokio::net::TcpListener;
//! use tokio::sync::mpsc;
//! use whisper_chat::{serve, ChatServer, ServerConfig};
//!
//! #[tokio::main]
//! async fn main() {
//!     let config = ServerConfig::default();
//!     let listener = TcpListener::bind(&config.bind_addr).await.unwrap();
//!     let (cmd_tx, cmd_rx) = mpsc::channel(config.command_buffer);
//!
//!     tokio::spawn(ChatServer::new(cmd_rx).run());
//!     serve(listener, cmd_tx, Arc::new(config)).await;
//! }
//! ```

pub mod client;
pub mod codec;
pub mod command;
pub mod config;
pub mod error;
pub mod handler;
pub mod listener;
pub mod message;
pub mod registry;
pub mod router;
pub mod server;
pub mod types;

// Re-export main types for convenience
pub use client::{Client, ClientSink};
pub use codec::{ChatCodec, Line};
pub use command::{dispatch, Action, Command};
pub use config::ServerConfig;
pub use error::{AppError, RouteError, SendError};
pub use handler::handle_connection;
pub use listener::serve;
pub use message::ServerMessage;
pub use registry::{Registry, Snapshot};
pub use server::{ChatServer, ServerCommand};
pub use types::ConnectionId;
