//! Connection handler
//!
//! Drives one client session: handshake, registration, the read loop that
//! feeds lines to the dispatcher, and cleanup on disconnect. Works over any
//! byte stream; the listener passes in TCP sockets.

use std::sync::Arc;

use futures_util::{Sink, SinkExt, Stream, StreamExt};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::sync::{mpsc, oneshot};
use tokio_util::codec::{Framed, LinesCodecError};
use tracing::{debug, error, info, warn};

use crate::client::Client;
use crate::codec::{ChatCodec, Line};
use crate::command::{self, Action};
use crate::config::ServerConfig;
use crate::error::AppError;
use crate::message::ServerMessage;
use crate::server::ServerCommand;
use crate::types::ConnectionId;

/// Handle a new connection
///
/// Returns once the client is gone and its registry entry has been
/// released. A client that disconnects during the handshake is never
/// registered. Unreadable lines (too long, not UTF-8) get an
/// "Invalid command!" reply and the session carries on.
pub async fn handle_connection<S>(
    stream: S,
    peer_addr: String,
    cmd_tx: mpsc::Sender<ServerCommand>,
    config: Arc<ServerConfig>,
) -> Result<(), AppError>
where
    S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
{
    let client_id = ConnectionId::new();
    info!("Client {} connected from {}", client_id, peer_addr);

    let mut framed = Framed::new(stream, ChatCodec::new(config.max_line_length));

    // Handshake
    framed.send(ServerMessage::Welcome.to_string()).await?;
    framed.send(ServerMessage::UsernamePrompt.to_string()).await?;
    let username = loop {
        match framed.next().await {
            Some(Ok(Line::Text(line))) => break line.trim().to_string(),
            Some(Ok(bad)) => {
                debug!("Unreadable username from {}: {:?}", client_id, bad);
                framed.send(ServerMessage::InvalidCommand.to_string()).await?;
                framed.send(ServerMessage::UsernamePrompt.to_string()).await?;
            }
            Some(Err(e)) => return Err(e.into()),
            None => {
                info!("Client {} left before choosing a username", client_id);
                return Ok(());
            }
        }
    };
    framed
        .send(
            ServerMessage::Greeting {
                username: username.clone(),
            }
            .to_string(),
        )
        .await?;

    // Create channel for server -> client messages
    let (msg_tx, msg_rx) = mpsc::channel::<ServerMessage>(config.client_buffer);
    let client = Client::new(client_id, username.clone(), msg_tx);
    info!("Client {} set username to '{}'", client_id, username);

    let (line_sink, mut lines) = framed.split::<String>();
    let write_task = tokio::spawn(write_loop(line_sink, msg_rx, client_id));

    // Register with ChatServer
    if cmd_tx
        .send(ServerCommand::Register {
            username: username.clone(),
            sink: client.sink.clone(),
        })
        .await
        .is_err()
    {
        error!("Failed to register client {} - server closed", client_id);
        return Err(AppError::ChannelSend);
    }
    let _ = cmd_tx
        .send(ServerCommand::Broadcast {
            message: ServerMessage::Joined {
                username: username.clone(),
            },
        })
        .await;

    let result = read_loop(&client, &mut lines, &cmd_tx).await;
    if let Err(e) = &result {
        warn!("Read loop for {} ended with error: {}", client_id, e);
    }

    // Deregister first so the departure notice only reaches the others
    let _ = cmd_tx
        .send(ServerCommand::Unregister {
            username: username.clone(),
        })
        .await;
    let _ = cmd_tx
        .send(ServerCommand::Broadcast {
            message: ServerMessage::Left {
                username: username.clone(),
            },
        })
        .await;

    // Write task drains what is queued, then closes the transport
    drop(client);
    let _ = write_task.await;

    info!("Client {} ('{}') disconnected", client_id, username);

    result
}

/// Feed incoming lines to the dispatcher until end-of-stream
///
/// Only a transport error ends the loop early.
async fn read_loop<St>(
    client: &Client,
    lines: &mut St,
    cmd_tx: &mpsc::Sender<ServerCommand>,
) -> Result<(), AppError>
where
    St: Stream<Item = Result<Line, LinesCodecError>> + Unpin,
{
    while let Some(line) = lines.next().await {
        let line = match line? {
            Line::Text(line) => line,
            bad => {
                debug!("Unreadable line from {}: {:?}", client.id, bad);
                reply(client, ServerMessage::InvalidCommand).await;
                continue;
            }
        };

        let cmd = match command::dispatch(&client.username, &line) {
            Action::Reply(msg) => {
                reply(client, msg).await;
                continue;
            }
            Action::ListClients => {
                let (reply_tx, reply_rx) = oneshot::channel();
                if cmd_tx
                    .send(ServerCommand::ListClients { reply: reply_tx })
                    .await
                    .is_err()
                {
                    return Err(AppError::ChannelSend);
                }
                let listing = reply_rx.await.map_err(|_| AppError::ChannelSend)?;
                reply(client, listing).await;
                continue;
            }
            Action::Broadcast(message) => ServerCommand::Broadcast { message },
            Action::Whisper {
                sender,
                recipient,
                text,
            } => ServerCommand::Whisper {
                sender,
                recipient,
                text,
            },
        };

        if cmd_tx.send(cmd).await.is_err() {
            debug!("Server closed, ending read loop for {}", client.id);
            return Err(AppError::ChannelSend);
        }
    }

    debug!("Read loop ended for {}", client.id);
    Ok(())
}

/// Queue a direct answer on the client's own channel, waiting for room
async fn reply(client: &Client, msg: ServerMessage) {
    if let Err(e) = client.send(msg).await {
        debug!("Reply to {} dropped: {}", client.id, e);
    }
}

/// Write queued messages to the transport, one line (or block) per message
async fn write_loop<Si>(
    mut line_sink: Si,
    mut msg_rx: mpsc::Receiver<ServerMessage>,
    client_id: ConnectionId,
) where
    Si: Sink<String, Error = LinesCodecError> + Unpin,
{
    while let Some(msg) = msg_rx.recv().await {
        if let Err(e) = line_sink.send(msg.to_string()).await {
            debug!("Send to {} failed, ending write task: {}", client_id, e);
            break;
        }
    }
    debug!("Write task ended for {}", client_id);

    let _ = line_sink.close().await;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::server::ChatServer;
    use tokio::io::{duplex, AsyncWriteExt, DuplexStream};
    use tokio::task::JoinHandle;
    use tokio_util::codec::LinesCodec;

    struct TestClient {
        framed: Framed<DuplexStream, LinesCodec>,
        handler: JoinHandle<Result<(), AppError>>,
    }

    impl TestClient {
        fn connect(cmd_tx: &mpsc::Sender<ServerCommand>) -> Self {
            connect_raw(cmd_tx, ServerConfig::default(), 4096)
        }

        async fn line(&mut self) -> String {
            self.framed.next().await.unwrap().unwrap()
        }

        async fn send(&mut self, line: &str) {
            self.framed.send(line).await.unwrap();
        }

        async fn login(cmd_tx: &mpsc::Sender<ServerCommand>, name: &str) -> Self {
            let mut client = Self::connect(cmd_tx);
            assert_eq!(
                client.line().await,
                "Welcome to the chat server, please make yourself at home!"
            );
            assert_eq!(client.line().await, "Please enter your username: ");
            client.send(name).await;
            assert_eq!(client.line().await, format!("Welcome {}!", name));
            assert_eq!(client.line().await, format!("{} has joined the chat.", name));
            client
        }
    }

    fn start_server() -> mpsc::Sender<ServerCommand> {
        let (cmd_tx, cmd_rx) = mpsc::channel(32);
        tokio::spawn(ChatServer::new(cmd_rx).run());
        cmd_tx
    }

    async fn listing(cmd_tx: &mpsc::Sender<ServerCommand>) -> String {
        let (reply, rx) = oneshot::channel();
        cmd_tx
            .send(ServerCommand::ListClients { reply })
            .await
            .unwrap();
        rx.await.unwrap().to_string()
    }

    #[tokio::test]
    async fn test_disconnect_during_handshake_does_not_register() {
        let cmd_tx = start_server();
        let mut client = TestClient::connect(&cmd_tx);
        client.line().await;
        client.line().await;

        let TestClient { framed, handler } = client;
        drop(framed);

        assert!(handler.await.unwrap().is_ok());
        assert_eq!(listing(&cmd_tx).await, "Connected clients:");
    }

    #[tokio::test]
    async fn test_username_is_trimmed() {
        let cmd_tx = start_server();
        let mut client = TestClient::connect(&cmd_tx);
        client.line().await;
        client.line().await;
        client.send("  carol ").await;

        assert_eq!(client.line().await, "Welcome carol!");
        assert_eq!(client.line().await, "carol has joined the chat.");
        assert_eq!(listing(&cmd_tx).await, "Connected clients:\n- carol");
    }

    #[tokio::test]
    async fn test_invalid_whisper_replies_only_to_sender() {
        let cmd_tx = start_server();
        let mut alice = TestClient::login(&cmd_tx, "alice").await;
        let mut bob = TestClient::login(&cmd_tx, "bob").await;
        assert_eq!(alice.line().await, "bob has joined the chat.");

        bob.send("/w onlyone").await;
        assert_eq!(bob.line().await, "Invalid command!");

        // Next thing alice sees is bob's chat line, not the invalid notice
        bob.send("after").await;
        assert_eq!(alice.line().await, "bob: after");
        assert_eq!(bob.line().await, "bob: after");
    }

    #[tokio::test]
    async fn test_list_command_returns_listing_block() {
        let cmd_tx = start_server();
        let mut alice = TestClient::login(&cmd_tx, "alice").await;

        alice.send("/l").await;
        assert_eq!(alice.line().await, "Connected clients:");
        assert_eq!(alice.line().await, "- alice");
    }

    #[tokio::test]
    async fn test_disconnect_unregisters_and_announces() {
        let cmd_tx = start_server();
        let alice = TestClient::login(&cmd_tx, "alice").await;
        let mut bob = TestClient::login(&cmd_tx, "bob").await;

        let TestClient { framed, handler } = alice;
        drop(framed);
        assert!(handler.await.unwrap().is_ok());

        assert_eq!(bob.line().await, "alice has left the chat.");
        assert_eq!(listing(&cmd_tx).await, "Connected clients:\n- bob");
    }

    fn connect_raw(
        cmd_tx: &mpsc::Sender<ServerCommand>,
        config: ServerConfig,
        pipe_size: usize,
    ) -> TestClient {
        let (server_side, client_side) = duplex(pipe_size);
        let handler = tokio::spawn(handle_connection(
            server_side,
            "test".to_string(),
            cmd_tx.clone(),
            Arc::new(config),
        ));
        TestClient {
            framed: Framed::new(client_side, LinesCodec::new()),
            handler,
        }
    }

    #[tokio::test]
    async fn test_overlong_line_keeps_session() {
        let cmd_tx = start_server();
        let config = ServerConfig {
            max_line_length: 16,
            ..ServerConfig::default()
        };
        let mut dave = connect_raw(&cmd_tx, config, 1 << 16);
        dave.line().await;
        dave.line().await;
        dave.send("dave").await;
        assert_eq!(dave.line().await, "Welcome dave!");
        assert_eq!(dave.line().await, "dave has joined the chat.");

        dave.send(&"x".repeat(64)).await;
        assert_eq!(dave.line().await, "Invalid command!");

        dave.send("hello").await;
        assert_eq!(dave.line().await, "dave: hello");
        assert_eq!(listing(&cmd_tx).await, "Connected clients:\n- dave");
    }

    #[tokio::test]
    async fn test_invalid_utf8_line_keeps_session() {
        let cmd_tx = start_server();
        let mut bob = TestClient::login(&cmd_tx, "bob").await;
        let mut alice = TestClient::login(&cmd_tx, "alice").await;
        assert_eq!(bob.line().await, "alice has joined the chat.");

        alice
            .framed
            .get_mut()
            .write_all(b"caf\xe9\nhello\n")
            .await
            .unwrap();

        assert_eq!(alice.line().await, "Invalid command!");
        assert_eq!(alice.line().await, "alice: hello");
        assert_eq!(bob.line().await, "alice: hello");
        assert_eq!(
            listing(&cmd_tx).await,
            "Connected clients:\n- alice\n- bob"
        );
    }

    #[tokio::test]
    async fn test_invalid_utf8_username_is_prompted_again() {
        let cmd_tx = start_server();
        let mut client = TestClient::connect(&cmd_tx);
        client.line().await;
        client.line().await;

        client.framed.get_mut().write_all(b"\xff\n").await.unwrap();
        assert_eq!(client.line().await, "Invalid command!");
        assert_eq!(client.line().await, "Please enter your username: ");

        client.send("erin").await;
        assert_eq!(client.line().await, "Welcome erin!");
        assert_eq!(client.line().await, "erin has joined the chat.");
    }

    #[tokio::test]
    async fn test_direct_replies_wait_for_room_in_own_queue() {
        let cmd_tx = start_server();
        let config = ServerConfig {
            client_buffer: 1,
            ..ServerConfig::default()
        };
        // Small pipe so the write task stalls and the queue fills up
        let mut client = connect_raw(&cmd_tx, config, 64);
        client.line().await;
        client.line().await;
        client.send("frank").await;
        assert_eq!(client.line().await, "Welcome frank!");
        assert_eq!(client.line().await, "frank has joined the chat.");

        let TestClient { framed, handler: _handler } = client;
        let (mut sink, mut stream) = framed.split::<String>();
        let writer = tokio::spawn(async move {
            for _ in 0..20 {
                sink.send("/w onlyone".to_string()).await.unwrap();
            }
            sink
        });

        for _ in 0..20 {
            assert_eq!(stream.next().await.unwrap().unwrap(), "Invalid command!");
        }
        let _sink = writer.await.unwrap();
    }
}
