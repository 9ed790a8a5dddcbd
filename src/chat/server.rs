use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{info, warn};

use super::broadcaster::Broadcaster;
use super::connection::Connection;
use super::membership::RoomManager;
use super::protocol::{self, HELP_TEXT};
use super::registry::ConnectionRegistry;
use crate::error::WebSocketError;

/// Entry point the transport drives: one `open`, any number of
/// `handle_message`, then exactly one `close` per connection.
pub struct ChatServer {
    rooms: RoomManager,
    registry: ConnectionRegistry,
}

impl ChatServer {
    pub fn new(broadcaster: Arc<dyn Broadcaster>) -> Self {
        Self {
            rooms: RoomManager::new(broadcaster),
            registry: ConnectionRegistry::new(),
        }
    }

    pub async fn connection_count(&self) -> usize {
        self.registry.connection_count().await
    }

    pub async fn open(&self, conn: &Connection) -> Result<(), WebSocketError> {
        self.registry.add(conn.id(), conn.username()).await;
        info!("Connection {} opened for {}", conn.id(), conn.username());

        conn.send(&protocol::welcome(conn.username()))?;
        conn.send(HELP_TEXT)
    }

    pub async fn handle_message(
        &self,
        conn: &mut Connection,
        text: &str,
    ) -> Result<(), WebSocketError> {
        protocol::dispatch(&self.rooms, conn, text).await
    }

    pub async fn close(&self, conn: &mut Connection) {
        self.rooms.forced_leave_all(conn).await;
        self.registry.remove(&conn.id()).await;
        info!("Connection {} closed for {}", conn.id(), conn.username());
    }

    /// Run the whole life of one connection.
    ///
    /// Frames are read from `inbound` until it is closed by the transport or
    /// a reply can no longer be delivered; cleanup then runs once.
    pub async fn run_session(
        self: Arc<Self>,
        username: String,
        outbound: mpsc::UnboundedSender<String>,
        mut inbound: mpsc::UnboundedReceiver<String>,
    ) {
        let mut conn = Connection::new(username, outbound);

        match self.open(&conn).await {
            Ok(()) => {
                while let Some(text) = inbound.recv().await {
                    if let Err(e) = self.handle_message(&mut conn, &text).await {
                        warn!("Ending session {}: {}", conn.id(), e);
                        break;
                    }
                }
            }
            Err(e) => warn!("Could not greet connection {}: {}", conn.id(), e),
        }

        self.close(&mut conn).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chat::broadcaster::PubSub;

    fn drain(rx: &mut mpsc::UnboundedReceiver<String>) -> Vec<String> {
        let mut out = Vec::new();
        while let Ok(msg) = rx.try_recv() {
            out.push(msg);
        }
        out
    }

    #[tokio::test]
    async fn test_open_registers_and_greets() {
        let server = ChatServer::new(Arc::new(PubSub::new()));
        let (tx, mut rx) = mpsc::unbounded_channel();
        let conn = Connection::new("alice", tx);

        server.open(&conn).await.unwrap();

        assert_eq!(server.connection_count().await, 1);
        let greeting = drain(&mut rx);
        assert_eq!(greeting.len(), 2);
        assert!(greeting[0].contains("alice"));
        assert_eq!(greeting[1], HELP_TEXT);
    }

    #[tokio::test]
    async fn test_close_leaves_every_room() {
        let pubsub = Arc::new(PubSub::new());
        let server = ChatServer::new(pubsub.clone());
        let (tx, _rx) = mpsc::unbounded_channel();
        let mut alice = Connection::new("alice", tx);
        let (tx, mut bob_rx) = mpsc::unbounded_channel();
        let mut bob = Connection::new("bob", tx);

        server.open(&alice).await.unwrap();
        server.open(&bob).await.unwrap();
        server.handle_message(&mut alice, "/join a").await.unwrap();
        server.handle_message(&mut alice, "/join b").await.unwrap();
        server.handle_message(&mut bob, "/join a").await.unwrap();
        drain(&mut bob_rx);

        server.close(&mut alice).await;

        assert!(alice.rooms().is_empty());
        assert_eq!(server.connection_count().await, 1);
        assert_eq!(pubsub.topic_count().await, 1);
        assert_eq!(drain(&mut bob_rx), vec!["alice has left the room (disconnected)"]);
    }

    #[tokio::test]
    async fn test_run_session_cleans_up_when_inbound_closes() {
        let pubsub = Arc::new(PubSub::new());
        let server = Arc::new(ChatServer::new(pubsub.clone()));
        let (out_tx, mut out_rx) = mpsc::unbounded_channel();
        let (in_tx, in_rx) = mpsc::unbounded_channel();

        let session = tokio::spawn(server.clone().run_session("carol".into(), out_tx, in_rx));

        in_tx.send("/join lobby".to_string()).unwrap();
        in_tx.send("hello".to_string()).unwrap();
        drop(in_tx);
        session.await.unwrap();

        let received = drain(&mut out_rx);
        assert_eq!(
            &received[2..],
            &[
                "You have joined room: lobby".to_string(),
                "carol has joined the room".to_string(),
                "carol: hello".to_string(),
            ]
        );
        assert_eq!(server.connection_count().await, 0);
        assert_eq!(pubsub.topic_count().await, 0);
    }

    #[tokio::test]
    async fn test_run_session_stops_when_client_is_gone() {
        let pubsub = Arc::new(PubSub::new());
        let server = Arc::new(ChatServer::new(pubsub.clone()));
        let (out_tx, out_rx) = mpsc::unbounded_channel();
        let (_in_tx, in_rx) = mpsc::unbounded_channel::<String>();
        drop(out_rx);

        // The greeting cannot be delivered, so the session ends on its own
        server.clone().run_session("dave".into(), out_tx, in_rx).await;

        assert_eq!(server.connection_count().await, 0);
    }
}
