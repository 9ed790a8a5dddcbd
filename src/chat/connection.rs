use std::collections::BTreeSet;
use tokio::sync::mpsc;
use uuid::Uuid;
use crate::error::WebSocketError;

/// Username used when a client connects without one.
pub const DEFAULT_USERNAME: &str = "Anonymous";

/// Outbound handle of a connection, as known to the broadcaster.
#[derive(Debug, Clone)]
pub struct Subscriber {
    id: Uuid,
    tx: mpsc::UnboundedSender<String>,
}

impl Subscriber {
    pub fn new(id: Uuid, tx: mpsc::UnboundedSender<String>) -> Self {
        Self { id, tx }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn send(&self, text: &str) -> Result<(), WebSocketError> {
        self.tx
            .send(text.to_string())
            .map_err(|e| WebSocketError::SendError(format!("connection {}: {}", self.id, e)))
    }
}

/// Per-connection state, owned by the flow handling that connection.
///
/// The room set is only ever touched together with the matching
/// broadcaster subscription, see [`RoomManager`](super::RoomManager).
#[derive(Debug)]
pub struct Connection {
    username: String,
    rooms: BTreeSet<String>,
    handle: Subscriber,
}

impl Connection {
    pub fn new(username: impl Into<String>, tx: mpsc::UnboundedSender<String>) -> Self {
        Self {
            username: username.into(),
            rooms: BTreeSet::new(),
            handle: Subscriber::new(Uuid::new_v4(), tx),
        }
    }

    pub fn id(&self) -> Uuid {
        self.handle.id()
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn rooms(&self) -> &BTreeSet<String> {
        &self.rooms
    }

    pub fn in_room(&self, room: &str) -> bool {
        self.rooms.contains(room)
    }

    pub fn subscriber(&self) -> Subscriber {
        self.handle.clone()
    }

    /// Send a text frame straight to this client.
    pub fn send(&self, text: &str) -> Result<(), WebSocketError> {
        self.handle.send(text)
    }

    pub(crate) fn add_room(&mut self, room: &str) {
        self.rooms.insert(room.to_string());
    }

    pub(crate) fn remove_room(&mut self, room: &str) -> bool {
        self.rooms.remove(room)
    }
}

/// Resolve the username supplied at connect time.
pub fn resolve_username(requested: Option<&str>) -> String {
    match requested.map(str::trim) {
        Some(name) if !name.is_empty() => name.to_string(),
        _ => DEFAULT_USERNAME.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_connection_has_no_rooms() {
        let (tx, _rx) = mpsc::unbounded_channel();
        let conn = Connection::new("alice", tx);
        assert_eq!(conn.username(), "alice");
        assert!(conn.rooms().is_empty());
        assert_eq!(conn.subscriber().id(), conn.id());
    }

    #[test]
    fn test_send_after_receiver_dropped_fails() {
        let (tx, rx) = mpsc::unbounded_channel();
        let conn = Connection::new("alice", tx);
        drop(rx);
        assert!(matches!(conn.send("hi"), Err(WebSocketError::SendError(_))));
    }

    #[test]
    fn test_resolve_username() {
        assert_eq!(resolve_username(Some("bob")), "bob");
        assert_eq!(resolve_username(None), DEFAULT_USERNAME);
        assert_eq!(resolve_username(Some("")), DEFAULT_USERNAME);
        assert_eq!(resolve_username(Some("   ")), DEFAULT_USERNAME);
    }
}
