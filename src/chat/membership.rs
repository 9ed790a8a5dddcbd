use std::sync::Arc;
use tracing::{debug, info};

use super::broadcaster::Broadcaster;
use super::connection::Connection;
use crate::error::WebSocketError;

/// Keeps a connection's room set and its broadcaster subscriptions in step.
///
/// Every operation takes the connection mutably, so the subscription change
/// and the room set change for one (connection, room) pair can never
/// interleave with another operation on the same connection.
pub struct RoomManager {
    broadcaster: Arc<dyn Broadcaster>,
}

impl RoomManager {
    pub fn new(broadcaster: Arc<dyn Broadcaster>) -> Self {
        Self { broadcaster }
    }

    /// Join `room`. Joining a room twice repeats the confirmation and the
    /// announcement.
    ///
    /// The room hears the announcement even when the confirmation can no
    /// longer reach the joiner; the send error is returned afterwards.
    pub async fn join(&self, conn: &mut Connection, room: &str) -> Result<(), WebSocketError> {
        self.broadcaster.subscribe(conn.subscriber(), room).await;
        conn.add_room(room);
        info!("{} ({}) joined room {}", conn.username(), conn.id(), room);

        let confirmed = conn.send(&format!("You have joined room: {}", room));
        let announcement = format!("{} has joined the room", conn.username());
        self.broadcaster.publish(room, &announcement).await;
        confirmed
    }

    pub async fn leave(&self, conn: &mut Connection, room: &str) -> Result<(), WebSocketError> {
        if !conn.in_room(room) {
            return conn.send(&format!("You are not in room {}", room));
        }

        self.broadcaster.unsubscribe(conn.id(), room).await;
        conn.remove_room(room);
        info!("{} ({}) left room {}", conn.username(), conn.id(), room);

        let confirmed = conn.send(&format!("You have left room: {}", room));
        let announcement = format!("{} has left the room", conn.username());
        self.broadcaster.publish(room, &announcement).await;
        confirmed
    }

    /// Drop every membership of a disconnecting connection. Nothing is sent
    /// to the connection itself.
    pub async fn forced_leave_all(&self, conn: &mut Connection) {
        let rooms: Vec<String> = conn.rooms().iter().cloned().collect();
        let announcement = format!("{} has left the room (disconnected)", conn.username());

        for room in rooms {
            self.broadcaster.publish(&room, &announcement).await;
            self.broadcaster.unsubscribe(conn.id(), &room).await;
            conn.remove_room(&room);
            debug!("Removed {} from room {} on disconnect", conn.id(), room);
        }
    }

    pub async fn room_message(
        &self,
        conn: &Connection,
        room: &str,
        text: &str,
    ) -> Result<(), WebSocketError> {
        if !conn.in_room(room) {
            return conn.send(&format!(
                "You are not in room {}. Join it first with /join {}",
                room, room
            ));
        }

        let message = format!("[{}] {}: {}", room, conn.username(), text);
        let delivered = self.broadcaster.publish(room, &message).await;
        debug!("Message from {} to {} delivered to {} subscribers", conn.id(), room, delivered);
        Ok(())
    }
}
