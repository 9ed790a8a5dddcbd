//! Text protocol spoken over the websocket.
//!
//! Lines starting with `/` are commands, anything else is chat that is
//! echoed back to the sender with their name in front.

use tracing::debug;

use super::connection::Connection;
use super::membership::RoomManager;
use crate::error::WebSocketError;

pub const HELP_TEXT: &str = "Available commands:\n\
/join [room] - Join a room\n\
/leave [room] - Leave a room\n\
/room [room] [message] - Send a message to a room\n\
/rooms - How to find rooms\n\
/myrooms - List the rooms you have joined";

pub const JOIN_USAGE: &str = "Please specify a room name: /join [room]";
pub const LEAVE_USAGE: &str = "Please specify a room name: /leave [room]";
pub const ROOM_USAGE: &str = "Please specify a room name and message: /room [room] [message]";
pub const ROOMS_REPLY: &str = "To join a room, use: /join [room]";
pub const NO_ROOMS_REPLY: &str = "You have not joined any rooms. Join one with /join [room]";

pub fn welcome(username: &str) -> String {
    format!("Welcome to the chat server, {}!", username)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientMessage {
    Join { room: Option<String> },
    Leave { room: Option<String> },
    Room { room: Option<String>, text: String },
    Rooms,
    MyRooms,
    Unknown { command: String },
    Chat { text: String },
}

impl ClientMessage {
    pub fn parse(input: &str) -> Self {
        let Some(line) = input.strip_prefix('/') else {
            return ClientMessage::Chat { text: input.to_string() };
        };

        let mut tokens = line.split_whitespace();
        let command = tokens.next().unwrap_or_default().to_lowercase();
        let first = tokens.next().map(str::to_string);

        match command.as_str() {
            "join" => ClientMessage::Join { room: first },
            "leave" => ClientMessage::Leave { room: first },
            "room" => ClientMessage::Room {
                room: first,
                text: tokens.collect::<Vec<_>>().join(" "),
            },
            "rooms" => ClientMessage::Rooms,
            "myrooms" => ClientMessage::MyRooms,
            _ => ClientMessage::Unknown { command },
        }
    }
}

pub fn unknown_command(command: &str) -> String {
    format!(
        "Unknown command: {}. Available commands: /join, /leave, /room, /rooms, /myrooms",
        command
    )
}

pub fn my_rooms(conn: &Connection) -> String {
    if conn.rooms().is_empty() {
        return NO_ROOMS_REPLY.to_string();
    }
    let names: Vec<&str> = conn.rooms().iter().map(String::as_str).collect();
    format!("Your rooms:\n{}", names.join("\n"))
}

/// Parse one inbound text frame and act on it.
pub async fn dispatch(
    rooms: &RoomManager,
    conn: &mut Connection,
    input: &str,
) -> Result<(), WebSocketError> {
    let message = ClientMessage::parse(input);
    debug!("Connection {} sent {:?}", conn.id(), message);

    match message {
        ClientMessage::Join { room: Some(room) } => rooms.join(conn, &room).await,
        ClientMessage::Join { room: None } => conn.send(JOIN_USAGE),
        ClientMessage::Leave { room: Some(room) } => rooms.leave(conn, &room).await,
        ClientMessage::Leave { room: None } => conn.send(LEAVE_USAGE),
        ClientMessage::Room { room: Some(room), text } if !text.is_empty() => {
            rooms.room_message(conn, &room, &text).await
        }
        ClientMessage::Room { .. } => conn.send(ROOM_USAGE),
        ClientMessage::Rooms => conn.send(ROOMS_REPLY),
        ClientMessage::MyRooms => conn.send(&my_rooms(conn)),
        ClientMessage::Unknown { command } => conn.send(&unknown_command(&command)),
        ClientMessage::Chat { text } => conn.send(&format!("{}: {}", conn.username(), text)),
    }
}
