//! Chat core for the room server
//!
//! Connection state, topic fan-out, room membership and the text command
//! protocol. Nothing in here knows about HTTP or websocket frames.

mod broadcaster;
mod connection;
mod membership;
mod protocol;
mod registry;
mod server;

pub use broadcaster::{Broadcaster, PubSub};
pub use connection::{resolve_username, Connection, Subscriber, DEFAULT_USERNAME};
pub use membership::RoomManager;
pub use protocol::{ClientMessage, HELP_TEXT};
pub use registry::ConnectionRegistry;
pub use server::ChatServer;
