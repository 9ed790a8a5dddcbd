use std::sync::Arc;
use std::time::{Duration, Instant};
use actix::prelude::*;
use actix_web_actors::ws;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use crate::chat::ChatServer;
use crate::config::WebSocketConfig;

/// Text queued by the chat core for this client.
pub struct Outbound(String);

/// Actor bridging one websocket to its chat session flow.
///
/// Inbound text frames are queued to the session flow spawned in
/// `started`; replies and room broadcasts come back through a channel
/// the actor drains into text frames. Stopping the actor closes the
/// inbound queue, which is what triggers the chat cleanup.
pub struct ChatSession {
    chat: Arc<ChatServer>,
    username: String,
    peer_addr: String,
    inbound: Option<mpsc::UnboundedSender<String>>,
    last_heartbeat: Instant,
    heartbeat_interval: Duration,
    client_timeout: Duration,
}

impl ChatSession {
    pub fn new(
        chat: Arc<ChatServer>,
        username: String,
        peer_addr: String,
        config: &WebSocketConfig,
    ) -> Self {
        Self {
            chat,
            username,
            peer_addr,
            inbound: None,
            last_heartbeat: Instant::now(),
            heartbeat_interval: config.heartbeat_interval(),
            client_timeout: config.client_timeout(),
        }
    }

    fn start_heartbeat(&self, ctx: &mut <Self as Actor>::Context) {
        ctx.run_interval(self.heartbeat_interval, |act, ctx| {
            if Instant::now().duration_since(act.last_heartbeat) > act.client_timeout {
                warn!("Heartbeat timeout for {} ({})", act.peer_addr, act.username);
                ctx.stop();
                return;
            }
            ctx.ping(b"");
        });
    }

    fn forward(&mut self, text: String, ctx: &mut <Self as Actor>::Context) {
        let delivered = self
            .inbound
            .as_ref()
            .map(|tx| tx.send(text).is_ok())
            .unwrap_or(false);

        // The session flow is gone, nothing left to talk to
        if !delivered {
            ctx.stop();
        }
    }
}

impl Actor for ChatSession {
    type Context = ws::WebsocketContext<Self>;

    fn started(&mut self, ctx: &mut Self::Context) {
        info!("WebSocket connection established with {} as {}", self.peer_addr, self.username);
        self.start_heartbeat(ctx);

        let (out_tx, out_rx) = mpsc::unbounded_channel::<String>();
        let (in_tx, in_rx) = mpsc::unbounded_channel::<String>();
        self.inbound = Some(in_tx);

        ctx.add_stream(futures::stream::unfold(out_rx, |mut rx| async move {
            rx.recv().await.map(|text| (Outbound(text), rx))
        }));

        actix::spawn(
            self.chat
                .clone()
                .run_session(self.username.clone(), out_tx, in_rx),
        );
    }

    fn stopped(&mut self, _ctx: &mut Self::Context) {
        self.inbound.take();
        info!("WebSocket connection closed with {} ({})", self.peer_addr, self.username);
    }
}

impl StreamHandler<Outbound> for ChatSession {
    fn handle(&mut self, msg: Outbound, ctx: &mut Self::Context) {
        ctx.text(msg.0);
    }
}

impl StreamHandler<Result<ws::Message, ws::ProtocolError>> for ChatSession {
    fn handle(&mut self, msg: Result<ws::Message, ws::ProtocolError>, ctx: &mut Self::Context) {
        match msg {
            Ok(ws::Message::Ping(msg)) => {
                self.last_heartbeat = Instant::now();
                ctx.pong(&msg);
            }
            Ok(ws::Message::Pong(_)) => {
                self.last_heartbeat = Instant::now();
            }
            Ok(ws::Message::Text(text)) => {
                self.last_heartbeat = Instant::now();
                debug!("Received text frame from {}: {}", self.peer_addr, text);
                self.forward(text.to_string(), ctx);
            }
            Ok(ws::Message::Binary(bin)) => {
                warn!("Ignoring binary frame of {} bytes from {}", bin.len(), self.peer_addr);
            }
            Ok(ws::Message::Close(reason)) => {
                info!("WebSocket closed from {}: {:?}", self.peer_addr, reason);
                ctx.close(reason);
                ctx.stop();
            }
            Ok(ws::Message::Continuation(_)) => {
                warn!("Continuation frames are not supported, closing {}", self.peer_addr);
                ctx.stop();
            }
            Ok(ws::Message::Nop) => {}
            Err(e) => {
                error!("Error handling WebSocket message from {}: {}", self.peer_addr, e);
                ctx.stop();
            }
        }
    }
}
