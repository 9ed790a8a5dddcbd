//! WebSocket transport for the chat server
//!
//! Upgrades HTTP requests and hands each socket to a [`ChatSession`] actor.

mod session;

pub use session::ChatSession;

use actix_web::{web, HttpRequest, HttpResponse};
use serde::Deserialize;
use actix_web_actors::ws;
use tracing::{info, warn};

use crate::chat::resolve_username;
use crate::error::{AppError, WebSocketError};
use crate::AppState;

pub const INDEX_BODY: &str = "Simple WebSocket Server";

#[derive(Debug, Default, Deserialize)]
pub struct ConnectParams {
    pub username: Option<String>,
}

/// Upgrade to a chat websocket. The username comes from `?username=`.
pub async fn websocket_route(
    req: HttpRequest,
    stream: web::Payload,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let peer_addr = req.peer_addr()
        .map(|addr| addr.to_string())
        .unwrap_or_else(|| "unknown".to_string());

    let params = web::Query::<ConnectParams>::from_query(req.query_string())
        .map(web::Query::into_inner)
        .unwrap_or_default();
    let username = resolve_username(params.username.as_deref());

    info!("New WebSocket connection request from {} as {}", peer_addr, username);

    let session = ChatSession::new(
        state.chat.clone(),
        username,
        peer_addr.clone(),
        &state.config.websocket,
    );

    ws::start(session, &req, stream).map_err(|e| {
        warn!("WebSocket upgrade failed for {}: {}", peer_addr, e);
        AppError::from(WebSocketError::UpgradeFailed(e.to_string()))
    })
}

/// Fallback for every request that is not a websocket upgrade.
pub async fn index() -> HttpResponse {
    HttpResponse::Ok()
        .content_type("text/plain; charset=utf-8")
        .body(INDEX_BODY)
}
