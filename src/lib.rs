pub mod chat;
pub mod config;
pub mod error;
pub mod websocket;

use std::sync::Arc;
use actix_web::{web, HttpResponse};

pub use error::AppError;
pub type Result<T> = std::result::Result<T, AppError>;
pub use config::Settings;

pub use chat::{Broadcaster, ChatServer, PubSub};

/// Health check endpoint handler
/// Returns a JSON response with server status, timestamp and open connections
pub async fn health_check(state: web::Data<AppState>) -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "connections": state.chat.connection_count().await,
    }))
}

/// Register every route of the chat server.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/health", web::get().to(health_check))
        .route("/ws", web::get().to(websocket::websocket_route))
        .default_service(web::to(websocket::index));
}

/// Application state shared across all components
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Settings>,
    pub chat: Arc<ChatServer>,
}

impl AppState {
    pub fn new(config: Settings) -> Self {
        let broadcaster: Arc<dyn Broadcaster> = Arc::new(PubSub::new());
        Self::with_broadcaster(config, broadcaster)
    }

    pub fn with_broadcaster(config: Settings, broadcaster: Arc<dyn Broadcaster>) -> Self {
        Self {
            config: Arc::new(config),
            chat: Arc::new(ChatServer::new(broadcaster)),
        }
    }
}
