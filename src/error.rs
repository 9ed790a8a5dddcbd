use thiserror::Error;
use actix_web::{ResponseError, HttpResponse, http::StatusCode};
use serde_json::json;

/// Body sent back when a request cannot be upgraded to a websocket.
pub const UPGRADE_ERROR_BODY: &str = "WebSocket upgrade error";

#[derive(Error, Debug)]
pub enum AppError {
    #[error("WebSocket error: {0}")]
    WebSocketError(#[from] WebSocketError),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Internal server error: {0}")]
    InternalError(String),
}

// Implement conversion from config::ConfigError
impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        AppError::ConfigError(err.to_string())
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::InternalError(err.to_string())
    }
}

impl ResponseError for AppError {
    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();

        // Upgrade failures answer in plain text, everything else in JSON
        if let AppError::WebSocketError(WebSocketError::UpgradeFailed(_)) = self {
            return HttpResponse::build(status)
                .content_type("text/plain; charset=utf-8")
                .body(UPGRADE_ERROR_BODY);
        }

        let response = json!({
            "error": {
                "status": status.as_u16(),
                "message": self.to_string()
            }
        });
        HttpResponse::build(status).json(response)
    }

    fn status_code(&self) -> StatusCode {
        match self {
            AppError::WebSocketError(e) => match e {
                WebSocketError::UpgradeFailed(_) => StatusCode::BAD_REQUEST,
                WebSocketError::SendError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            AppError::ConfigError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::InternalError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

#[derive(Error, Debug)]
pub enum WebSocketError {
    #[error("Message sending failed: {0}")]
    SendError(String),

    #[error("Upgrade failed: {0}")]
    UpgradeFailed(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::body::to_bytes;
    use std::io;

    #[test]
    fn test_error_conversion() {
        let io_err = io::Error::new(io::ErrorKind::AddrInUse, "address in use");
        let app_err: AppError = io_err.into();
        assert!(matches!(app_err, AppError::InternalError(_)));

        let config_err = config::ConfigError::NotFound(String::from("key not found"));
        let app_err: AppError = config_err.into();
        assert!(matches!(app_err, AppError::ConfigError(_)));

        let ws_err = WebSocketError::SendError("channel closed".to_string());
        let app_err: AppError = ws_err.into();
        assert!(matches!(app_err, AppError::WebSocketError(WebSocketError::SendError(_))));
    }

    #[test]
    fn test_error_status_codes() {
        let err = AppError::WebSocketError(WebSocketError::UpgradeFailed("no upgrade header".into()));
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);

        let err = AppError::WebSocketError(WebSocketError::SendError("closed".into()));
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);

        let err = AppError::ConfigError("missing".to_string());
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_error_display() {
        let err = AppError::ConfigError("missing key".to_string());
        assert_eq!(err.to_string(), "Configuration error: missing key");

        let err = AppError::WebSocketError(WebSocketError::SendError("closed".into()));
        assert_eq!(err.to_string(), "WebSocket error: Message sending failed: closed");
    }

    #[actix_web::test]
    async fn test_upgrade_error_body_is_plain_text() {
        let err = AppError::from(WebSocketError::UpgradeFailed("missing header".into()));
        let response = err.error_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let body = to_bytes(response.into_body()).await.unwrap();
        assert_eq!(&body[..], UPGRADE_ERROR_BODY.as_bytes());
    }

    #[actix_web::test]
    async fn test_other_errors_use_json_body() {
        let err = AppError::InternalError("boom".into());
        let response = err.error_response();
        let body = to_bytes(response.into_body()).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["error"]["status"], 500);
        assert_eq!(json["error"]["message"], "Internal server error: boom");
    }
}
