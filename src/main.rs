use actix_web::{web, App, HttpServer};
use actix_cors::Cors;
use roomchat::{AppState, Settings, AppError};
use dotenv::dotenv;
use std::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;

fn cors(settings: &Settings) -> Cors {
    if !settings.cors.enabled {
        // CORS disabled - use most restrictive settings
        return Cors::default();
    }

    let cors_config = if settings.cors.allow_any_origin {
        Cors::default()
            .allow_any_origin()
            .allow_any_method()
            .allow_any_header()
    } else {
        Cors::default()
            .allowed_origin(&format!("http://{}:{}", settings.server.host, settings.server.port))
            .allowed_methods(vec!["GET"])
    };

    cors_config.max_age(settings.cors.max_age as usize)
}

#[actix_web::main]
async fn main() -> roomchat::Result<()> {
    // Load environment variables
    dotenv().ok();

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true)
        .init();

    // Load configuration
    let config = Settings::new()?;
    info!("Configuration loaded successfully ({})", config.environment);

    let state = web::Data::new(AppState::new(config.clone()));

    // Create and bind TCP listener
    let listener = TcpListener::bind(format!("{}:{}", config.server.host, config.server.port))?;

    info!(
        "Chat server ready to accept connections at ws://{}:{}/ws",
        config.server.host, config.server.port
    );

    let workers = config.server.workers as usize;
    HttpServer::new(move || {
        App::new()
            .wrap(cors(&config))
            .app_data(state.clone())
            .configure(roomchat::configure)
    })
    .listen(listener)?
    .workers(workers)
    .run()
    .await
    .map_err(|e| AppError::InternalError(e.to_string()))?;

    Ok(())
}
