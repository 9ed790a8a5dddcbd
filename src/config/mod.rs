use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::env;
use std::time::Duration;

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub workers: u32,
}

/// Keep-alive settings for websocket sessions
#[derive(Debug, Deserialize, Clone)]
pub struct WebSocketConfig {
    pub heartbeat_interval_secs: u64,
    pub client_timeout_secs: u64,
}

impl WebSocketConfig {
    pub fn heartbeat_interval(&self) -> Duration {
        Duration::from_secs(self.heartbeat_interval_secs)
    }

    pub fn client_timeout(&self) -> Duration {
        Duration::from_secs(self.client_timeout_secs)
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct CorsConfig {
    pub enabled: bool,
    pub allow_any_origin: bool,
    pub max_age: u32,
}

#[derive(Debug, Deserialize, Clone)]
pub struct Settings {
    pub environment: String,
    pub server: ServerConfig,
    pub websocket: WebSocketConfig,
    pub cors: CorsConfig,
}

type Builder = config::ConfigBuilder<config::builder::DefaultState>;

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let s = Self::with_defaults(Config::builder(), "development")?
            // Add in settings from the config file if it exists
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", run_mode)).required(false))
            // Add in settings from environment variables (with prefix "APP_")
            // E.g., `APP_SERVER__PORT=5001` would set `Settings.server.port`
            .add_source(Self::environment())
            .build()?;

        s.try_deserialize::<Self>()?.validate()
    }

    /// Defaults plus `APP_` environment variables, no config files.
    pub fn new_for_test() -> Result<Self, ConfigError> {
        Self::from_environment(Self::environment())
    }

    fn from_environment(environment: Environment) -> Result<Self, ConfigError> {
        Self::with_defaults(Config::builder(), "test")?
            .add_source(environment)
            .build()?
            .try_deserialize::<Self>()?
            .validate()
    }

    /// Reject websocket timings that would drop responsive clients.
    fn validate(self) -> Result<Self, ConfigError> {
        let ws = &self.websocket;
        if ws.heartbeat_interval_secs == 0 {
            return Err(ConfigError::Message(
                "websocket.heartbeat_interval_secs must be greater than zero".into(),
            ));
        }
        if ws.heartbeat_interval_secs >= ws.client_timeout_secs {
            return Err(ConfigError::Message(format!(
                "websocket.heartbeat_interval_secs ({}) must be less than websocket.client_timeout_secs ({})",
                ws.heartbeat_interval_secs, ws.client_timeout_secs
            )));
        }
        Ok(self)
    }

    fn environment() -> Environment {
        Environment::with_prefix("app")
            .separator("__")
            .try_parsing(true)
    }

    fn with_defaults(builder: Builder, environment: &str) -> Result<Builder, ConfigError> {
        builder
            .set_default("environment", environment)?
            .set_default("server.host", "127.0.0.1")?
            .set_default("server.port", 8080)?
            .set_default("server.workers", num_cpus::get() as i64)?
            .set_default("websocket.heartbeat_interval_secs", 5)?
            .set_default("websocket.client_timeout_secs", 10)?
            .set_default("cors.enabled", true)?
            .set_default("cors.allow_any_origin", true)?
            .set_default("cors.max_age", 3600)
    }
}
