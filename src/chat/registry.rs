use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;
use tracing::{debug, info};

/// Book-keeping of open connections. Rooms are deliberately not tracked here.
#[derive(Debug, Default)]
pub struct ConnectionRegistry {
    connections: Arc<RwLock<HashMap<Uuid, String>>>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self {
            connections: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    pub async fn add(&self, id: Uuid, username: &str) {
        self.connections.write().await.insert(id, username.to_string());
        debug!("Registered connection {} ({})", id, username);
    }

    pub async fn remove(&self, id: &Uuid) -> bool {
        let removed = self.connections.write().await.remove(id);
        if let Some(username) = &removed {
            info!("Unregistered connection {} ({})", id, username);
        }
        removed.is_some()
    }

    pub async fn connection_count(&self) -> usize {
        self.connections.read().await.len()
    }

    pub async fn usernames(&self) -> Vec<String> {
        self.connections.read().await.values().cloned().collect()
    }
}
