//! Topic based fan-out.
//!
//! A topic only exists while it has at least one subscriber. All mutation
//! goes through a single write lock and publishing holds the read lock for
//! the whole fan-out, so a publish never races a subscribe or unsubscribe
//! on the same table.

use std::collections::HashMap;
use std::sync::Arc;
use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;
use tracing::{debug, warn};

use super::connection::Subscriber;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Broadcaster: Send + Sync {
    /// Add `subscriber` to `topic`. Subscribing twice is a no-op.
    async fn subscribe(&self, subscriber: Subscriber, topic: &str);

    /// Remove the subscriber with `id` from `topic`, if present.
    async fn unsubscribe(&self, id: Uuid, topic: &str);

    /// Deliver `message` to every current subscriber of `topic`.
    ///
    /// Returns how many subscribers the message was handed to. A failed
    /// send to one subscriber does not stop delivery to the rest.
    async fn publish(&self, topic: &str, message: &str) -> usize;

    async fn subscribers(&self, topic: &str) -> Vec<Uuid>;

    async fn topic_count(&self) -> usize;
}

#[derive(Debug, Default)]
pub struct PubSub {
    topics: Arc<RwLock<HashMap<String, HashMap<Uuid, Subscriber>>>>,
}

impl PubSub {
    pub fn new() -> Self {
        Self {
            topics: Arc::new(RwLock::new(HashMap::new())),
        }
    }
}

#[async_trait]
impl Broadcaster for PubSub {
    async fn subscribe(&self, subscriber: Subscriber, topic: &str) {
        let mut topics = self.topics.write().await;
        let id = subscriber.id();
        topics
            .entry(topic.to_string())
            .or_default()
            .entry(id)
            .or_insert(subscriber);
        debug!("Connection {} subscribed to {}", id, topic);
    }

    async fn unsubscribe(&self, id: Uuid, topic: &str) {
        let mut topics = self.topics.write().await;
        if let Some(subscribers) = topics.get_mut(topic) {
            if subscribers.remove(&id).is_some() {
                debug!("Connection {} unsubscribed from {}", id, topic);
            }
            if subscribers.is_empty() {
                topics.remove(topic);
            }
        }
    }

    async fn publish(&self, topic: &str, message: &str) -> usize {
        let topics = self.topics.read().await;
        let Some(subscribers) = topics.get(topic) else {
            return 0;
        };

        let mut delivered = 0;
        for (id, subscriber) in subscribers.iter() {
            match subscriber.send(message) {
                Ok(()) => delivered += 1,
                Err(e) => warn!("Failed to publish to {} on {}: {}", id, topic, e),
            }
        }
        delivered
    }

    async fn subscribers(&self, topic: &str) -> Vec<Uuid> {
        self.topics
            .read()
            .await
            .get(topic)
            .map(|subscribers| subscribers.keys().copied().collect())
            .unwrap_or_default()
    }

    async fn topic_count(&self) -> usize {
        self.topics.read().await.len()
    }
}
