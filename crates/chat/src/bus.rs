//! Message transport.

use crate::message::{ChatError, ChatMessage};
use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::{broadcast, RwLock};

/// Abstract pub/sub transport for chat messages.
#[async_trait]
pub trait MessageChannel: Send + Sync {
    async fn publish(&self, message: ChatMessage) -> Result<(), ChatError>;

    /// Subscribes to the live feed of one request. Only messages published
    /// after the call are delivered; history comes from the log.
    async fn subscribe(&self, request_id: &str) -> broadcast::Receiver<ChatMessage>;
}

/// In-process fan-out with one broadcast channel per request id.
///
/// Channels are created lazily and kept for the process lifetime; slow
/// subscribers that fall more than the channel capacity behind lose the
/// oldest messages (tokio broadcast lag semantics).
pub struct BroadcastBus {
    capacity: usize,
    channels: RwLock<HashMap<String, broadcast::Sender<ChatMessage>>>,
}

impl BroadcastBus {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            channels: RwLock::new(HashMap::new()),
        }
    }

    async fn sender(&self, request_id: &str) -> broadcast::Sender<ChatMessage> {
        if let Some(tx) = self.channels.read().await.get(request_id) {
            return tx.clone();
        }
        let mut channels = self.channels.write().await;
        channels
            .entry(request_id.to_owned())
            .or_insert_with(|| broadcast::channel(self.capacity).0)
            .clone()
    }
}

impl Default for BroadcastBus {
    fn default() -> Self {
        Self::new(64)
    }
}

#[async_trait]
impl MessageChannel for BroadcastBus {
    async fn publish(&self, message: ChatMessage) -> Result<(), ChatError> {
        let tx = self.sender(&message.request_id).await;
        // No live subscriber is not a failure; the log keeps the message.
        let _ = tx.send(message);
        Ok(())
    }

    async fn subscribe(&self, request_id: &str) -> broadcast::Receiver<ChatMessage> {
        self.sender(request_id).await.subscribe()
    }
}
