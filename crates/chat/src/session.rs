//! Chat orchestration: optimistic append, publish, rollback.

use crate::bus::MessageChannel;
use crate::log::ChatLog;
use crate::message::{ChatError, ChatMessage};
use medaudit_core::User;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{broadcast, RwLock};

/// Per-request chat sessions over one shared transport.
///
/// The service keeps a replayable log per request, so history can be served
/// without a persistence round-trip, and mirrors every confirmed publication
/// into it.
pub struct ChatService {
    bus: Arc<dyn MessageChannel>,
    logs: RwLock<HashMap<String, ChatLog>>,
}

impl ChatService {
    pub fn new(bus: Arc<dyn MessageChannel>) -> Self {
        Self {
            bus,
            logs: RwLock::new(HashMap::new()),
        }
    }

    /// Sends `content` into the request's discussion.
    ///
    /// The message is appended optimistically, then published; on delivery
    /// failure the placeholder is rolled back and the error surfaces to the
    /// sender. Blank content never leaves the client.
    pub async fn send(
        &self,
        request_id: &str,
        sender: &User,
        content: &str,
    ) -> Result<ChatMessage, ChatError> {
        let content = content.trim();
        if content.is_empty() {
            return Err(ChatError::EmptyContent);
        }

        let now = chrono::Utc::now();
        let placeholder = {
            let mut logs = self.logs.write().await;
            logs.entry(request_id.to_owned())
                .or_default()
                .append_local(request_id, sender, content, now)
        };

        let confirmed = ChatMessage::new(request_id, sender, content, now);
        if let Err(err) = self.bus.publish(confirmed.clone()).await {
            tracing::warn!(request = %request_id, %err, "message delivery failed, rolling back");
            let mut logs = self.logs.write().await;
            if let Some(log) = logs.get_mut(request_id) {
                log.remove_local(&placeholder.id);
            }
            return Err(err);
        }

        let mut logs = self.logs.write().await;
        logs.entry(request_id.to_owned())
            .or_default()
            .apply_incoming(confirmed.clone());
        Ok(confirmed)
    }

    /// The full discussion so far, placeholders included.
    pub async fn history(&self, request_id: &str) -> Vec<ChatMessage> {
        self.logs
            .read()
            .await
            .get(request_id)
            .map(|log| log.messages().to_vec())
            .unwrap_or_default()
    }

    /// Live feed of one request, for streaming consumers.
    pub async fn subscribe(&self, request_id: &str) -> broadcast::Receiver<ChatMessage> {
        self.bus.subscribe(request_id).await
    }
}
