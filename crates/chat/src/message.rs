//! The chat message wire type.

use chrono::{DateTime, Utc};
use medaudit_core::{Role, User};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, thiserror::Error)]
pub enum ChatError {
    #[error("message content is empty")]
    EmptyContent,
    #[error("message delivery failed for request {0}")]
    Delivery(String),
}

/// One message of a request's technical discussion.
///
/// Messages with a `temp-` prefixed id are local optimistic placeholders
/// awaiting their server echo; everything else is confirmed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessage {
    pub id: String,
    pub request_id: String,
    pub sender_id: String,
    pub sender_name: String,
    pub sender_role: Role,
    pub content: String,
    pub timestamp: DateTime<Utc>,
    /// Audience marker; every message is currently visible to all roles.
    pub visibility: String,
}

impl ChatMessage {
    /// A confirmed message from `sender`.
    pub fn new(request_id: &str, sender: &User, content: &str, now: DateTime<Utc>) -> Self {
        Self {
            id: format!("msg-{}", Uuid::new_v4()),
            request_id: request_id.to_owned(),
            sender_id: sender.id.clone(),
            sender_name: sender.name.clone(),
            sender_role: sender.role,
            content: content.to_owned(),
            timestamp: now,
            visibility: "ALL".to_owned(),
        }
    }

    /// A local placeholder awaiting its echo.
    pub fn local(request_id: &str, sender: &User, content: &str, now: DateTime<Utc>) -> Self {
        Self {
            id: format!("temp-{}", Uuid::new_v4()),
            ..Self::new(request_id, sender, content, now)
        }
    }

    pub fn is_local(&self) -> bool {
        self.id.starts_with("temp-")
    }
}
