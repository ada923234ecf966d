//! Optimistic message log for one request.

use crate::message::ChatMessage;
use chrono::{DateTime, Utc};
use medaudit_core::User;

/// Ordered view of one request's discussion, with optimistic local echo.
///
/// Three echo orderings are handled:
/// * echo-after, the usual case: the local placeholder is already in the log
///   when its confirmed counterpart arrives, and is replaced in place;
/// * echo-never, delivery failed: [`ChatLog::remove_local`] rolls the
///   placeholder back;
/// * echo-before, the confirmed message arrived first (another session, or a
///   fast round-trip): the later duplicate is dropped by id.
#[derive(Debug, Default)]
pub struct ChatLog {
    messages: Vec<ChatMessage>,
}

impl ChatLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    /// Appends an optimistic placeholder and returns it.
    pub fn append_local(
        &mut self,
        request_id: &str,
        sender: &User,
        content: &str,
        now: DateTime<Utc>,
    ) -> ChatMessage {
        let message = ChatMessage::local(request_id, sender, content, now);
        self.messages.push(message.clone());
        message
    }

    /// Merges one incoming confirmed message.
    ///
    /// A placeholder from the same sender with the same content is replaced
    /// in place, preserving its position; a message whose id is already known
    /// is dropped; anything else is appended.
    pub fn apply_incoming(&mut self, incoming: ChatMessage) {
        if self.messages.iter().any(|m| m.id == incoming.id) {
            return;
        }
        if let Some(placeholder) = self.messages.iter_mut().find(|m| {
            m.is_local() && m.sender_id == incoming.sender_id && m.content == incoming.content
        }) {
            *placeholder = incoming;
            return;
        }
        self.messages.push(incoming);
    }

    /// Rolls back one placeholder after a failed delivery.
    pub fn remove_local(&mut self, temp_id: &str) {
        self.messages.retain(|m| m.id != temp_id);
    }
}
