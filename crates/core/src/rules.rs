//! Governance rules maintained by the master administration.
//!
//! Rules are free-text instructions with a priority tier. They are injected
//! into the advisory oracle prompt with interpretive priority over the model's
//! default judgment; nothing in the workflow itself reads them.

use medaudit_types::NonEmptyText;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RulePriority {
    #[serde(rename = "ALTA")]
    Alta,
    #[serde(rename = "MEDIA")]
    Media,
    #[serde(rename = "BAIXA")]
    Baixa,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AiRule {
    pub id: String,
    /// Never blank; a rule without a title cannot be referenced in a prompt.
    pub title: NonEmptyText,
    pub description: String,
    pub is_active: bool,
    pub priority: RulePriority,
}
