//! Medical auditor profiles.

use crate::actor::AuditorKind;
use medaudit_types::Specialty;
use serde::{Deserialize, Serialize};

/// A registered medical auditor.
///
/// Auditors are linked to exactly one managing gestora and to any number of
/// operator tenants ("postos de atuação"), which define where their AUDIT-step
/// work may come from. The link is a plain many-to-many relation, not
/// ownership.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MedicalAuditor {
    pub id: String,
    pub name: String,
    /// Regional medical council registration.
    pub crm: String,
    pub uf: String,
    pub specialty: Specialty,
    /// Absent on profiles created before the two-tier rollout; treated as
    /// generalist.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tipo_auditor: Option<AuditorKind>,
    /// Specialist qualification registry number, when applicable.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rqe: Option<String>,
    pub rating: f32,
    pub is_active: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gestora_id: Option<String>,
    #[serde(default)]
    pub operator_ids: Vec<String>,
}

impl MedicalAuditor {
    pub fn kind(&self) -> AuditorKind {
        self.tipo_auditor.unwrap_or(AuditorKind::Generalista)
    }

    /// Whether this auditor may pick up AUDIT work owned by `operator_id`.
    pub fn works_for(&self, operator_id: &str) -> bool {
        self.operator_ids.iter().any(|id| id == operator_id)
    }
}
