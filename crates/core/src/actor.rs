//! Actor identity: roles and the acting user.
//!
//! The auth/session provider is an external collaborator; it only supplies the
//! opaque identity and role claims captured here. Nothing in this module talks
//! to it.

use medaudit_types::Specialty;
use serde::{Deserialize, Serialize};

/// The four access roles of the platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Role {
    /// Platform-wide administrator, outside the tenant hierarchy.
    #[serde(rename = "ADMIN_MASTER")]
    AdminMaster,
    /// Managing tenant (gestora) staff.
    #[serde(rename = "EMPRESA_GESTORA")]
    EmpresaGestora,
    /// Operator tenant (operadora) staff; registers and effectuates requests.
    #[serde(rename = "OPERADORA")]
    Operadora,
    /// Medical auditor, generalist or specialist.
    #[serde(rename = "AUDITOR_MEDICO")]
    AuditorMedico,
}

impl Role {
    /// Managers may act across the tenants they oversee.
    pub fn is_manager(self) -> bool {
        matches!(self, Role::AdminMaster | Role::EmpresaGestora)
    }
}

/// The two tiers of the medical audit pool.
///
/// Generalists triage the shared queue and may hand a request to exactly one
/// named specialty; specialists may bounce it back to the generalist pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AuditorKind {
    #[serde(rename = "GENERALISTA")]
    Generalista,
    #[serde(rename = "ESPECIALISTA")]
    Especialista,
}

/// The acting user attached to every workflow operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub name: String,
    pub role: Role,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tenant_id: Option<String>,
    /// Meaningful only when `role` is [`Role::AuditorMedico`].
    #[serde(rename = "tipo_auditor", default, skip_serializing_if = "Option::is_none")]
    pub tipo_auditor: Option<AuditorKind>,
    /// Clinical specialty; meaningful only for specialist auditors.
    #[serde(rename = "especialidade", default, skip_serializing_if = "Option::is_none")]
    pub especialidade: Option<Specialty>,
}

impl User {
    /// The auditor tier, defaulting to generalist when the profile omits it.
    ///
    /// A profile row without `tipo_auditor` predates the two-tier rollout and
    /// has always been treated as a generalist.
    pub fn auditor_kind(&self) -> AuditorKind {
        self.tipo_auditor.unwrap_or(AuditorKind::Generalista)
    }
}
