//! Tenant hierarchy: managing companies (gestoras) and operators (operadoras).

use serde::{Deserialize, Serialize};

/// Position of a tenant in the two-level hierarchy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TenantKind {
    /// Managing tenant; its visibility spans its operators.
    #[serde(rename = "GESTORA")]
    Gestora,
    /// Operator tenant; owns requests, optionally parented to a gestora.
    #[serde(rename = "OPERADORA")]
    Operadora,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TenantStatus {
    #[serde(rename = "ATIVO")]
    Ativo,
    #[serde(rename = "INATIVO")]
    Inativo,
}

/// A contracted company on the platform.
///
/// Ownership of a request is always an operator tenant. The contact and
/// registration fields are captured for administration only; no workflow rule
/// reads them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tenant {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub commercial_name: Option<String>,
    #[serde(rename = "type")]
    pub kind: TenantKind,
    /// Parent gestora; only meaningful for operators.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<String>,
    pub status: TenantStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cnpj: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contact_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contact_email: Option<String>,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

impl Tenant {
    /// Whether `operator` is owned by this gestora.
    pub fn manages(&self, operator: &Tenant) -> bool {
        self.kind == TenantKind::Gestora
            && operator.kind == TenantKind::Operadora
            && operator.parent_id.as_deref() == Some(self.id.as_str())
    }
}
