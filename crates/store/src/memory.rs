//! In-memory record store.
//!
//! Collections live behind `tokio::sync::RwLock`s; requests are keyed by id
//! and written whole. This is the reference implementation of the
//! [`RecordStore`] contract; a durable backend replaces this type without
//! touching the workflow.

use crate::{RecordStore, StoreError};
use async_trait::async_trait;
use chrono::{Datelike, Utc};
use medaudit_core::{
    AiRule, MedicalAuditor, Procedure, Request, Role, Tenant, TenantKind, WorkflowDocument,
};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::RwLock;

#[derive(Default)]
pub struct MemoryStore {
    requests: RwLock<HashMap<String, Request>>,
    tenants: RwLock<Vec<Tenant>>,
    auditors: RwLock<Vec<MedicalAuditor>>,
    procedures: RwLock<Vec<Procedure>>,
    rules: RwLock<Vec<AiRule>>,
    /// Dossier templates keyed by tenant id.
    templates: RwLock<HashMap<String, Vec<WorkflowDocument>>>,
    auth_sequence: AtomicU64,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn set_tenants(&self, tenants: Vec<Tenant>) {
        *self.tenants.write().await = tenants;
    }

    pub async fn set_auditors(&self, auditors: Vec<MedicalAuditor>) {
        *self.auditors.write().await = auditors;
    }

    pub async fn set_procedures(&self, procedures: Vec<Procedure>) {
        *self.procedures.write().await = procedures;
    }

    pub async fn set_rules(&self, rules: Vec<AiRule>) {
        *self.rules.write().await = rules;
    }

    pub async fn set_template(&self, tenant_id: &str, slots: Vec<WorkflowDocument>) {
        self.templates
            .write()
            .await
            .insert(tenant_id.to_owned(), slots);
    }
}

#[async_trait]
impl RecordStore for MemoryStore {
    async fn requests_for(
        &self,
        role: Role,
        tenant_id: Option<&str>,
    ) -> Result<Vec<Request>, StoreError> {
        let requests = self.requests.read().await;
        let mut visible: Vec<Request> = match (role, tenant_id) {
            (Role::AdminMaster, _) | (_, None) => requests.values().cloned().collect(),
            (Role::EmpresaGestora, Some(gestora_id)) => {
                // A gestora's visibility spans its operators.
                let tenants = self.tenants.read().await;
                let managed: Vec<&str> = tenants
                    .iter()
                    .filter(|t| {
                        t.kind == TenantKind::Operadora
                            && t.parent_id.as_deref() == Some(gestora_id)
                    })
                    .map(|t| t.id.as_str())
                    .collect();
                requests
                    .values()
                    .filter(|r| {
                        r.tenant_id.as_deref() == Some(gestora_id)
                            || r.tenant_id
                                .as_deref()
                                .is_some_and(|id| managed.contains(&id))
                    })
                    .cloned()
                    .collect()
            }
            (_, Some(own)) => requests
                .values()
                .filter(|r| r.tenant_id.as_deref() == Some(own))
                .cloned()
                .collect(),
        };
        visible.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(visible)
    }

    async fn request(&self, id: &str) -> Result<Request, StoreError> {
        self.requests
            .read()
            .await
            .get(id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound { id: id.to_owned() })
    }

    async fn insert_request(&self, request: Request) -> Result<Request, StoreError> {
        let mut requests = self.requests.write().await;
        requests.insert(request.id.clone(), request.clone());
        tracing::info!(request = %request.id, "request registered");
        Ok(request)
    }

    async fn update_request(&self, request: Request) -> Result<Request, StoreError> {
        let mut requests = self.requests.write().await;
        let stored = requests
            .get(&request.id)
            .ok_or_else(|| StoreError::NotFound {
                id: request.id.clone(),
            })?;
        if stored.revision != request.revision {
            return Err(StoreError::Conflict {
                id: request.id.clone(),
                expected: request.revision,
                found: stored.revision,
            });
        }
        let mut updated = request;
        updated.revision += 1;
        requests.insert(updated.id.clone(), updated.clone());
        Ok(updated)
    }

    async fn document_template(
        &self,
        tenant_id: Option<&str>,
    ) -> Result<Option<Vec<WorkflowDocument>>, StoreError> {
        let Some(tenant_id) = tenant_id else {
            return Ok(None);
        };
        Ok(self.templates.read().await.get(tenant_id).cloned())
    }

    async fn tenants(&self) -> Result<Vec<Tenant>, StoreError> {
        Ok(self.tenants.read().await.clone())
    }

    async fn auditors(&self) -> Result<Vec<MedicalAuditor>, StoreError> {
        Ok(self.auditors.read().await.clone())
    }

    async fn search_procedures(&self, term: &str) -> Result<Vec<Procedure>, StoreError> {
        let term = term.trim().to_lowercase();
        let procedures = self.procedures.read().await;
        Ok(procedures
            .iter()
            .filter(|p| {
                p.is_active
                    && (p.code.to_lowercase().contains(&term)
                        || p.description.to_lowercase().contains(&term))
            })
            .cloned()
            .collect())
    }

    async fn procedure(&self, code: &str) -> Result<Procedure, StoreError> {
        self.procedures
            .read()
            .await
            .iter()
            .find(|p| p.is_active && p.code == code)
            .cloned()
            .ok_or_else(|| StoreError::UnknownProcedure {
                code: code.to_owned(),
            })
    }

    async fn active_rules(&self) -> Result<Vec<AiRule>, StoreError> {
        Ok(self
            .rules
            .read()
            .await
            .iter()
            .filter(|r| r.is_active)
            .cloned()
            .collect())
    }

    async fn generate_auth_code(&self) -> Result<String, StoreError> {
        let seq = self.auth_sequence.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(format!("AUT-{}-{:06}", Utc::now().year(), seq))
    }

    async fn reload(&self) -> Result<(), StoreError> {
        // Nothing cached here; the hook exists for incremental-sync backends.
        Ok(())
    }
}
