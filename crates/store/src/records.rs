//! The record-store collaborator interface.

use crate::StoreError;
use async_trait::async_trait;
use medaudit_core::{
    AiRule, MedicalAuditor, Procedure, Request, Role, Tenant, WorkflowDocument,
};

/// Abstract record store consumed by [`crate::AuditService`].
///
/// Implementations must guarantee that reads observe a total order of history
/// events per request (no reordering); concurrent writers are serialized by
/// the revision check in [`RecordStore::update_request`].
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Fetches the requests visible to `role` at the tenant boundary.
    ///
    /// Tenant scoping happens here, upstream of the queue routing engine: the
    /// master admin sees everything, a gestora sees its own requests plus
    /// those of its operators, everyone else sees their own tenant only.
    async fn requests_for(
        &self,
        role: Role,
        tenant_id: Option<&str>,
    ) -> Result<Vec<Request>, StoreError>;

    async fn request(&self, id: &str) -> Result<Request, StoreError>;

    async fn insert_request(&self, request: Request) -> Result<Request, StoreError>;

    /// Replaces the whole aggregate.
    ///
    /// The incoming `revision` must match the stored one; on mismatch the
    /// write is rejected with [`StoreError::Conflict`]. On success the stored
    /// revision is bumped by one.
    async fn update_request(&self, request: Request) -> Result<Request, StoreError>;

    /// Tenant-level dossier template; `None` means the caller falls back to
    /// the fixed default slots.
    async fn document_template(
        &self,
        tenant_id: Option<&str>,
    ) -> Result<Option<Vec<WorkflowDocument>>, StoreError>;

    async fn tenants(&self) -> Result<Vec<Tenant>, StoreError>;

    async fn auditors(&self) -> Result<Vec<MedicalAuditor>, StoreError>;

    /// Case-insensitive catalog search on procedure code or description.
    async fn search_procedures(&self, term: &str) -> Result<Vec<Procedure>, StoreError>;

    /// Resolves one active catalog entry by exact code.
    ///
    /// Rejects unknown and inactive codes with
    /// [`StoreError::UnknownProcedure`]; registration never persists catalog
    /// data supplied by the caller.
    async fn procedure(&self, code: &str) -> Result<Procedure, StoreError>;

    /// Governance rules currently active for oracle prompt injection.
    async fn active_rules(&self) -> Result<Vec<AiRule>, StoreError>;

    /// Server-generated sequential, human-readable authorization code.
    /// Invoked exactly once per request, at the FINISHED transition.
    async fn generate_auth_code(&self) -> Result<String, StoreError>;

    /// Idempotent full-refresh hook.
    ///
    /// The workflow keeps the original wholesale-reload contract: callers may
    /// invoke this after every mutation. A store without caches treats it as a
    /// no-op; an incremental-sync store can hang its own logic here without
    /// touching the workflow code.
    async fn reload(&self) -> Result<(), StoreError>;
}
