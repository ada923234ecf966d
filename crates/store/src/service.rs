//! Orchestration layer between validation, the pure workflow and persistence.
//!
//! [`AuditService`] owns no state of its own; it composes a [`RecordStore`]
//! and a [`BlobStorage`] behind trait objects so backends can be swapped
//! without touching the workflow.

use crate::{BlobStorage, RecordStore, StoreError};
use medaudit_core::{
    average_audit_duration, step_counts, transition, visible_queue, AuditItem, ItemStatus,
    NewRequest, QueueTab, Request, Role, SlaStats, StepCounts, TransitionCommand, User,
    WorkflowStep,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

/// One file of an upload batch, before it reaches blob storage.
#[derive(Debug, Clone)]
pub struct Upload {
    pub name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

/// An auditor's decision on one existing item.
///
/// Items are amended in place; lines are never added or removed after
/// registration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemAmendment {
    pub item_id: String,
    pub quantity_authorized: u32,
    pub status: ItemStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub justification: Option<String>,
}

/// Dashboard aggregate: average audit duration plus per-step counts.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SlaOverview {
    pub average_audit: SlaStats,
    pub steps: StepCounts,
}

pub struct AuditService {
    store: Arc<dyn RecordStore>,
    blobs: Arc<dyn BlobStorage>,
}

impl AuditService {
    pub fn new(store: Arc<dyn RecordStore>, blobs: Arc<dyn BlobStorage>) -> Self {
        Self { store, blobs }
    }

    pub fn store(&self) -> &Arc<dyn RecordStore> {
        &self.store
    }

    /// Registers a new request owned by the actor's tenant.
    ///
    /// Item lines are resolved against the server-held procedure catalog:
    /// the draft names codes only, and an unknown or inactive code rejects
    /// the whole draft. When the draft carries no dossier, the tenant's
    /// document template is applied; absent a template, [`NewRequest::submit`]
    /// falls back to the fixed default slots. Validation failures reject the
    /// whole draft; no partial state is written.
    pub async fn create_request(
        &self,
        mut draft: NewRequest,
        actor: &User,
    ) -> Result<Request, StoreError> {
        let tenant_id = actor.tenant_id.clone();
        if draft.documents.is_empty() {
            if let Some(template) = self.store.document_template(tenant_id.as_deref()).await? {
                draft.documents = template;
            }
        }

        let mut items = Vec::with_capacity(draft.items.len());
        for line in &draft.items {
            let procedure = self.store.procedure(&line.procedure_code).await?;
            items.push(AuditItem::new(procedure, line.quantity_requested));
        }

        let id = format!("req-{}", Uuid::new_v4());
        let request = draft.submit(id, tenant_id, items, actor, chrono::Utc::now())?;
        let saved = self.store.insert_request(request).await?;
        self.store.reload().await?;
        Ok(saved)
    }

    /// Applies one workflow transition and persists the updated aggregate.
    ///
    /// Legality is checked by the state machine; this layer adds the one
    /// side effect the pure function cannot perform: when the request reaches
    /// FINISHED, the authorization code is generated and assigned, exactly
    /// once.
    pub async fn transition(
        &self,
        request_id: &str,
        actor: &User,
        command: TransitionCommand,
    ) -> Result<Request, StoreError> {
        let current = self.store.request(request_id).await?;
        let mut updated = transition(&current, actor, command, chrono::Utc::now())?;

        if updated.workflow_step == WorkflowStep::Finished && updated.auth_code.is_none() {
            let code = self.store.generate_auth_code().await?;
            tracing::info!(request = %updated.id, code = %code, "authorization code assigned");
            updated.auth_code = Some(code);
        }

        let saved = self.store.update_request(updated).await?;
        self.store.reload().await?;
        Ok(saved)
    }

    /// Persists an auditor's item decisions.
    ///
    /// Only a medical auditor may amend items, and only while the request
    /// sits in the AUDIT step. Every amendment must reference an existing
    /// item; an unknown id rejects the whole batch.
    pub async fn save_items(
        &self,
        request_id: &str,
        actor: &User,
        amendments: Vec<ItemAmendment>,
    ) -> Result<Request, StoreError> {
        if actor.role != Role::AuditorMedico {
            return Err(StoreError::Forbidden(format!(
                "role {:?} may not amend audit items",
                actor.role
            )));
        }

        let mut request = self.store.request(request_id).await?;
        if request.workflow_step != WorkflowStep::Audit {
            return Err(StoreError::Forbidden(format!(
                "items may only be amended in the AUDIT step, request is in {:?}",
                request.workflow_step
            )));
        }

        for amendment in amendments {
            let item = request
                .items
                .iter_mut()
                .find(|i| i.id == amendment.item_id)
                .ok_or_else(|| StoreError::UnknownItem {
                    request_id: request_id.to_owned(),
                    item_id: amendment.item_id.clone(),
                })?;
            item.quantity_authorized = amendment.quantity_authorized;
            item.status = amendment.status;
            item.justification = amendment.justification;
        }
        request.last_update = chrono::Utc::now();

        let saved = self.store.update_request(request).await?;
        self.store.reload().await?;
        Ok(saved)
    }

    /// Uploads a batch of files into one dossier slot.
    ///
    /// Files are uploaded independently; partial success is accepted and the
    /// slot accumulates whatever made it through. Only when every file of the
    /// batch fails is the operation an error, and nothing is persisted.
    pub async fn attach_files(
        &self,
        request_id: &str,
        doc_id: &str,
        uploads: Vec<Upload>,
    ) -> Result<Request, StoreError> {
        let mut request = self.store.request(request_id).await?;
        if !request.documents.iter().any(|d| d.id == doc_id) {
            return Err(StoreError::UnknownDocument {
                request_id: request_id.to_owned(),
                doc_id: doc_id.to_owned(),
            });
        }

        let total = uploads.len();
        let mut stored = Vec::new();
        let mut failures = Vec::new();
        for upload in uploads {
            match self
                .blobs
                .upload(&upload.name, upload.bytes, &upload.content_type)
                .await
            {
                Ok(meta) => stored.push(meta),
                Err(err) => {
                    tracing::warn!(request = %request_id, file = %upload.name, %err, "file upload failed");
                    failures.push(upload.name);
                }
            }
        }
        if stored.is_empty() && total > 0 {
            return Err(StoreError::Upload(format!(
                "all {total} files failed: {}",
                failures.join(", ")
            )));
        }

        let slot = request
            .documents
            .iter_mut()
            .find(|d| d.id == doc_id)
            .ok_or_else(|| StoreError::UnknownDocument {
                request_id: request_id.to_owned(),
                doc_id: doc_id.to_owned(),
            })?;
        slot.files.extend(stored);
        request.last_update = chrono::Utc::now();

        let saved = self.store.update_request(request).await?;
        self.store.reload().await?;
        Ok(saved)
    }

    /// The actor's work queue: tenant scoping at the store, then role, tab
    /// and search filtering by the routing engine.
    pub async fn queue(
        &self,
        actor: &User,
        tab: QueueTab,
        search: &str,
    ) -> Result<Vec<Request>, StoreError> {
        let requests = self
            .store
            .requests_for(actor.role, actor.tenant_id.as_deref())
            .await?;
        Ok(visible_queue(&requests, actor, tab, search)
            .into_iter()
            .cloned()
            .collect())
    }

    /// SLA and step-count aggregates over the requests the actor may see.
    pub async fn sla_overview(&self, actor: &User) -> Result<SlaOverview, StoreError> {
        let requests = self
            .store
            .requests_for(actor.role, actor.tenant_id.as_deref())
            .await?;
        Ok(SlaOverview {
            average_audit: average_audit_duration(&requests),
            steps: step_counts(&requests),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{seed, MemoryBlobStorage};
    use async_trait::async_trait;
    use medaudit_core::{AuditorKind, ItemDraft, MetadataPatch};

    fn operator() -> User {
        seed::demo_users()
            .into_iter()
            .find(|u| u.role == Role::Operadora)
            .unwrap()
    }

    fn auditor() -> User {
        seed::demo_users()
            .into_iter()
            .find(|u| u.role == Role::AuditorMedico)
            .unwrap()
    }

    async fn service_with_request() -> (AuditService, String) {
        let store = Arc::new(seed::demo_store().await);
        let request = seed::demo_request("REQ-S", seed::OPERADORA_ID);
        store.insert_request(request.clone()).await.unwrap();
        let service = AuditService::new(store, Arc::new(MemoryBlobStorage::default()));
        (service, request.id)
    }

    fn cmd(next_step: WorkflowStep, description: &str) -> TransitionCommand {
        TransitionCommand {
            next_step,
            description: description.into(),
            patch: MetadataPatch::default(),
        }
    }

    #[tokio::test]
    async fn full_path_persists_history_and_assigns_auth_code_once() {
        let (service, id) = service_with_request().await;

        let r = service
            .transition(&id, &operator(), cmd(WorkflowStep::Audit, "Triagem concluída"))
            .await
            .unwrap();
        assert_eq!(r.workflow_step, WorkflowStep::Audit);
        assert!(r.auth_code.is_none());

        let r = service
            .transition(&id, &auditor(), cmd(WorkflowStep::Release, "Parecer favorável"))
            .await
            .unwrap();
        assert_eq!(r.history.len(), 3);

        let r = service
            .transition(&id, &operator(), cmd(WorkflowStep::Finished, "Autorização emitida"))
            .await
            .unwrap();
        assert_eq!(r.workflow_step, WorkflowStep::Finished);
        let code = r.auth_code.clone().unwrap();
        assert!(code.starts_with("AUT-"));

        // Persisted copy carries the code and the full trail.
        let stored = service.store().request(&id).await.unwrap();
        assert_eq!(stored.auth_code, Some(code));
        assert_eq!(stored.history.len(), 4);
        assert_eq!(stored.revision, 3);
    }

    #[tokio::test]
    async fn operator_may_not_amend_items() {
        let (service, id) = service_with_request().await;
        let err = service
            .save_items(&id, &operator(), Vec::new())
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Forbidden(_)));
    }

    #[tokio::test]
    async fn items_are_only_amendable_under_audit() {
        let (service, id) = service_with_request().await;
        // Still in ADMINISTRATIVE.
        let err = service
            .save_items(&id, &auditor(), Vec::new())
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Forbidden(_)));
    }

    #[tokio::test]
    async fn item_amendment_batch_rejects_unknown_ids() {
        let (service, id) = service_with_request().await;
        service
            .transition(&id, &operator(), cmd(WorkflowStep::Audit, "Triagem concluída"))
            .await
            .unwrap();

        let err = service
            .save_items(
                &id,
                &auditor(),
                vec![ItemAmendment {
                    item_id: "i-missing".into(),
                    quantity_authorized: 1,
                    status: ItemStatus::Favorable,
                    justification: None,
                }],
            )
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::UnknownItem { .. }));
    }

    #[tokio::test]
    async fn amended_items_persist_decision_and_justification() {
        let (service, id) = service_with_request().await;
        service
            .transition(&id, &operator(), cmd(WorkflowStep::Audit, "Triagem concluída"))
            .await
            .unwrap();

        let item_id = service.store().request(&id).await.unwrap().items[0].id.clone();
        let saved = service
            .save_items(
                &id,
                &auditor(),
                vec![ItemAmendment {
                    item_id: item_id.clone(),
                    quantity_authorized: 0,
                    status: ItemStatus::Unfavorable,
                    justification: Some("Sem laudo que sustente a indicação.".into()),
                }],
            )
            .await
            .unwrap();

        let item = saved.items.iter().find(|i| i.id == item_id).unwrap();
        assert_eq!(item.quantity_authorized, 0);
        assert_eq!(item.status, ItemStatus::Unfavorable);
        assert!(item.justification.is_some());
    }

    struct FailingBlob;

    #[async_trait]
    impl BlobStorage for FailingBlob {
        async fn upload(
            &self,
            name: &str,
            _bytes: Vec<u8>,
            _content_type: &str,
        ) -> Result<medaudit_core::FileMetadata, StoreError> {
            Err(StoreError::Upload(format!("{name}: backend offline")))
        }
    }

    #[tokio::test]
    async fn upload_batch_with_no_survivors_is_an_error_and_persists_nothing() {
        let store = Arc::new(seed::demo_store().await);
        let request = seed::demo_request("REQ-U", seed::OPERADORA_ID);
        store.insert_request(request).await.unwrap();
        let service = AuditService::new(store, Arc::new(FailingBlob));

        let err = service
            .attach_files(
                "REQ-U",
                "doc-1",
                vec![Upload {
                    name: "laudo.pdf".into(),
                    content_type: "application/pdf".into(),
                    bytes: vec![1, 2, 3],
                }],
            )
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Upload(_)));

        let stored = service.store().request("REQ-U").await.unwrap();
        assert!(stored.documents[0].files.is_empty());
        assert_eq!(stored.revision, 0);
    }

    #[tokio::test]
    async fn successful_uploads_accumulate_in_the_slot() {
        let (service, id) = service_with_request().await;
        let saved = service
            .attach_files(
                &id,
                "doc-1",
                vec![
                    Upload {
                        name: "laudo.pdf".into(),
                        content_type: "application/pdf".into(),
                        bytes: vec![1],
                    },
                    Upload {
                        name: "exame.pdf".into(),
                        content_type: "application/pdf".into(),
                        bytes: vec![2],
                    },
                ],
            )
            .await
            .unwrap();
        assert_eq!(saved.documents[0].files.len(), 2);
        assert!(saved.documents[0].files.iter().all(|f| f.url.is_some()));
    }

    #[tokio::test]
    async fn attaching_to_a_missing_slot_is_rejected() {
        let (service, id) = service_with_request().await;
        let err = service
            .attach_files(&id, "doc-99", Vec::new())
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::UnknownDocument { .. }));
    }

    fn draft(procedure_code: &str) -> NewRequest {
        let seeded = seed::demo_request("unused", seed::OPERADORA_ID);
        NewRequest {
            beneficiary: seeded.beneficiary,
            cid10: seeded.cid10,
            clinical_summary: seeded.clinical_summary,
            items: vec![ItemDraft {
                procedure_code: procedure_code.into(),
                quantity_requested: 2,
            }],
            documents: Vec::new(),
            guia_number: None,
            request_date: None,
            requesting_entity: None,
            service_type: None,
            request_character: Some(1),
            accident_indication: Some(9),
            service_date: None,
            co_authorization: false,
            executing_entity: None,
            executing_city: None,
            transaction_number: None,
        }
    }

    #[tokio::test]
    async fn create_request_applies_the_tenant_document_template() {
        let store = Arc::new(seed::demo_store().await);
        store
            .set_template(
                seed::OPERADORA_ID,
                vec![medaudit_core::WorkflowDocument {
                    id: "doc-custom".into(),
                    name: "CHECKLIST INTERNO".into(),
                    required: true,
                    files: Vec::new(),
                }],
            )
            .await;
        let service = AuditService::new(store, Arc::new(MemoryBlobStorage::default()));

        let saved = service
            .create_request(draft("31009166"), &operator())
            .await
            .unwrap();
        assert_eq!(saved.documents.len(), 1);
        assert_eq!(saved.documents[0].id, "doc-custom");
        assert_eq!(saved.tenant_id.as_deref(), Some(seed::OPERADORA_ID));
    }

    #[tokio::test]
    async fn created_items_carry_catalog_data_resolved_server_side() {
        let store = Arc::new(seed::demo_store().await);
        let service = AuditService::new(store, Arc::new(MemoryBlobStorage::default()));

        let saved = service
            .create_request(draft("31009166"), &operator())
            .await
            .unwrap();
        let item = &saved.items[0];
        // Fees, coverage and risk come from the server catalog, never from
        // the registrant's payload.
        assert_eq!(item.procedure.description, "HERNIORRAFIA UMBILICAL");
        assert_eq!(item.unit_value, 1250.0);
        assert_eq!(item.quantity_requested, 2);
        assert_eq!(item.quantity_authorized, 2);
        assert_eq!(item.status, ItemStatus::Pending);
    }

    #[tokio::test]
    async fn create_request_rejects_unknown_procedure_codes() {
        let store = Arc::new(seed::demo_store().await);
        let service = AuditService::new(store, Arc::new(MemoryBlobStorage::default()));

        let err = service
            .create_request(draft("99999999"), &operator())
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::UnknownProcedure { .. }));

        // Nothing was persisted for the rejected draft.
        let all = service
            .store()
            .requests_for(Role::AdminMaster, None)
            .await
            .unwrap();
        assert!(all.is_empty());
    }

    #[tokio::test]
    async fn generalist_queue_excludes_specialty_routed_work() {
        let (service, id) = service_with_request().await;
        service
            .transition(&id, &operator(), cmd(WorkflowStep::Audit, "Triagem concluída"))
            .await
            .unwrap();
        service
            .transition(
                &id,
                &auditor(),
                TransitionCommand {
                    next_step: WorkflowStep::Audit,
                    description: "Encaminhado para NEUROCIRURGIA".into(),
                    patch: MetadataPatch {
                        target_specialty: Some(
                            medaudit_core::Specialty::new("NEUROCIRURGIA").unwrap(),
                        ),
                        status: None,
                    },
                },
            )
            .await
            .unwrap();

        let generalist_view = service
            .queue(&auditor(), QueueTab::InProgress, "")
            .await
            .unwrap();
        assert!(generalist_view.is_empty());

        let mut specialist = auditor();
        specialist.tipo_auditor = Some(AuditorKind::Especialista);
        specialist.especialidade =
            Some(medaudit_core::Specialty::new("NEUROCIRURGIA").unwrap());
        let specialist_view = service
            .queue(&specialist, QueueTab::InProgress, "")
            .await
            .unwrap();
        assert_eq!(specialist_view.len(), 1);
    }
}
