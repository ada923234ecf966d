//! The authorization request aggregate and its owned entities.
//!
//! A [`Request`] exclusively owns its items, dossier documents and history; the
//! history log is append-only and is the sole audit trail (and the input to SLA
//! computation). Wire field names follow the shapes any storage or transport
//! binding must round-trip losslessly.

use crate::actor::{Role, User};
use crate::workflow::WorkflowStep;
use chrono::{DateTime, NaiveDate, Utc};
use medaudit_types::Specialty;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Errors rejected before any persistence call is made.
#[derive(Debug, thiserror::Error)]
pub enum ValidationError {
    #[error("a request must contain at least one procedure item")]
    NoItems,
    #[error("beneficiary name is required")]
    MissingBeneficiaryName,
    #[error("primary diagnosis (CID-10) is required")]
    MissingDiagnosis,
}

/// Approval-outcome classification, orthogonal to the workflow step.
///
/// The step tracks process position; the status tracks the clinical and
/// administrative outcome. No `(status, step)` combination is rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Status {
    #[serde(rename = "DRAFT")]
    Draft,
    #[serde(rename = "PENDING_AUDIT")]
    PendingAudit,
    #[serde(rename = "COMPLETED")]
    Completed,
    #[serde(rename = "CANCELED")]
    Canceled,
    #[serde(rename = "RETURNED_TO_OPERATOR")]
    ReturnedToOperator,
}

/// Clinical decision on a single requested item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ItemStatus {
    #[serde(rename = "PENDING")]
    Pending,
    #[serde(rename = "FAVORABLE")]
    Favorable,
    #[serde(rename = "UNFAVORABLE")]
    Unfavorable,
    #[serde(rename = "PARTIAL")]
    Partial,
}

/// Coverage classification of a catalog procedure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Coverage {
    #[serde(rename = "COBERTO")]
    Coberto,
    #[serde(rename = "SEM_COBERTURA")]
    SemCobertura,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProcedureKind {
    #[serde(rename = "SADT")]
    Sadt,
    #[serde(rename = "OPME")]
    Opme,
    #[serde(rename = "PROCEDIMENTO")]
    Procedimento,
    #[serde(rename = "FARMACO")]
    Farmaco,
    #[serde(rename = "TAXA")]
    Taxa,
    #[serde(rename = "INSUMO")]
    Insumo,
}

/// An entry of the TUSS procedure catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Procedure {
    pub id: i64,
    pub code: String,
    pub tuss_code: String,
    pub description: String,
    pub fees_value: f64,
    /// Free-form tier label from the catalog (e.g. `BAIXO RISCO`).
    pub risk_rating: String,
    pub rationalization: String,
    pub coverage: Coverage,
    #[serde(rename = "type")]
    pub kind: ProcedureKind,
    pub is_active: bool,
}

/// One requested procedure line.
///
/// Items are created alongside the request and are never deleted afterwards,
/// only amended: an auditor may change the authorized quantity, the clinical
/// status and the justification while the request sits in the AUDIT step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditItem {
    pub id: String,
    pub procedure: Procedure,
    pub quantity_requested: u32,
    pub quantity_authorized: u32,
    pub unit_value: f64,
    pub status: ItemStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub justification: Option<String>,
}

impl AuditItem {
    /// Creates a fresh line for `procedure`: authorized quantity mirrors the
    /// requested quantity and the clinical decision starts pending.
    pub fn new(procedure: Procedure, quantity_requested: u32) -> Self {
        let unit_value = procedure.fees_value;
        Self {
            id: format!("i-{}", Uuid::new_v4()),
            procedure,
            quantity_requested,
            quantity_authorized: quantity_requested,
            unit_value,
            status: ItemStatus::Pending,
            justification: None,
        }
    }

    pub fn total_value(&self) -> f64 {
        f64::from(self.quantity_requested) * self.unit_value
    }
}

/// A reference to an uploaded file, as returned by blob storage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileMetadata {
    pub name: String,
    pub size: u64,
    #[serde(rename = "type")]
    pub content_type: String,
    /// Publicly resolvable URL; present once the upload has completed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

/// A named slot of the documentary dossier.
///
/// Files accumulate in a slot and are never removed through this workflow.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowDocument {
    pub id: String,
    pub name: String,
    pub required: bool,
    #[serde(default)]
    pub files: Vec<FileMetadata>,
}

/// The fixed dossier used when a tenant has no document template of its own.
pub fn default_document_slots() -> Vec<WorkflowDocument> {
    const SLOTS: [&str; 5] = [
        "LAUDO MÉDICO / RELATÓRIO",
        "EXAMES COMPLEMENTARES",
        "ORÇAMENTO DE MATERIAIS / OPME",
        "JUSTIFICATIVA TÉCNICA",
        "TERMO DE CONSENTIMENTO (TCLE)",
    ];
    SLOTS
        .iter()
        .enumerate()
        .map(|(i, name)| WorkflowDocument {
            id: format!("doc-{}", i + 1),
            name: (*name).to_owned(),
            required: true,
            files: Vec::new(),
        })
        .collect()
}

/// Snapshot of the beneficiary taken at registration time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Beneficiary {
    pub id: String,
    pub name: String,
    pub card_id: String,
    pub birth_date: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gender: Option<String>,
}

/// One immutable entry of the request's audit trail.
///
/// Appended on every transition, never edited or reordered.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEvent {
    pub id: String,
    pub step: WorkflowStep,
    pub user: String,
    pub role: Role,
    pub description: String,
    pub timestamp: DateTime<Utc>,
}

/// The authorization request aggregate root.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Request {
    pub id: String,
    #[serde(rename = "tenant_id", default, skip_serializing_if = "Option::is_none")]
    pub tenant_id: Option<String>,
    pub beneficiary: Beneficiary,
    pub cid10: String,
    pub clinical_summary: String,
    pub items: Vec<AuditItem>,
    pub status: Status,
    pub workflow_step: WorkflowStep,
    /// Specialist-queue routing target; `GERAL` (or absent) means the
    /// generalist pool.
    #[serde(rename = "especialidade_alvo", default, skip_serializing_if = "Option::is_none")]
    pub target_specialty: Option<Specialty>,
    pub documents: Vec<WorkflowDocument>,
    pub history: Vec<HistoryEvent>,
    /// Assigned exactly once, when the request reaches FINISHED.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auth_code: Option<String>,
    pub created_at: DateTime<Utc>,
    pub last_update: DateTime<Utc>,
    /// Optimistic-concurrency counter checked at persistence time.
    #[serde(default)]
    pub revision: u64,

    // TISS administrative block: captured fields only, no formatting rules.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub guia_number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub requesting_entity: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service_type: Option<String>,
    /// 1 = elective, 2 = urgency/emergency.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_character: Option<u8>,
    /// 9 = not an accident; 1/2/3 = work/traffic/other.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub accident_indication: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service_date: Option<NaiveDate>,
    #[serde(default)]
    pub co_authorization: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub executing_entity: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub executing_city: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transaction_number: Option<String>,
}

impl Request {
    /// Validates the aggregate invariants that must hold before the request
    /// may leave the draft stage. No partial state is ever written for an
    /// invalid request.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.items.is_empty() {
            return Err(ValidationError::NoItems);
        }
        if self.beneficiary.name.trim().is_empty() {
            return Err(ValidationError::MissingBeneficiaryName);
        }
        if self.cid10.trim().is_empty() {
            return Err(ValidationError::MissingDiagnosis);
        }
        Ok(())
    }

    pub fn is_finished(&self) -> bool {
        self.workflow_step == WorkflowStep::Finished
    }
}

/// One requested line of a draft, before catalog resolution.
///
/// Registrants name procedures by catalog code only; fees, coverage and risk
/// data are never accepted from the caller. The server resolves each code
/// against its own catalog when the draft is submitted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemDraft {
    pub procedure_code: String,
    pub quantity_requested: u32,
}

/// A not-yet-persisted request, as captured by the registration form.
///
/// Creation and editing share the one canonical [`Request`] value; this type
/// exists only for the unsubmitted case and converges through
/// [`NewRequest::submit`], the single validation path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewRequest {
    pub beneficiary: Beneficiary,
    pub cid10: String,
    pub clinical_summary: String,
    pub items: Vec<ItemDraft>,
    #[serde(default)]
    pub documents: Vec<WorkflowDocument>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub guia_number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub requesting_entity: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_character: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub accident_indication: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service_date: Option<NaiveDate>,
    #[serde(default)]
    pub co_authorization: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub executing_entity: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub executing_city: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transaction_number: Option<String>,
}

impl NewRequest {
    /// Turns the draft into a persistable [`Request`] owned by `tenant_id`,
    /// opening the history with a registration event by `actor`.
    ///
    /// `items` are the draft's lines after catalog resolution; the caller is
    /// responsible for looking each [`ItemDraft`] up in the server-held
    /// catalog and rejecting unknown codes before calling this.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError`] when the aggregate invariants do not hold;
    /// nothing is persisted in that case.
    pub fn submit(
        self,
        id: String,
        tenant_id: Option<String>,
        items: Vec<AuditItem>,
        actor: &User,
        now: DateTime<Utc>,
    ) -> Result<Request, ValidationError> {
        let documents = if self.documents.is_empty() {
            default_document_slots()
        } else {
            self.documents
        };

        let request = Request {
            id,
            tenant_id,
            beneficiary: self.beneficiary,
            cid10: self.cid10,
            clinical_summary: self.clinical_summary,
            items,
            status: Status::PendingAudit,
            workflow_step: WorkflowStep::Administrative,
            target_specialty: None,
            documents,
            history: vec![HistoryEvent {
                id: format!("ev-{}", Uuid::new_v4()),
                step: WorkflowStep::Administrative,
                user: actor.name.clone(),
                role: actor.role,
                description: "Protocolo registrado com sucesso através do painel da operadora."
                    .to_owned(),
                timestamp: now,
            }],
            auth_code: None,
            created_at: now,
            last_update: now,
            revision: 0,
            guia_number: self.guia_number,
            request_date: self.request_date,
            requesting_entity: self.requesting_entity,
            service_type: self.service_type,
            request_character: self.request_character,
            accident_indication: self.accident_indication,
            service_date: self.service_date,
            co_authorization: self.co_authorization,
            executing_entity: self.executing_entity,
            executing_city: self.executing_city,
            transaction_number: self.transaction_number,
        };
        request.validate()?;
        Ok(request)
    }
}
