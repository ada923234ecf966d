//! # MedAudit Core
//!
//! Core business logic for the MedAudit authorization workflow system.
//!
//! This crate contains pure, synchronous policy logic:
//! - Domain model for requests, items, dossier documents, auditors and tenants
//! - The workflow state machine (legal transitions, server-side guards, history append)
//! - The queue routing engine (role and specialist/generalist visibility)
//! - SLA aggregation over the request history log
//!
//! **No I/O concerns**: persistence, HTTP, the advisory oracle and the chat
//! channel live in `medaudit-store`, `medaudit-oracle`, `medaudit-chat` and the
//! `medaudit-run` binary.

pub mod actor;
pub mod auditor;
pub mod queue;
pub mod request;
pub mod rules;
pub mod sla;
pub mod tenant;
pub mod workflow;

pub use actor::{AuditorKind, Role, User};
pub use auditor::MedicalAuditor;
pub use medaudit_types::{NonEmptyText, Specialty, GENERAL_QUEUE};
pub use queue::{visible_queue, QueueTab};
pub use request::{
    default_document_slots, AuditItem, Beneficiary, Coverage, FileMetadata, HistoryEvent,
    ItemDraft, ItemStatus, NewRequest, Procedure, ProcedureKind, Request, Status, ValidationError,
    WorkflowDocument,
};
pub use rules::{AiRule, RulePriority};
pub use sla::{average_audit_duration, step_counts, SlaStats, StepCounts};
pub use tenant::{Tenant, TenantKind, TenantStatus};
pub use workflow::{
    is_transition_allowed, transition, MetadataPatch, TransitionCommand, TransitionError,
    WorkflowStep,
};
