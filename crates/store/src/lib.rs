//! # MedAudit Store
//!
//! Persistence boundary for the MedAudit workflow.
//!
//! This crate defines the narrow collaborator interfaces the core consumes:
//! [`RecordStore`] for records and code generation, [`BlobStorage`] for file
//! uploads. It also ships in-memory implementations and the [`AuditService`]
//! orchestration layer that glues validation, the pure state machine and
//! persistence.
//!
//! Aggregates are written whole (copy-on-write at request granularity) and
//! every write is checked against an optimistic `revision` counter; a stale
//! write fails with [`StoreError::Conflict`] and the caller must reload.

pub mod blob;
pub mod error;
pub mod memory;
pub mod records;
pub mod seed;
pub mod service;

pub use blob::{BlobStorage, MemoryBlobStorage};
pub use error::StoreError;
pub use memory::MemoryStore;
pub use records::RecordStore;
pub use service::{AuditService, ItemAmendment, SlaOverview, Upload};
