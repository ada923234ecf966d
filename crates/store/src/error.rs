use medaudit_core::{TransitionError, ValidationError};

/// Errors surfaced by the persistence boundary and its orchestration layer.
///
/// Persistence failures are reported to the initiating actor verbatim; there is
/// no automatic retry and no background error queue.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("request {id} not found")]
    NotFound { id: String },
    /// Optimistic-concurrency check failed: someone else saved this request
    /// first. The caller must reload and reapply.
    #[error("request {id} was modified concurrently (expected revision {expected}, found {found})")]
    Conflict {
        id: String,
        expected: u64,
        found: u64,
    },
    #[error("validation failed: {0}")]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Transition(#[from] TransitionError),
    #[error("{0}")]
    Forbidden(String),
    /// The draft named a procedure code the active catalog does not carry.
    /// Catalog data (fees, coverage, risk) is server-authoritative and never
    /// accepted from the registrant.
    #[error("procedure {code} is not in the active catalog")]
    UnknownProcedure { code: String },
    #[error("item {item_id} does not belong to request {request_id}")]
    UnknownItem {
        request_id: String,
        item_id: String,
    },
    #[error("document slot {doc_id} does not exist on request {request_id}")]
    UnknownDocument {
        request_id: String,
        doc_id: String,
    },
    /// Every file of an upload batch failed. Partial successes are not errors.
    #[error("upload failed: {0}")]
    Upload(String),
    #[error("storage backend failure: {0}")]
    Backend(String),
}
