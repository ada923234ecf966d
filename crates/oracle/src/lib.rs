//! # MedAudit Oracle
//!
//! Advisory AI adapter for the MedAudit workflow.
//!
//! The oracle produces a [`DecisionSupport`] opinion for a request under
//! audit. It is strictly advisory: nothing in the workflow reads its output,
//! and the adapter never fails: any generation or parsing problem degrades
//! into the contingency opinion (`PARTIAL`, zero confidence, manual-review
//! reasoning) so the audit screen always has something to show.

pub mod advisor;
pub mod client;
pub mod decision;
pub mod prompts;

pub use advisor::DecisionOracle;
pub use client::{GeminiClient, OracleConfig, OracleError, TextGenerator};
pub use decision::{parse_decision, DecisionSupport, Recommendation};
pub use prompts::{build_analysis_prompt, SYSTEM_INSTRUCTION};
