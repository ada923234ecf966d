//! The workflow state machine.
//!
//! Steps run `ADMINISTRATIVE → AUDIT → RELEASE → FINISHED`, with the designed
//! escape `AUDIT|RELEASE → ADMINISTRATIVE` ("return to operator") and two
//! intra-AUDIT routing moves (generalist hands off to a named specialty,
//! specialist returns the case to the `GERAL` pool). `FINISHED` is terminal.
//!
//! Transition legality is enforced here, server-side, via
//! [`is_transition_allowed`], independent of whichever interface layer exposed
//! the action.

use crate::actor::{Role, User};
use crate::request::{HistoryEvent, Request, Status};
use chrono::{DateTime, Utc};
use medaudit_types::Specialty;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Coarse process phase of a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WorkflowStep {
    #[serde(rename = "ADMINISTRATIVE")]
    Administrative,
    #[serde(rename = "AUDIT")]
    Audit,
    #[serde(rename = "RELEASE")]
    Release,
    #[serde(rename = "FINISHED")]
    Finished,
}

impl WorkflowStep {
    pub const ALL: [WorkflowStep; 4] = [
        WorkflowStep::Administrative,
        WorkflowStep::Audit,
        WorkflowStep::Release,
        WorkflowStep::Finished,
    ];

    /// `FINISHED` accepts no further transitions.
    pub fn is_terminal(self) -> bool {
        matches!(self, WorkflowStep::Finished)
    }
}

/// Fields a transition may change atomically with the step itself.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetadataPatch {
    /// Routes the request between the generalist pool and a specialty queue.
    #[serde(rename = "especialidade_alvo", default, skip_serializing_if = "Option::is_none")]
    pub target_specialty: Option<Specialty>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<Status>,
}

/// One requested transition, as issued by an actor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransitionCommand {
    pub next_step: WorkflowStep,
    pub description: String,
    #[serde(default)]
    pub patch: MetadataPatch,
}

#[derive(Debug, thiserror::Error)]
pub enum TransitionError {
    /// The request already reached `FINISHED`; nothing changes, no history is
    /// appended.
    #[error("request {id} is finished and accepts no further transitions")]
    Terminal { id: String },
    /// The actor's role may not perform this step change.
    #[error("role {role:?} may not move a request from {from:?} to {to:?}")]
    Forbidden {
        role: Role,
        from: WorkflowStep,
        to: WorkflowStep,
    },
}

/// The legal actor → transition table.
///
/// | From | Actor | To |
/// |---|---|---|
/// | ADMINISTRATIVE | operator | AUDIT |
/// | AUDIT | auditor (routing move) | AUDIT |
/// | AUDIT | auditor | RELEASE |
/// | AUDIT, RELEASE | auditor or manager | ADMINISTRATIVE |
/// | RELEASE | operator | FINISHED |
pub fn is_transition_allowed(actor: &User, from: WorkflowStep, to: WorkflowStep) -> bool {
    use WorkflowStep::*;
    match (from, to) {
        (Administrative, Audit) => actor.role == Role::Operadora,
        (Audit, Audit) => actor.role == Role::AuditorMedico,
        (Audit, Release) => actor.role == Role::AuditorMedico,
        (Audit, Administrative) | (Release, Administrative) => {
            actor.role == Role::AuditorMedico || actor.role.is_manager()
        }
        (Release, Finished) => actor.role == Role::Operadora,
        _ => false,
    }
}

/// Applies one transition to `request`, returning the updated aggregate.
///
/// On success exactly one [`HistoryEvent`] is appended, the step is updated and
/// the metadata patch is applied atomically with it. The caller persists the
/// returned value as a whole (copy-on-write at request granularity) and, when
/// the new step is `FINISHED`, obtains the authorization code from the record
/// store's code generator.
///
/// # Errors
///
/// * [`TransitionError::Terminal`] when the request is already finished.
/// * [`TransitionError::Forbidden`] when the actor/step combination is outside
///   the legal table. In both cases the input is untouched and no history is
///   appended.
pub fn transition(
    request: &Request,
    actor: &User,
    command: TransitionCommand,
    now: DateTime<Utc>,
) -> Result<Request, TransitionError> {
    if request.workflow_step.is_terminal() {
        return Err(TransitionError::Terminal {
            id: request.id.clone(),
        });
    }
    if !is_transition_allowed(actor, request.workflow_step, command.next_step) {
        return Err(TransitionError::Forbidden {
            role: actor.role,
            from: request.workflow_step,
            to: command.next_step,
        });
    }

    let mut updated = request.clone();
    updated.history.push(HistoryEvent {
        id: format!("ev-{}", Uuid::new_v4()),
        step: command.next_step,
        user: actor.name.clone(),
        role: actor.role,
        description: command.description,
        timestamp: now,
    });
    updated.workflow_step = command.next_step;
    if let Some(specialty) = command.patch.target_specialty {
        updated.target_specialty = Some(specialty);
    }
    if let Some(status) = command.patch.status {
        updated.status = status;
    }
    updated.last_update = now;

    tracing::debug!(
        request = %updated.id,
        from = ?request.workflow_step,
        to = ?updated.workflow_step,
        actor = %actor.name,
        "workflow transition applied"
    );
    Ok(updated)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::request::fixtures;
    use chrono::TimeZone;

    fn auditor(kind: crate::actor::AuditorKind, specialty: Option<&str>) -> User {
        User {
            id: "u-aud".into(),
            name: "Dr. Auditor Carlos".into(),
            role: Role::AuditorMedico,
            tenant_id: Some("op-1".into()),
            tipo_auditor: Some(kind),
            especialidade: specialty.map(|s| Specialty::new(s).unwrap()),
        }
    }

    fn manager() -> User {
        User {
            id: "u-g".into(),
            name: "Gestor Saúde".into(),
            role: Role::EmpresaGestora,
            tenant_id: Some("g-1".into()),
            tipo_auditor: None,
            especialidade: None,
        }
    }

    fn cmd(next_step: WorkflowStep) -> TransitionCommand {
        TransitionCommand {
            next_step,
            description: "teste".into(),
            patch: MetadataPatch::default(),
        }
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 10, 0, 0).unwrap()
    }

    #[test]
    fn operator_forwards_administrative_to_audit() {
        let req = fixtures::submitted("JOANA PRADO");
        let updated = transition(&req, &fixtures::operator_user(), cmd(WorkflowStep::Audit), now())
            .unwrap();
        assert_eq!(updated.workflow_step, WorkflowStep::Audit);
        assert_eq!(updated.history.len(), req.history.len() + 1);
    }

    #[test]
    fn auditor_may_not_forward_administrative_to_audit() {
        let req = fixtures::submitted("JOANA PRADO");
        let generalist = auditor(crate::actor::AuditorKind::Generalista, None);
        let err = transition(&req, &generalist, cmd(WorkflowStep::Audit), now()).unwrap_err();
        assert!(matches!(err, TransitionError::Forbidden { .. }));
    }

    #[test]
    fn generalist_routes_to_specialty_within_audit() {
        let mut req = fixtures::submitted("JOANA PRADO");
        req.workflow_step = WorkflowStep::Audit;
        let generalist = auditor(crate::actor::AuditorKind::Generalista, None);
        let command = TransitionCommand {
            next_step: WorkflowStep::Audit,
            description: "Protocolo encaminhado para fila especializada: NEUROCIRURGIA".into(),
            patch: MetadataPatch {
                target_specialty: Some(Specialty::new("NEUROCIRURGIA").unwrap()),
                status: None,
            },
        };
        let updated = transition(&req, &generalist, command, now()).unwrap();
        assert_eq!(updated.workflow_step, WorkflowStep::Audit);
        assert_eq!(
            updated.target_specialty,
            Some(Specialty::new("NEUROCIRURGIA").unwrap())
        );
    }

    #[test]
    fn specialist_returns_case_to_general_pool() {
        let mut req = fixtures::submitted("JOANA PRADO");
        req.workflow_step = WorkflowStep::Audit;
        req.target_specialty = Some(Specialty::new("ORTOPEDIA").unwrap());
        let specialist = auditor(crate::actor::AuditorKind::Especialista, Some("ORTOPEDIA"));
        let command = TransitionCommand {
            next_step: WorkflowStep::Audit,
            description: "Especialista devolveu o processo para a Fila Geral de Triagem.".into(),
            patch: MetadataPatch {
                target_specialty: Some(Specialty::general()),
                status: None,
            },
        };
        let updated = transition(&req, &specialist, command, now()).unwrap();
        assert!(updated.target_specialty.as_ref().unwrap().is_general());
    }

    #[test]
    fn manager_returns_release_to_operator_queue() {
        let mut req = fixtures::submitted("JOANA PRADO");
        req.workflow_step = WorkflowStep::Release;
        let updated =
            transition(&req, &manager(), cmd(WorkflowStep::Administrative), now()).unwrap();
        assert_eq!(updated.workflow_step, WorkflowStep::Administrative);
    }

    #[test]
    fn operator_may_not_conclude_audit() {
        let mut req = fixtures::submitted("JOANA PRADO");
        req.workflow_step = WorkflowStep::Audit;
        let err = transition(&req, &fixtures::operator_user(), cmd(WorkflowStep::Release), now())
            .unwrap_err();
        assert!(matches!(err, TransitionError::Forbidden { .. }));
    }

    #[test]
    fn finished_is_terminal_and_appends_nothing() {
        let mut req = fixtures::submitted("JOANA PRADO");
        req.workflow_step = WorkflowStep::Finished;
        let history_before = req.history.clone();
        for next in WorkflowStep::ALL {
            let err = transition(&req, &manager(), cmd(next), now()).unwrap_err();
            assert!(matches!(err, TransitionError::Terminal { .. }));
        }
        assert_eq!(req.history, history_before);
        assert_eq!(req.workflow_step, WorkflowStep::Finished);
    }

    #[test]
    fn skipping_steps_is_rejected_for_everyone() {
        let req = fixtures::submitted("JOANA PRADO");
        for actor in [
            fixtures::operator_user(),
            manager(),
            auditor(crate::actor::AuditorKind::Generalista, None),
        ] {
            assert!(!is_transition_allowed(
                &actor,
                WorkflowStep::Administrative,
                WorkflowStep::Finished
            ));
            assert!(transition(&req, &actor, cmd(WorkflowStep::Finished), now()).is_err());
        }
    }

    #[test]
    fn history_grows_by_exactly_one_per_transition() {
        let req = fixtures::submitted("JOANA PRADO");
        let t1 = transition(&req, &fixtures::operator_user(), cmd(WorkflowStep::Audit), now())
            .unwrap();
        let generalist = auditor(crate::actor::AuditorKind::Generalista, None);
        let t2 = transition(&t1, &generalist, cmd(WorkflowStep::Release), now()).unwrap();
        assert_eq!(t2.history.len(), 3);
        // Append-only: the prefix is untouched.
        assert_eq!(&t2.history[..2], &t1.history[..]);
    }
}
