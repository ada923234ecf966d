//! The queue routing engine.
//!
//! Computes, for a given actor and list tab, the visible subset of requests.
//! The two-tier specialist/generalist dispatch has no central scheduler and
//! no capacity tracking; visibility is the only admission policy.
//!
//! Tenant scoping is applied upstream at the data-fetch boundary
//! (`medaudit-store`), never here.

use crate::actor::{AuditorKind, Role, User};
use crate::request::Request;
use crate::workflow::WorkflowStep;
use serde::{Deserialize, Serialize};

/// The two tabs of the work list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum QueueTab {
    #[serde(rename = "IN_PROGRESS")]
    InProgress,
    #[serde(rename = "COMPLETED")]
    Completed,
}

impl Default for QueueTab {
    fn default() -> Self {
        QueueTab::InProgress
    }
}

/// Filters `requests` down to what `actor` may see and act on.
///
/// Three predicates must all hold:
/// 1. tab: `COMPLETED` shows only finished requests, `IN_PROGRESS` the rest;
/// 2. role: auditors on the in-progress tab see only AUDIT-step work routed
///    to their tier (specialists by exact specialty match, generalists when
///    the target is unset or the `GERAL` sentinel); every other role, and
///    auditors on the completed tab, is unrestricted;
/// 3. search: case-insensitive substring match on beneficiary name or
///    request id; an empty term matches everything.
///
/// The result is recomputed on demand and never cached.
pub fn visible_queue<'a>(
    requests: &'a [Request],
    actor: &User,
    tab: QueueTab,
    search: &str,
) -> Vec<&'a Request> {
    let term = search.trim().to_lowercase();
    requests
        .iter()
        .filter(|r| matches_tab(r, tab) && matches_role(r, actor, tab) && matches_search(r, &term))
        .collect()
}

fn matches_tab(request: &Request, tab: QueueTab) -> bool {
    match tab {
        QueueTab::Completed => request.workflow_step == WorkflowStep::Finished,
        QueueTab::InProgress => request.workflow_step != WorkflowStep::Finished,
    }
}

fn matches_role(request: &Request, actor: &User, tab: QueueTab) -> bool {
    if actor.role != Role::AuditorMedico {
        return true;
    }
    // Finished work is open to every auditor for reference.
    if tab == QueueTab::Completed {
        return true;
    }
    if request.workflow_step != WorkflowStep::Audit {
        return false;
    }
    match actor.auditor_kind() {
        AuditorKind::Especialista => request.target_specialty == actor.especialidade,
        AuditorKind::Generalista => request
            .target_specialty
            .as_ref()
            .map_or(true, |s| s.is_general()),
    }
}

fn matches_search(request: &Request, term: &str) -> bool {
    if term.is_empty() {
        return true;
    }
    request.beneficiary.name.to_lowercase().contains(term)
        || request.id.to_lowercase().contains(term)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::request::fixtures;
    use crate::workflow::{transition, MetadataPatch, TransitionCommand};
    use chrono::{TimeZone, Utc};
    use medaudit_types::Specialty;

    fn specialist(specialty: &str) -> User {
        User {
            id: format!("u-{specialty}"),
            name: format!("Dr. {specialty}"),
            role: Role::AuditorMedico,
            tenant_id: Some("op-1".into()),
            tipo_auditor: Some(AuditorKind::Especialista),
            especialidade: Some(Specialty::new(specialty).unwrap()),
        }
    }

    fn generalist() -> User {
        User {
            id: "u-gen".into(),
            name: "Dr. Triagem".into(),
            role: Role::AuditorMedico,
            tenant_id: Some("op-1".into()),
            tipo_auditor: Some(AuditorKind::Generalista),
            especialidade: None,
        }
    }

    fn in_audit(name: &str, target: Option<&str>) -> Request {
        let mut req = fixtures::submitted(name);
        req.workflow_step = WorkflowStep::Audit;
        req.target_specialty = target.map(|s| Specialty::new(s).unwrap());
        req
    }

    #[test]
    fn specialist_sees_only_exact_specialty_matches() {
        let requests = vec![
            in_audit("ANA", Some("ORTOPEDIA")),
            in_audit("BIA", Some("CARDIOLOGIA")),
            in_audit("CLARA", None),
        ];
        let visible = visible_queue(
            &requests,
            &specialist("ORTOPEDIA"),
            QueueTab::InProgress,
            "",
        );
        assert_eq!(visible.len(), 1);
        assert_eq!(visible[0].beneficiary.name, "ANA");
    }

    #[test]
    fn generalist_sees_unrouted_and_general_pool_only() {
        let requests = vec![
            in_audit("ANA", Some("ORTOPEDIA")),
            in_audit("BIA", Some("GERAL")),
            in_audit("CLARA", None),
        ];
        let visible = visible_queue(&requests, &generalist(), QueueTab::InProgress, "");
        let names: Vec<_> = visible.iter().map(|r| r.beneficiary.name.as_str()).collect();
        assert_eq!(names, vec!["BIA", "CLARA"]);
    }

    #[test]
    fn auditor_sees_nothing_outside_audit_step() {
        let mut administrative = fixtures::submitted("ANA");
        administrative.id = "REQ-A".into();
        let mut release = fixtures::submitted("BIA");
        release.id = "REQ-B".into();
        release.workflow_step = WorkflowStep::Release;

        let requests = vec![administrative, release];
        assert!(visible_queue(&requests, &generalist(), QueueTab::InProgress, "").is_empty());
        assert!(
            visible_queue(&requests, &specialist("ORTOPEDIA"), QueueTab::InProgress, "")
                .is_empty()
        );
    }

    #[test]
    fn auditor_sees_all_finished_requests_for_reference() {
        let mut finished = fixtures::submitted("ANA");
        finished.workflow_step = WorkflowStep::Finished;
        let requests = vec![finished, in_audit("BIA", Some("CARDIOLOGIA"))];
        let visible = visible_queue(&requests, &specialist("ORTOPEDIA"), QueueTab::Completed, "");
        assert_eq!(visible.len(), 1);
        assert_eq!(visible[0].beneficiary.name, "ANA");
    }

    #[test]
    fn operator_and_manager_queues_are_unrestricted_within_tab() {
        let requests = vec![
            fixtures::submitted("ANA"),
            in_audit("BIA", Some("ORTOPEDIA")),
        ];
        let operator = fixtures::operator_user();
        assert_eq!(
            visible_queue(&requests, &operator, QueueTab::InProgress, "").len(),
            2
        );
        let master = User {
            id: "u-m".into(),
            name: "Dr. Silva Master".into(),
            role: Role::AdminMaster,
            tenant_id: None,
            tipo_auditor: None,
            especialidade: None,
        };
        assert_eq!(
            visible_queue(&requests, &master, QueueTab::InProgress, "").len(),
            2
        );
    }

    #[test]
    fn search_matches_name_or_id_case_insensitively() {
        let mut a = fixtures::submitted("JOANA PRADO");
        a.id = "REQ-100".into();
        let mut b = fixtures::submitted("MARCOS LIMA");
        b.id = "REQ-200".into();
        let requests = vec![a, b];
        let operator = fixtures::operator_user();

        let by_name = visible_queue(&requests, &operator, QueueTab::InProgress, "joana");
        assert_eq!(by_name.len(), 1);
        assert_eq!(by_name[0].id, "REQ-100");

        let by_id = visible_queue(&requests, &operator, QueueTab::InProgress, "req-200");
        assert_eq!(by_id.len(), 1);
        assert_eq!(by_id[0].beneficiary.name, "MARCOS LIMA");

        assert_eq!(
            visible_queue(&requests, &operator, QueueTab::InProgress, "  ").len(),
            2
        );
    }

    #[test]
    fn routing_scenario_moves_visibility_between_tiers() {
        // Operator registers; the request sits in administrative triage.
        let now = Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap();
        let operator = fixtures::operator_user();
        let req = fixtures::new_request("JOANA PRADO")
            .submit(
                "REQ-E2E".into(),
                Some("op-1".into()),
                fixtures::resolved_items(),
                &operator,
                now,
            )
            .unwrap();
        assert_eq!(req.workflow_step, WorkflowStep::Administrative);

        // Forwarded to audit: any generalist sees it, mismatched specialists do not.
        let req = transition(
            &req,
            &operator,
            TransitionCommand {
                next_step: WorkflowStep::Audit,
                description: "Enviado para Auditoria.".into(),
                patch: MetadataPatch::default(),
            },
            now,
        )
        .unwrap();
        let all = vec![req.clone()];
        assert_eq!(visible_queue(&all, &generalist(), QueueTab::InProgress, "").len(), 1);
        assert!(visible_queue(&all, &specialist("ORTOPEDIA"), QueueTab::InProgress, "").is_empty());

        // Generalist routes to neurosurgery: visibility flips to that specialty only.
        let req = transition(
            &req,
            &generalist(),
            TransitionCommand {
                next_step: WorkflowStep::Audit,
                description: "Protocolo encaminhado para fila especializada: NEUROCIRURGIA".into(),
                patch: MetadataPatch {
                    target_specialty: Some(Specialty::new("NEUROCIRURGIA").unwrap()),
                    status: None,
                },
            },
            now,
        )
        .unwrap();
        let all = vec![req];
        assert!(visible_queue(&all, &generalist(), QueueTab::InProgress, "").is_empty());
        assert!(visible_queue(&all, &specialist("ORTOPEDIA"), QueueTab::InProgress, "").is_empty());
        assert_eq!(
            visible_queue(&all, &specialist("NEUROCIRURGIA"), QueueTab::InProgress, "").len(),
            1
        );
    }
}
