//! Demonstration dataset for local runs and tests.
//!
//! Mirrors the fixture catalog shipped with the migration scripts: one gestora
//! managing one operator, two TUSS procedures, a generalist and a specialist
//! auditor, and a couple of governance rules.

use crate::MemoryStore;
use chrono::{NaiveDate, TimeZone, Utc};
use medaudit_core::{
    AiRule, AuditItem, AuditorKind, Beneficiary, Coverage, ItemDraft, MedicalAuditor, NewRequest,
    NonEmptyText, Procedure,
    ProcedureKind, Request, Role, RulePriority, Specialty, Tenant, TenantKind, TenantStatus, User,
};

pub const GESTORA_ID: &str = "g-demo";
pub const OPERADORA_ID: &str = "op-demo";

pub fn demo_tenants() -> Vec<Tenant> {
    let created_at = Utc.with_ymd_and_hms(2024, 1, 15, 12, 0, 0).unwrap();
    vec![
        Tenant {
            id: GESTORA_ID.to_owned(),
            name: "Alfa Gestão de Auditoria".to_owned(),
            commercial_name: Some("ALFA AUDIT".to_owned()),
            kind: TenantKind::Gestora,
            parent_id: None,
            status: TenantStatus::Ativo,
            cnpj: Some("11.111.111/0001-11".to_owned()),
            contact_name: None,
            contact_email: None,
            created_at,
        },
        Tenant {
            id: OPERADORA_ID.to_owned(),
            name: "Unimed Regional Pro".to_owned(),
            commercial_name: None,
            kind: TenantKind::Operadora,
            parent_id: Some(GESTORA_ID.to_owned()),
            status: TenantStatus::Ativo,
            cnpj: Some("22.222.222/0001-22".to_owned()),
            contact_name: None,
            contact_email: None,
            created_at,
        },
    ]
}

pub fn demo_procedures() -> Vec<Procedure> {
    vec![
        Procedure {
            id: 1,
            code: "31009166".to_owned(),
            tuss_code: "31009166".to_owned(),
            description: "HERNIORRAFIA UMBILICAL".to_owned(),
            fees_value: 1250.0,
            risk_rating: "RACIONALIZAÇÃO".to_owned(),
            rationalization:
                "Procedimento padrão para correção de hérnia umbilical conforme diretrizes da SBC."
                    .to_owned(),
            coverage: Coverage::Coberto,
            kind: ProcedureKind::Procedimento,
            is_active: true,
        },
        Procedure {
            id: 2,
            code: "40304361".to_owned(),
            tuss_code: "40304361".to_owned(),
            description: "HEMOGRAMA COMPLETO".to_owned(),
            fees_value: 35.0,
            risk_rating: "BAIXO RISCO".to_owned(),
            rationalization: "Exame laboratorial de rotina.".to_owned(),
            coverage: Coverage::Coberto,
            kind: ProcedureKind::Sadt,
            is_active: true,
        },
    ]
}

pub fn demo_auditors() -> Vec<MedicalAuditor> {
    vec![
        MedicalAuditor {
            id: "aud-1".to_owned(),
            name: "Dr. Auditor Carlos".to_owned(),
            crm: "123456".to_owned(),
            uf: "SP".to_owned(),
            specialty: Specialty::general(),
            tipo_auditor: Some(AuditorKind::Generalista),
            rqe: None,
            rating: 4.8,
            is_active: true,
            gestora_id: Some(GESTORA_ID.to_owned()),
            operator_ids: vec![OPERADORA_ID.to_owned()],
        },
        MedicalAuditor {
            id: "aud-2".to_owned(),
            name: "Dra. Helena Vasquez".to_owned(),
            crm: "654321".to_owned(),
            uf: "SP".to_owned(),
            specialty: Specialty::new("NEUROCIRURGIA").expect("valid specialty"),
            tipo_auditor: Some(AuditorKind::Especialista),
            rqe: Some("RQE-11223".to_owned()),
            rating: 4.9,
            is_active: true,
            gestora_id: Some(GESTORA_ID.to_owned()),
            operator_ids: vec![OPERADORA_ID.to_owned()],
        },
    ]
}

pub fn demo_rules() -> Vec<AiRule> {
    vec![
        AiRule {
            id: "rule-1".to_owned(),
            title: NonEmptyText::new("OPME exige três orçamentos").expect("valid title"),
            description:
                "Solicitações com itens OPME devem apresentar três orçamentos de fornecedores \
                 distintos; na ausência, recomendar parecer parcial."
                    .to_owned(),
            is_active: true,
            priority: RulePriority::Alta,
        },
        AiRule {
            id: "rule-2".to_owned(),
            title: NonEmptyText::new("Exames de rotina").expect("valid title"),
            description: "Exames laboratoriais de baixo risco dispensam laudo detalhado."
                .to_owned(),
            is_active: false,
            priority: RulePriority::Baixa,
        },
    ]
}

pub fn demo_users() -> Vec<User> {
    vec![
        User {
            id: "u-master".to_owned(),
            name: "Dr. Silva Master".to_owned(),
            role: Role::AdminMaster,
            tenant_id: None,
            tipo_auditor: None,
            especialidade: None,
        },
        User {
            id: "u-gestora".to_owned(),
            name: "Gestor Saúde Brasil".to_owned(),
            role: Role::EmpresaGestora,
            tenant_id: Some(GESTORA_ID.to_owned()),
            tipo_auditor: None,
            especialidade: None,
        },
        User {
            id: "u-operadora".to_owned(),
            name: "Atendimento Unimed".to_owned(),
            role: Role::Operadora,
            tenant_id: Some(OPERADORA_ID.to_owned()),
            tipo_auditor: None,
            especialidade: None,
        },
        User {
            id: "u-auditor".to_owned(),
            name: "Dr. Auditor Carlos".to_owned(),
            role: Role::AuditorMedico,
            tenant_id: Some(OPERADORA_ID.to_owned()),
            tipo_auditor: Some(AuditorKind::Generalista),
            especialidade: None,
        },
    ]
}

/// A submitted request owned by `tenant_id`, ready to be inserted.
pub fn demo_request(id: &str, tenant_id: &str) -> Request {
    let operator = User {
        id: "u-operadora".to_owned(),
        name: "Atendimento Unimed".to_owned(),
        role: Role::Operadora,
        tenant_id: Some(tenant_id.to_owned()),
        tipo_auditor: None,
        especialidade: None,
    };
    let draft = NewRequest {
        beneficiary: Beneficiary {
            id: format!("b-{id}"),
            name: "JOÃO CARLOS DA SILVA".to_owned(),
            card_id: "0099887766".to_owned(),
            birth_date: NaiveDate::from_ymd_opt(1980, 5, 17).unwrap(),
            gender: Some("MASCULINO".to_owned()),
        },
        cid10: "K42.9".to_owned(),
        clinical_summary: "Abaulamento umbilical com dor local aos esforços.".to_owned(),
        items: vec![ItemDraft {
            procedure_code: "31009166".to_owned(),
            quantity_requested: 1,
        }],
        documents: Vec::new(),
        guia_number: Some(format!("G-2024-{id}")),
        request_date: None,
        requesting_entity: Some("HOSPITAL SANTA HELENA".to_owned()),
        service_type: Some("INTERNAÇÃO ELETIVA".to_owned()),
        request_character: Some(1),
        accident_indication: Some(9),
        service_date: None,
        co_authorization: false,
        executing_entity: None,
        executing_city: None,
        transaction_number: None,
    };
    let now = Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap();
    let items = vec![AuditItem::new(demo_procedures()[0].clone(), 1)];
    draft
        .submit(id.to_owned(), Some(tenant_id.to_owned()), items, &operator, now)
        .expect("demo request is valid")
}

/// A fully populated in-memory store for demos and tests. No requests are
/// inserted; callers register their own.
pub async fn demo_store() -> MemoryStore {
    let store = MemoryStore::new();
    store.set_tenants(demo_tenants()).await;
    store.set_auditors(demo_auditors()).await;
    store.set_procedures(demo_procedures()).await;
    store.set_rules(demo_rules()).await;
    store
}
