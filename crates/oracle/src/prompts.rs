//! Prompt assembly for the advisory analysis.
//!
//! Prompts are written in Portuguese, the working language of the audit
//! teams, and instruct the model to answer with a single JSON object.

use medaudit_core::{AiRule, Request};

/// Persona given to the model for every analysis.
pub const SYSTEM_INSTRUCTION: &str = "Atue como um Auditor Médico sênior brasileiro especializado \
em regulação e auditoria prospectiva. Sua tarefa é analisar a pertinência técnica desta \
solicitação com base nas evidências clínicas, documentais e REGRAS DE GOVERNANÇA DA GESTORA. \
O retorno deve ser estritamente técnico e fundamentado em evidências.";

/// Builds the analysis prompt for one request.
///
/// Active governance rules are injected with interpretive priority over the
/// model's own judgment; inactive rules are skipped. Document slots without
/// files are omitted from the evidence summary, and a dossier with no files
/// at all is flagged explicitly.
pub fn build_analysis_prompt(request: &Request, rules: &[AiRule]) -> String {
    let document_summary = request
        .documents
        .iter()
        .filter(|d| !d.files.is_empty())
        .map(|d| {
            let names: Vec<&str> = d.files.iter().map(|f| f.name.as_str()).collect();
            format!("{} ({} arquivo(s): {})", d.name, d.files.len(), names.join(", "))
        })
        .collect::<Vec<_>>()
        .join("; ");

    let items = request
        .items
        .iter()
        .map(|i| {
            format!(
                "{} - {} (Qtd: {})",
                i.procedure.code, i.procedure.description, i.quantity_requested
            )
        })
        .collect::<Vec<_>>()
        .join(", ");

    let rules_text = rules
        .iter()
        .filter(|r| r.is_active)
        .map(|r| {
            let tier = match r.priority {
                medaudit_core::RulePriority::Alta => "ALTA",
                medaudit_core::RulePriority::Media => "MEDIA",
                medaudit_core::RulePriority::Baixa => "BAIXA",
            };
            format!("- [PRIORIDADE {tier}]: {}. {}", r.title, r.description)
        })
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        "Analise a seguinte solicitação de auditoria médica:\n\n\
         DADOS DO PROTOCOLO:\n\
         - Beneficiário: {beneficiary}\n\
         - CID-10: {cid10}\n\
         - Resumo Clínico: \"{summary}\"\n\
         - Itens Solicitados: {items}\n\
         - Evidências Documentais: [{documents}]\n\n\
         [REGRAS INTELIGENTES DO MASTER ADMIN - OBRIGATÓRIO SEGUIR]:\n\
         {rules}\n\n\
         DIRETRIZES DE ANÁLISE:\n\
         1. ANALISE OS DOCUMENTOS: Verifique se os arquivos (Laudo, Biópsia, TCLE) sugerem \
         evidências para o CID informado.\n\
         2. CONSIDERE AS REGRAS ACIMA: As Regras Inteligentes do Master Admin têm soberania \
         sobre o julgamento geral da IA.\n\
         3. INSUFICIÊNCIA DOC: Se faltar documento essencial e a regra exigir, recomende \
         REJECT ou PARTIAL.\n\
         4. APOIO À DECISÃO: Explique como as regras e anexos corroboram ou não a indicação.\n\n\
         Forneça a resposta exclusivamente em JSON estruturado com os campos \
         \"recommendation\" (APPROVE, REJECT ou PARTIAL), \"confidence\" (0 a 1), \
         \"reasoning\" e \"regulatoryReferences\" (lista de strings).",
        beneficiary = request.beneficiary.name,
        cid10 = request.cid10,
        summary = request.clinical_summary,
        items = items,
        documents = if document_summary.is_empty() {
            "ALERTA: NENHUM DOCUMENTO ANEXADO"
        } else {
            &document_summary
        },
        rules = if rules_text.is_empty() {
            "Nenhuma regra customizada ativa. Siga as diretrizes padrão da ANS (DUT)."
        } else {
            &rules_text
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use medaudit_core::{AiRule, RulePriority};

    fn request() -> Request {
        medaudit_core::NewRequest {
            beneficiary: medaudit_core::Beneficiary {
                id: "b-1".into(),
                name: "JOANA PRADO".into(),
                card_id: "001".into(),
                birth_date: chrono::NaiveDate::from_ymd_opt(1985, 2, 2).unwrap(),
                gender: None,
            },
            cid10: "K42.9".into(),
            clinical_summary: "Dor abdominal recorrente.".into(),
            items: vec![medaudit_core::ItemDraft {
                procedure_code: "31009166".into(),
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
        .submit(
            "REQ-1".into(),
            None,
            vec![medaudit_core::AuditItem::new(
                medaudit_core::Procedure {
                    id: 1,
                    code: "31009166".into(),
                    tuss_code: "31009166".into(),
                    description: "HERNIORRAFIA UMBILICAL".into(),
                    fees_value: 1250.0,
                    risk_rating: "RACIONALIZAÇÃO".into(),
                    rationalization: String::new(),
                    coverage: medaudit_core::Coverage::Coberto,
                    kind: medaudit_core::ProcedureKind::Procedimento,
                    is_active: true,
                },
                2,
            )],
            &medaudit_core::User {
                id: "u-1".into(),
                name: "Atendimento".into(),
                role: medaudit_core::Role::Operadora,
                tenant_id: None,
                tipo_auditor: None,
                especialidade: None,
            },
            chrono::Utc::now(),
        )
        .unwrap()
    }

    #[test]
    fn prompt_flags_an_empty_dossier() {
        let prompt = build_analysis_prompt(&request(), &[]);
        assert!(prompt.contains("ALERTA: NENHUM DOCUMENTO ANEXADO"));
        assert!(prompt.contains("diretrizes padrão da ANS"));
        assert!(prompt.contains("31009166 - HERNIORRAFIA UMBILICAL (Qtd: 2)"));
    }

    #[test]
    fn prompt_injects_only_active_rules() {
        let rules = vec![
            AiRule {
                id: "r1".into(),
                title: medaudit_core::NonEmptyText::new("OPME exige três orçamentos").unwrap(),
                description: "Sem orçamentos, recomendar parcial.".into(),
                is_active: true,
                priority: RulePriority::Alta,
            },
            AiRule {
                id: "r2".into(),
                title: medaudit_core::NonEmptyText::new("Regra desligada").unwrap(),
                description: "Não deve aparecer.".into(),
                is_active: false,
                priority: RulePriority::Baixa,
            },
        ];
        let prompt = build_analysis_prompt(&request(), &rules);
        assert!(prompt.contains("[PRIORIDADE ALTA]: OPME exige três orçamentos"));
        assert!(!prompt.contains("Regra desligada"));
    }
}
