//! The decision-support opinion and its recovery parser.

use serde::{Deserialize, Serialize};

/// Advisory verdict tiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Recommendation {
    #[serde(rename = "APPROVE")]
    Approve,
    #[serde(rename = "REJECT")]
    Reject,
    #[serde(rename = "PARTIAL")]
    Partial,
}

/// The oracle's opinion on one request.
///
/// Purely advisory: it is returned to the caller and rendered on the audit
/// screen; no workflow rule reads it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DecisionSupport {
    pub recommendation: Recommendation,
    /// Self-reported confidence, clamped to `[0, 1]`.
    pub confidence: f32,
    pub reasoning: String,
    pub regulatory_references: Vec<String>,
}

impl DecisionSupport {
    /// The opinion returned whenever generation or parsing fails.
    ///
    /// Always `PARTIAL` at zero confidence, so a broken oracle can never push
    /// an auditor toward approval or rejection.
    pub fn contingency() -> Self {
        Self {
            recommendation: Recommendation::Partial,
            confidence: 0.0,
            reasoning: "Não foi possível processar a análise técnica via IA seguindo as regras \
                        inteligentes. Realize a conferência manual."
                .to_owned(),
            regulatory_references: vec![
                "Protocolo de Contingência - Falha na Injeção de Regras IA".to_owned(),
            ],
        }
    }
}

/// Parses a model reply into a [`DecisionSupport`].
///
/// Models occasionally wrap the JSON object in prose or code fences; the
/// parser recovers by slicing from the first `{` to the last `}` before
/// deserializing. Confidence outside `[0, 1]` is clamped rather than
/// rejected.
pub fn parse_decision(reply: &str) -> Result<DecisionSupport, serde_json::Error> {
    let start = reply.find('{').unwrap_or(0);
    let end = reply.rfind('}').map_or(reply.len(), |i| i + 1);
    let slice = reply.get(start..end).unwrap_or(reply);

    let mut decision: DecisionSupport = serde_json::from_str(slice)?;
    decision.confidence = decision.confidence.clamp(0.0, 1.0);
    Ok(decision)
}
