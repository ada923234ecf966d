//! The never-failing advisory flow.

use crate::client::TextGenerator;
use crate::decision::{parse_decision, DecisionSupport};
use crate::prompts::{build_analysis_prompt, SYSTEM_INSTRUCTION};
use medaudit_core::{AiRule, Request};
use std::sync::Arc;

/// Advisory oracle over an abstract [`TextGenerator`].
///
/// `analyze` is infallible by contract: generation failures, empty replies
/// and malformed JSON all degrade into [`DecisionSupport::contingency`]. The
/// caller never has to distinguish a broken oracle from a cautious one.
pub struct DecisionOracle {
    generator: Arc<dyn TextGenerator>,
}

impl DecisionOracle {
    pub fn new(generator: Arc<dyn TextGenerator>) -> Self {
        Self { generator }
    }

    /// Produces an advisory opinion for `request` under the given governance
    /// rules.
    pub async fn analyze(&self, request: &Request, rules: &[AiRule]) -> DecisionSupport {
        let prompt = build_analysis_prompt(request, rules);
        let reply = match self.generator.generate(SYSTEM_INSTRUCTION, &prompt).await {
            Ok(reply) => reply,
            Err(err) => {
                tracing::warn!(request = %request.id, %err, "oracle generation failed, serving contingency");
                return DecisionSupport::contingency();
            }
        };

        match parse_decision(&reply) {
            Ok(decision) => decision,
            Err(err) => {
                tracing::warn!(request = %request.id, %err, "oracle reply unparseable, serving contingency");
                DecisionSupport::contingency()
            }
        }
    }
}
